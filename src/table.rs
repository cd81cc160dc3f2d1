// ============================================================================
// src/table.rs - Fixed Socket Slot Table
// ============================================================================
//!
//! # ソケットテーブル
//!
//! 固定長のスロット配列。ディスクリプタはスロット番号そのもので、
//! 割り当ては昇順の線形走査（最小番号が優先）。

use crate::buffer::RxRing;
use crate::error::{CompatError, CompatResult};
use crate::types::{DHCP_CLIENT_PORT, Protocol, SockAddrIn, SocketFd};

/// スロット数
pub const MAX_SOCKETS: usize = 8;

/// 接続状態
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectState {
    /// 未接続
    Idle,
    /// NICからの完了通知待ち
    Connecting { remote: SockAddrIn },
    /// 接続済み
    Connected { remote: SockAddrIn },
}

/// スロット
#[derive(Clone)]
pub struct SocketSlot {
    in_use: bool,
    bound: bool,
    protocol: Protocol,
    bound_address: SockAddrIn,
    connect_state: ConnectState,
    rx: RxRing,
}

impl SocketSlot {
    const fn empty() -> Self {
        Self {
            in_use: false,
            bound: false,
            protocol: Protocol::Tcp,
            bound_address: SockAddrIn::UNSPECIFIED,
            connect_state: ConnectState::Idle,
            rx: RxRing::new(),
        }
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// 実効プロトコル
    ///
    /// DHCPクライアントポートにバインドされたUDPスロットはDHCPとして扱う。
    pub fn protocol(&self) -> Protocol {
        match self.protocol {
            Protocol::Udp if self.bound && self.bound_address.port.0 == DHCP_CLIENT_PORT => {
                Protocol::Dhcp
            }
            p => p,
        }
    }

    /// 生成時に指定されたプロトコル
    pub fn created_protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn bound_address(&self) -> Option<SockAddrIn> {
        self.bound.then_some(self.bound_address)
    }

    /// バインド（再バインドは後勝ち）
    pub fn bind(&mut self, addr: SockAddrIn) {
        self.bound_address = addr;
        self.bound = true;
    }

    pub fn connect_state(&self) -> ConnectState {
        self.connect_state
    }

    pub fn set_connect_state(&mut self, state: ConnectState) {
        self.connect_state = state;
    }

    /// 接続先（接続済みの場合のみ）
    pub fn peer(&self) -> Option<SockAddrIn> {
        match self.connect_state {
            ConnectState::Connected { remote } => Some(remote),
            _ => None,
        }
    }

    pub fn rx(&self) -> &RxRing {
        &self.rx
    }

    pub fn rx_mut(&mut self) -> &mut RxRing {
        &mut self.rx
    }
}

/// ソケットテーブル
pub struct SocketTable {
    slots: [SocketSlot; MAX_SOCKETS],
}

impl SocketTable {
    pub const fn new() -> Self {
        Self {
            slots: [const { SocketSlot::empty() }; MAX_SOCKETS],
        }
    }

    /// 最初の空きスロットを確保
    pub fn allocate(&mut self, protocol: Protocol) -> CompatResult<SocketFd> {
        let (idx, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| !s.in_use)
            .ok_or(CompatError::PoolExhausted)?;

        *slot = SocketSlot::empty();
        slot.in_use = true;
        slot.protocol = protocol;
        Ok(SocketFd::new(idx as u8))
    }

    /// スロットを解放（受信バッファも破棄）
    pub fn release(&mut self, fd: SocketFd) -> CompatResult<()> {
        let slot = self.validate_mut(fd)?;
        slot.in_use = false;
        slot.bound = false;
        slot.bound_address = SockAddrIn::UNSPECIFIED;
        slot.connect_state = ConnectState::Idle;
        slot.rx.clear();
        Ok(())
    }

    pub fn validate(&self, fd: SocketFd) -> CompatResult<&SocketSlot> {
        self.slots
            .get(fd.as_usize())
            .filter(|s| s.in_use)
            .ok_or(CompatError::InvalidDescriptor)
    }

    pub fn validate_mut(&mut self, fd: SocketFd) -> CompatResult<&mut SocketSlot> {
        self.slots
            .get_mut(fd.as_usize())
            .filter(|s| s.in_use)
            .ok_or(CompatError::InvalidDescriptor)
    }

    /// 使用中スロット数
    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }
}

impl Default for SocketTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// テスト
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ipv4Address;

    #[test]
    fn test_allocate_lowest_first() {
        let mut table = SocketTable::new();
        for i in 0..MAX_SOCKETS {
            assert_eq!(table.allocate(Protocol::Udp), Ok(SocketFd(i as u8)));
        }
        assert_eq!(table.allocate(Protocol::Tcp), Err(CompatError::PoolExhausted));

        table.release(SocketFd(3)).unwrap();
        assert_eq!(table.allocate(Protocol::Tcp), Ok(SocketFd(3)));
    }

    #[test]
    fn test_validate() {
        let mut table = SocketTable::new();
        assert!(table.validate(SocketFd(0)).is_err());
        let fd = table.allocate(Protocol::Tcp).unwrap();
        assert!(table.validate(fd).is_ok());
        assert_eq!(
            table.validate(SocketFd(MAX_SOCKETS as u8)).err(),
            Some(CompatError::InvalidDescriptor)
        );
        assert_eq!(table.release(SocketFd(5)), Err(CompatError::InvalidDescriptor));
    }

    #[test]
    fn test_release_flushes_buffer() {
        let mut table = SocketTable::new();
        let fd = table.allocate(Protocol::Udp).unwrap();
        table.validate_mut(fd).unwrap().rx_mut().push(&[1, 2, 3]);
        table.validate_mut(fd).unwrap().bind(SockAddrIn::any(1000));

        table.release(fd).unwrap();
        let fd = table.allocate(Protocol::Udp).unwrap();
        let slot = table.validate(fd).unwrap();
        assert!(slot.rx().is_empty());
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_dhcp_designation() {
        let mut table = SocketTable::new();
        let fd = table.allocate(Protocol::Udp).unwrap();
        let slot = table.validate_mut(fd).unwrap();
        assert_eq!(slot.protocol(), Protocol::Udp);

        slot.bind(SockAddrIn::new(Ipv4Address::ANY, DHCP_CLIENT_PORT));
        assert_eq!(slot.protocol(), Protocol::Dhcp);
        assert_eq!(slot.created_protocol(), Protocol::Udp);
    }
}
