// ============================================================================
// src/nic.rs - NIC Device Interface
// ============================================================================
//!
//! 互換層から外部NICエミュレーションへの呼び出し口。
//!
//! 実際のW5100レジスタ動作やプロキシへの転送はこのトレイトの実装側が担う。
//! 受信データと接続完了は逆方向に`CompatLayer::deliver_inbound` /
//! `CompatLayer::connected`として届く。

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::types::{Ipv4Address, Protocol, SocketFd};

/// NICデバイスインターフェース
pub trait NicDevice {
    /// 新しい論理ソケットの通知
    fn socket_opened(&mut self, fd: SocketFd, protocol: Protocol);

    /// ソケットのクローズ通知（関連リソースを解放させる）
    fn socket_closed(&mut self, fd: SocketFd);

    /// ローカルポートのバインド通知
    fn bind(&mut self, fd: SocketFd, port: u16);

    /// 宛先指定の送信
    fn transmit(&mut self, fd: SocketFd, address: Ipv4Address, port: u16, payload: &[u8]);

    /// 確立済みのコンテキストへの送信
    fn send(&mut self, fd: SocketFd, payload: &[u8]);

    /// 接続要求。完了は`connected`コールバックで返る。
    fn connect(&mut self, fd: SocketFd, address: Ipv4Address, port: u16);
}

impl<D: NicDevice + ?Sized> NicDevice for Box<D> {
    fn socket_opened(&mut self, fd: SocketFd, protocol: Protocol) {
        (**self).socket_opened(fd, protocol)
    }

    fn socket_closed(&mut self, fd: SocketFd) {
        (**self).socket_closed(fd)
    }

    fn bind(&mut self, fd: SocketFd, port: u16) {
        (**self).bind(fd, port)
    }

    fn transmit(&mut self, fd: SocketFd, address: Ipv4Address, port: u16, payload: &[u8]) {
        (**self).transmit(fd, address, port, payload)
    }

    fn send(&mut self, fd: SocketFd, payload: &[u8]) {
        (**self).send(fd, payload)
    }

    fn connect(&mut self, fd: SocketFd, address: Ipv4Address, port: u16) {
        (**self).connect(fd, address, port)
    }
}

/// 何もしないNIC（デバイス未接続時）
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNic;

impl NicDevice for NullNic {
    fn socket_opened(&mut self, _fd: SocketFd, _protocol: Protocol) {}
    fn socket_closed(&mut self, _fd: SocketFd) {}
    fn bind(&mut self, _fd: SocketFd, _port: u16) {}
    fn transmit(&mut self, _fd: SocketFd, _address: Ipv4Address, _port: u16, _payload: &[u8]) {}
    fn send(&mut self, _fd: SocketFd, _payload: &[u8]) {}
    fn connect(&mut self, _fd: SocketFd, _address: Ipv4Address, _port: u16) {}
}

// ============================================================================
// Deferred Dispatch
// ============================================================================

/// 保留されたNIC呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NicAction {
    Opened(SocketFd, Protocol),
    Closed(SocketFd),
    Bind(SocketFd, u16),
    Transmit(SocketFd, Ipv4Address, u16, Vec<u8>),
    Send(SocketFd, Vec<u8>),
    Connect(SocketFd, Ipv4Address, u16),
}

impl NicAction {
    /// 実際のデバイスへ発行
    pub fn dispatch<D: NicDevice + ?Sized>(self, nic: &mut D) {
        match self {
            NicAction::Opened(fd, protocol) => nic.socket_opened(fd, protocol),
            NicAction::Closed(fd) => nic.socket_closed(fd),
            NicAction::Bind(fd, port) => nic.bind(fd, port),
            NicAction::Transmit(fd, address, port, payload) => {
                nic.transmit(fd, address, port, &payload)
            }
            NicAction::Send(fd, payload) => nic.send(fd, &payload),
            NicAction::Connect(fd, address, port) => nic.connect(fd, address, port),
        }
    }
}

/// 呼び出しを記録して後から発行するNIC
///
/// 互換層のロックを保持したまま外部デバイスを呼ばないために使う。
/// デバイス側が呼び出しの中から`compat_rx_data`等で折り返してもよい。
#[derive(Debug, Default)]
pub struct DeferredNic {
    actions: Vec<NicAction>,
}

impl DeferredNic {
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// 保留中の呼び出しを取り出す（発行順）
    pub fn take(&mut self) -> Vec<NicAction> {
        core::mem::take(&mut self.actions)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl NicDevice for DeferredNic {
    fn socket_opened(&mut self, fd: SocketFd, protocol: Protocol) {
        self.actions.push(NicAction::Opened(fd, protocol));
    }

    fn socket_closed(&mut self, fd: SocketFd) {
        self.actions.push(NicAction::Closed(fd));
    }

    fn bind(&mut self, fd: SocketFd, port: u16) {
        self.actions.push(NicAction::Bind(fd, port));
    }

    fn transmit(&mut self, fd: SocketFd, address: Ipv4Address, port: u16, payload: &[u8]) {
        self.actions
            .push(NicAction::Transmit(fd, address, port, payload.to_vec()));
    }

    fn send(&mut self, fd: SocketFd, payload: &[u8]) {
        self.actions.push(NicAction::Send(fd, payload.to_vec()));
    }

    fn connect(&mut self, fd: SocketFd, address: Ipv4Address, port: u16) {
        self.actions.push(NicAction::Connect(fd, address, port));
    }
}
