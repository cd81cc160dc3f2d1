// ============================================================================
// src/compat.rs - BSD-style Call Adapter
// ============================================================================
//!
//! # ソケット呼び出しアダプタ
//!
//! ファームウェアのBSD風呼び出しをソケットテーブルの操作とNICデバイスへの
//! 通知に変換する。
//!
//! ## 流れ
//! - `socket` → スロット確保 → `NicDevice::socket_opened`
//! - `bind` / `send_to` → 検証してNICへ転送
//! - NICが`deliver_inbound`で受信データを積む
//! - `poll_readiness`でレディネスを確認し、`receive_from`で取り出す
//! - `close_socket` → `NicDevice::socket_closed` → スロット解放
//!
//! 全操作は中断なしで完了する。送信はNICへの受け渡しのみで、
//! 分割やフロー制御は行わない。

use log::{debug, trace, warn};

use crate::config::CompatConfig;
use crate::error::{self, CompatError, CompatResult};
use crate::fdset::{FdSet, Readiness};
use crate::nic::NicDevice;
use crate::stats::CompatStats;
use crate::table::{ConnectState, SocketSlot, SocketTable};
use crate::types::{Protocol, SockAddrIn, SocketFd, SocketOption};

/// 互換層
pub struct CompatLayer<D: NicDevice> {
    table: SocketTable,
    nic: D,
    config: CompatConfig,
    stats: CompatStats,
    /// 直近の割り当て失敗
    last_error: Option<CompatError>,
}

impl<D: NicDevice> CompatLayer<D> {
    pub fn new(nic: D) -> Self {
        Self::with_config(nic, CompatConfig::default())
    }

    pub fn with_config(nic: D, config: CompatConfig) -> Self {
        Self {
            table: SocketTable::new(),
            nic,
            config,
            stats: CompatStats::new(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    pub fn stats(&self) -> &CompatStats {
        &self.stats
    }

    pub fn table(&self) -> &SocketTable {
        &self.table
    }

    pub fn nic(&self) -> &D {
        &self.nic
    }

    pub fn nic_mut(&mut self) -> &mut D {
        &mut self.nic
    }

    fn trace_payload(&self, what: &str, fd: SocketFd, payload: &[u8]) {
        if self.config.trace_payloads {
            trace!("{} {}: {:02x?}", what, fd, payload);
        }
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// `socket(domain, type, protocol)`
    ///
    /// `domain`と`type`は受け付けるだけで、スロットのプロトコルは
    /// `protocol`のみで決まる。
    pub fn socket(&mut self, domain: i32, sock_type: i32, protocol: i32) -> CompatResult<SocketFd> {
        trace!("socket: domain {} type {} protocol {}", domain, sock_type, protocol);
        self.allocate_socket(protocol)
    }

    /// スロットを確保してNICへ通知
    pub fn allocate_socket(&mut self, protocol_hint: i32) -> CompatResult<SocketFd> {
        let result = Protocol::from_ipproto(protocol_hint)
            .ok_or(CompatError::NoProtocolMatch)
            .and_then(|protocol| Ok((self.table.allocate(protocol)?, protocol)));

        match result {
            Ok((fd, protocol)) => {
                self.nic.socket_opened(fd, protocol);
                self.stats.record_open();
                debug!("socket: opened {} type {}", fd, protocol);
                Ok(fd)
            }
            Err(err) => {
                match err {
                    CompatError::NoProtocolMatch => {
                        warn!("socket: protocol {} not recognized", protocol_hint)
                    }
                    _ => warn!("socket: used all sockets"),
                }
                self.last_error = Some(err);
                Err(err)
            }
        }
    }

    /// ソケットをクローズ
    pub fn close_socket(&mut self, fd: SocketFd) -> CompatResult<()> {
        self.table.validate(fd)?;
        self.nic.socket_closed(fd);
        self.table.release(fd)?;
        self.stats.record_close();
        debug!("close: {}", fd);
        Ok(())
    }

    /// ディスクリプタの検証
    pub fn validate(&self, fd: SocketFd) -> CompatResult<&SocketSlot> {
        self.table.validate(fd)
    }

    // ========================================================================
    // Binding / Connection
    // ========================================================================

    /// ローカルアドレスをバインド
    ///
    /// 再バインドは検証せず後勝ち。
    pub fn bind(&mut self, fd: SocketFd, addr: SockAddrIn) -> CompatResult<()> {
        let slot = self.table.validate_mut(fd)?;
        if slot.is_bound() {
            debug!("bind: {} rebinding to port {}", fd, addr.port.0);
        }
        self.nic.bind(fd, addr.port.0);
        slot.bind(addr);
        debug!("bind: {} port {}", fd, addr.port.0);
        Ok(())
    }

    /// 接続要求をNICへ転送
    ///
    /// 完了は`connected`コールバックで通知される。
    pub fn connect(&mut self, fd: SocketFd, remote: SockAddrIn) -> CompatResult<()> {
        let slot = self.table.validate_mut(fd)?;
        slot.set_connect_state(ConnectState::Connecting { remote });
        self.nic.connect(fd, remote.addr, remote.port.0);
        debug!("connect: {} to {}", fd, remote);
        Ok(())
    }

    /// NICからの接続完了通知
    ///
    /// デバイス側から呼ばれるため失敗を返さない。
    /// ディスクリプタが有効だったかどうかを返す。
    pub fn connected(&mut self, fd: SocketFd, success: bool) -> bool {
        let Ok(slot) = self.table.validate_mut(fd) else {
            return false;
        };

        let next = match (slot.connect_state(), success) {
            (ConnectState::Connecting { remote }, true) => ConnectState::Connected { remote },
            (ConnectState::Connecting { .. }, false) => ConnectState::Idle,
            (state, _) => state,
        };
        slot.set_connect_state(next);
        debug!("connected: {} success {}", fd, success);
        true
    }

    /// 実効プロトコル（DHCPクライアントポートにバインドされたUDPはDHCP）
    pub fn protocol(&self, fd: SocketFd) -> CompatResult<Protocol> {
        Ok(self.table.validate(fd)?.protocol())
    }

    /// 接続先アドレス
    pub fn peer_addr(&self, fd: SocketFd) -> CompatResult<SockAddrIn> {
        self.table.validate(fd)?.peer().ok_or(CompatError::NotConnected)
    }

    /// バインド済みのローカルアドレス
    pub fn local_addr(&self, fd: SocketFd) -> CompatResult<Option<SockAddrIn>> {
        Ok(self.table.validate(fd)?.bound_address())
    }

    /// listen（未対応）
    pub fn listen(&mut self, fd: SocketFd, _backlog: i32) -> CompatResult<()> {
        self.table.validate(fd)?;
        Err(CompatError::NotSupported)
    }

    /// accept（未対応）
    pub fn accept(&mut self, fd: SocketFd) -> CompatResult<(SocketFd, SockAddrIn)> {
        self.table.validate(fd)?;
        Err(CompatError::NotSupported)
    }

    /// setsockopt
    ///
    /// ディスクリプタも含めて検証せず、受け付けるだけで何も変更しない。
    pub fn setsockopt(&mut self, sockfd: i32, option: SocketOption) -> CompatResult<()> {
        trace!("setsockopt: fd{} {:?}", sockfd, option);
        Ok(())
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// 宛先指定の送信
    ///
    /// ペイロード全体をNICへ渡し、その長さを返す。
    pub fn send_to(&mut self, fd: SocketFd, payload: &[u8], dest: SockAddrIn) -> CompatResult<usize> {
        self.table.validate(fd)?;
        debug!("sendto: {} port {} len {}", fd, dest.port.0, payload.len());
        self.trace_payload("sendto", fd, payload);

        self.nic.transmit(fd, dest.addr, dest.port.0, payload);
        self.stats.record_tx(payload.len());
        Ok(payload.len())
    }

    /// 確立済みコンテキストへの送信
    pub fn send(&mut self, fd: SocketFd, payload: &[u8]) -> CompatResult<usize> {
        self.table.validate(fd)?;
        debug!("send: {} len {}", fd, payload.len());
        self.trace_payload("send", fd, payload);

        self.nic.send(fd, payload);
        self.stats.record_tx(payload.len());
        Ok(payload.len())
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// NICからの受信データを受信バッファへ追記（`compat_rx_data`）
    ///
    /// 無効なディスクリプタには0を返す。空き容量を超えた分は黙って破棄する。
    pub fn deliver_inbound(&mut self, fd: SocketFd, bytes: &[u8]) -> usize {
        let Ok(slot) = self.table.validate_mut(fd) else {
            return 0;
        };

        let accepted = slot.rx_mut().push(bytes);
        let dropped = bytes.len() - accepted;
        if dropped > 0 {
            debug!("rx: {} dropped {} bytes (buffer full)", fd, dropped);
        }

        self.stats.record_rx(accepted, dropped);
        self.trace_payload("rx", fd, &bytes[..accepted]);
        accepted
    }

    /// 受信（`recv`）
    ///
    /// バッファが空なら0を返す（エラーではない）。
    pub fn receive(&mut self, fd: SocketFd, buf: &mut [u8]) -> CompatResult<usize> {
        Ok(self.table.validate_mut(fd)?.rx_mut().pop(buf))
    }

    /// 送信元付き受信（`recvfrom`）
    ///
    /// 送信元は接続先アドレス、未接続なら`SockAddrIn::UNSPECIFIED`。
    pub fn receive_from(&mut self, fd: SocketFd, buf: &mut [u8]) -> CompatResult<(usize, SockAddrIn)> {
        let slot = self.table.validate_mut(fd)?;
        let n = slot.rx_mut().pop(buf);
        Ok((n, slot.peer().unwrap_or(SockAddrIn::UNSPECIFIED)))
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    /// 単一ディスクリプタのレディネス
    ///
    /// 書き込みは常に可能として扱う。
    pub fn readiness(&self, fd: SocketFd) -> Readiness {
        match self.table.validate(fd) {
            Ok(slot) if !slot.rx().is_empty() => Readiness::READABLE | Readiness::WRITABLE,
            Ok(_) => Readiness::WRITABLE,
            Err(_) => Readiness::empty(),
        }
    }

    /// `select`相当のスナップショットポーリング
    ///
    /// 受信バッファが空のエントリは番兵に置き換える。
    /// 準備完了のディスクリプタ数を返す。
    pub fn poll_readiness(&self, read_set: &mut FdSet) -> usize {
        read_set.retain_ready(|fd| self.readiness(fd).contains(Readiness::READABLE))
    }

    // ========================================================================
    // Last Error
    // ========================================================================

    /// 直近の割り当て失敗
    pub fn last_error(&self) -> Option<CompatError> {
        self.last_error
    }

    /// `compat_socket_get_error()`
    pub fn last_error_code(&self) -> i32 {
        error::error_code(self.last_error)
    }

    /// `compat_socket_get_strerror()`
    pub fn strerror(&self) -> &'static str {
        error::strerror(self.last_error)
    }
}

// ============================================================================
// テスト
// ============================================================================
