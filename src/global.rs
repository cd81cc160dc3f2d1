// ============================================================================
// src/global.rs - Firmware-facing Call Surface
// ============================================================================
//!
//! プロセス全体で1つの互換層インスタンスと、ファームウェアの呼び出し名に
//! 合わせた関数群。
//!
//! テーブル全体を1つのスピンロックで保護するため、NICデバイス側
//! （受信コールバック）とファームウェア側が別スレッドで動いても
//! `compat_rx_data`と`recvfrom`/`close`が交錯することはない。
//!
//! NICデバイスへの呼び出しはロック中に`DeferredNic`へ積み、ロック解放後に
//! 発行する。デバイスが`transmit`等の中から`compat_rx_data`や
//! `compat_connected`で折り返してもデッドロックしない。

use alloc::boxed::Box;
use alloc::vec::Vec;
use spin::Mutex;

use crate::compat::CompatLayer;
use crate::config::CompatConfig;
use crate::error::{self, CompatError, CompatResult};
use crate::fdset::FdSet;
use crate::nic::{DeferredNic, NicAction, NicDevice};
use crate::stats::StatsSnapshot;
use crate::types::{Protocol, SockAddrIn, SocketFd, SocketOption};

/// グローバル互換層で使うNICデバイス
pub type BoxedNic = Box<dyn NicDevice + Send>;

/// グローバル互換層
static COMPAT: Mutex<Option<CompatLayer<DeferredNic>>> = Mutex::new(None);

/// 外部NICデバイス（`COMPAT`とは別ロック）
static NIC: Mutex<Option<BoxedNic>> = Mutex::new(None);

/// 互換層を初期化（既存のインスタンスは破棄される）
pub fn init(nic: BoxedNic, config: CompatConfig) {
    *NIC.lock() = Some(nic);
    *COMPAT.lock() = Some(CompatLayer::with_config(DeferredNic::new(), config));
}

/// 互換層を破棄
pub fn shutdown() {
    *COMPAT.lock() = None;
    *NIC.lock() = None;
}

pub fn is_initialized() -> bool {
    COMPAT.lock().is_some()
}

fn with_compat<T>(f: impl FnOnce(&mut CompatLayer<DeferredNic>) -> CompatResult<T>) -> CompatResult<T> {
    let (result, actions) = {
        let mut guard = COMPAT.lock();
        let compat = guard.as_mut().ok_or(CompatError::NotInitialized)?;
        let result = f(compat);
        (result, compat.nic_mut().take())
    };
    dispatch(actions);
    result
}

/// 保留中のNIC呼び出しを`COMPAT`のロック外で発行
fn dispatch(actions: Vec<NicAction>) {
    if actions.is_empty() {
        return;
    }
    if let Some(nic) = NIC.lock().as_mut() {
        for action in actions {
            action.dispatch(nic);
        }
    }
}

fn fd(sockfd: i32) -> CompatResult<SocketFd> {
    SocketFd::from_raw(sockfd).ok_or(CompatError::InvalidDescriptor)
}

// ============================================================================
// Firmware Calls
// ============================================================================

pub fn socket(domain: i32, sock_type: i32, protocol: i32) -> CompatResult<SocketFd> {
    with_compat(|c| c.socket(domain, sock_type, protocol))
}

pub fn compat_socket_close(sockfd: i32) -> CompatResult<()> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.close_socket(fd))
}

pub fn bind(sockfd: i32, addr: &SockAddrIn) -> CompatResult<()> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.bind(fd, *addr))
}

pub fn connect(sockfd: i32, addr: &SockAddrIn) -> CompatResult<()> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.connect(fd, *addr))
}

pub fn listen(sockfd: i32, backlog: i32) -> CompatResult<()> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.listen(fd, backlog))
}

pub fn accept(sockfd: i32) -> CompatResult<(SocketFd, SockAddrIn)> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.accept(fd))
}

/// ディスクリプタを検証せずに受け付ける
pub fn setsockopt(sockfd: i32, level: i32, optname: i32) -> CompatResult<()> {
    with_compat(|c| c.setsockopt(sockfd, SocketOption::from_raw(level, optname)))
}

/// 実効プロトコル
pub fn socket_protocol(sockfd: i32) -> CompatResult<Protocol> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.protocol(fd))
}

pub fn send(sockfd: i32, buf: &[u8]) -> CompatResult<usize> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.send(fd, buf))
}

pub fn sendto(sockfd: i32, buf: &[u8], dest_addr: &SockAddrIn) -> CompatResult<usize> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.send_to(fd, buf, *dest_addr))
}

pub fn recv(sockfd: i32, buf: &mut [u8]) -> CompatResult<usize> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.receive(fd, buf))
}

pub fn recvfrom(sockfd: i32, buf: &mut [u8]) -> CompatResult<(usize, SockAddrIn)> {
    let fd = fd(sockfd)?;
    with_compat(|c| c.receive_from(fd, buf))
}

/// `select(nfds, readfds, writefds, ...)`
///
/// 書き込み集合は常に準備完了として扱い、変更しない。
pub fn select(read_set: &mut FdSet) -> CompatResult<usize> {
    with_compat(|c| Ok(c.poll_readiness(read_set)))
}

pub fn compat_socket_get_error() -> i32 {
    COMPAT
        .lock()
        .as_ref()
        .map_or(error::ERROR_OK, |c| c.last_error_code())
}

pub fn compat_socket_get_strerror() -> &'static str {
    COMPAT
        .lock()
        .as_ref()
        .map_or_else(|| error::strerror(None), |c| c.strerror())
}

pub fn stats() -> Option<StatsSnapshot> {
    COMPAT.lock().as_ref().map(|c| c.stats().snapshot())
}

// ============================================================================
// NIC Callbacks
// ============================================================================

/// NICからの受信データ
///
/// 未初期化・無効なディスクリプタでは0を返す。
pub fn compat_rx_data(sockfd: i32, data: &[u8]) -> usize {
    let Some(fd) = SocketFd::from_raw(sockfd) else {
        return 0;
    };
    COMPAT
        .lock()
        .as_mut()
        .map_or(0, |c| c.deliver_inbound(fd, data))
}

/// NICからの接続完了通知
pub fn compat_connected(sockfd: i32, success: bool) -> bool {
    let Some(fd) = SocketFd::from_raw(sockfd) else {
        return false;
    };
    COMPAT
        .lock()
        .as_mut()
        .is_some_and(|c| c.connected(fd, success))
}
