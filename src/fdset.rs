// ============================================================================
// src/fdset.rs - Readiness Set for select()
// ============================================================================
//!
//! `fd_set`相当の小さな固定長集合。
//!
//! `select`は多重化器ではなくスナップショットのポーリングで、準備未完了の
//! エントリは番兵値`FD_NOT_READY`に置き換えられる。

use bitflags::bitflags;

use crate::types::SocketFd;

/// 集合の容量
pub const FD_SETSIZE: usize = 8;

/// 準備未完了を表す番兵値
pub const FD_NOT_READY: u8 = 0xFF;

bitflags! {
    /// ディスクリプタのレディネス
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Readiness: u8 {
        /// 受信バッファにデータあり
        const READABLE = 1 << 0;
        /// 送信は常に即時受理される
        const WRITABLE = 1 << 1;
    }
}

/// `fd_set`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FdSet {
    count: u8,
    fds: [u8; FD_SETSIZE],
}

impl FdSet {
    /// FD_ZERO済みの集合
    pub const fn new() -> Self {
        Self {
            count: 0,
            fds: [FD_NOT_READY; FD_SETSIZE],
        }
    }

    /// FD_ZERO
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// FD_SET
    ///
    /// 既に含まれている場合と満杯の場合は何もしない。
    pub fn insert(&mut self, fd: SocketFd) -> bool {
        if self.contains(fd) || self.count as usize == FD_SETSIZE {
            return false;
        }
        self.fds[self.count as usize] = fd.as_u8();
        self.count += 1;
        true
    }

    /// FD_ISSET
    pub fn contains(&self, fd: SocketFd) -> bool {
        fd.as_u8() != FD_NOT_READY && self.entries().contains(&fd.as_u8())
    }

    /// FD_CLR
    pub fn remove(&mut self, fd: SocketFd) -> bool {
        let count = self.count as usize;
        match self.fds[..count].iter().position(|&e| e == fd.as_u8()) {
            Some(pos) => {
                self.fds.copy_within(pos + 1..count, pos);
                self.fds[count - 1] = FD_NOT_READY;
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    /// 登録済みエントリ数（番兵を含む）
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 登録済みエントリ（番兵を含む）
    pub fn entries(&self) -> &[u8] {
        &self.fds[..self.count as usize]
    }

    /// 準備完了のディスクリプタ
    pub fn ready(&self) -> impl Iterator<Item = SocketFd> + '_ {
        self.entries()
            .iter()
            .filter(|&&e| e != FD_NOT_READY)
            .map(|&e| SocketFd::new(e))
    }

    /// `select`用: 各エントリをレディネス判定で残すか番兵に置き換える
    ///
    /// 準備完了のエントリ数を返す。
    pub(crate) fn retain_ready<F>(&mut self, mut is_ready: F) -> usize
    where
        F: FnMut(SocketFd) -> bool,
    {
        let count = self.count as usize;
        let mut ready = 0;
        for entry in &mut self.fds[..count] {
            if *entry == FD_NOT_READY {
                continue;
            }
            if is_ready(SocketFd::new(*entry)) {
                ready += 1;
            } else {
                *entry = FD_NOT_READY;
            }
        }
        ready
    }
}

impl Default for FdSet {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// テスト
// ============================================================================
