// ============================================================================
// src/stats.rs - Traffic Counters
// ============================================================================

use core::sync::atomic::{AtomicU64, Ordering};

/// 互換層の統計
#[derive(Debug, Default)]
pub struct CompatStats {
    /// 生成されたソケット数
    pub sockets_opened: AtomicU64,
    /// クローズされたソケット数
    pub sockets_closed: AtomicU64,
    /// NICへ渡した送信回数
    pub tx_packets: AtomicU64,
    /// NICへ渡した送信バイト数
    pub tx_bytes: AtomicU64,
    /// 受信バッファに受け入れたバイト数
    pub rx_bytes: AtomicU64,
    /// 容量超過で破棄したバイト数
    pub rx_dropped: AtomicU64,
}

/// 統計のスナップショット
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sockets_opened: u64,
    pub sockets_closed: u64,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub rx_dropped: u64,
}

impl CompatStats {
    pub const fn new() -> Self {
        Self {
            sockets_opened: AtomicU64::new(0),
            sockets_closed: AtomicU64::new(0),
            tx_packets: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
            rx_bytes: AtomicU64::new(0),
            rx_dropped: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_open(&self) {
        self.sockets_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self) {
        self.sockets_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tx(&self, bytes: usize) {
        self.tx_packets.fetch_add(1, Ordering::Relaxed);
        self.tx_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_rx(&self, accepted: usize, dropped: usize) {
        self.rx_bytes.fetch_add(accepted as u64, Ordering::Relaxed);
        self.rx_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sockets_opened: self.sockets_opened.load(Ordering::Relaxed),
            sockets_closed: self.sockets_closed.load(Ordering::Relaxed),
            tx_packets: self.tx_packets.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            rx_dropped: self.rx_dropped.load(Ordering::Relaxed),
        }
    }
}
