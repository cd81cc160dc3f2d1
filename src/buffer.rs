// ============================================================================
// src/buffer.rs - Fixed-Capacity Receive Ring
// ============================================================================
//!
//! スロット毎の受信バッファ。
//!
//! 先頭インデックスと長さで管理するリングバッファで、部分読み出し時に
//! 残りデータを前方へ詰め直す必要がない。観測できる順序は単純なFIFO。

/// 受信バッファ容量
pub const RX_CAPACITY: usize = 2048;

/// 固定長受信リングバッファ
#[derive(Clone)]
pub struct RxRing {
    data: [u8; RX_CAPACITY],
    head: usize,
    len: usize,
}

impl RxRing {
    pub const fn new() -> Self {
        Self {
            data: [0; RX_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    /// バッファ済みバイト数
    pub fn len(&self) -> usize {
        self.len
    }

    /// 空きバイト数
    pub fn available(&self) -> usize {
        RX_CAPACITY - self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == RX_CAPACITY
    }

    /// 末尾に追記し、受け入れたバイト数を返す
    ///
    /// 空き容量を超えた分は破棄される。
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes.len().min(self.available());
        if accepted == 0 {
            return 0;
        }

        let tail = (self.head + self.len) % RX_CAPACITY;
        let first = accepted.min(RX_CAPACITY - tail);
        self.data[tail..tail + first].copy_from_slice(&bytes[..first]);
        self.data[..accepted - first].copy_from_slice(&bytes[first..accepted]);

        self.len += accepted;
        accepted
    }

    /// 先頭から`buf.len()`バイトまで取り出す
    pub fn pop(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.len);
        if n == 0 {
            return 0;
        }

        let first = n.min(RX_CAPACITY - self.head);
        buf[..first].copy_from_slice(&self.data[self.head..self.head + first]);
        buf[first..n].copy_from_slice(&self.data[..n - first]);

        self.head = (self.head + n) % RX_CAPACITY;
        self.len -= n;
        if self.len == 0 {
            self.head = 0;
        }
        n
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl Default for RxRing {
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

    #[test]
    fn test_fifo_order() {
        let mut ring = RxRing::new();
        assert_eq!(ring.push(&[1, 2, 3]), 3);
        assert_eq!(ring.push(&[4, 5]), 2);

        let mut out = [0u8; 2];
        assert_eq!(ring.pop(&mut out), 2);
        assert_eq!(out, [1, 2]);

        let mut out = [0u8; 8];
        assert_eq!(ring.pop(&mut out), 3);
        assert_eq!(&out[..3], &[3, 4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_truncates_at_capacity() {
        let mut ring = RxRing::new();
        let existing = [0xAAu8; 2040];
        assert_eq!(ring.push(&existing), 2040);

        let incoming: [u8; 16] = core::array::from_fn(|i| i as u8);
        assert_eq!(ring.push(&incoming), 8);
        assert!(ring.is_full());
        assert_eq!(ring.push(&[1]), 0);

        let mut out = [0u8; RX_CAPACITY];
        assert_eq!(ring.pop(&mut out), RX_CAPACITY);
        assert!(out[..2040].iter().all(|&b| b == 0xAA));
        assert_eq!(&out[2040..], &incoming[..8]);
    }

    #[test]
    fn test_wraps_around() {
        let mut ring = RxRing::new();
        let mut scratch = [0u8; 1999];
        ring.push(&[7u8; 2000]);
        ring.pop(&mut scratch);

        // 末尾を跨ぐ書き込み
        let payload: [u8; 100] = core::array::from_fn(|i| i as u8);
        assert_eq!(ring.push(&payload), 100);
        assert_eq!(ring.len(), 101);

        let mut first = [0u8; 1];
        assert_eq!(ring.pop(&mut first), 1);
        assert_eq!(first, [7]);

        let mut out = [0u8; 100];
        assert_eq!(ring.pop(&mut out), 100);
        assert_eq!(out, payload);
    }

    #[test]
    fn test_empty_pop() {
        let mut ring = RxRing::new();
        let mut out = [0u8; 4];
        assert_eq!(ring.pop(&mut out), 0);
    }

    #[test]
    fn test_clear() {
        let mut ring = RxRing::new();
        ring.push(&[1, 2, 3]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.available(), RX_CAPACITY);
    }
}
