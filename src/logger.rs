// ============================================================================
// src/logger.rs - Debug Logging through the `log` crate
// ============================================================================
//!
//! 互換層用ロギング。
//!
//! ## 機能
//! - `log`クレートを使用した標準的なログインターフェース
//! - 1レコードを固定長の行バッファ（ヒープ不要）に整形
//! - 整形済みの行はホストが登録したデバッグシンク（`debug_print`）へ渡す
//! - シンク未登録時は破棄
//!
//! ## 使用方法
//! ```ignore
//! spectranet_compat::logger::set_sink(|line| host_debug_print(line));
//! spectranet_compat::logger::init(&CompatConfig::default())?;
//! ```

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU8, Ordering};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::config::{CompatConfig, DEFAULT_LOG_LEVEL};

// ============================================================================
// 定数定義
// ============================================================================

/// 1行の最大バイト数（超過分は切り捨て）
pub const MAX_LINE: usize = 128;

/// デバッグシンクの型
pub type DebugSink = fn(&str);

// ============================================================================
// ロガー状態管理
// ============================================================================

/// 現在のログレベル（実行時変更可能）
static CURRENT_LOG_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_LOG_LEVEL as u8);

/// 登録済みシンク
static SINK: Mutex<Option<DebugSink>> = Mutex::new(None);

// ============================================================================
// 行バッファ
// ============================================================================

/// 固定長の行バッファ
pub struct LineWriter {
    buf: [u8; MAX_LINE],
    len: usize,
}

impl LineWriter {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn is_truncated(&self) -> bool {
        self.len == MAX_LINE
    }
}

impl Default for LineWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = MAX_LINE - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

// ============================================================================
// ロガー実装
// ============================================================================

/// 互換層ロガー
struct CompatLogger;

impl CompatLogger {
    /// ログレベルのプレフィックスを取得
    fn level_prefix(level: Level) -> &'static str {
        match level {
            Level::Error => "[ERROR] ",
            Level::Warn => "[WARN]  ",
            Level::Info => "[INFO]  ",
            Level::Debug => "[DEBUG] ",
            Level::Trace => "[TRACE] ",
        }
    }
}

/// レコードを1行に整形
pub fn render(record: &Record, line: &mut LineWriter) {
    let _ = line.write_str(CompatLogger::level_prefix(record.level()));
    if let Some(module) = record.module_path() {
        let _ = write!(line, "[{}] ", module);
    }
    let _ = write!(line, "{}", record.args());
}

impl Log for CompatLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let current_level = LevelFilter::iter()
            .nth(CURRENT_LOG_LEVEL.load(Ordering::Relaxed) as usize)
            .unwrap_or(DEFAULT_LOG_LEVEL);
        metadata.level() <= current_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let sink = *SINK.lock();
        let Some(sink) = sink else {
            return;
        };

        let mut line = LineWriter::new();
        render(record, &mut line);
        sink(line.as_str());
    }

    fn flush(&self) {}
}

/// グローバルロガーインスタンス
static LOGGER: CompatLogger = CompatLogger;

// ============================================================================
// 公開API
// ============================================================================

/// ロギングを初期化
pub fn init(config: &CompatConfig) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    set_level(config.log_level);
    Ok(())
}

/// 実行時にログレベルを変更
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
    CURRENT_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// デバッグシンクを登録
pub fn set_sink(sink: DebugSink) {
    *SINK.lock() = Some(sink);
}

/// デバッグシンクを解除
pub fn clear_sink() {
    *SINK.lock() = None;
}

// ============================================================================
// テスト
// ============================================================================
