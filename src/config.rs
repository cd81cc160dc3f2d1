// ============================================================================
// src/config.rs - Compat Layer Configuration
// ============================================================================

use log::LevelFilter;

/// 既定のログレベル（featureで変更可能）
#[cfg(feature = "verbose_logging")]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Trace;

#[cfg(not(feature = "verbose_logging"))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// 互換層の設定
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompatConfig {
    /// ロガーの最大レベル
    pub log_level: LevelFilter,
    /// 送受信ペイロードをtraceレベルで16進ダンプする
    pub trace_payloads: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL,
            trace_payloads: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompatConfig::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.trace_payloads);
    }
}
