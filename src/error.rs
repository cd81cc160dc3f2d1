//! 統一エラーハンドリングモジュール
//!
//! 互換層の全操作が返すエラー型を定義する。
//! 受信バッファ溢れはエラーではなく切り詰め（データ破棄）として扱う。

use core::fmt;

/// 互換層のエラー型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatError {
    /// 範囲外、または未使用スロットのディスクリプタ
    InvalidDescriptor,
    /// 空きスロットなし
    PoolExhausted,
    /// 未対応のプロトコル
    NoProtocolMatch,
    /// サポートされていない操作（listen / accept）
    NotSupported,
    /// 接続先が未確定
    NotConnected,
    /// グローバル呼び出し面が未初期化
    NotInitialized,
}

pub type CompatResult<T> = Result<T, CompatError>;

impl CompatError {
    /// `compat_socket_get_error()`が返す粗いエラーコード
    pub const fn code(self) -> i32 {
        match self {
            CompatError::NoProtocolMatch => 1,
            CompatError::InvalidDescriptor => 2,
            CompatError::PoolExhausted => 3,
            CompatError::NotSupported => 4,
            CompatError::NotConnected => 5,
            CompatError::NotInitialized => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CompatError::InvalidDescriptor => "invalid descriptor",
            CompatError::PoolExhausted => "socket pool exhausted",
            CompatError::NoProtocolMatch => "protocol is not recognized",
            CompatError::NotSupported => "operation not supported",
            CompatError::NotConnected => "socket not connected",
            CompatError::NotInitialized => "compat layer not initialized",
        }
    }

    /// `compat_socket_get_strerror()`の文字列
    ///
    /// ファームウェアが表示する文言はプロトコル不一致だけを区別する。
    pub const fn strerror(self) -> &'static str {
        match self {
            CompatError::NoProtocolMatch => "Protocol is not recognized",
            _ => "Error!",
        }
    }
}

impl fmt::Display for CompatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// エラー無しのコード
pub const ERROR_OK: i32 = 0;

/// `Option<CompatError>`をエラーコードへ
pub fn error_code(err: Option<CompatError>) -> i32 {
    err.map_or(ERROR_OK, CompatError::code)
}

/// `Option<CompatError>`をstrerror文字列へ
pub fn strerror(err: Option<CompatError>) -> &'static str {
    err.map_or("Error!", CompatError::strerror)
}
