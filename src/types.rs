// ============================================================================
// src/types.rs - Descriptor, Protocol and Address Types
// ============================================================================
//!
//! # ソケット互換層の基本型
//!
//! ファームウェア側のBSD風呼び出しで使われる値をNewtypeで表現する。
//! アドレス・ポートはホストバイトオーダーの整数をそのまま通す。

use core::fmt;

// ============================================================================
// Wire Constants
// ============================================================================

/// プロトコル番号（ファームウェアのヘッダ定義と一致）
pub const IPPROTO_TCP: i32 = 0;
pub const IPPROTO_UDP: i32 = 1;

/// ソケット種別
pub const SOCK_STREAM: i32 = 0;
pub const SOCK_DGRAM: i32 = 1;

/// アドレスファミリ
pub const AF_INET: i16 = 0;

/// ソケットオプションレベル / オプション名
pub const SOL_SOCKET: i32 = 0;
pub const SO_REUSEADDR: i32 = 1;

/// DHCPクライアントポート
pub const DHCP_CLIENT_PORT: u16 = 68;

/// 無効なディスクリプタ値
pub const COMPAT_SOCKET_INVALID: i32 = -1;

// ============================================================================
// Type-Safe Identifiers (Newtype Pattern)
// ============================================================================

/// ソケットディスクリプタ（スロット番号）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SocketFd(pub u8);

impl SocketFd {
    pub const fn new(fd: u8) -> Self {
        Self(fd)
    }

    /// C側の`int`ディスクリプタから変換（範囲外はNone）
    pub fn from_raw(raw: i32) -> Option<Self> {
        u8::try_from(raw).ok().map(Self)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub const fn as_raw(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for SocketFd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd{}", self.0)
    }
}

/// ポート番号
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Port(pub u16);

impl Port {
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

// ============================================================================
// Protocol
// ============================================================================

/// スロットのプロトコル
///
/// 判別値はNICデバイスへ通知する`socket_type`と同じ。
/// `Dhcp`は生成時に選べない派生指定。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Protocol {
    Dhcp = 0,
    Tcp = 1,
    Udp = 2,
}

impl Protocol {
    /// `socket()`の`protocol`引数を対応付ける
    pub fn from_ipproto(protocol: i32) -> Option<Self> {
        match protocol {
            IPPROTO_TCP => Some(Protocol::Tcp),
            IPPROTO_UDP => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Dhcp => write!(f, "DHCP"),
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// IPv4アドレス
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ipv4Address([u8; 4]);

impl Ipv4Address {
    /// Any address (0.0.0.0)
    pub const ANY: Ipv4Address = Ipv4Address([0, 0, 0, 0]);

    /// Broadcast address (255.255.255.255)
    pub const BROADCAST: Ipv4Address = Ipv4Address([255, 255, 255, 255]);

    pub const fn new(bytes: [u8; 4]) -> Self {
        Ipv4Address(bytes)
    }

    pub const fn from_octets(a: u8, b: u8, c: u8, d: u8) -> Self {
        Ipv4Address([a, b, c, d])
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// `s_addr`の整数表現（上位バイトが先頭オクテット）
    pub const fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub const fn from_u32(value: u32) -> Self {
        Ipv4Address(value.to_be_bytes())
    }

    pub const fn is_any(&self) -> bool {
        self.to_u32() == 0
    }
}

impl fmt::Debug for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// `sockaddr_in`相当のエンドポイント
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SockAddrIn {
    pub family: i16,
    pub port: Port,
    pub addr: Ipv4Address,
}

impl SockAddrIn {
    /// 0.0.0.0:0
    pub const UNSPECIFIED: Self = Self::new(Ipv4Address::ANY, 0);

    pub const fn new(addr: Ipv4Address, port: u16) -> Self {
        Self {
            family: AF_INET,
            port: Port::new(port),
            addr,
        }
    }

    pub const fn any(port: u16) -> Self {
        Self::new(Ipv4Address::ANY, port)
    }
}

impl fmt::Display for SockAddrIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port.0)
    }
}

// ============================================================================
// Socket Options
// ============================================================================

/// `setsockopt`で受け付けるオプション
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketOption {
    ReuseAddr,
    Unknown { level: i32, name: i32 },
}

impl SocketOption {
    pub fn from_raw(level: i32, name: i32) -> Self {
        match (level, name) {
            (SOL_SOCKET, SO_REUSEADDR) => SocketOption::ReuseAddr,
            _ => SocketOption::Unknown { level, name },
        }
    }
}

// ============================================================================
// テスト
// ============================================================================
