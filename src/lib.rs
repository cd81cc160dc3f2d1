// ============================================================================
// src/lib.rs - Spectranet Socket Compatibility Layer
// ============================================================================
//!
//! エミュレートされたSpectranetファームウェアが発行するBSD風ソケット呼び出し
//! （`socket`, `bind`, `sendto`, `recvfrom`, `select` ...）を、外部のNIC
//! エミュレーション（W5100）への通知に変換する互換層。
//!
//! ## 構成
//! - `table`  : 固定長ソケットスロットテーブル
//! - `compat` : 呼び出しアダプタ
//! - `fdset`  : `select`用レディネス集合
//! - `global` : ファームウェア向けのグローバル呼び出し面
//!
//! 実際のネットワークI/OやTCP/UDPのプロトコル処理は行わない。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod buffer;
pub mod compat;
pub mod config;
pub mod error;
pub mod fdset;
pub mod global;
pub mod logger;
pub mod nic;
pub mod stats;
pub mod table;
pub mod types;

pub use compat::CompatLayer;
pub use config::CompatConfig;
pub use error::{CompatError, CompatResult};
pub use fdset::{FD_NOT_READY, FD_SETSIZE, FdSet, Readiness};
pub use nic::{DeferredNic, NicAction, NicDevice, NullNic};
pub use table::MAX_SOCKETS;
pub use types::{Ipv4Address, Port, Protocol, SockAddrIn, SocketFd};
