//! DualCom Library
//!
//! Dual serial port session engine: two independent sessions, each with
//! its own port, codec choices, send history and quick-string table, plus
//! the import parser for third-party quick-string files.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::codec::{Codec, PayloadKind};
pub use crate::core::communication::{DisconnectReason, PortIo, PortOpener, SessionEvent};
pub use crate::core::session::{SerialSession, SessionId, SessionPair, SessionStatus};
pub use crate::domain::config::{PortConfig, WorkbenchSettings};
pub use crate::domain::error::{DualComError, DualComResult};
