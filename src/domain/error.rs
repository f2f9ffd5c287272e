use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while converting between operator text and wire bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    #[error("Hex input has odd length ({0} digits)")]
    OddHexLength(usize),

    #[error("Invalid hex digits in input: {0}")]
    InvalidHexDigits(String),
}

/// DualCom unified error type
#[derive(Error, Debug)]
pub enum DualComError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Port '{port}' unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    #[error("Session {session} is already open on '{port}'")]
    AlreadyOpen { session: u8, port: String },

    #[error("Session {session} is not connected")]
    NotConnected { session: u8 },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Macro slot {index} is empty")]
    EmptyMacro { index: usize },

    #[error("Macro index {index} out of range (table holds {len} slots)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Nothing to send: payload is empty")]
    EmptyPayload,

    #[error("Cannot read file {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(String),
}

impl DualComError {
    /// Shorthand for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for failures caused by malformed operator input rather than the link
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }
}

pub type DualComResult<T> = Result<T, DualComError>;
