use crate::domain::error::DualComError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Stable identifier of one of the two sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionId {
    One,
    Two,
}

impl SessionId {
    pub const BOTH: [SessionId; 2] = [SessionId::One, SessionId::Two];

    /// 1 or 2
    pub fn number(&self) -> u8 {
        match self {
            SessionId::One => 1,
            SessionId::Two => 2,
        }
    }

    pub(crate) fn index(&self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl TryFrom<u8> for SessionId {
    type Error = DualComError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SessionId::One),
            2 => Ok(SessionId::Two),
            other => Err(DualComError::config(format!(
                "Unknown session {} (expected 1 or 2)",
                other
            ))),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Connection lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Closed,
    Opening,
    Open,
    Closing,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Closed => write!(f, "Closed"),
            SessionStatus::Opening => write!(f, "Opening"),
            SessionStatus::Open => write!(f, "Open"),
            SessionStatus::Closing => write!(f, "Closing"),
        }
    }
}

/// Byte counters shared between the send path and the reader task
#[derive(Debug, Default)]
pub struct SessionCounters {
    received: AtomicU64,
    sent: AtomicU64,
}

/// Point-in-time copy of [`SessionCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

impl SessionCounters {
    pub fn add_received(&self, bytes: usize) {
        self.received.fetch_add(bytes as u64, Ordering::AcqRel);
    }

    pub fn add_sent(&self, bytes: usize) {
        self.sent.fetch_add(bytes as u64, Ordering::AcqRel);
    }

    pub fn reset(&self) {
        self.received.store(0, Ordering::Release);
        self.sent.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bytes_received: self.received.load(Ordering::Acquire),
            bytes_sent: self.sent.load(Ordering::Acquire),
        }
    }
}

/// Receive-side rendering options, read by the reader task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub recv_encoding: String,
    pub hex_display: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            recv_encoding: crate::core::codec::Codec::Utf8.name().to_string(),
            hex_display: false,
        }
    }
}

/// The operator asked for the current input to be re-sent periodically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSendIntent {
    pub interval: Duration,
}

/// Presentation summary of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub port: Option<String>,
    pub status: SessionStatus,
    pub send_encoding: String,
    pub recv_encoding: String,
    pub hex_send: bool,
    pub hex_display: bool,
    pub auto_newline: bool,
    pub auto_send_ms: Option<u64>,
    pub counters: CounterSnapshot,
    pub macros_in_use: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_conversion() {
        assert_eq!(SessionId::try_from(1).unwrap(), SessionId::One);
        assert_eq!(SessionId::try_from(2).unwrap(), SessionId::Two);
        assert!(SessionId::try_from(3).is_err());
        assert_eq!(SessionId::Two.to_string(), "2");
        assert_eq!(SessionId::Two.index(), 1);
    }

    #[test]
    fn test_counters_accumulate_and_reset() {
        let counters = SessionCounters::default();
        counters.add_sent(4);
        counters.add_sent(2);
        counters.add_received(10);
        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                bytes_received: 10,
                bytes_sent: 6
            }
        );

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Open.to_string(), "Open");
        assert_eq!(SessionStatus::Closing.to_string(), "Closing");
    }
}
