use crate::core::session::SessionId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Why a session left the Open state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The caller asked for it
    Requested,
    /// A read or write failed and the session closed itself
    TransportFailure,
}

/// Notification published by a session.
///
/// `Connected` and `Disconnected` double as the signal for presentation
/// code to lock or unlock the framing controls of that session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Connected {
        session: SessionId,
        port: String,
        timestamp: SystemTime,
    },
    Disconnected {
        session: SessionId,
        reason: DisconnectReason,
        timestamp: SystemTime,
    },
    Received {
        session: SessionId,
        data: Vec<u8>,
        text: String,
        timestamp: SystemTime,
    },
    Sent {
        session: SessionId,
        data: Vec<u8>,
        text: String,
        macro_index: Option<usize>,
        timestamp: SystemTime,
    },
    Error {
        session: SessionId,
        message: String,
        timestamp: SystemTime,
    },
}

impl SessionEvent {
    pub fn connected(session: SessionId, port: impl Into<String>) -> Self {
        Self::Connected {
            session,
            port: port.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn disconnected(session: SessionId, reason: DisconnectReason) -> Self {
        Self::Disconnected {
            session,
            reason,
            timestamp: SystemTime::now(),
        }
    }

    pub fn received(session: SessionId, data: Vec<u8>, text: String) -> Self {
        Self::Received {
            session,
            data,
            text,
            timestamp: SystemTime::now(),
        }
    }

    pub fn sent(session: SessionId, data: Vec<u8>, text: String, macro_index: Option<usize>) -> Self {
        Self::Sent {
            session,
            data,
            text,
            macro_index,
            timestamp: SystemTime::now(),
        }
    }

    pub fn error(session: SessionId, message: impl Into<String>) -> Self {
        Self::Error {
            session,
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Session that published the event
    pub fn session(&self) -> SessionId {
        match self {
            Self::Connected { session, .. }
            | Self::Disconnected { session, .. }
            | Self::Received { session, .. }
            | Self::Sent { session, .. }
            | Self::Error { session, .. } => *session,
        }
    }

    pub fn timestamp(&self) -> SystemTime {
        match self {
            Self::Connected { timestamp, .. }
            | Self::Disconnected { timestamp, .. }
            | Self::Received { timestamp, .. }
            | Self::Sent { timestamp, .. }
            | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_received(&self) -> bool {
        matches!(self, Self::Received { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_session_accessor() {
        let event = SessionEvent::received(SessionId::Two, vec![0x41], "A".into());
        assert_eq!(event.session(), SessionId::Two);
        assert!(event.is_received());

        let event = SessionEvent::disconnected(SessionId::One, DisconnectReason::Requested);
        assert_eq!(event.session(), SessionId::One);
        assert!(!event.is_received());
    }

    #[test]
    fn test_event_serializes() {
        let event = SessionEvent::sent(SessionId::One, b"AT\r\n".to_vec(), "AT\r\n".into(), Some(3));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"macro_index\":3"));
    }
}
