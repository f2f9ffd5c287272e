use crate::core::codec::PayloadKind;
use crate::core::communication::{PortOpener, SessionEvent};
use crate::core::session::{
    session::SerialSession,
    state::{CounterSnapshot, SessionId, SessionSnapshot},
};
use crate::domain::config::{GlobalConfig, MacroSlot, PortConfig, WorkbenchSettings};
use crate::domain::error::DualComResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Owns both sessions and the event stream they publish on.
///
/// Every operation is addressed by [`SessionId`]; the two sessions share no
/// state besides the event channel, so a failure in one never reaches the
/// other.
pub struct SessionPair {
    sessions: [SerialSession; 2],
    events: mpsc::UnboundedReceiver<SessionEvent>,
    global: GlobalConfig,
}

impl SessionPair {
    /// Create two closed sessions with default options
    pub fn new(opener: Arc<dyn PortOpener>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let sessions = [
            SerialSession::new(SessionId::One, Arc::clone(&opener), tx.clone()),
            SerialSession::new(SessionId::Two, opener, tx),
        ];
        Self {
            sessions,
            events: rx,
            global: GlobalConfig::default(),
        }
    }

    /// Create both sessions from stored settings
    pub fn from_settings(opener: Arc<dyn PortOpener>, settings: &WorkbenchSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let sessions = [
            SerialSession::from_settings(
                SessionId::One,
                Arc::clone(&opener),
                tx.clone(),
                &settings.session1,
                &settings.global,
            ),
            SerialSession::from_settings(
                SessionId::Two,
                opener,
                tx,
                &settings.session2,
                &settings.global,
            ),
        ];
        Self {
            sessions,
            events: rx,
            global: settings.global.clone(),
        }
    }

    /// Export the persistent state of both sessions
    pub async fn to_settings(&self) -> WorkbenchSettings {
        WorkbenchSettings {
            global: self.global.clone(),
            session1: self.sessions[0].to_settings().await,
            session2: self.sessions[1].to_settings().await,
        }
    }

    pub fn session(&self, id: SessionId) -> &SerialSession {
        &self.sessions[id.index()]
    }

    pub fn session_mut(&mut self, id: SessionId) -> &mut SerialSession {
        &mut self.sessions[id.index()]
    }

    pub async fn connect(&mut self, id: SessionId, config: PortConfig) -> DualComResult<()> {
        self.session_mut(id).connect(config).await
    }

    pub async fn disconnect(&mut self, id: SessionId) -> DualComResult<()> {
        self.session_mut(id).disconnect().await
    }

    /// Close both sessions, reporting the first failure after trying both
    pub async fn disconnect_all(&mut self) -> DualComResult<()> {
        let mut first_error = None;
        for session in self.sessions.iter_mut() {
            if let Err(e) = session.disconnect().await {
                warn!("Failed to close session {}: {}", session.id(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn send(
        &mut self,
        id: SessionId,
        payload: &str,
        kind: PayloadKind,
    ) -> DualComResult<Vec<u8>> {
        self.session_mut(id).send(payload, kind).await
    }

    pub async fn send_macro(&mut self, id: SessionId, index: usize) -> DualComResult<Vec<u8>> {
        self.session_mut(id).send_macro(index).await
    }

    pub fn edit_macro(&mut self, id: SessionId, index: usize, content: &str, is_hex: bool) {
        self.session_mut(id).edit_macro(index, content, is_hex);
    }

    pub fn delete_macro(&mut self, id: SessionId, index: usize) -> DualComResult<()> {
        self.session_mut(id).delete_macro(index)
    }

    pub fn macros(&self, id: SessionId) -> &[MacroSlot] {
        self.session(id).macros().slots()
    }

    pub async fn import_macros(&mut self, id: SessionId, path: &Path) -> DualComResult<usize> {
        self.session_mut(id).import_macros(path).await
    }

    pub fn history(&self, id: SessionId, kind: PayloadKind) -> Vec<String> {
        self.session(id).history_entries(kind)
    }

    pub fn counters(&self, id: SessionId) -> CounterSnapshot {
        self.session(id).counters()
    }

    pub fn clear_counters(&self, id: SessionId) {
        self.session(id).clear_counters();
    }

    pub async fn set_auto_send(
        &mut self,
        id: SessionId,
        interval: Option<Duration>,
    ) -> DualComResult<()> {
        self.session_mut(id).set_auto_send(interval).await?;
        Ok(())
    }

    /// Wait for the next event from either session
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots = Vec::with_capacity(2);
        for session in &self.sessions {
            snapshots.push(session.snapshot().await);
        }
        snapshots
    }

    /// Close everything before the pair is dropped
    pub async fn shutdown(&mut self) -> DualComResult<()> {
        info!("Shutting down both sessions");
        self.disconnect_all().await
    }
}
