use crate::core::codec::{
    append_line_ending, encode_as_hex_string, encode_for_send, Codec, PayloadKind, SendMode,
};
use crate::core::communication::{DisconnectReason, PortOpener, SessionEvent};
use crate::core::history::{SendHistory, DEFAULT_HISTORY_CAPACITY};
use crate::core::import::import_file;
use crate::core::macros::{default_label, MacroTable, DEFAULT_MACRO_CAPACITY};
use crate::core::session::reader::{ReaderContext, ReaderHandle, SharedPort};
use crate::core::session::state::{
    AutoSendIntent, CounterSnapshot, DisplayOptions, SessionCounters, SessionId,
    SessionSnapshot, SessionStatus,
};
use crate::domain::config::{GlobalConfig, MacroSlot, PortConfig, SessionSettings};
use crate::domain::error::{DualComError, DualComResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Transport read/write timeout plus one poll cycle, with headroom
const STOP_GRACE: Duration = Duration::from_secs(2);

/// An open port together with its reader
struct Link {
    port: SharedPort,
    reader: ReaderHandle,
}

/// One serial port session: port handle, reader task, counters, send
/// history, quick strings and the operator's codec/line-ending choices.
pub struct SerialSession {
    id: SessionId,
    opener: Arc<dyn PortOpener>,
    port_config: Option<PortConfig>,
    status: Arc<RwLock<SessionStatus>>,
    counters: Arc<SessionCounters>,
    display: Arc<RwLock<DisplayOptions>>,
    send_encoding: String,
    hex_send: bool,
    auto_newline: bool,
    /// Auto-newline value to restore when hex-send is turned off
    remembered_newline: bool,
    auto_send: Arc<RwLock<Option<AutoSendIntent>>>,
    history: SendHistory,
    macros: MacroTable,
    link: Option<Link>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SerialSession {
    /// Create a closed session with default options
    pub fn new(
        id: SessionId,
        opener: Arc<dyn PortOpener>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            id,
            opener,
            port_config: None,
            status: Arc::new(RwLock::new(SessionStatus::Closed)),
            counters: Arc::new(SessionCounters::default()),
            display: Arc::new(RwLock::new(DisplayOptions::default())),
            send_encoding: Codec::Utf8.name().to_string(),
            hex_send: false,
            auto_newline: true,
            remembered_newline: true,
            auto_send: Arc::new(RwLock::new(None)),
            history: SendHistory::with_capacity(DEFAULT_HISTORY_CAPACITY),
            macros: MacroTable::with_capacity(DEFAULT_MACRO_CAPACITY),
            link: None,
            events,
        }
    }

    /// Create a closed session restored from stored settings
    pub fn from_settings(
        id: SessionId,
        opener: Arc<dyn PortOpener>,
        events: mpsc::UnboundedSender<SessionEvent>,
        settings: &SessionSettings,
        global: &GlobalConfig,
    ) -> Self {
        let mut session = Self::new(id, opener, events);
        if !settings.port.trim().is_empty() {
            session.port_config = Some(settings.port_config());
        }
        session.display = Arc::new(RwLock::new(DisplayOptions {
            recv_encoding: settings.recv_encoding.clone(),
            hex_display: false,
        }));
        session.send_encoding = settings.send_encoding.clone();
        session.auto_newline = settings.auto_newline;
        session.remembered_newline = settings.auto_newline;
        session.history = SendHistory::from_lists(
            &settings.send_history_text,
            &settings.send_history_hex,
            global.history_limit,
        );
        session.macros = MacroTable::from_slots(settings.quick_strings.clone(), global.macro_capacity);
        session
    }

    /// Export the persistent part of the session
    pub async fn to_settings(&self) -> SessionSettings {
        let display = self.display.read().await;
        let mut settings = SessionSettings {
            send_encoding: self.send_encoding.clone(),
            recv_encoding: display.recv_encoding.clone(),
            auto_newline: if self.hex_send {
                self.remembered_newline
            } else {
                self.auto_newline
            },
            send_history_text: self.history.as_ordered_list(PayloadKind::Text),
            send_history_hex: self.history.as_ordered_list(PayloadKind::Hex),
            quick_strings: self.macros.slots().to_vec(),
            ..SessionSettings::default()
        };
        if let Some(config) = &self.port_config {
            settings.set_port_config(config);
        }
        settings
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Framing of the current connection, or the one restored from settings
    pub fn port_config(&self) -> Option<&PortConfig> {
        self.port_config.as_ref()
    }

    pub async fn status(&self) -> SessionStatus {
        *self.status.read().await
    }

    pub async fn is_open(&self) -> bool {
        self.status().await == SessionStatus::Open
    }

    /// Open the port and start the background reader
    pub async fn connect(&mut self, config: PortConfig) -> DualComResult<()> {
        if self.is_open().await {
            let port = self
                .port_config
                .as_ref()
                .map(|c| c.port.clone())
                .unwrap_or_default();
            return Err(DualComError::AlreadyOpen {
                session: self.id.number(),
                port,
            });
        }
        config.validate()?;

        // A reader that failed on its own leaves its link behind
        if let Some(stale) = self.link.take() {
            stale.reader.stop(STOP_GRACE).await;
        }

        self.set_status(SessionStatus::Opening).await;
        let port = match self.opener.open(&config) {
            Ok(port) => port,
            Err(e) => {
                self.set_status(SessionStatus::Closed).await;
                warn!("Session {} failed to open {}: {}", self.id, config.port, e);
                return Err(e);
            }
        };

        let port: SharedPort = Arc::new(Mutex::new(port));
        self.set_status(SessionStatus::Open).await;
        let reader = ReaderHandle::spawn(ReaderContext {
            session: self.id,
            port: Arc::clone(&port),
            counters: Arc::clone(&self.counters),
            display: Arc::clone(&self.display),
            status: Arc::clone(&self.status),
            auto_send: Arc::clone(&self.auto_send),
            events: self.events.clone(),
        });
        self.link = Some(Link { port, reader });

        info!("Session {} opened {}", self.id, config);
        self.emit(SessionEvent::connected(self.id, config.port.clone()));
        self.port_config = Some(config);
        Ok(())
    }

    /// Stop the reader, release the port and return to Closed.
    ///
    /// No receive event for this session is published after this returns.
    /// Calling it on a closed session is a no-op.
    pub async fn disconnect(&mut self) -> DualComResult<()> {
        *self.auto_send.write().await = None;
        let Some(link) = self.link.take() else {
            self.set_status(SessionStatus::Closed).await;
            return Ok(());
        };

        let was_open = self.is_open().await;
        self.set_status(SessionStatus::Closing).await;
        link.reader.stop(STOP_GRACE).await;
        drop(link.port);
        self.set_status(SessionStatus::Closed).await;

        if was_open {
            info!("Session {} closed", self.id);
            self.emit(SessionEvent::disconnected(self.id, DisconnectReason::Requested));
        } else {
            debug!("Session {} released link after transport failure", self.id);
        }
        Ok(())
    }

    /// Encode and write an operator payload, returning the bytes written
    pub async fn send(&mut self, payload: &str, kind: PayloadKind) -> DualComResult<Vec<u8>> {
        self.transmit(payload, kind, None).await
    }

    /// Send the content of quick-string slot `index`
    pub async fn send_macro(&mut self, index: usize) -> DualComResult<Vec<u8>> {
        self.ensure_open().await?;
        let slot = self.macros.sendable(index)?.clone();
        let kind = if slot.is_hex {
            PayloadKind::Hex
        } else {
            PayloadKind::Text
        };
        self.transmit(&slot.content, kind, Some(index)).await
    }

    async fn transmit(
        &mut self,
        payload: &str,
        kind: PayloadKind,
        macro_index: Option<usize>,
    ) -> DualComResult<Vec<u8>> {
        let port = self.ensure_open().await?;
        if payload.trim().is_empty() {
            return Err(DualComError::EmptyPayload);
        }

        let bytes = match kind {
            PayloadKind::Hex => encode_for_send(payload, &SendMode::Hex)?,
            PayloadKind::Text => {
                let mode = SendMode::Text(self.send_encoding.clone());
                append_line_ending(encode_for_send(payload, &mode)?, self.auto_newline)
            }
        };

        let written = {
            let mut port = port.lock().await;
            port.write_all(&bytes)
        };
        if let Err(e) = written {
            self.fail_transport(&e).await;
            return Err(DualComError::Transport(e));
        }

        self.counters.add_sent(bytes.len());
        self.history.record(payload, kind);

        let text = match kind {
            PayloadKind::Hex => encode_as_hex_string(&bytes),
            PayloadKind::Text => {
                let display = self.display.read().await;
                let codec = Codec::from_name(&display.recv_encoding).unwrap_or(Codec::Utf8);
                codec.decode(&bytes).0
            }
        };
        debug!("Session {} sent {} bytes", self.id, bytes.len());
        self.emit(SessionEvent::sent(self.id, bytes.clone(), text, macro_index));
        Ok(bytes)
    }

    async fn ensure_open(&self) -> DualComResult<SharedPort> {
        match &self.link {
            Some(link) if self.is_open().await => Ok(Arc::clone(&link.port)),
            _ => Err(DualComError::NotConnected {
                session: self.id.number(),
            }),
        }
    }

    async fn fail_transport(&mut self, err: &std::io::Error) {
        error!("Session {} write failed: {}", self.id, err);
        self.emit(SessionEvent::error(self.id, format!("Write error: {}", err)));
        *self.auto_send.write().await = None;
        if let Some(link) = self.link.take() {
            self.set_status(SessionStatus::Closing).await;
            link.reader.stop(STOP_GRACE).await;
        }
        self.set_status(SessionStatus::Closed).await;
        self.emit(SessionEvent::disconnected(
            self.id,
            DisconnectReason::TransportFailure,
        ));
    }

    async fn set_status(&self, status: SessionStatus) {
        *self.status.write().await = status;
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session {} event receiver dropped", self.id);
        }
    }

    // Codec and display options

    pub fn send_encoding(&self) -> &str {
        &self.send_encoding
    }

    /// Codec names are resolved at send time; an unknown one fails the send
    pub fn set_send_encoding(&mut self, name: impl Into<String>) {
        self.send_encoding = name.into();
    }

    pub async fn recv_encoding(&self) -> String {
        self.display.read().await.recv_encoding.clone()
    }

    pub async fn set_recv_encoding(&self, name: impl Into<String>) {
        self.display.write().await.recv_encoding = name.into();
    }

    pub async fn hex_display(&self) -> bool {
        self.display.read().await.hex_display
    }

    pub async fn set_hex_display(&self, enabled: bool) {
        self.display.write().await.hex_display = enabled;
    }

    pub fn hex_send(&self) -> bool {
        self.hex_send
    }

    /// Hex payloads never get a line ending: turning hex-send on parks the
    /// auto-newline choice and turning it off restores it.
    pub fn set_hex_send(&mut self, enabled: bool) {
        if enabled == self.hex_send {
            return;
        }
        if enabled {
            self.remembered_newline = self.auto_newline;
            self.auto_newline = false;
        } else {
            self.auto_newline = self.remembered_newline;
        }
        self.hex_send = enabled;
    }

    /// Default payload kind for free-form input
    pub fn input_kind(&self) -> PayloadKind {
        if self.hex_send {
            PayloadKind::Hex
        } else {
            PayloadKind::Text
        }
    }

    pub fn auto_newline(&self) -> bool {
        self.auto_newline
    }

    pub fn set_auto_newline(&mut self, enabled: bool) {
        if self.hex_send {
            self.remembered_newline = enabled;
        } else {
            self.auto_newline = enabled;
            self.remembered_newline = enabled;
        }
    }

    /// Periodic-send intent; any transport failure disarms it
    pub async fn auto_send(&self) -> Option<AutoSendIntent> {
        *self.auto_send.read().await
    }

    /// Record (or clear) the operator's periodic-send intent
    pub async fn set_auto_send(
        &mut self,
        interval: Option<Duration>,
    ) -> DualComResult<Option<AutoSendIntent>> {
        let Some(interval) = interval else {
            *self.auto_send.write().await = None;
            return Ok(None);
        };
        if interval.is_zero() {
            return Err(DualComError::config("Auto-send interval must be positive"));
        }
        self.ensure_open().await?;
        let intent = AutoSendIntent { interval };
        *self.auto_send.write().await = Some(intent);
        Ok(Some(intent))
    }

    // Counters, history and quick strings

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn clear_counters(&self) {
        self.counters.reset();
    }

    pub fn history(&self) -> &SendHistory {
        &self.history
    }

    pub fn history_entries(&self, kind: PayloadKind) -> Vec<String> {
        self.history.as_ordered_list(kind)
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroTable {
        &mut self.macros
    }

    /// Overwrite slot `index` with new content
    pub fn edit_macro(&mut self, index: usize, content: impl Into<String>, is_hex: bool) {
        let label = self
            .macros
            .get(index)
            .map(|slot| slot.label.clone())
            .unwrap_or_else(|_| default_label(index));
        self.macros.set(index, MacroSlot::new(label, content, is_hex));
    }

    pub fn delete_macro(&mut self, index: usize) -> DualComResult<()> {
        self.macros.delete(index)
    }

    /// Load quick strings from an import file.
    ///
    /// Returns how many were imported; zero leaves the table as it was.
    pub async fn import_macros(&mut self, path: &Path) -> DualComResult<usize> {
        let imported = import_file(path)?;
        let count = self.macros.apply_import(imported);
        if count == 0 {
            info!("Session {}: nothing importable in {}", self.id, path.display());
        } else {
            info!("Session {}: imported {} quick strings", self.id, count);
        }
        Ok(count)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let display = self.display.read().await.clone();
        SessionSnapshot {
            session: self.id,
            port: self.port_config.as_ref().map(|c| c.port.clone()),
            status: self.status().await,
            send_encoding: self.send_encoding.clone(),
            recv_encoding: display.recv_encoding,
            hex_send: self.hex_send,
            hex_display: display.hex_display,
            auto_newline: self.auto_newline,
            auto_send_ms: self
                .auto_send()
                .await
                .map(|a| a.interval.as_millis() as u64),
            counters: self.counters(),
            macros_in_use: self.macros.visible().count(),
        }
    }
}
