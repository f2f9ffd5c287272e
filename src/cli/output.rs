use crate::cli::args::OutputFormat;
use crate::core::communication::{DisconnectReason, SessionEvent};
use crate::core::import::ImportedMacro;
use crate::core::session::{SessionId, SessionSnapshot};
use crate::domain::config::{MacroSlot, WorkbenchSettings};
use crate::infrastructure::serial::PortInfo;
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError>;
    fn write_imported(&self, imported: &[ImportedMacro]) -> Result<(), OutputError>;
    fn write_macros(&self, session: SessionId, slots: &[(usize, MacroSlot)]) -> Result<(), OutputError>;
    fn write_event(&self, event: &SessionEvent) -> Result<(), OutputError>;
    fn write_snapshots(&self, snapshots: &[SessionSnapshot]) -> Result<(), OutputError>;
    fn write_settings(&self, settings: &WorkbenchSettings) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::DualComError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
    quiet: bool,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            quiet: false,
        }
    }

    /// Drop informational messages; data and errors are still printed
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                if ports.is_empty() {
                    println!("No serial ports found");
                }
                for port in ports {
                    if port.description.is_empty() {
                        println!("{} ({})", port.name, port.kind);
                    } else {
                        println!("{} ({}) {}", port.name, port.kind, port.description);
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(ports)?);
            }
            OutputFormat::Table => {
                if !ports.is_empty() {
                    let rows: Vec<PortTableRow> = ports.iter().map(PortTableRow::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
        }
        Ok(())
    }

    fn write_imported(&self, imported: &[ImportedMacro]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Imported {} quick strings", imported.len());
                for (i, entry) in imported.iter().enumerate() {
                    let kind = if entry.is_hex { "hex" } else { "text" };
                    println!("  {:>3}. [{}] {}: {}", i + 1, kind, entry.source_name, entry.content);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(imported)?);
            }
            OutputFormat::Table => {
                let rows: Vec<MacroTableRow> = imported
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| MacroTableRow {
                        index: i + 1,
                        label: entry.source_name.clone(),
                        kind: kind_label(entry.is_hex),
                        content: entry.content.clone(),
                    })
                    .collect();
                if !rows.is_empty() {
                    println!("{}", Table::new(rows));
                }
            }
        }
        Ok(())
    }

    fn write_macros(&self, session: SessionId, slots: &[(usize, MacroSlot)]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Session {} quick strings:", session);
                for (index, slot) in slots {
                    let content = if slot.is_unused() { "-" } else { slot.content.as_str() };
                    println!(
                        "  {:>3}. [{}] {}: {}",
                        index + 1,
                        kind_label(slot.is_hex),
                        slot.label,
                        content
                    );
                }
            }
            OutputFormat::Json => {
                let entries: Vec<serde_json::Value> = slots
                    .iter()
                    .map(|(index, slot)| {
                        serde_json::json!({
                            "index": index + 1,
                            "label": slot.label,
                            "content": slot.content,
                            "hex": slot.is_hex,
                        })
                    })
                    .collect();
                let output = serde_json::json!({
                    "session": session.number(),
                    "macros": entries,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                let rows: Vec<MacroTableRow> = slots
                    .iter()
                    .map(|(index, slot)| MacroTableRow {
                        index: index + 1,
                        label: slot.label.clone(),
                        kind: kind_label(slot.is_hex),
                        content: slot.content.clone(),
                    })
                    .collect();
                if !rows.is_empty() {
                    println!("{}", Table::new(rows));
                }
            }
        }
        Ok(())
    }

    fn write_event(&self, event: &SessionEvent) -> Result<(), OutputError> {
        match self.format {
            // One object per line so the stream stays parseable
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(event)?);
            }
            _ => match event {
                SessionEvent::Received { session, text, .. } => {
                    println!("[{} RX] {}", session, text.trim_end_matches(['\r', '\n']));
                }
                SessionEvent::Sent { session, text, .. } => {
                    println!("[{} TX] {}", session, text.trim_end_matches(['\r', '\n']));
                }
                SessionEvent::Error { session, message, .. } => {
                    eprintln!("[{} ERR] {}", session, message);
                }
                SessionEvent::Connected { session, port, .. } if !self.quiet => {
                    println!("[{}] connected to {}", session, port);
                }
                SessionEvent::Disconnected { session, reason, .. } if !self.quiet => {
                    let why = match reason {
                        DisconnectReason::Requested => "closed",
                        DisconnectReason::TransportFailure => "lost",
                    };
                    println!("[{}] connection {}", session, why);
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn write_snapshots(&self, snapshots: &[SessionSnapshot]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                for snapshot in snapshots {
                    println!("Session {}: {}", snapshot.session, snapshot.status);
                    println!("  Port: {}", snapshot.port.as_deref().unwrap_or("-"));
                    println!(
                        "  Codecs: send {}, receive {}",
                        snapshot.send_encoding, snapshot.recv_encoding
                    );
                    println!(
                        "  Data: {} bytes sent, {} bytes received",
                        snapshot.counters.bytes_sent, snapshot.counters.bytes_received
                    );
                    println!("  Quick strings: {}", snapshot.macros_in_use);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(snapshots)?);
            }
            OutputFormat::Table => {
                let rows: Vec<SessionTableRow> = snapshots.iter().map(SessionTableRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }
        Ok(())
    }

    fn write_settings(&self, settings: &WorkbenchSettings) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("DualCom Settings:");
                println!("  Log level: {}", settings.global.log_level);
                println!("  History limit: {}", settings.global.history_limit);
                println!("  Quick string slots: {}", settings.global.macro_capacity);
                for (id, session) in [(1, &settings.session1), (2, &settings.session2)] {
                    let port = if session.port.is_empty() {
                        "-".to_string()
                    } else {
                        session.port_config().to_string()
                    };
                    println!("  Session {}: {}", id, port);
                    println!(
                        "    Codecs: send {}, receive {}",
                        session.send_encoding, session.recv_encoding
                    );
                    println!("    Auto newline: {}", session.auto_newline);
                    println!(
                        "    Quick strings: {}",
                        session.quick_strings.iter().filter(|s| !s.is_unused()).count()
                    );
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(settings)?);
            }
            OutputFormat::Table => {
                let rows = vec![
                    SettingsTableRow::new(1, &settings.session1),
                    SettingsTableRow::new(2, &settings.session2),
                ];
                println!("{}", Table::new(rows));
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

fn kind_label(is_hex: bool) -> &'static str {
    if is_hex {
        "hex"
    } else {
        "text"
    }
}

#[derive(Tabled)]
struct PortTableRow {
    name: String,
    kind: String,
    description: String,
}

impl From<&PortInfo> for PortTableRow {
    fn from(port: &PortInfo) -> Self {
        Self {
            name: port.name.clone(),
            kind: port.kind.clone(),
            description: port.description.clone(),
        }
    }
}

#[derive(Tabled)]
struct MacroTableRow {
    index: usize,
    label: String,
    kind: &'static str,
    content: String,
}

#[derive(Tabled)]
struct SessionTableRow {
    session: u8,
    port: String,
    status: String,
    send: String,
    recv: String,
    sent: u64,
    received: u64,
    macros: usize,
}

impl From<&SessionSnapshot> for SessionTableRow {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            session: snapshot.session.number(),
            port: snapshot.port.clone().unwrap_or_else(|| "-".to_string()),
            status: snapshot.status.to_string(),
            send: snapshot.send_encoding.clone(),
            recv: snapshot.recv_encoding.clone(),
            sent: snapshot.counters.bytes_sent,
            received: snapshot.counters.bytes_received,
            macros: snapshot.macros_in_use,
        }
    }
}

#[derive(Tabled)]
struct SettingsTableRow {
    session: u8,
    port: String,
    framing: String,
    send: String,
    recv: String,
    newline: bool,
    macros: usize,
}

impl SettingsTableRow {
    fn new(session: u8, settings: &crate::domain::config::SessionSettings) -> Self {
        let config = settings.port_config();
        Self {
            session,
            port: if settings.port.is_empty() {
                "-".to_string()
            } else {
                settings.port.clone()
            },
            framing: format!(
                "{} {}{}{}",
                config.baud_rate, config.data_bits, config.parity, config.stop_bits
            ),
            send: settings.send_encoding.clone(),
            recv: settings.recv_encoding.clone(),
            newline: settings.auto_newline,
            macros: settings.quick_strings.iter().filter(|s| !s.is_unused()).count(),
        }
    }
}
