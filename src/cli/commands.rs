use crate::cli::args::{
    Args, Command, ConfigCommand, MacroArgs, MacroCommand, MonitorArgs, SendArgs,
};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::codec::decode_hex_string;
use crate::core::communication::SessionEvent;
use crate::core::import::import_file;
use crate::core::session::{SessionId, SessionPair, SessionStatus};
use crate::domain::config::{MacroSlot, PortConfig, WorkbenchSettings};
use crate::domain::error::{DualComError, DualComResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::{available_ports, SystemPortOpener};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Execute CLI command
pub async fn execute_command(args: Args) -> DualComResult<()> {
    let writer = ConsoleWriter::new(args.output).quiet(args.quiet);

    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    let settings = config_manager.load_settings()?;

    if !args.quiet {
        init_logging(&settings.global.log_level, args.verbose)?;
    }
    debug!("Using settings file {}", config_manager.active_path().display());

    match args.command {
        Command::Ports => {
            let ports = available_ports()?;
            writer.write_ports(&ports)?;
            Ok(())
        }
        Command::Import(import) => {
            let path = PathBuf::from(&import.file);
            match import.session {
                Some(number) => {
                    let id = SessionId::try_from(number)?;
                    let mut pair = open_pair(&settings);
                    let count = pair.import_macros(id, &path).await?;
                    if count == 0 {
                        writer.write_message(&format!(
                            "No quick strings found in {}, session {} unchanged",
                            path.display(),
                            id
                        ))?;
                        return Ok(());
                    }
                    store(&config_manager, &pair).await?;
                    writer.write_macros(id, &visible_slots(&pair, id))?;
                    Ok(())
                }
                None => {
                    let imported = import_file(&path)?;
                    writer.write_imported(&imported)?;
                    Ok(())
                }
            }
        }
        Command::Send(send) => execute_send(send, &writer).await,
        Command::Monitor(monitor) => execute_monitor(monitor, &settings, &writer).await,
        Command::Macro(macro_args) => {
            execute_macro_command(macro_args, &settings, &config_manager, &writer).await
        }
        Command::Config(config_args) => match config_args.command {
            ConfigCommand::Show => {
                writer.write_settings(&settings)?;
                Ok(())
            }
            ConfigCommand::Path => {
                writer.write_message(&config_manager.active_path().display().to_string())?;
                Ok(())
            }
            ConfigCommand::Init { dir } => {
                let dir = match dir {
                    Some(dir) => PathBuf::from(dir),
                    None => std::env::current_dir()?,
                };
                let file = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!("Created {}", file.display()))?;
                Ok(())
            }
        },
        Command::Version => {
            writer.write_message(&format!("dualcom {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

fn open_pair(settings: &WorkbenchSettings) -> SessionPair {
    SessionPair::from_settings(Arc::new(SystemPortOpener::new()), settings)
}

async fn store(config_manager: &ConfigManager, pair: &SessionPair) -> DualComResult<()> {
    config_manager.save_settings(&pair.to_settings().await)
}

fn visible_slots(pair: &SessionPair, id: SessionId) -> Vec<(usize, MacroSlot)> {
    pair.session(id)
        .macros()
        .visible()
        .map(|(i, slot)| (i, slot.clone()))
        .collect()
}

/// Quick strings are numbered from 1 on the command line
fn zero_based(index: usize) -> DualComResult<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| DualComError::config("Quick string indexes start at 1"))
}

async fn execute_send(args: SendArgs, writer: &ConsoleWriter) -> DualComResult<()> {
    let config = args.port.to_port_config()?;
    let mut pair = SessionPair::new(Arc::new(SystemPortOpener::new()));
    let id = SessionId::One;

    {
        let session = pair.session_mut(id);
        session.set_send_encoding(args.codec.send_encoding.clone());
        session.set_recv_encoding(args.codec.recv_encoding.clone()).await;
        session.set_hex_display(args.codec.hex_display).await;
        session.set_auto_newline(!args.no_newline);
        session.set_hex_send(args.hex);
    }

    pair.connect(id, config).await?;
    let result = send_repeated(&mut pair, id, &args, writer).await;
    pair.disconnect(id).await?;
    pump_events(&mut pair, writer, Duration::ZERO).await?;
    result
}

async fn send_repeated(
    pair: &mut SessionPair,
    id: SessionId,
    args: &SendArgs,
    writer: &ConsoleWriter,
) -> DualComResult<()> {
    let kind = pair.session(id).input_kind();
    if args.count > 1 {
        pair.set_auto_send(id, Some(Duration::from_millis(args.interval_ms)))
            .await?;
    }

    for round in 0..args.count.max(1) {
        pair.send(id, &args.data, kind).await?;
        let last = round + 1 >= args.count;
        let wait = match pair.session(id).auto_send().await {
            Some(intent) if !last => intent.interval,
            _ => Duration::from_millis(args.listen_ms),
        };
        pump_events(pair, writer, wait).await?;
    }

    let counters = pair.counters(id);
    info!(
        "Sent {} bytes, received {} bytes",
        counters.bytes_sent, counters.bytes_received
    );
    Ok(())
}

/// Print events until `window` has elapsed or the queue runs dry at the end
async fn pump_events(
    pair: &mut SessionPair,
    writer: &ConsoleWriter,
    window: Duration,
) -> DualComResult<()> {
    let deadline = Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, pair.next_event()).await {
            Ok(Some(event)) => writer.write_event(&event)?,
            Ok(None) | Err(_) => break,
        }
    }
    while let Some(event) = pair.try_next_event() {
        writer.write_event(&event)?;
    }
    Ok(())
}

async fn execute_monitor(
    args: MonitorArgs,
    settings: &WorkbenchSettings,
    writer: &ConsoleWriter,
) -> DualComResult<()> {
    let mut pair = open_pair(settings);
    let overrides = [args.port1.clone(), args.port2.clone()];

    let mut opened = 0;
    for (id, port) in SessionId::BOTH.into_iter().zip(overrides) {
        let stored = pair.session(id).port_config().cloned();
        let mut config = match (port, stored) {
            (Some(port), Some(mut stored)) => {
                stored.port = port;
                stored
            }
            (Some(port), None) => PortConfig::new(port),
            (None, Some(stored)) => stored,
            (None, None) => continue,
        };
        if let Some(baud) = args.baud {
            config.baud_rate = baud;
        }

        pair.session(id).set_hex_display(args.hex_display).await;
        pair.connect(id, config).await?;
        opened += 1;
    }

    if opened == 0 {
        return Err(DualComError::config(
            "No port to monitor: pass --port1/--port2 or store one in the settings",
        ));
    }

    let stop = async {
        match args.duration {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = pair.next_event() => {
                let Some(event) = event else { break };
                writer.write_event(&event)?;
                if matches!(event, SessionEvent::Disconnected { .. }) && !any_open(&pair).await {
                    break;
                }
            }
        }
    }

    pair.shutdown().await?;
    pump_events(&mut pair, writer, Duration::ZERO).await?;
    writer.write_snapshots(&pair.snapshots().await)?;
    Ok(())
}

async fn any_open(pair: &SessionPair) -> bool {
    for id in SessionId::BOTH {
        if pair.session(id).status().await == SessionStatus::Open {
            return true;
        }
    }
    false
}

async fn execute_macro_command(
    args: MacroArgs,
    settings: &WorkbenchSettings,
    config_manager: &ConfigManager,
    writer: &ConsoleWriter,
) -> DualComResult<()> {
    let id = SessionId::try_from(args.session)?;
    let mut pair = open_pair(settings);

    match args.command {
        MacroCommand::List { all } => {
            let slots: Vec<(usize, MacroSlot)> = if all {
                pair.macros(id).iter().cloned().enumerate().collect()
            } else {
                visible_slots(&pair, id)
            };
            writer.write_macros(id, &slots)?;
            Ok(())
        }
        MacroCommand::Set {
            index,
            content,
            hex,
        } => {
            let index = zero_based(index)?;
            if hex {
                decode_hex_string(&content)?;
            }
            pair.edit_macro(id, index, &content, hex);
            store(config_manager, &pair).await?;
            writer.write_message(&format!(
                "Session {} quick string {} set",
                id,
                index + 1
            ))?;
            Ok(())
        }
        MacroCommand::Delete { index } => {
            let index = zero_based(index)?;
            pair.delete_macro(id, index)?;
            store(config_manager, &pair).await?;
            writer.write_message(&format!(
                "Session {} quick string {} deleted",
                id,
                index + 1
            ))?;
            Ok(())
        }
        MacroCommand::Send { index, listen_ms } => {
            let index = zero_based(index)?;
            let config = pair.session(id).port_config().cloned().ok_or_else(|| {
                DualComError::config(format!("Session {} has no stored port", id))
            })?;

            pair.connect(id, config).await?;
            let sent = pair.send_macro(id, index).await;
            if sent.is_ok() {
                pump_events(&mut pair, writer, Duration::from_millis(listen_ms)).await?;
            }
            pair.disconnect(id).await?;
            pump_events(&mut pair, writer, Duration::ZERO).await?;
            sent?;

            // Remember the payload in the send history
            store(config_manager, &pair).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::PayloadKind;

    #[test]
    fn test_zero_based_index() {
        assert_eq!(zero_based(1).unwrap(), 0);
        assert_eq!(zero_based(40).unwrap(), 39);
        assert!(zero_based(0).is_err());
    }

    #[test]
    fn test_payload_kind_follows_hex_flag() {
        let settings = WorkbenchSettings::default();
        let mut pair = open_pair(&settings);
        pair.session_mut(SessionId::One).set_hex_send(true);
        assert_eq!(pair.session(SessionId::One).input_kind(), PayloadKind::Hex);
    }
}
