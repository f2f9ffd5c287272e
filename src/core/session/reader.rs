//! Background receive task of an open session.
//!
//! The task polls the port every [`POLL_INTERVAL`], reads everything that
//! is available in one call and publishes a decoded `Received` event. It
//! checks its cancellation token every cycle and again under the port
//! lock, so once [`ReaderHandle::stop`] returns nothing more is emitted.

use crate::core::codec::decode_for_display;
use crate::core::communication::{DisconnectReason, PortIo, SessionEvent};
use crate::core::session::state::{
    AutoSendIntent, DisplayOptions, SessionCounters, SessionId, SessionStatus,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Delay between two polls of the port
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

const INITIAL_BUFFER: usize = 4096;

pub(crate) type SharedPort = Arc<Mutex<Box<dyn PortIo>>>;

/// State the reader needs; it never touches configuration or macros
pub(crate) struct ReaderContext {
    pub session: SessionId,
    pub port: SharedPort,
    pub counters: Arc<SessionCounters>,
    pub display: Arc<RwLock<DisplayOptions>>,
    pub status: Arc<RwLock<SessionStatus>>,
    pub auto_send: Arc<RwLock<Option<AutoSendIntent>>>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
}

pub(crate) struct ReaderHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaderHandle {
    pub fn spawn(ctx: ReaderContext) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(read_loop(ctx, cancel.clone()));
        Self { cancel, task }
    }

    /// Signal the task and wait for it, aborting after `grace`
    pub async fn stop(mut self, grace: Duration) {
        self.cancel.cancel();
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            warn!("Reader did not stop within {:?}, aborting", grace);
            self.task.abort();
            let _ = (&mut self.task).await;
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_loop(ctx: ReaderContext, cancel: CancellationToken) {
    let mut buffer = vec![0u8; INITIAL_BUFFER];

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Session {} reader cancelled", ctx.session);
                break;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        match receive_tick(&ctx, &cancel, &mut buffer).await {
            Ok(Some(data)) => {
                let text = {
                    let display = ctx.display.read().await;
                    decode_for_display(&data, display.hex_display, &display.recv_encoding)
                };
                debug!("Session {} received {} bytes", ctx.session, data.len());
                publish(&ctx, SessionEvent::received(ctx.session, data, text));
            }
            Ok(None) => {}
            Err(e) => {
                error!("Session {} read failed: {}", ctx.session, e);
                *ctx.auto_send.write().await = None;
                *ctx.status.write().await = SessionStatus::Closed;
                publish(
                    &ctx,
                    SessionEvent::error(ctx.session, format!("Read error: {}", e)),
                );
                publish(
                    &ctx,
                    SessionEvent::disconnected(ctx.session, DisconnectReason::TransportFailure),
                );
                break;
            }
        }
    }
}

fn publish(ctx: &ReaderContext, event: SessionEvent) {
    if ctx.events.send(event).is_err() {
        debug!("Session {} event receiver dropped", ctx.session);
    }
}

/// Read all currently available bytes, if any
async fn receive_tick(
    ctx: &ReaderContext,
    cancel: &CancellationToken,
    buffer: &mut Vec<u8>,
) -> io::Result<Option<Vec<u8>>> {
    let mut port = ctx.port.lock().await;
    if cancel.is_cancelled() {
        return Ok(None);
    }

    let available = port.bytes_to_read()?;
    if available == 0 {
        return Ok(None);
    }
    if buffer.len() < available {
        buffer.resize(available, 0);
    }

    match port.read(&mut buffer[..available]) {
        Ok(0) => Ok(None),
        Ok(n) => {
            ctx.counters.add_received(n);
            Ok(Some(buffer[..n].to_vec()))
        }
        Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
        Err(e) => Err(e),
    }
}
