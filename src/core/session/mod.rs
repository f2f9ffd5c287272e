// Session module - serial sessions and the pair coordinator
pub mod manager;
pub mod reader;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod mock;

pub use manager::SessionPair;
pub use reader::POLL_INTERVAL;
pub use session::SerialSession;
pub use state::{
    AutoSendIntent, CounterSnapshot, DisplayOptions, SessionCounters, SessionId, SessionSnapshot,
    SessionStatus,
};
