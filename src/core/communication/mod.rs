// Communication module - Transport seam and session events
pub mod message;
pub mod transport;

pub use message::{DisconnectReason, SessionEvent};
pub use transport::{PortIo, PortOpener};
