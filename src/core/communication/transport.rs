use crate::domain::{config::PortConfig, error::DualComResult};
use std::io;

/// An open, byte-oriented port.
///
/// Implementations are driven from two places: the session's send path
/// writes, its background reader polls and reads. Access is serialised by
/// the session, so methods take `&mut self`.
pub trait PortIo: Send {
    /// Number of bytes that can be read without blocking
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer, bounded by the transport's own timeout
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Opens ports for a given framing
pub trait PortOpener: Send + Sync {
    fn open(&self, config: &PortConfig) -> DualComResult<Box<dyn PortIo>>;
}
