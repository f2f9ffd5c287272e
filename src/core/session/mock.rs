//! In-memory ports for session tests

use crate::core::communication::{PortIo, PortOpener};
use crate::domain::config::PortConfig;
use crate::domain::error::{DualComError, DualComResult};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Both ends of a fake serial line
#[derive(Clone, Default)]
pub(crate) struct MockWire {
    inbound: Arc<Mutex<VecDeque<u8>>>,
    outbound: Arc<Mutex<Vec<u8>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MockWire {
    /// Bytes the device "sends" to the session
    pub fn push_inbound(&self, data: &[u8]) {
        self.inbound.lock().unwrap().extend(data.iter().copied());
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }

    /// Everything the session wrote so far
    pub fn written(&self) -> Vec<u8> {
        self.outbound.lock().unwrap().clone()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn restore(&self) {
        self.fail_reads.store(false, Ordering::SeqCst);
        self.fail_writes.store(false, Ordering::SeqCst);
    }
}

struct MockPort {
    wire: MockWire,
}

impl PortIo for MockPort {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        if self.wire.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(self.wire.pending_inbound())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.wire.inbound.lock().unwrap();
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.wire.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.wire.outbound.lock().unwrap().extend_from_slice(data);
        Ok(())
    }
}

/// Opens only the ports registered with [`MockOpener::add_port`]
#[derive(Default)]
pub(crate) struct MockOpener {
    wires: Mutex<HashMap<String, MockWire>>,
}

impl MockOpener {
    pub fn add_port(&self, name: &str) -> MockWire {
        let wire = MockWire::default();
        self.wires
            .lock()
            .unwrap()
            .insert(name.to_string(), wire.clone());
        wire
    }
}

impl PortOpener for MockOpener {
    fn open(&self, config: &PortConfig) -> DualComResult<Box<dyn PortIo>> {
        match self.wires.lock().unwrap().get(&config.port) {
            Some(wire) => Ok(Box::new(MockPort { wire: wire.clone() })),
            None => Err(DualComError::PortUnavailable {
                port: config.port.clone(),
                reason: "no such device".to_string(),
            }),
        }
    }
}
