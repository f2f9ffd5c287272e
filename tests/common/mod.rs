//! Virtual serial hardware for integration tests

#![allow(dead_code)]

use dualcom::{DualComError, DualComResult, PortConfig, PortIo, PortOpener, SessionEvent};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

type Buffer = Arc<Mutex<VecDeque<u8>>>;

/// One end of a virtual line
#[derive(Clone, Default)]
pub struct Endpoint {
    inbound: Buffer,
    outbound: Buffer,
    read_broken: Arc<AtomicBool>,
    write_broken: Arc<AtomicBool>,
}

impl Endpoint {
    /// Bytes arriving at this end from the far side
    pub fn inject(&self, data: &[u8]) {
        self.inbound.lock().unwrap().extend(data.iter().copied());
    }

    /// Take everything written into this end so far
    pub fn drain_written(&self) -> Vec<u8> {
        self.outbound.lock().unwrap().drain(..).collect()
    }

    /// Both directions fail from now on
    pub fn unplug(&self) {
        self.read_broken.store(true, Ordering::SeqCst);
        self.write_broken.store(true, Ordering::SeqCst);
    }

    /// Only writes fail; the reader keeps polling happily
    pub fn jam_writes(&self) {
        self.write_broken.store(true, Ordering::SeqCst);
    }

    pub fn replug(&self) {
        self.read_broken.store(false, Ordering::SeqCst);
        self.write_broken.store(false, Ordering::SeqCst);
    }
}

/// A null-modem cable: what one end writes, the other end reads
pub fn null_modem() -> (Endpoint, Endpoint) {
    let a_to_b: Buffer = Arc::default();
    let b_to_a: Buffer = Arc::default();
    let a = Endpoint {
        inbound: Arc::clone(&b_to_a),
        outbound: Arc::clone(&a_to_b),
        read_broken: Arc::default(),
        write_broken: Arc::default(),
    };
    let b = Endpoint {
        inbound: a_to_b,
        outbound: b_to_a,
        read_broken: Arc::default(),
        write_broken: Arc::default(),
    };
    (a, b)
}

struct VirtualPort {
    end: Endpoint,
}

impl PortIo for VirtualPort {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        if self.end.read_broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged"));
        }
        Ok(self.end.inbound.lock().unwrap().len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.end.inbound.lock().unwrap();
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.end.write_broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged"));
        }
        self.end.outbound.lock().unwrap().extend(data.iter().copied());
        Ok(())
    }
}

/// Serves registered endpoints by port name
#[derive(Default)]
pub struct VirtualPorts {
    ports: Mutex<HashMap<String, Endpoint>>,
}

impl VirtualPorts {
    pub fn attach(&self, name: &str, end: Endpoint) {
        self.ports.lock().unwrap().insert(name.to_string(), end);
    }

    /// Register a port whose far side is driven by the test
    pub fn device(&self, name: &str) -> Endpoint {
        let (port_end, device_end) = null_modem();
        self.attach(name, port_end);
        device_end
    }
}

impl PortOpener for VirtualPorts {
    fn open(&self, config: &PortConfig) -> DualComResult<Box<dyn PortIo>> {
        match self.ports.lock().unwrap().get(&config.port) {
            Some(end) => Ok(Box::new(VirtualPort { end: end.clone() })),
            None => Err(DualComError::PortUnavailable {
                port: config.port.clone(),
                reason: "no such device".to_string(),
            }),
        }
    }
}

/// Wait for the first event matching `pred`, skipping the others
pub async fn wait_for<F>(pair: &mut dualcom::SessionPair, mut pred: F) -> Option<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    timeout(Duration::from_secs(2), async {
        while let Some(event) = pair.next_event().await {
            if pred(&event) {
                return Some(event);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}
