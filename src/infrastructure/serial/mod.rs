// Serial module - system serial port transport
pub mod client;

pub use client::{available_ports, PortInfo, SystemPortOpener};
