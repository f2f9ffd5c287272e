use crate::core::communication::{PortIo, PortOpener};
use crate::domain::config::{DataBits, Parity, PortConfig, StopBits};
use crate::domain::error::{DualComError, DualComResult};
use serde::Serialize;
use serialport::{SerialPort, SerialPortType};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Read/write timeout of an opened device
pub const PORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens real serial devices through the `serialport` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortOpener;

impl SystemPortOpener {
    pub fn new() -> Self {
        Self
    }
}

impl PortOpener for SystemPortOpener {
    fn open(&self, config: &PortConfig) -> DualComResult<Box<dyn PortIo>> {
        let unavailable = |reason: String| DualComError::PortUnavailable {
            port: config.port.clone(),
            reason,
        };

        let data_bits = match config.data_bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        };
        let stop_bits = match config.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
            StopBits::OnePointFive => {
                return Err(unavailable(
                    "1.5 stop bits are not supported by this driver".to_string(),
                ))
            }
        };
        let parity = match config.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(serialport::FlowControl::None)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| unavailable(e.to_string()))?;

        info!("Serial port opened: {}", config);
        Ok(Box::new(SystemPort { inner: port }))
    }
}

struct SystemPort {
    inner: Box<dyn SerialPort>,
}

impl PortIo for SystemPort {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(self.inner.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)?;
        self.inner.flush()?;
        debug!("Wrote {} bytes to serial port", data.len());
        Ok(())
    }
}

/// A serial device present on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
    pub description: String,
}

/// Enumerate serial devices, sorted by name
pub fn available_ports() -> DualComResult<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| DualComError::PortUnavailable {
        port: "*".to_string(),
        reason: format!("Failed to enumerate ports: {}", e),
    })?;

    let mut infos: Vec<PortInfo> = ports
        .into_iter()
        .map(|p| {
            let (kind, description) = describe(&p.port_type);
            PortInfo {
                name: p.port_name,
                kind,
                description,
            }
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

fn describe(port_type: &SerialPortType) -> (String, String) {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_default();
            (
                "usb".to_string(),
                format!("{:04x}:{:04x} {}", usb.vid, usb.pid, product)
                    .trim_end()
                    .to_string(),
            )
        }
        SerialPortType::PciPort => ("pci".to_string(), String::new()),
        SerialPortType::BluetoothPort => ("bluetooth".to_string(), String::new()),
        SerialPortType::Unknown => ("unknown".to_string(), String::new()),
    }
}
