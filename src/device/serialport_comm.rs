use async_trait::async_trait;
use log::{debug, info, trace};
use tokio::sync::Mutex;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

use super::{Device, Elm327Stream, TransportStrategy, DEFAULT_BAUD_RATE};

/// Talk to a bonded adapter through its serial port
///
/// Paired Bluetooth SPP adapters show up as `/dev/rfcomm*`, `/dev/cu.*` or `COM*` ports, which
/// is what [list_bonded](TransportStrategy::list_bonded) reports.
pub struct SerialTransport {
    baud_rate: u32,
    port: Mutex<Option<OpenPort>>,
}

struct OpenPort {
    address: String,
    link: Elm327Stream<SerialStream>,
}

impl OpenPort {
    /// Drop whatever the adapter sent that no command is waiting for
    fn purge_input(&self) -> super::Result<()> {
        trace!("purge_input: clearing {}", self.address);
        self.link.get_ref().clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl SerialTransport {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            port: Mutex::new(None),
        }
    }
}

/// Name shown for a port: the USB product string when there is one, else the file name
fn display_name(info: &serialport::SerialPortInfo) -> String {
    if let serialport::SerialPortType::UsbPort(usb) = &info.port_type {
        if let Some(product) = usb.product.as_ref().filter(|p| !p.is_empty()) {
            return product.clone();
        }
    }
    info.port_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&info.port_name)
        .to_owned()
}

#[async_trait]
impl TransportStrategy for SerialTransport {
    async fn list_bonded(&self) -> crate::Result<Vec<Device>> {
        let ports = serialport::available_ports().map_err(super::Error::from)?;
        trace!("list_bonded: found {} ports", ports.len());
        Ok(ports
            .iter()
            .map(|info| {
                Device::new(
                    format!("serial:{}", info.port_name),
                    display_name(info),
                    info.port_name.clone(),
                )
            })
            .collect())
    }

    async fn open(&self, device: &Device) -> crate::Result<()> {
        info!("Opening {} at {} baud", device.address, self.baud_rate);
        let stream = tokio_serial::new(&device.address, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
            .map_err(super::Error::from)?;

        let mut port = self.port.lock().await;
        if let Some(previous) = port.replace(OpenPort {
            address: device.address.clone(),
            link: Elm327Stream::new(stream),
        }) {
            // Left behind by a connect that was dropped before it finished
            debug!("open: closing leftover port {}", previous.address);
        }
        Ok(())
    }

    async fn close(&self, device: &Device) -> crate::Result<()> {
        let mut port = self.port.lock().await;
        match port.take() {
            Some(open) if open.address == device.address => {
                info!("Closed {}", open.address);
            }
            Some(other) => {
                debug!("close: {} is not open, keeping {}", device.address, other.address);
                *port = Some(other);
            }
            None => debug!("close: nothing open"),
        }
        Ok(())
    }

    async fn send(&self, device: &Device, command: &str) -> crate::Result<String> {
        let mut port = self.port.lock().await;
        let open = port
            .as_mut()
            .filter(|open| open.address == device.address)
            .ok_or(crate::Error::NoActiveConnection)?;

        open.link.resync().await?;
        open.purge_input()?;
        Ok(open.link.exchange(command).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::{SerialPortInfo, SerialPortType, UsbPortInfo};

    fn usb(product: Option<&str>) -> SerialPortType {
        SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x0403,
            pid: 0x6001,
            serial_number: None,
            manufacturer: Some("FTDI".to_owned()),
            product: product.map(str::to_owned),
        })
    }

    #[test]
    fn usb_ports_are_named_by_product() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_owned(),
            port_type: usb(Some("OBDLink SX")),
        };
        assert_eq!(display_name(&info), "OBDLink SX");
    }

    #[test]
    fn other_ports_are_named_by_file_name() {
        let info = SerialPortInfo {
            port_name: "/dev/rfcomm0".to_owned(),
            port_type: SerialPortType::BluetoothPort,
        };
        assert_eq!(display_name(&info), "rfcomm0");

        let info = SerialPortInfo {
            port_name: "COM4".to_owned(),
            port_type: SerialPortType::Unknown,
        };
        assert_eq!(display_name(&info), "COM4");

        let info = SerialPortInfo {
            port_name: "/dev/ttyUSB1".to_owned(),
            port_type: usb(Some("")),
        };
        assert_eq!(display_name(&info), "ttyUSB1");
    }
}
