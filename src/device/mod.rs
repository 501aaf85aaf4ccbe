//! Transports that carry ELM327 traffic, and the devices they expose

mod elm327;
pub use elm327::{
    frame_command, read_until_prompt, Elm327Stream, INIT_SEQUENCE, PROMPT, RESYNC_WINDOW,
};
pub(crate) use elm327::{initialize, with_deadline};

mod simulated;
pub use simulated::{SimulatedTransport, REFERENCE_CODES, REFERENCE_DEVICES};

#[cfg(feature = "serialport_comm")]
mod serialport_comm;
#[cfg(feature = "serialport_comm")]
pub use serialport_comm::SerialTransport;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::commands::{self, DtcCode, DtcTable, VehicleProfile};

/// Default baud rate for ELM327 adapters
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// A candidate OBD-II interface
///
/// `address` is whatever the transport uses to reach the device (a serial port path or a
/// Bluetooth MAC address), while `id` is a stable handle for the caller. The `connected` flag is
/// only a view for display; [ConnectionManager](crate::ConnectionManager) owns the real state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub display_name: String,
    pub address: String,
    pub connected: bool,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            address: address.into(),
            connected: false,
        }
    }

    pub(crate) fn with_connected(&self, connected: bool) -> Self {
        Self {
            connected,
            ..self.clone()
        }
    }
}

/// How the engine reaches an adapter
///
/// Every operation of the engine goes through one of these, so the simulation and production
/// paths differ only in which implementation is selected. The provided methods implement the
/// real OBD-II exchanges on top of [send](Self::send); the simulated transport overrides them.
#[async_trait]
pub trait TransportStrategy: Send + Sync {
    /// List the bonded/paired serial devices, unfiltered
    async fn list_bonded(&self) -> crate::Result<Vec<Device>>;

    async fn open(&self, device: &Device) -> crate::Result<()>;

    async fn close(&self, device: &Device) -> crate::Result<()>;

    /// Write one framed command and return the raw response text
    async fn send(&self, device: &Device, command: &str) -> crate::Result<String>;

    /// Whether a new connection must run the ELM327 configuration sequence
    fn needs_initialization(&self) -> bool {
        true
    }

    /// Request the stored trouble codes (service 0x03) and decode them
    async fn read_stored_codes(
        &self,
        device: &Device,
        table: &DtcTable,
        timeout: Duration,
    ) -> crate::Result<Vec<DtcCode>> {
        let command = commands::READ_STORED_DTCS;
        let raw = with_deadline(command, timeout, self.send(device, command)).await?;
        let decoded = commands::decode_response(&raw, table);
        for skipped in decoded.skipped.iter() {
            debug!("read_stored_codes: {}", skipped);
        }
        Ok(decoded.codes)
    }

    /// Detect the connected vehicle's brand, model and year
    ///
    /// The VIN is requested (service 0x09, PID 0x02) but there is no VIN decoder yet, so real
    /// adapters always yield `None`.
    async fn identify_vehicle(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> crate::Result<Option<VehicleProfile>> {
        let identity = self.read_vin(device, timeout).await?;
        debug!("identify_vehicle: extracted {:?}, not decoded", identity);
        Ok(None)
    }

    /// Request the VIN (service 0x09, PID 0x02) and extract it from the response
    async fn read_vin(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> crate::Result<Option<commands::VehicleIdentity>> {
        let command = commands::REQUEST_VIN;
        let raw = with_deadline(command, timeout, self.send(device, command)).await?;
        Ok(commands::extract_vin(&raw))
    }
}

/// Production transport for builds without serial support
///
/// Every operation fails with [TransportUnavailable](crate::Error::TransportUnavailable).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransport;

#[async_trait]
impl TransportStrategy for NoTransport {
    async fn list_bonded(&self) -> crate::Result<Vec<Device>> {
        Err(crate::Error::TransportUnavailable)
    }

    async fn open(&self, _device: &Device) -> crate::Result<()> {
        Err(crate::Error::TransportUnavailable)
    }

    async fn close(&self, _device: &Device) -> crate::Result<()> {
        Err(crate::Error::TransportUnavailable)
    }

    async fn send(&self, _device: &Device, _command: &str) -> crate::Result<String> {
        Err(crate::Error::TransportUnavailable)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "serialport_comm")]
    #[error("Serial port error: `{0:?}`")]
    Serialport(serialport::Error),
    #[error("IO error: `{0:?}`")]
    IO(std::io::Error),
    #[error("Communication error: `{0}`")]
    Communication(String),
}

#[cfg(feature = "serialport_comm")]
impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serialport(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_transport_is_unavailable() {
        let device = Device::new("1", "ELM327", "00:11:22:33:44:55");
        assert!(matches!(
            NoTransport.list_bonded().await,
            Err(crate::Error::TransportUnavailable)
        ));
        assert!(matches!(
            NoTransport.open(&device).await,
            Err(crate::Error::TransportUnavailable)
        ));
        assert!(matches!(
            NoTransport.send(&device, "03").await,
            Err(crate::Error::TransportUnavailable)
        ));
    }

    #[test]
    fn connected_view_does_not_touch_identity() {
        let device = Device::new("2", "OBD2 Pro", "11:22:33:44:55:66");
        let view = device.with_connected(true);
        assert!(view.connected);
        assert_eq!(view.id, device.id);
        assert_eq!(view.address, device.address);
    }
}
