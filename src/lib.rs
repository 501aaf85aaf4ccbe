//! Crate for scanning a vehicle's trouble codes through a Bluetooth ELM327 OBD-II adapter
//!
//! The [Obd2Scanner] discovers adapters, connects to one, runs the ELM327 configuration
//! handshake and reads stored trouble codes (service 0x03) and the VIN (service 0x09). In
//! simulation mode, the default, every operation is answered by [SimulatedTransport] so the
//! engine can be used without hardware. Real serial ports need the `serialport_comm` feature.
//!
//! # Usage
//! ```no_run
//! use obd2_scanner::Obd2Scanner;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), obd2_scanner::Error> {
//!     let scanner = Obd2Scanner::default();
//!     let devices = scanner.scan_for_devices().await?;
//!     if let Some(device) = devices.first() {
//!         scanner.connect(device).await?;
//!         for code in scanner.scan_for_dtcs().await? {
//!             println!("{}", code);
//!         }
//!         scanner.disconnect().await?;
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod commands;

pub mod config;
pub use config::{ScannerConfig, SimulationConfig};

mod connection;
pub use connection::{ConnectionManager, ConnectionState};

pub mod device;
pub use device::{Device, NoTransport, SimulatedTransport, TransportStrategy};

mod error;
pub use error::{DeviceError, Error, Result};

mod interface;
pub use interface::Obd2Scanner;

mod mode;
pub use mode::ModeController;

mod permission;
pub use permission::{AlwaysGranted, PermissionGate};

pub mod registry;
