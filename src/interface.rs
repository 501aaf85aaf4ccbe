use std::sync::Arc;

use log::{debug, info};

use crate::commands::{DtcCode, DtcTable, VehicleIdentity, VehicleProfile};
use crate::config::ScannerConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::device::{Device, SimulatedTransport, TransportStrategy};
use crate::mode::ModeController;
use crate::permission::{AlwaysGranted, PermissionGate};
use crate::registry::is_obd_adapter;
use crate::{Error, Result};

/// An OBD-II scanner
///
/// Owns the connection, the simulation/production switch and the trouble code table. Create one
/// per process and share it; every method takes `&self`.
pub struct Obd2Scanner {
    simulated: Arc<dyn TransportStrategy>,
    production: Arc<dyn TransportStrategy>,
    permissions: Arc<dyn PermissionGate>,
    mode: ModeController,
    connection: ConnectionManager,
    table: DtcTable,
}

impl Default for Obd2Scanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

impl Obd2Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            simulated: Arc::new(SimulatedTransport::new(config.simulation.clone())),
            production: default_production_transport(&config),
            permissions: Arc::new(AlwaysGranted),
            mode: ModeController::new(config.start_in_simulation),
            connection: ConnectionManager::new(config.command_timeout),
            table: DtcTable::standard(),
        }
    }

    /// Replace the transport used in production mode
    pub fn with_production_transport(mut self, transport: Arc<dyn TransportStrategy>) -> Self {
        self.production = transport;
        self
    }

    /// Replace the transport used in simulation mode
    pub fn with_simulated_transport(mut self, transport: Arc<dyn TransportStrategy>) -> Self {
        self.simulated = transport;
        self
    }

    pub fn with_permission_gate(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn is_simulation(&self) -> bool {
        self.mode.is_simulation()
    }

    /// Switch between simulation and production
    ///
    /// Resets [has_scanned](Self::has_scanned). An existing connection keeps the transport it
    /// was opened with until it is disconnected.
    pub fn set_simulation(&self, enabled: bool) {
        self.mode.set_simulation(enabled);
    }

    /// Whether [scan_for_devices](Self::scan_for_devices) ran since the last mode switch
    pub fn has_scanned(&self) -> bool {
        self.mode.has_scanned()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connected_device(&self) -> Option<Device> {
        self.connection.connected_device()
    }

    /// Whether an operation is currently running against the connection
    pub fn is_busy(&self) -> bool {
        self.connection.is_busy()
    }

    pub fn dtc_table(&self) -> &DtcTable {
        &self.table
    }

    fn transport(&self) -> Arc<dyn TransportStrategy> {
        if self.mode.is_simulation() {
            self.simulated.clone()
        } else {
            self.production.clone()
        }
    }

    fn check_permissions(&self) -> Result<()> {
        if self.mode.is_simulation() || self.permissions.has_bluetooth_capability() {
            Ok(())
        } else {
            Err(Error::PermissionDenied)
        }
    }

    /// List the OBD-II adapters that are currently available
    ///
    /// In production these are the bonded serial devices whose name looks like an adapter.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        self.check_permissions()?;
        let bonded = self.transport().list_bonded().await?;
        let total = bonded.len();
        let devices: Vec<Device> = bonded
            .into_iter()
            .filter(|d| is_obd_adapter(&d.display_name))
            .collect();
        debug!(
            "list_devices: {} of {} bonded devices look like adapters",
            devices.len(),
            total
        );
        Ok(devices)
    }

    /// Explicitly scan for adapters, recording that a scan happened
    pub async fn scan_for_devices(&self) -> Result<Vec<Device>> {
        self.mode.mark_scanned();
        self.list_devices().await
    }

    /// Connect to `device` and, in production, initialize the adapter
    ///
    /// An existing or in-flight connection is reported before the permission gate is asked.
    pub async fn connect(&self, device: &Device) -> Result<Device> {
        self.connection.check_available()?;
        self.check_permissions()?;
        self.connection.connect(device, self.transport()).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.connection.disconnect().await
    }

    /// Send a raw command to the adapter and return its response
    pub async fn send(&self, command: &str) -> Result<String> {
        self.connection.send(command).await
    }

    /// Read the stored trouble codes from the vehicle
    ///
    /// An empty list means the vehicle reported no faults.
    pub async fn scan_for_dtcs(&self) -> Result<Vec<DtcCode>> {
        let codes = self.connection.read_stored_codes(&self.table).await?;
        info!("DTC scan found {} codes", codes.len());
        Ok(codes)
    }

    /// Detect the connected vehicle
    ///
    /// Real adapters currently always give `None`, since the VIN is not decoded into a brand,
    /// model and year.
    pub async fn identify_vehicle(&self) -> Result<Option<VehicleProfile>> {
        self.connection.identify_vehicle().await
    }

    /// Read the vehicle identification number, if the response holds a complete one
    pub async fn read_vin(&self) -> Result<Option<VehicleIdentity>> {
        self.connection.read_vin().await
    }
}

#[cfg(feature = "serialport_comm")]
fn default_production_transport(config: &ScannerConfig) -> Arc<dyn TransportStrategy> {
    Arc::new(crate::device::SerialTransport::new(config.baud_rate))
}

#[cfg(not(feature = "serialport_comm"))]
fn default_production_transport(_config: &ScannerConfig) -> Arc<dyn TransportStrategy> {
    Arc::new(crate::device::NoTransport)
}
