use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Device, TransportStrategy};
use crate::commands::{DtcCode, DtcTable, VehicleProfile, VehicleIdentity};
use crate::config::SimulationConfig;

/// Devices offered by discovery in simulation mode: `(id, name, address)`
pub const REFERENCE_DEVICES: [(&str, &str, &str); 3] = [
    ("1", "ELM327 Scanner", "00:11:22:33:44:55"),
    ("2", "OBD2 Pro", "11:22:33:44:55:66"),
    ("3", "BlueDriver", "22:33:44:55:66:77"),
];

/// Codes a simulated scan draws from; all of them are in the standard table
pub const REFERENCE_CODES: [&str; 4] = ["P0171", "P0301", "P0420", "P0442"];

/// `(brand, model, year)`
const REFERENCE_VEHICLES: [(&str, &str, &str); 5] = [
    ("Toyota", "Camry", "2018"),
    ("Honda", "Civic", "2020"),
    ("Ford", "F-150", "2019"),
    ("BMW", "X3", "2021"),
    ("Chevrolet", "Malibu", "2017"),
];

/// Deterministic stand-in for a real adapter
///
/// Discovery returns [REFERENCE_DEVICES], connecting takes a fixed latency and needs no
/// initialization, commands are answered with `OK`, scans return a few reference codes and
/// vehicle detection picks one of five reference vehicles.
pub struct SimulatedTransport {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulatedTransport {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A simulated transport whose random draws are reproducible
    pub fn seeded(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A non-empty prefix of [REFERENCE_CODES], resolved through `table`
    fn draw_codes(&self, table: &DtcTable) -> Vec<DtcCode> {
        let count = self.rng().gen_range(1..=REFERENCE_CODES.len());
        let observed_at = Utc::now();
        REFERENCE_CODES[..count]
            .iter()
            .enumerate()
            .map(|(position, code)| table.resolve(code, position, observed_at))
            .collect()
    }

    fn draw_vehicle(&self) -> VehicleProfile {
        let index = self.rng().gen_range(0..REFERENCE_VEHICLES.len());
        let (brand, model, year) = REFERENCE_VEHICLES[index];
        VehicleProfile::new(brand, model, year)
    }
}

#[async_trait]
impl TransportStrategy for SimulatedTransport {
    async fn list_bonded(&self) -> crate::Result<Vec<Device>> {
        Ok(REFERENCE_DEVICES
            .iter()
            .map(|(id, name, address)| Device::new(*id, *name, *address))
            .collect())
    }

    async fn open(&self, device: &Device) -> crate::Result<()> {
        info!("Simulating connection to {}", device.display_name);
        tokio::time::sleep(self.config.connect_latency).await;
        Ok(())
    }

    async fn close(&self, device: &Device) -> crate::Result<()> {
        debug!("Simulated disconnect from {}", device.display_name);
        Ok(())
    }

    async fn send(&self, _device: &Device, command: &str) -> crate::Result<String> {
        debug!("Simulated command {:?}", command);
        Ok("OK".to_owned())
    }

    fn needs_initialization(&self) -> bool {
        false
    }

    async fn read_stored_codes(
        &self,
        _device: &Device,
        table: &DtcTable,
        _timeout: Duration,
    ) -> crate::Result<Vec<DtcCode>> {
        tokio::time::sleep(self.config.scan_delay).await;
        let codes = self.draw_codes(table);
        info!("Simulated scan found {} codes", codes.len());
        Ok(codes)
    }

    async fn identify_vehicle(
        &self,
        _device: &Device,
        _timeout: Duration,
    ) -> crate::Result<Option<VehicleProfile>> {
        tokio::time::sleep(self.config.identify_delay).await;
        Ok(Some(self.draw_vehicle()))
    }

    async fn read_vin(
        &self,
        _device: &Device,
        _timeout: Duration,
    ) -> crate::Result<Option<VehicleIdentity>> {
        Ok(None)
    }
}
