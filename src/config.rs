use std::time::Duration;

use crate::device::DEFAULT_BAUD_RATE;

/// Default deadline for one command/response exchange
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Baud rate used when opening a serial port
    pub baud_rate: u32,
    /// Deadline for each command sent to the adapter
    pub command_timeout: Duration,
    /// Whether the scanner starts in simulation mode
    pub start_in_simulation: bool,
    pub simulation: SimulationConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            start_in_simulation: true,
            simulation: SimulationConfig::default(),
        }
    }
}

/// Latencies modelled by the simulated transport
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub connect_latency: Duration,
    pub scan_delay: Duration,
    pub identify_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            connect_latency: Duration::from_millis(2000),
            scan_delay: Duration::from_millis(3000),
            identify_delay: Duration::from_millis(4000),
        }
    }
}
