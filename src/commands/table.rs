use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{DtcCode, Severity};

/// Description given to codes missing from the table
pub const UNKNOWN_DESCRIPTION: &str = "Unknown diagnostic trouble code";

const STANDARD_CODES: [(&str, &str, Severity); 24] = [
    ("P0000", "No codes detected", Severity::Low),
    ("P0001", "Fuel Volume Regulator Control Circuit/Open", Severity::Medium),
    ("P0010", "Camshaft Position Actuator Circuit (Bank 1)", Severity::Medium),
    ("P0020", "Camshaft Position Actuator Circuit (Bank 2)", Severity::Medium),
    ("P0030", "HO2S Heater Control Circuit (Bank 1 Sensor 1)", Severity::Medium),
    ("P0101", "Mass or Volume Air Flow Circuit Range/Performance Problem", Severity::High),
    ("P0171", "System Too Lean (Bank 1)", Severity::High),
    ("P0172", "System Too Rich (Bank 1)", Severity::High),
    ("P0300", "Random/Multiple Cylinder Misfire Detected", Severity::Critical),
    ("P0301", "Cylinder 1 Misfire Detected", Severity::High),
    ("P0302", "Cylinder 2 Misfire Detected", Severity::High),
    ("P0303", "Cylinder 3 Misfire Detected", Severity::High),
    ("P0304", "Cylinder 4 Misfire Detected", Severity::High),
    ("P0420", "Catalyst System Efficiency Below Threshold (Bank 1)", Severity::Medium),
    (
        "P0442",
        "Evaporative Emission Control System Leak Detected (small leak)",
        Severity::Medium,
    ),
    (
        "P0446",
        "Evaporative Emission Control System Vent Control Circuit Malfunction",
        Severity::Medium,
    ),
    ("P0500", "Vehicle Speed Sensor Malfunction", Severity::High),
    ("P0506", "Idle Control System RPM Lower Than Expected", Severity::Medium),
    ("P0507", "Idle Control System RPM Higher Than Expected", Severity::Medium),
    ("P0700", "Transmission Control System Malfunction", Severity::Critical),
    ("P0750", "Shift Solenoid A Malfunction", Severity::High),
    ("B0001", "Driver Airbag Squib Circuit Short to Battery", Severity::Critical),
    ("C0001", "Vehicle Speed Sensor Circuit", Severity::Medium),
    ("U0001", "High Speed CAN Communication Bus", Severity::Medium),
];

/// Descriptions and severities of known trouble codes
///
/// Built once when the scanner is created and never modified afterwards.
#[derive(Debug, Clone)]
pub struct DtcTable {
    entries: HashMap<&'static str, (&'static str, Severity)>,
}

impl Default for DtcTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DtcTable {
    /// The built-in table of common powertrain, body, chassis and network codes
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_CODES
                .iter()
                .map(|(code, description, severity)| (*code, (*description, *severity)))
                .collect(),
        }
    }

    /// Description and severity for `code`, falling back to an unknown, medium severity entry
    pub fn lookup(&self, code: &str) -> (&'static str, Severity) {
        self.entries
            .get(code)
            .copied()
            .unwrap_or((UNKNOWN_DESCRIPTION, Severity::Medium))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the record for `code` found at `position` of a scan taken at `observed_at`
    pub fn resolve(&self, code: &str, position: usize, observed_at: DateTime<Utc>) -> DtcCode {
        let (description, severity) = self.lookup(code);
        DtcCode {
            id: format!("{}-{}-{}", code, observed_at.timestamp_millis(), position),
            code: code.to_owned(),
            description: description.to_owned(),
            severity,
            observed_at,
        }
    }
}
