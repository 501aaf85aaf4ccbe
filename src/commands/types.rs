use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How urgently a trouble code should be looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

/// An individual trouble code read from the vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtcCode {
    /// Unique within one scan result
    pub id: String,
    /// Canonical five character form, e.g. `P0301`
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub observed_at: DateTime<Utc>,
}

impl fmt::Display for DtcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.severity, self.description)
    }
}

/// A vehicle identification number that was fully extracted from a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub vin: String,
}

/// The vehicle a scan was taken from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub brand: String,
    pub model: String,
    pub year: String,
}

impl VehicleProfile {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            year: year.into(),
        }
    }
}

impl fmt::Display for VehicleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.brand, self.model)
    }
}

/// Inputs for an AI summary of one trouble code
///
/// Building and sending the actual request is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub code: String,
    pub vehicle_year: String,
    pub vehicle_brand: String,
    pub vehicle_model: String,
}

impl SummaryRequest {
    pub fn new(code: &DtcCode, vehicle: &VehicleProfile) -> Self {
        Self {
            code: code.code.clone(),
            vehicle_year: vehicle.year.clone(),
            vehicle_brand: vehicle.brand.clone(),
            vehicle_model: vehicle.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_displays_lowercase_and_orders_by_urgency() {
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!(Severity::Medium.to_string(), "medium");
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn summary_request_copies_code_and_vehicle() {
        let code = DtcCode {
            id: "P0420-0-0".to_owned(),
            code: "P0420".to_owned(),
            description: "Catalyst System Efficiency Below Threshold (Bank 1)".to_owned(),
            severity: Severity::Medium,
            observed_at: Utc::now(),
        };
        let vehicle = VehicleProfile::new("Honda", "Civic", "2020");
        let request = SummaryRequest::new(&code, &vehicle);
        assert_eq!(request.code, "P0420");
        assert_eq!(request.vehicle_year, "2020");
        assert_eq!(request.vehicle_brand, "Honda");
        assert_eq!(request.vehicle_model, "Civic");
        assert_eq!(vehicle.to_string(), "2020 Honda Civic");
    }
}
