//! Recognising OBD-II adapters among bonded devices

/// Lowercase fragments found in the names of common Bluetooth OBD-II adapters
///
/// `blue` catches vendor names such as BlueDriver.
pub const ADAPTER_KEYWORDS: [&str; 6] = ["obd", "elm", "scanner", "blue", "torque", "obdlink"];

/// Whether a device called `name` is likely an OBD-II adapter
///
/// The comparison ignores case. Unnamed devices never match.
pub fn is_obd_adapter(name: &str) -> bool {
    let name = name.to_lowercase();
    ADAPTER_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_common_adapter_names() {
        for name in [
            "ELM327 Scanner",
            "OBD2 Pro",
            "BlueDriver",
            "OBDLink MX+",
            "Torque Adapter",
            "vLinker obdii",
        ] {
            assert!(is_obd_adapter(name), "{} should match", name);
        }
    }

    #[test]
    fn ignores_other_devices() {
        for name in ["", "JBL Flip 5", "Pixel 7", "rfcomm0", "Car Audio"] {
            assert!(!is_obd_adapter(name), "{} should not match", name);
        }
    }
}
