use super::VehicleIdentity;

/// Shortest cleaned response that can hold a complete VIN
const MIN_RESPONSE_LEN: usize = 34;

/// Offset of the VIN within a cleaned response
const VIN_OFFSET: usize = 6;

const VIN_LEN: usize = 17;

/// Extract the VIN from a service 0x09 PID 0x02 response
///
/// Whitespace is removed first. Responses too short to hold all 17 characters give `None`,
/// never a partial VIN.
pub fn extract_vin(raw: &str) -> Option<VehicleIdentity> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() < MIN_RESPONSE_LEN || !cleaned.is_ascii() {
        return None;
    }

    let vin = &cleaned[VIN_OFFSET..VIN_OFFSET + VIN_LEN];
    if vin.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(VehicleIdentity {
            vin: vin.to_owned(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_responses_are_unavailable() {
        assert_eq!(extract_vin(""), None);
        assert_eq!(extract_vin("NO DATA"), None);
        assert_eq!(extract_vin("49 02 01 31 47 31"), None);
    }

    #[test]
    fn takes_seventeen_characters_after_the_header() {
        let raw = "490201 1G1JC5444R7252367 0000000000 00";
        let identity = extract_vin(raw).unwrap();
        assert_eq!(identity.vin, "1G1JC5444R7252367");
        assert_eq!(identity.vin.len(), 17);
    }

    #[test]
    fn exactly_minimum_length_is_enough() {
        let raw = format!("490201{}{}", "A".repeat(17), "0".repeat(11));
        assert_eq!(raw.len(), 34);
        assert_eq!(extract_vin(&raw).unwrap().vin, "A".repeat(17));
    }

    #[test]
    fn garbage_is_not_a_vin() {
        let raw = format!("490201{}{}", "?".repeat(17), "0".repeat(11));
        assert_eq!(extract_vin(&raw), None);
    }
}
