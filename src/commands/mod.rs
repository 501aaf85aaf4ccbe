//! OBD-II requests the scanner issues, and decoding of their responses

mod dtc;
pub use dtc::{
    decode_chunk, decode_response, DecodeSkipped, DecodedResponse, SkipReason, DTC_PREFIXES,
};

mod table;
pub use table::{DtcTable, UNKNOWN_DESCRIPTION};

mod types;
pub use types::{DtcCode, Severity, SummaryRequest, VehicleIdentity, VehicleProfile};

mod vin;
pub use vin::extract_vin;

/// Service 0x03: request stored trouble codes
pub const READ_STORED_DTCS: &str = "03";

/// Service 0x09, PID 0x02: request the vehicle identification number
pub const REQUEST_VIN: &str = "0902";
