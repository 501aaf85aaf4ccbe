//! Decoding of service 0x03 (stored trouble codes) responses
//!
//! Each trouble code travels as two bytes, printed by the adapter as four hex characters. The
//! first character carries the code's category and its leading digit; the other three are
//! copied into the code unchanged.

use std::fmt;

use chrono::Utc;

use super::{DtcCode, DtcTable};
use crate::device::PROMPT;

/// Category letter selected by the upper three bits of a code's first nibble
pub const DTC_PREFIXES: [char; 8] = ['P', 'P', 'P', 'P', 'C', 'B', 'U', 'U'];

/// What the adapter prints when the vehicle did not answer, after spaces are removed
const NO_DATA: &str = "NODATA";

/// Positive response to service 0x03
const STORED_DTCS_RESPONSE: &str = "43";

/// Two zero bytes fill up the unused slots of a response
const PADDING: &str = "0000";

/// Why a chunk of a response did not yield a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than four characters were left at the end of the line
    Truncated,
    /// The chunk contained something other than hex digits
    NotHex,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Truncated => "truncated chunk",
            Self::NotHex => "not hexadecimal",
        })
    }
}

/// A chunk of a response that was skipped while decoding
///
/// This never fails a scan; the rest of the response is still decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("skipped {chunk:?} (line {line}, offset {offset}): {reason}")]
pub struct DecodeSkipped {
    pub line: usize,
    pub offset: usize,
    pub chunk: String,
    pub reason: SkipReason,
}

/// The codes found in a response, and the chunks that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct DecodedResponse {
    pub codes: Vec<DtcCode>,
    pub skipped: Vec<DecodeSkipped>,
}

/// Decode one four character chunk into its canonical code, e.g. `"0301"` into `"P0301"`
///
/// Returns `None` when the chunk is not exactly four hex digits.
pub fn decode_chunk(chunk: &str) -> Option<String> {
    if chunk.len() != 4 || !chunk.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = chunk.chars().next()?.to_digit(16)?;
    let prefix = DTC_PREFIXES[(nibble >> 1) as usize];
    Some(format!("{}{}{}", prefix, nibble & 1, &chunk[1..]))
}

/// Decode the raw text of a service 0x03 response
///
/// An empty response or `NO DATA` means the vehicle has no stored codes, which is a valid empty
/// result.
pub fn decode_response(raw: &str, table: &DtcTable) -> DecodedResponse {
    let observed_at = Utc::now();
    let mut decoded = DecodedResponse::default();

    for (line_idx, line) in raw.split(['\r', '\n']).enumerate() {
        let cleaned: String = line
            .chars()
            .filter(|c| !c.is_whitespace() && *c != PROMPT as char)
            .collect();
        if cleaned.is_empty() || cleaned.eq_ignore_ascii_case(NO_DATA) {
            continue;
        }

        let payload: Vec<char> = cleaned
            .strip_prefix(STORED_DTCS_RESPONSE)
            .unwrap_or(&cleaned)
            .chars()
            .collect();

        for (chunk_idx, chunk) in payload.chunks(4).enumerate() {
            let chunk: String = chunk.iter().collect();
            if chunk == PADDING {
                continue;
            }
            match decode_chunk(&chunk) {
                Some(code) => {
                    let position = decoded.codes.len();
                    decoded.codes.push(table.resolve(&code, position, observed_at));
                }
                None => decoded.skipped.push(DecodeSkipped {
                    line: line_idx,
                    offset: chunk_idx * 4,
                    reason: if chunk.chars().count() < 4 {
                        SkipReason::Truncated
                    } else {
                        SkipReason::NotHex
                    },
                    chunk,
                }),
            }
        }
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(raw: &str) -> Vec<String> {
        decode_response(raw, &DtcTable::standard())
            .codes
            .into_iter()
            .map(|c| c.code)
            .collect()
    }

    #[test]
    fn prefix_follows_upper_three_bits() {
        for nibble in 0..16u32 {
            let chunk = format!("{:X}123", nibble);
            let code = decode_chunk(&chunk).unwrap();
            let expected_prefix = DTC_PREFIXES[(nibble >> 1) as usize];
            assert_eq!(code, format!("{}{}123", expected_prefix, nibble & 1));
        }
    }

    #[test]
    fn prefix_table_covers_every_category() {
        let expected: [(usize, char); 8] = [
            (0b000, 'P'),
            (0b001, 'P'),
            (0b010, 'P'),
            (0b011, 'P'),
            (0b100, 'C'),
            (0b101, 'B'),
            (0b110, 'U'),
            (0b111, 'U'),
        ];
        for (index, prefix) in expected {
            assert_eq!(DTC_PREFIXES[index], prefix);
            let chunk = format!("{:X}000", index << 1);
            assert!(decode_chunk(&chunk).unwrap().starts_with(prefix));
        }
    }

    #[test]
    fn decoding_is_stable() {
        for chunk in ["0301", "0171", "8001", "C123", "fA0b"] {
            assert_eq!(decode_chunk(chunk), decode_chunk(chunk));
        }
        assert_eq!(decode_chunk("0301").as_deref(), Some("P0301"));
        assert_eq!(decode_chunk("1234").as_deref(), Some("P1234"));
        assert_eq!(decode_chunk("D001").as_deref(), Some("U1001"));
    }

    #[test]
    fn rejects_malformed_chunks() {
        assert_eq!(decode_chunk("A0"), None);
        assert_eq!(decode_chunk("03011"), None);
        assert_eq!(decode_chunk("G301"), None);
    }

    #[test]
    fn no_data_and_empty_mean_no_faults() {
        assert!(codes("").is_empty());
        assert!(codes("NODATA").is_empty());
        assert!(codes("NO DATA\r\r>").is_empty());
        assert!(decode_response("NO DATA", &DtcTable::standard())
            .skipped
            .is_empty());
    }

    #[test]
    fn trailing_partial_chunk_is_skipped() {
        let decoded = decode_response("430301A0", &DtcTable::standard());
        assert_eq!(decoded.codes.len(), 1);
        assert_eq!(decoded.codes[0].code, "P0301");
        assert_eq!(decoded.codes[0].description, "Cylinder 1 Misfire Detected");
        assert_eq!(
            decoded.skipped,
            vec![DecodeSkipped {
                line: 0,
                offset: 4,
                chunk: "A0".to_owned(),
                reason: SkipReason::Truncated,
            }]
        );
    }

    #[test]
    fn padding_is_never_a_code() {
        assert!(codes("0000").is_empty());
        assert!(codes("43 00 00 00 00 00 00").is_empty());
        assert_eq!(codes("4300000171"), vec!["P0171"]);
        assert_eq!(codes("4301710000"), vec!["P0171"]);
    }

    #[test]
    fn decodes_every_line() {
        let raw = "43 01 33 00 00 00 00\r43 03 01 04 20 00 00\r\r>";
        assert_eq!(codes(raw), vec!["P0133", "P0301", "P0420"]);
    }

    #[test]
    fn bad_chunk_does_not_discard_the_rest() {
        let decoded = decode_response("43ZZ0103010", &DtcTable::standard());
        let found: Vec<_> = decoded.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(found, vec!["P0301"]);
        assert_eq!(decoded.skipped.len(), 2);
        assert_eq!(decoded.skipped[0].reason, SkipReason::NotHex);
        assert_eq!(decoded.skipped[1].reason, SkipReason::Truncated);
    }

    #[test]
    fn codes_get_unique_ids_and_table_entries() {
        let decoded = decode_response("4303010301FFFF", &DtcTable::standard());
        assert_eq!(decoded.codes.len(), 3);
        assert_ne!(decoded.codes[0].id, decoded.codes[1].id);
        assert_eq!(decoded.codes[2].code, "U1FFF");
        assert_eq!(decoded.codes[2].description, crate::commands::UNKNOWN_DESCRIPTION);
        assert_eq!(decoded.codes[2].severity, crate::commands::Severity::Medium);
    }
}
