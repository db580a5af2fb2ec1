//! Binary wire primitives
//!
//! Fixed-width integers are big-endian. Counts and version counters use
//! 7-bit variable-length groups, least significant first. Every stream
//! carries the negotiated peer `WireVersion` so version gates resolve the
//! same way on both sides.

mod generic;
mod input;
mod output;

pub use input::StreamInput;
pub use output::StreamOutput;

/// Generic value type tags
pub(crate) mod value_type {
    pub const NULL: i8 = -1;
    pub const STRING: i8 = 0;
    pub const INT: i8 = 1;
    pub const LONG: i8 = 2;
    pub const FLOAT: i8 = 3;
    pub const DOUBLE: i8 = 4;
    pub const BOOLEAN: i8 = 5;
    pub const LIST: i8 = 7;
    pub const OBJECT_ARRAY: i8 = 8;
    pub const ORDERED_MAP: i8 = 9;
    pub const HASH_MAP: i8 = 10;
    pub const BYTE: i8 = 11;
    pub const SHORT: i8 = 16;
}

/// Optional boolean encoding
pub(crate) const OPTIONAL_FALSE: u8 = 0;
pub(crate) const OPTIONAL_TRUE: u8 = 1;
pub(crate) const OPTIONAL_NONE: u8 = 2;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::WireVersion;
    use serde_json::json;

    fn round_trip<F, G, T>(write: F, read: G) -> T
    where
        F: FnOnce(&mut StreamOutput),
        G: FnOnce(&mut StreamInput<'_>) -> T,
    {
        let mut out = StreamOutput::new(WireVersion::CURRENT);
        write(&mut out);
        let bytes = out.into_bytes();
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        let value = read(&mut input);
        assert_eq!(input.remaining(), 0, "reader must consume the whole buffer");
        value
    }

    // =========================================================================
    // Variable-length integers
    // =========================================================================

    #[test]
    fn test_vint_encoding_matches_peer_layout() {
        let mut out = StreamOutput::new(WireVersion::CURRENT);
        out.write_vint(0);
        out.write_vint(127);
        out.write_vint(128);
        out.write_vint(300);
        assert_eq!(out.as_bytes(), &[0x00, 0x7f, 0x80, 0x01, 0xac, 0x02]);
    }

    #[test]
    fn test_negative_vint_takes_five_bytes() {
        let mut out = StreamOutput::new(WireVersion::CURRENT);
        out.write_vint(-1);
        assert_eq!(out.len(), 5);

        let value = round_trip(|o| o.write_vint(-1), |i| i.read_vint().unwrap());
        assert_eq!(value, -1);
    }

    #[test]
    fn test_vlong_round_trip_extremes() {
        for v in [0u64, 1, 127, 128, 1 << 35, i64::MAX as u64, u64::MAX] {
            let read = round_trip(|o| o.write_vlong(v), |i| i.read_vlong().unwrap());
            assert_eq!(read, v);
        }
    }

    #[test]
    fn test_overlong_vint_rejected() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        assert!(input.read_vint().is_err());
    }

    // =========================================================================
    // Strings
    // =========================================================================

    #[test]
    fn test_string_counts_utf16_units() {
        let mut out = StreamOutput::new(WireVersion::CURRENT);
        out.write_string("h\u{e9}\u{20ac}");
        // 3 units: 1 byte, 2 bytes, 3 bytes
        assert_eq!(out.as_bytes(), &[3, b'h', 0xc3, 0xa9, 0xe2, 0x82, 0xac]);
    }

    #[test]
    fn test_string_round_trip_with_surrogate_pairs() {
        let text = "orders \u{1f600} \u{0} end";
        let read = round_trip(|o| o.write_string(text), |i| i.read_string().unwrap());
        assert_eq!(read, text);
    }

    #[test]
    fn test_string_rejects_invalid_lead_byte() {
        let bytes = [1u8, 0x90];
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        assert!(input.read_string().is_err());
    }

    // =========================================================================
    // Booleans
    // =========================================================================

    #[test]
    fn test_boolean_rejects_other_bytes() {
        let bytes = [3u8];
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        assert!(input.read_bool().is_err());
    }

    #[test]
    fn test_optional_boolean_tristate() {
        let read = round_trip(
            |o| {
                o.write_optional_bool(Some(true));
                o.write_optional_bool(Some(false));
                o.write_optional_bool(None);
            },
            |i| {
                (
                    i.read_optional_bool().unwrap(),
                    i.read_optional_bool().unwrap(),
                    i.read_optional_bool().unwrap(),
                )
            },
        );
        assert_eq!(read, (Some(true), Some(false), None));
    }

    // =========================================================================
    // Generic values
    // =========================================================================

    #[test]
    fn test_generic_value_round_trip() {
        let value = json!({
            "name": "orders",
            "small": 7,
            "big": 5_000_000_000i64,
            "ratio": 0.25,
            "flag": true,
            "nothing": null,
            "tags": ["a", "b"],
            "nested": {"inner": [1, {"k": "v"}]}
        });
        let read = round_trip(
            |o| o.write_generic_value(&value),
            |i| i.read_generic_value().unwrap(),
        );
        assert_eq!(read, value);
    }

    #[test]
    fn test_generic_value_unknown_type_is_decode_error() {
        let bytes = [42u8];
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        assert!(input.read_generic_value().is_err());
    }

    // =========================================================================
    // Skipping
    // =========================================================================

    #[test]
    fn test_skip_past_end_is_corruption() {
        let bytes = [1u8, 2, 3];
        let mut input = StreamInput::new(&bytes, WireVersion::CURRENT);
        let err = input.skip(4).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_skippable_frames_only_at_threshold() {
        let mut framed = StreamOutput::new(WireVersion::V_3_2_0);
        framed
            .write_skippable(|o| {
                o.write_string("abc");
                Ok(())
            })
            .unwrap();
        assert_eq!(framed.as_bytes(), &[4, 3, b'a', b'b', b'c']);

        let mut bare = StreamOutput::new(WireVersion::new(3, 1, 0));
        bare.write_skippable(|o| {
            o.write_string("abc");
            Ok(())
        })
        .unwrap();
        assert_eq!(bare.as_bytes(), &[3, b'a', b'b', b'c']);
    }
}
