use proptest::prelude::*;

use ballot_types::{Hash256, Timestamp};

proptest! {
    /// Hex encoding always round-trips through parsing.
    #[test]
    fn hash_hex_round_trips(bytes in prop::array::uniform32(0u8..)) {
        let h = Hash256::new(bytes);
        let hex = h.to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        let parsed: Hash256 = hex.parse().unwrap();
        prop_assert_eq!(parsed, h);
    }

    /// Leading-zero count never exceeds 64 and matches the rendered hex.
    #[test]
    fn leading_zeros_match_rendering(bytes in prop::array::uniform32(0u8..)) {
        let h = Hash256::new(bytes);
        let n = h.leading_zero_digits() as usize;
        prop_assert!(n <= 64);
        let hex = h.to_hex();
        prop_assert!(hex[..n].chars().all(|c| c == '0'));
        if n < 64 {
            prop_assert_ne!(hex.as_bytes()[n], b'0');
        }
    }

    /// RFC 3339 rendering round-trips for any plausible timestamp.
    #[test]
    fn timestamp_round_trips(secs in 0i64..4_102_444_800) {
        let ts = Timestamp::new(secs);
        let parsed = Timestamp::parse_rfc3339(&ts.to_rfc3339()).unwrap();
        prop_assert_eq!(parsed, ts);
    }

    /// Rendering the same seconds value twice yields identical strings —
    /// the string feeds the block hash preimage, so this is a protocol
    /// invariant, not a convenience.
    #[test]
    fn timestamp_rendering_deterministic(secs in 0i64..4_102_444_800) {
        let ts = Timestamp::new(secs);
        prop_assert_eq!(ts.to_rfc3339(), ts.to_rfc3339());
    }
}
