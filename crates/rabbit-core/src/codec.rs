//! Base62 positional codec used to turn sequence numbers into short codes.
//!
//! The alphabet order is part of the public contract: it decides what every
//! issued code looks like, so it must never change once codes are persisted.
//!
//! ```
//! use rabbit_core::codec;
//!
//! assert_eq!(codec::encode(0), "0");
//! assert_eq!(codec::encode(62), "10");
//! assert_eq!(codec::decode("10").unwrap(), 62);
//! ```

use crate::error::{CoreError, Result};

/// Digits, then uppercase, then lowercase letters.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = ALPHABET.len() as u64;

/// Length of `encode(u64::MAX)`.
pub const MAX_ENCODED_LEN: usize = 11;

/// Encodes `n` as a base62 string.
///
/// `0` encodes to `"0"`, never to an empty string.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    let mut buf = [0_u8; MAX_ENCODED_LEN];
    let mut pos = MAX_ENCODED_LEN;
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| char::from(b)).collect()
}

/// Decodes a base62 string produced by [`encode`].
///
/// Rejects empty input, characters outside [`ALPHABET`], leading zeros on
/// multi-character codes and values that do not fit in a `u64`.
pub fn decode(code: &str) -> Result<u64> {
    if code.is_empty() {
        return Err(CoreError::MalformedCode("code is empty".to_string()));
    }

    if code.len() > 1 && code.as_bytes()[0] == ALPHABET[0] {
        return Err(CoreError::MalformedCode(format!(
            "non-canonical leading zero: '{code}'"
        )));
    }

    code.chars().try_fold(0_u64, |acc, c| {
        let digit = digit(c).ok_or_else(|| {
            CoreError::MalformedCode(format!("invalid character '{c}' in '{code}'"))
        })?;
        acc.checked_mul(BASE)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| CoreError::MalformedCode(format!("'{code}' overflows 64 bits")))
    })
}

fn digit(c: char) -> Option<u64> {
    let value = match c {
        '0'..='9' => c as u64 - '0' as u64,
        'A'..='Z' => c as u64 - 'A' as u64 + 10,
        'a'..='z' => c as u64 - 'a' as u64 + 36,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_first_symbol() {
        assert_eq!(encode(0), "0");
        assert_eq!(decode("0").unwrap(), 0);
    }

    #[test]
    fn alphabet_order() {
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "A");
        assert_eq!(encode(35), "Z");
        assert_eq!(encode(36), "a");
        assert_eq!(encode(61), "z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(62 * 62), "100");
    }

    #[test]
    fn digit_table_matches_alphabet() {
        for (i, &b) in ALPHABET.iter().enumerate() {
            assert_eq!(digit(char::from(b)), Some(i as u64));
        }
    }

    #[test]
    fn max_value_fits_in_max_len() {
        let code = encode(u64::MAX);
        assert_eq!(code.len(), MAX_ENCODED_LEN);
        assert_eq!(decode(&code).unwrap(), u64::MAX);
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(decode(""), Err(CoreError::MalformedCode(_))));
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        for bad in ["ab-c", "abc/", " 1", "é", "a_b"] {
            assert!(
                matches!(decode(bad), Err(CoreError::MalformedCode(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_leading_zero() {
        assert!(matches!(decode("01"), Err(CoreError::MalformedCode(_))));
        assert!(matches!(decode("00"), Err(CoreError::MalformedCode(_))));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            decode("zzzzzzzzzzz"),
            Err(CoreError::MalformedCode(_))
        ));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(n in any::<u64>()) {
            prop_assert_eq!(decode(&encode(n)).unwrap(), n);
        }

        #[test]
        fn encode_is_injective(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(encode(a), encode(b));
        }

        #[test]
        fn encoded_codes_only_use_alphabet(n in any::<u64>()) {
            let code = encode(n);
            prop_assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
            prop_assert!(code.len() <= MAX_ENCODED_LEN);
        }
    }
}
