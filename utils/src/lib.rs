//! Primitives shared across the server that have no dependency on the archive codec.

use std::fmt::Write as _;

pub mod bit_array;
pub use bit_array::BitArray;

/// Renders bytes as a lowercase hexadecimal string.
///
/// Used to log packed archive buffers.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Parses a hexadecimal string into bytes.
///
/// Returns `None` if the string has an odd number of digits or contains a non-hexadecimal
/// character.
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    let digits = hex.as_bytes();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16)?;
            let low = (pair[1] as char).to_digit(16)?;
            Some((high << 4 | low) as u8)
        })
        .collect()
}

/// Parses a hexadecimal dump, ignoring whitespace and an optional `0x` prefix.
///
/// Convenient for pasting captured packets into tests.
pub fn from_hex_formatted(hex: &str) -> Option<Vec<u8>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    from_hex(hex.strip_prefix("0x").unwrap_or(&hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0xEF, 0x01]), "ef01");
        assert_eq!(hex(&[0x00, 0x8F, 0x03]), "008f03");

        let cases: [&[u8]; 4] = [&[], &[0x01], &[0x01, 0x02, 0x03], &[0xFF; 16]];
        for bytes in cases {
            assert_eq!(from_hex(&hex(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(from_hex("0102030").is_none());
        assert!(from_hex("01g3").is_none());
        assert!(from_hex("0x01").is_none());
        assert!(from_hex("é").is_none());
        assert!(from_hex("éé").is_none());
        assert!(from_hex("0é").is_none());
    }

    #[test]
    fn test_from_hex_uppercase() {
        assert_eq!(from_hex("EF01").unwrap(), vec![0xEF, 0x01]);
    }

    #[test]
    fn test_from_hex_formatted() {
        assert_eq!(from_hex_formatted("").unwrap(), Vec::<u8>::new());
        assert_eq!(
            from_hex_formatted("0xef01 ac02\n\t8f03").unwrap(),
            vec![0xEF, 0x01, 0xAC, 0x02, 0x8F, 0x03]
        );
        assert!(from_hex_formatted("0x ef0").is_none());
    }
}
