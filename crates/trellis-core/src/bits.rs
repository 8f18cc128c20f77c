//! Bit sequence helpers
//!
//! Conversions between `"1011"`-style strings and unpacked bit vectors, plus
//! the validation every pipeline stage applies to its inputs.
//!
//! ## Example
//!
//! ```rust
//! use trellis_core::bits::{format_bits, parse_bits};
//!
//! let bits = parse_bits("1011000").unwrap();
//! assert_eq!(bits, vec![1, 0, 1, 1, 0, 0, 0]);
//! assert_eq!(format_bits(&bits), "1011000");
//! ```

use crate::types::{Bit, BitVec, CodecError, CodecResult};

/// Parse a string of `'0'`/`'1'` characters into bits.
///
/// Whitespace and `_` separators are skipped so long test vectors can be
/// grouped by symbol.
pub fn parse_bits(text: &str) -> CodecResult<BitVec> {
    let mut bits = Vec::with_capacity(text.len());
    for (position, ch) in text.chars().enumerate() {
        match ch {
            '0' => bits.push(0),
            '1' => bits.push(1),
            c if c.is_whitespace() || c == '_' => {}
            other => {
                return Err(CodecError::InvalidInput {
                    position,
                    value: u8::try_from(u32::from(other)).unwrap_or(u8::MAX),
                })
            }
        }
    }
    Ok(bits)
}

/// Render bits as a `'0'`/`'1'` string.
pub fn format_bits(bits: &[Bit]) -> String {
    bits.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}

/// Check that every value is `0` or `1`.
pub fn validate_bits(bits: &[Bit]) -> CodecResult<()> {
    match bits.iter().position(|&b| b > 1) {
        Some(position) => Err(CodecError::InvalidInput {
            position,
            value: bits[position],
        }),
        None => Ok(()),
    }
}

/// Return the bitwise complement.
pub fn invert(bits: &[Bit]) -> BitVec {
    bits.iter().map(|&b| b ^ 1).collect()
}

/// Count the ones in a bit sequence.
pub fn weight(bits: &[Bit]) -> usize {
    bits.iter().filter(|&&b| b == 1).count()
}
