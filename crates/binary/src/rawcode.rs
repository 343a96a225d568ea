//! Raw code encoding
//!
//! A raw code is a 1-4 character identifier (`hfoo`, `AHbz`, ...) packed
//! into an `i32`. Values in `1..=255` use a single byte; everything else
//! uses four bytes in reversed (big-endian-like) order.
//!
//! # Carry chain
//! The encoded bytes never contain 0x00 (null sentinel) or 0xFF. While
//! encoding, every byte >= 0x80 carries one into the next more significant
//! byte. Decoding undoes this: a byte >= 0x80 decrements the byte to its
//! left. A carry that would have to pass through 0xFF cannot be represented.
//!
//! # Text form
//! Encoded bytes map one-to-one onto Latin-1 characters, so a code can be
//! rendered as a 4 character string and comma lists of codes can live in
//! ordinary string fields.

use crate::RawCodeError;
use std::fmt;

type Result<T> = std::result::Result<T, RawCodeError>;

/// Separator used by the list forms
pub const LIST_SEPARATOR: char = ',';

/// Encode an integer into its 1 or 4 byte raw code
pub fn encode(value: i32) -> Result<Vec<u8>> {
    if (1..=255).contains(&value) {
        return Ok(vec![value as u8]);
    }

    let mut bytes = value.to_le_bytes();
    let mut carry = false;

    for byte in bytes.iter_mut() {
        if *byte == 0x00 {
            return Err(RawCodeError::NullByte);
        }
        if carry {
            if *byte >= 0xFE {
                return Err(RawCodeError::Overflow { value });
            }
            *byte += 1;
        }
        if *byte == 0xFF {
            return Err(RawCodeError::Unsupported);
        }
        carry = *byte >= 0x80;
    }

    bytes.reverse();
    Ok(bytes.to_vec())
}

/// Decode a 1 or 4 byte raw code
pub fn decode(bytes: &[u8]) -> Result<i32> {
    match bytes.len() {
        1 => match bytes[0] {
            0x00 => Err(RawCodeError::NullByte),
            b => Ok(i32::from(b)),
        },
        4 => {
            let mut adjusted = [bytes[0], bytes[1], bytes[2], bytes[3]];
            for (i, &stored) in bytes.iter().enumerate() {
                match stored {
                    0x00 => return Err(RawCodeError::NullByte),
                    0xFF => return Err(RawCodeError::Unsupported),
                    _ => {}
                }
                if i > 0 && stored >= 0x80 {
                    adjusted[i - 1] = adjusted[i - 1].wrapping_sub(1);
                    // Undoing the carry must not expose the null sentinel
                    if adjusted[i - 1] == 0x00 {
                        return Err(RawCodeError::NullByte);
                    }
                }
            }
            adjusted.reverse();
            Ok(i32::from_le_bytes(adjusted))
        }
        n => Err(RawCodeError::InvalidLength(n)),
    }
}

/// Convert text to bytes, one byte per character
fn latin1_bytes(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| RawCodeError::InvalidChar(c)))
        .collect()
}

/// Convert bytes to text, one character per byte
fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decode a comma separated list of 4 character codes
///
/// Returns `None` ("not a list") if any token is not exactly a 4 byte code,
/// so callers can fall back to treating the text as an opaque string.
pub fn decode_list(text: &str) -> Option<Vec<i32>> {
    text.split(LIST_SEPARATOR)
        .map(|token| {
            let bytes = latin1_bytes(token).ok()?;
            if bytes.len() != 4 {
                return None;
            }
            decode(&bytes).ok()
        })
        .collect()
}

/// Encode integers as a comma separated list of codes
pub fn encode_list(values: &[i32]) -> Result<String> {
    let codes = values
        .iter()
        .map(|&v| encode(v).map(|bytes| latin1_string(&bytes)))
        .collect::<Result<Vec<_>>>()?;
    Ok(codes.join(","))
}

/// An identifier packed into an `i32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawCode(pub i32);

impl RawCode {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i32 {
        self.0
    }

    /// Parse a tag such as `"hfoo"`
    pub fn from_tag(tag: &str) -> Result<Self> {
        let bytes = latin1_bytes(tag)?;
        decode(&bytes).map(Self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes).map(Self)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self.0)
    }

    /// Render the tag text (1 byte codes render as their single character)
    pub fn to_tag(&self) -> Result<String> {
        self.encode().map(|bytes| latin1_string(&bytes))
    }
}

impl From<i32> for RawCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RawCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(bytes) if bytes.len() == 4 => write!(f, "{}", latin1_string(&bytes)),
            _ => write!(f, "{}", self.0),
        }
    }
}
