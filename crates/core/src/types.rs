//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte order applied to multi-byte integer reads and writes
///
/// Map files are written little-endian; `Big` reverses every integer.
/// Floats are unaffected and always use the buffer's little-endian order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Whether integer bytes are reversed relative to the file's native order
    pub fn is_reversed(self) -> bool {
        matches!(self, Endian::Big)
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little"),
            Endian::Big => write!(f, "big"),
        }
    }
}

impl FromStr for Endian {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Endian::Little),
            "big" | "be" => Ok(Endian::Big),
            other => Err(format!("unknown byte order: {}", other)),
        }
    }
}
