//! # MapKit Binary Library
//!
//! Low-level primitives shared by every map-file codec.
//!
//! ## Architecture
//!
//! ### 1. Cursor ([`cursor`])
//! Random-access reader over an in-memory buffer:
//! - Position get/set for checkpoint and rewind
//! - int32 / float32 / byte / byte-slice reads
//! - Positional `*_at` reads that leave the cursor untouched
//! - Null-terminated strings
//!
//! ### 2. Writer ([`writer`])
//! The write mirror of the cursor, backed by [`bytes::BytesMut`].
//!
//! ### 3. Raw codes ([`rawcode`])
//! Bijective packing of 1-4 character ASCII identifiers into an `i32`,
//! with carry-chain overflow detection and comma-separated list forms.
//!
//! ## Usage Example
//!
//! ```rust
//! use mapkit_binary::{ByteCursor, ByteWriter, RawCode};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_i32(7);
//! writer.write_cstring("hfoo");
//!
//! let data = writer.into_vec();
//! let mut cursor = ByteCursor::new(&data);
//! assert_eq!(cursor.read_i32().unwrap(), 7);
//!
//! let tag = cursor.read_cstring().unwrap();
//! let code = RawCode::from_tag(&tag).unwrap();
//! assert_eq!(code.to_string(), "hfoo");
//! ```

pub mod error;
pub mod cursor;
pub mod writer;
pub mod rawcode;

pub use error::{BinaryError, RawCodeError, Result};
pub use cursor::ByteCursor;
pub use writer::ByteWriter;
pub use rawcode::{RawCode, decode_list, encode_list};
pub use mapkit_core::Endian;
