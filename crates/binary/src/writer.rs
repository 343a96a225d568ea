//! Byte writer
//!
//! Mirror of [`ByteCursor`](crate::ByteCursor): every `read_*` has a matching
//! `write_*` that produces the same on-disk form.

use crate::{BinaryError, Endian, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Appending writer backed by `BytesMut`
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: BytesMut,
    endian: Endian,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::with_endian(Endian::Little)
    }

    pub fn with_endian(endian: Endian) -> Self {
        Self {
            buf: BytesMut::new(),
            endian,
        }
    }

    /// Offset the next write will land at
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.put_u8(val);
    }

    pub fn write_i32(&mut self, val: i32) {
        if self.endian.is_reversed() {
            self.buf.put_i32(val);
        } else {
            self.buf.put_i32_le(val);
        }
    }

    pub fn write_u32(&mut self, val: u32) {
        self.write_i32(val as i32);
    }

    /// Floats are always little-endian
    pub fn write_f32(&mut self, val: f32) {
        self.buf.put_f32_le(val);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a flag as a 0/1 int32
    pub fn write_bool_i32(&mut self, val: bool) {
        self.write_i32(i32::from(val));
    }

    /// Write UTF-8 text, optionally followed by a null terminator
    pub fn write_string(&mut self, val: &str, terminated: bool) {
        self.buf.put_slice(val.as_bytes());
        if terminated {
            self.buf.put_u8(0);
        }
    }

    pub fn write_cstring(&mut self, val: &str) {
        self.write_string(val, true);
    }

    /// Overwrite an int32 already written at `offset`
    ///
    /// Used to back-patch counts once the number of records is known.
    pub fn write_i32_at(&mut self, offset: usize, val: i32) -> Result<()> {
        let end = offset.checked_add(4).filter(|&end| end <= self.buf.len());
        let Some(end) = end else {
            return Err(BinaryError::SeekOutOfRange {
                position: offset,
                len: self.buf.len(),
            });
        };

        let bytes = if self.endian.is_reversed() {
            val.to_be_bytes()
        } else {
            val.to_le_bytes()
        };
        self.buf[offset..end].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteCursor;

    #[test]
    fn test_writer_mirrors_cursor() {
        let mut writer = ByteWriter::new();
        writer.write_i32(-2);
        writer.write_f32(0.25);
        writer.write_u8(9);
        writer.write_cstring("Untitled Trigger 001");
        writer.write_bool_i32(true);

        let data = writer.into_vec();
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_i32().unwrap(), -2);
        assert_eq!(cursor.read_f32().unwrap(), 0.25);
        assert_eq!(cursor.read_u8().unwrap(), 9);
        assert_eq!(cursor.read_cstring().unwrap(), "Untitled Trigger 001");
        assert_eq!(cursor.read_bool_i32().unwrap(), Some(true));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_big_endian_write() {
        let mut writer = ByteWriter::with_endian(Endian::Big);
        writer.write_i32(1);
        assert_eq!(writer.as_slice(), &[0, 0, 0, 1]);
    }

    #[test]
    fn test_unterminated_string() {
        let mut writer = ByteWriter::new();
        writer.write_string("abc", false);
        assert_eq!(writer.as_slice(), b"abc");
    }

    #[test]
    fn test_back_patch_count() {
        let mut writer = ByteWriter::new();
        let count_pos = writer.position();
        writer.write_i32(0);
        writer.write_cstring("x");
        writer.write_i32_at(count_pos, 3).unwrap();

        let data = writer.freeze();
        assert_eq!(&data[..4], &[3, 0, 0, 0]);
        assert!(ByteWriter::new().write_i32_at(0, 1).is_err());
    }
}
