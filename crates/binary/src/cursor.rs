//! Seekable byte reader
//!
//! [`ByteCursor`] reads from a fully materialized buffer and tracks its
//! position explicitly, so callers can checkpoint with [`ByteCursor::position`]
//! and rewind with [`ByteCursor::set_position`] after a speculative parse.

use crate::{BinaryError, Endian, Result};
use bytes::Buf;

/// Default string terminator
pub const NULL_TERMINATOR: u8 = 0x00;

/// Random-access reader over an in-memory buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    /// Create a little-endian cursor at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_endian(data, Endian::Little)
    }

    /// Create a cursor with an explicit integer byte order
    pub fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self { data, pos: 0, endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Seek to an absolute offset
    ///
    /// Seeking to exactly `len()` is allowed (end of buffer).
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(BinaryError::SeekOutOfRange {
                position,
                len: self.data.len(),
            });
        }
        self.pos = position;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Advance the cursor without reading
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Fail with `Underrun` unless `n` more bytes are available
    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(BinaryError::Underrun {
                position: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Slice starting at the cursor, for `Buf` reads
    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let val = self.rest().get_u8();
        self.pos += 1;
        Ok(val)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        let mut rest = self.rest();
        let val = if self.endian.is_reversed() {
            rest.get_i32()
        } else {
            rest.get_i32_le()
        };
        self.pos += 4;
        Ok(val)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_i32()? as u32)
    }

    /// Read a float32 in the buffer's native (little-endian) order
    ///
    /// The endian flag only applies to integers.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        let val = self.rest().get_f32_le();
        self.pos += 4;
        Ok(val)
    }

    /// Read `n` bytes, borrowing from the underlying buffer
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read an int32 that must be 0 or 1
    ///
    /// Returns `None` for any other value; the cursor still advances.
    pub fn read_bool_i32(&mut self) -> Result<Option<bool>> {
        Ok(match self.read_i32()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        })
    }

    /// Read an int32 without advancing
    pub fn peek_i32(&self) -> Result<i32> {
        self.read_i32_at(self.pos)
    }

    /// Read a null-terminated string, consuming the terminator
    pub fn read_cstring(&mut self) -> Result<String> {
        self.read_string_until(NULL_TERMINATOR, true)
    }

    /// Read text up to `terminator`
    ///
    /// With `consume_terminator == false` the cursor is left on the
    /// terminator byte. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string_until(&mut self, terminator: u8, consume_terminator: bool) -> Result<String> {
        let start = self.pos;
        let len = self
            .rest()
            .iter()
            .position(|&b| b == terminator)
            .ok_or(BinaryError::MissingTerminator {
                position: start,
                terminator,
            })?;

        let raw = &self.data[start..start + len];
        let text = match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(e) => {
                tracing::trace!("Non UTF-8 string at {}: {}", start, e);
                String::from_utf8_lossy(raw).into_owned()
            }
        };

        self.pos = start + len;
        if consume_terminator {
            self.pos += 1;
        }
        Ok(text)
    }

    /// Run `read` at `offset`, then restore the original position
    ///
    /// The position is restored whether or not the read succeeds.
    fn at<T>(&self, offset: usize, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut probe = self.clone();
        probe.set_position(offset)?;
        read(&mut probe)
    }

    pub fn read_u8_at(&self, offset: usize) -> Result<u8> {
        self.at(offset, |c| c.read_u8())
    }

    pub fn read_i32_at(&self, offset: usize) -> Result<i32> {
        self.at(offset, |c| c.read_i32())
    }

    pub fn read_f32_at(&self, offset: usize) -> Result<f32> {
        self.at(offset, |c| c.read_f32())
    }

    pub fn read_bytes_at(&self, offset: usize, n: usize) -> Result<&'a [u8]> {
        self.at(offset, |c| c.read_bytes(n))
    }

    pub fn read_cstring_at(&self, offset: usize) -> Result<String> {
        self.at(offset, |c| c.read_cstring())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_i32_little_and_big() {
        let data = [0x01, 0x00, 0x00, 0x00];

        let mut le = ByteCursor::new(&data);
        assert_eq!(le.read_i32().unwrap(), 1);
        assert_eq!(le.position(), 4);

        let mut be = ByteCursor::with_endian(&data, Endian::Big);
        assert_eq!(be.read_i32().unwrap(), 0x0100_0000);
    }

    #[test]
    fn test_float_ignores_endian_flag() {
        let data = 1.5f32.to_le_bytes();
        let mut be = ByteCursor::with_endian(&data, Endian::Big);
        assert_eq!(be.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn test_underrun() {
        let data = [0x01, 0x02];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.read_i32().unwrap_err();

        assert!(err.is_underrun());
        assert_eq!(
            err,
            BinaryError::Underrun { position: 0, needed: 4, remaining: 2 }
        );
        // Failed reads do not move the cursor
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_checkpoint_and_rewind() {
        let data = [1, 0, 0, 0, 2, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);

        let checkpoint = cursor.position();
        assert_eq!(cursor.read_i32().unwrap(), 1);
        assert_eq!(cursor.read_i32().unwrap(), 2);
        assert!(cursor.is_at_end());

        cursor.set_position(checkpoint).unwrap();
        assert_eq!(cursor.read_i32().unwrap(), 1);

        assert!(cursor.set_position(9).is_err());
        assert!(cursor.set_position(8).is_ok());
    }

    #[test]
    fn test_positional_reads_restore_position() {
        let data = [7, 0, 0, 0, b'h', b'i', 0, 9];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(1).unwrap();

        assert_eq!(cursor.read_i32_at(0).unwrap(), 7);
        assert_eq!(cursor.read_cstring_at(4).unwrap(), "hi");
        assert_eq!(cursor.read_u8_at(7).unwrap(), 9);
        assert_eq!(cursor.read_bytes_at(4, 2).unwrap(), b"hi");
        assert!(cursor.read_i32_at(6).is_err());

        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_read_cstring() {
        let data = b"Map Init\0Melee\0";
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_cstring().unwrap(), "Map Init");
        assert_eq!(cursor.read_cstring().unwrap(), "Melee");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_read_string_without_consuming_terminator() {
        let data = b"a,b";
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_string_until(b',', false).unwrap(), "a");
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u8().unwrap(), b',');
    }

    #[test]
    fn test_missing_terminator() {
        let data = b"no end";
        let mut cursor = ByteCursor::new(data);
        let err = cursor.read_cstring().unwrap_err();

        assert!(err.is_underrun());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_bool_i32() {
        let data = [1, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_bool_i32().unwrap(), Some(true));
        assert_eq!(cursor.read_bool_i32().unwrap(), Some(false));
        assert_eq!(cursor.read_bool_i32().unwrap(), None);
    }
}
