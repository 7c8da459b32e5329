//! Big-endian (network byte order) primitive reading and writing.
//!
//! All multi-byte values are emitted most-significant byte first regardless
//! of the host CPU, so `0x01020304u32` always becomes `01 02 03 04` on the wire.
//!
//! [`BigEndianReader`] walks a borrowed byte slice with a cursor and fails with
//! [`CodecError::UnexpectedEndOfData`] instead of panicking when the buffer runs
//! out. [`BigEndianWriter`] appends to a growable buffer and supports
//! back-patching fixed-width fields at an earlier offset.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, CodecResult};

// ============================================================================
// Reader
// ============================================================================

/// Cursor over an in-memory buffer reading big-endian primitives.
#[derive(Debug, Clone)]
pub struct BigEndianReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BigEndianReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BigEndianReader { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> CodecResult<()> {
        if pos > self.data.len() {
            return Err(CodecError::UnexpectedEndOfData {
                offset: pos,
                needed: 0,
                remaining: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Consume `n` bytes and return them as a slice.
    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEndOfData {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read an unsigned 8-bit integer.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a signed 8-bit integer.
    pub fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.take(1)?.get_i8())
    }

    /// Read a single byte as a boolean (non-zero is `true`).
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(self.take(2)?.get_u16())
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16(&mut self) -> CodecResult<i16> {
        Ok(self.take(2)?.get_i16())
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(self.take(4)?.get_u32())
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(self.take(4)?.get_i32())
    }

    /// Read an unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(self.take(8)?.get_u64())
    }

    /// Read a signed 64-bit integer.
    pub fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(self.take(8)?.get_i64())
    }

    /// Read an IEEE 754 single precision float.
    pub fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(self.take(4)?.get_f32())
    }

    /// Read an IEEE 754 double precision float.
    pub fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(self.take(8)?.get_f64())
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        self.take(n)
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a fixed-length ASCII character array.
    pub fn read_chars(&mut self, n: usize) -> CodecResult<String> {
        let start = self.pos;
        let bytes = self.take(n)?;
        if !bytes.is_ascii() {
            return Err(CodecError::InvalidUtf8(start));
        }
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// Read `n` bytes as UTF-8 text.
    pub fn read_utf8(&mut self, n: usize) -> CodecResult<String> {
        let start = self.pos;
        let bytes = self.take(n)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8(start))
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Growable buffer writing big-endian primitives.
#[derive(Debug, Default, Clone)]
pub struct BigEndianWriter {
    buf: BytesMut,
}

impl BigEndianWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        BigEndianWriter {
            buf: BytesMut::new(),
        }
    }

    /// Create a writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        BigEndianWriter {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Current write position (number of bytes written so far).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Write an unsigned 8-bit integer.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a signed 8-bit integer.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    /// Write a boolean as a single `0`/`1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write an unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Write a signed 16-bit integer.
    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    /// Write an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Write a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Write an unsigned 64-bit integer.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Write a signed 64-bit integer.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// Write an IEEE 754 single precision float.
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    /// Write an IEEE 754 double precision float.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write an ASCII character array such as a magic identifier.
    pub fn write_chars(&mut self, chars: &str) -> CodecResult<()> {
        if !chars.is_ascii() {
            return Err(CodecError::InvalidUtf8(self.position()));
        }
        self.buf.put_slice(chars.as_bytes());
        Ok(())
    }

    /// Overwrite a previously written byte.
    pub fn patch_u8(&mut self, offset: usize, value: u8) -> CodecResult<()> {
        self.patch(offset, &[value])
    }

    /// Overwrite a previously written unsigned 32-bit integer.
    pub fn patch_u32(&mut self, offset: usize, value: u32) -> CodecResult<()> {
        self.patch(offset, &value.to_be_bytes())
    }

    fn patch(&mut self, offset: usize, bytes: &[u8]) -> CodecResult<()> {
        let end = offset + bytes.len();
        if end > self.buf.len() {
            return Err(CodecError::UnexpectedEndOfData {
                offset,
                needed: bytes.len(),
                remaining: self.buf.len().saturating_sub(offset),
            });
        }
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// View the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finish writing and return the frozen buffer.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Finish writing and return the bytes as a vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_wire_order() {
        let mut writer = BigEndianWriter::new();
        writer.write_u32(0x0102_0304);
        assert_eq!(writer.as_slice(), &[0x01, 0x02, 0x03, 0x04]);

        let mut reader = BigEndianReader::new(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(reader.read_u32().unwrap(), 0x0102_0304);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_mixed_primitives() {
        let mut writer = BigEndianWriter::new();
        writer.write_u8(0xAB);
        writer.write_i8(-2);
        writer.write_u16(0xBEEF);
        writer.write_i16(-300);
        writer.write_i32(-70_000);
        writer.write_u64(0x0102_0304_0506_0708);
        writer.write_i64(-1);
        writer.write_f32(1.5);
        writer.write_f64(-2.25);
        writer.write_bool(true);
        let bytes = writer.into_vec();

        assert_eq!(&bytes[2..4], &[0xBE, 0xEF]);
        assert_eq!(&bytes[10..18], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut reader = BigEndianReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_i8().unwrap(), -2);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_i16().unwrap(), -300);
        assert_eq!(reader.read_i32().unwrap(), -70_000);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(reader.read_i64().unwrap(), -1);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_f64().unwrap(), -2.25);
        assert!(reader.read_bool().unwrap());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = BigEndianReader::new(&[0x00, 0x01, 0x02]);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEndOfData {
                offset: 0,
                needed: 4,
                remaining: 3
            }
        );
        // A failed read does not move the cursor.
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16().unwrap(), 0x0001);
    }

    #[test]
    fn test_chars_and_utf8() {
        let mut writer = BigEndianWriter::new();
        writer.write_chars("MDRQ").unwrap();
        writer.write_bytes("héllo".as_bytes());
        let bytes = writer.into_vec();

        let mut reader = BigEndianReader::new(&bytes);
        assert_eq!(reader.read_chars(4).unwrap(), "MDRQ");
        assert_eq!(reader.read_utf8(6).unwrap(), "héllo");

        let mut reader = BigEndianReader::new(&[0xFF, 0xFE]);
        assert_eq!(reader.read_utf8(2).unwrap_err(), CodecError::InvalidUtf8(0));
    }

    #[test]
    fn test_patch() {
        let mut writer = BigEndianWriter::new();
        writer.write_u32(0);
        writer.write_u8(0);
        writer.patch_u32(0, 0xDEAD_BEEF).unwrap();
        writer.patch_u8(4, 7).unwrap();
        assert_eq!(writer.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF, 7]);

        assert!(writer.patch_u32(2, 1).is_err());
    }

    proptest::proptest! {
        #[test]
        fn test_scalar_roundtrip(a: u16, b: i32, c: i64, d: f64, e: f32) {
            let mut writer = BigEndianWriter::new();
            writer.write_u16(a);
            writer.write_i32(b);
            writer.write_i64(c);
            writer.write_f64(d);
            writer.write_f32(e);
            let bytes = writer.into_vec();
            proptest::prop_assert_eq!(&bytes[0..2], &a.to_be_bytes()[..]);

            let mut reader = BigEndianReader::new(&bytes);
            proptest::prop_assert_eq!(reader.read_u16().unwrap(), a);
            proptest::prop_assert_eq!(reader.read_i32().unwrap(), b);
            proptest::prop_assert_eq!(reader.read_i64().unwrap(), c);
            proptest::prop_assert_eq!(reader.read_f64().unwrap().to_bits(), d.to_bits());
            proptest::prop_assert_eq!(reader.read_f32().unwrap().to_bits(), e.to_bits());
        }
    }

    #[test]
    fn test_seek() {
        let data = [1u8, 2, 3, 4];
        let mut reader = BigEndianReader::new(&data);
        reader.seek(2).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert!(reader.seek(5).is_err());
    }
}
