//! Native-endian field access over X protocol buffers.
//!
//! libxcb hands out buffers in host byte order, so every multi-byte field is
//! read and written with `from_ne_bytes`/`to_ne_bytes`.

use std::convert::TryFrom;
use std::ops::Range;

use crate::error::{Error, Result};

/// Number of padding bytes needed to bring `len` to a multiple of 4.
pub fn pad(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// `len` rounded up to a multiple of 4.
pub fn padded(len: usize) -> usize {
    len + pad(len)
}

/// Checks that `len` fits the length field (of type `T`) that will count it.
pub fn check_length<T: TryFrom<usize>>(field: &str, len: usize) -> Result<()> {
    T::try_from(len)
        .map(|_| ())
        .map_err(|_| Error::invalid_arg(format!("`{}` is {} elements long, too many for its length field", field, len)))
}

/// Read-only view used by reply, event and error accessors.
///
/// Fixed-offset reads index directly: callers validate the minimum buffer
/// length once, when the typed wrapper is built.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reader<'a> {
    bytes: &'a [u8],
}

macro_rules! read_ne {
    ($($name:ident: $t:ty,)+) => {
        $(
            #[inline]
            pub fn $name(&self, offset: usize) -> $t {
                const N: usize = ::std::mem::size_of::<$t>();
                let mut raw = [0_u8; N];
                raw.copy_from_slice(&self.bytes[offset..offset + N]);
                <$t>::from_ne_bytes(raw)
            }
        )+
    };
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
    #[inline]
    pub fn u8(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }
    #[inline]
    pub fn i8(&self, offset: usize) -> i8 {
        self.bytes[offset] as i8
    }
    #[inline]
    pub fn bool(&self, offset: usize) -> bool {
        self.bytes[offset] != 0
    }
    read_ne!{
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
    }
    /// Bytes in `range`, clamped to what the buffer actually holds.
    pub fn slice(&self, range: Range<usize>) -> &'a [u8] {
        let end = range.end.min(self.bytes.len());
        let start = range.start.min(end);
        &self.bytes[start..end]
    }
    /// Everything from `offset` to the end of the buffer.
    pub fn tail(&self, offset: usize) -> Reader<'a> {
        Reader::new(self.slice(offset..self.bytes.len()))
    }
}

/// Builds the bytes of one request.
///
/// The first four bytes are the request header. Byte 0 (major opcode),
/// byte 1 for extension requests (minor opcode) and bytes 2..4 (length)
/// are filled in by the connection when the request goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWriter {
    buf: Vec<u8>,
}

macro_rules! write_ne {
    ($($name:ident: $t:ty,)+) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $t) -> &mut Self {
                self.buf.extend_from_slice(&value.to_ne_bytes());
                self
            }
        )+
    };
}

impl Default for RequestWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestWriter {
    pub fn new() -> Self {
        Self { buf: vec![0; 4] }
    }
    /// Header for core requests that carry a data byte at offset 1.
    pub fn with_data_byte(data: u8) -> Self {
        let mut w = Self::new();
        w.buf[1] = data;
        w
    }
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
    #[inline]
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }
    #[inline]
    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.buf.push(value as u8);
        self
    }
    #[inline]
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(value as u8);
        self
    }
    write_ne!{
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
    }
    pub fn zeroes(&mut self, count: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + count, 0);
        self
    }
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }
    /// Pads with zeroes up to the next multiple of 4.
    pub fn align(&mut self) -> &mut Self {
        let n = pad(self.buf.len());
        self.zeroes(n)
    }
    /// Returns the request bytes, 4-byte aligned.
    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.buf
    }
}

/// Fills the opcode and length fields of a request built by `RequestWriter`.
///
/// Transports that hand requests to libxcb leave this to libxcb. `minor` is
/// `Some` for extension requests.
pub fn fill_header(request: &mut [u8], major: u8, minor: Option<u8>) {
    assert!(request.len() >= 4 && request.len() % 4 == 0);
    request[0] = major;
    if let Some(minor) = minor {
        request[1] = minor;
    }
    let words = (request.len() / 4) as u16;
    request[2..4].copy_from_slice(&words.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_fields_are_checked() {
        assert!(check_length::<u16>("name", 65_535).is_ok());
        let e = check_length::<u16>("name", 65_536).unwrap_err();
        assert_eq!(e.kind, crate::error::ErrorKind::InvalidArgument);
        assert!(check_length::<u8>("names", 256).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn u32_length_fields_are_checked() {
        assert!(check_length::<u32>("context", u32::max_value() as usize).is_ok());
        assert!(check_length::<u32>("context", u32::max_value() as usize + 1).is_err());
    }

    #[test]
    fn padding() {
        assert_eq!(pad(0), 0);
        assert_eq!(pad(1), 3);
        assert_eq!(pad(6), 2);
        assert_eq!(padded(13), 16);
    }

    #[test]
    fn writer_aligns_and_reader_reads_back() {
        let mut w = RequestWriter::new();
        w.u32(0xdead_beef).u16(7).i8(-1);
        let bytes = w.finish();
        assert_eq!(bytes.len(), 12);
        let r = Reader::new(&bytes);
        assert_eq!(r.u32(4), 0xdead_beef);
        assert_eq!(r.u16(8), 7);
        assert_eq!(r.i8(10), -1);
        assert_eq!(r.u8(11), 0);
    }

    #[test]
    fn slice_is_clamped() {
        let r = Reader::new(&[1, 2, 3]);
        assert_eq!(r.slice(1..10), &[2, 3]);
        assert!(r.slice(5..10).is_empty());
        assert_eq!(r.tail(2).bytes(), &[3]);
    }

    #[test]
    fn header_is_filled() {
        let mut bytes = RequestWriter::with_data_byte(9).finish();
        bytes.extend_from_slice(&[0; 4]);
        fill_header(&mut bytes, 98, None);
        assert_eq!(bytes[0], 98);
        assert_eq!(bytes[1], 9);
        assert_eq!(u16::from_ne_bytes([bytes[2], bytes[3]]), 2);
    }
}
