//! Cursor/put primitives shared by the value codec and the message payloads.
//!
//! All multi-byte integers are little-endian; variable-length fields carry a
//! u32 length prefix.

use thiserror::Error;

use crate::address::{Address, AddressError, ADDRESS_LEN};
use crate::hexint::{HexInt, HexIntError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload too short")]
    TooShort,
    #[error("trailing bytes after payload")]
    TrailingBytes,
    #[error("invalid boolean byte: {0:#04x}")]
    BadBool(u8),
    #[error("invalid utf-8 in string field")]
    BadUtf8,
    #[error("invalid value tag: {0:#04x}")]
    BadValueTag(u8),
    #[error("value nesting deeper than {0}")]
    TooDeep(usize),
    #[error("invalid {what} tag: {tag:#04x}")]
    BadEnumTag { what: &'static str, tag: u8 },
    #[error("bad hex integer: {0}")]
    BadInt(#[from] HexIntError),
    #[error("bad address: {0}")]
    BadAddress(#[from] AddressError),
}

pub struct Cursor<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Cursor<'a> {
        Cursor { bytes, off: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.off
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::TooShort);
        }
        let s = &self.bytes[self.off..self.off + n];
        self.off += n;
        Ok(s)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(DecodeError::BadBool(b)),
        }
    }

    /// Length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Length-prefixed utf-8 string.
    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        let raw = self.read_bytes()?;
        String::from_utf8(raw).map_err(|_| DecodeError::BadUtf8)
    }

    /// Hex-int carried as length-prefixed text.
    pub fn read_int(&mut self) -> Result<HexInt, DecodeError> {
        let s = self.read_str()?;
        Ok(HexInt::from_hex(&s)?)
    }

    /// Fixed 21-byte address.
    pub fn read_address(&mut self) -> Result<Address, DecodeError> {
        let raw = self.take(ADDRESS_LEN)?;
        Ok(Address::from_bytes(raw)?)
    }

    /// Fail unless the payload was consumed exactly.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.remaining() != 0 {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(())
    }
}

pub fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_bool(out: &mut Vec<u8>, v: bool) {
    out.push(u8::from(v));
}

pub fn put_bytes(out: &mut Vec<u8>, v: &[u8]) {
    put_u32(out, v.len() as u32);
    out.extend_from_slice(v);
}

pub fn put_str(out: &mut Vec<u8>, v: &str) {
    put_bytes(out, v.as_bytes());
}

pub fn put_int(out: &mut Vec<u8>, v: HexInt) {
    put_str(out, &v.to_hex());
}

pub fn put_address(out: &mut Vec<u8>, v: &Address) {
    out.extend_from_slice(&v.to_bytes());
}
