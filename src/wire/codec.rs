//! A tiny big-endian cursor/codec, in the spirit of the `Decoding`/`Encoding`
//! cursor pattern used by reference TLS parsers: a `Cursor` walks forward
//! through a borrowed byte slice and every `decode_*` call either advances it
//! or fails with a `TLSError::Decode`.

use crate::error::TLSError;

pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], TLSError> {
        if self.remaining() < n {
            return Err(TLSError::decode("unexpected end of input"));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, TLSError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, TLSError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u24(&mut self) -> Result<u32, TLSError> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Reads a `len_bytes`-byte big-endian length prefix followed by that
    /// many bytes, returning the inner slice.
    pub fn vec_u8(&mut self) -> Result<&'a [u8], TLSError> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    pub fn vec_u16(&mut self) -> Result<&'a [u8], TLSError> {
        let len = self.u16()? as usize;
        self.take(len)
    }

    pub fn vec_u24(&mut self) -> Result<&'a [u8], TLSError> {
        let len = self.u24()? as usize;
        self.take(len)
    }
}

pub fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn put_u24(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes()[1..]);
}

pub fn put_vec_u8(out: &mut Vec<u8>, data: &[u8]) {
    put_u8(out, data.len() as u8);
    out.extend_from_slice(data);
}

pub fn put_vec_u16(out: &mut Vec<u8>, data: &[u8]) {
    put_u16(out, data.len() as u16);
    out.extend_from_slice(data);
}

pub fn put_vec_u24(out: &mut Vec<u8>, data: &[u8]) {
    put_u24(out, data.len() as u32);
    out.extend_from_slice(data);
}
