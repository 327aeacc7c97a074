// ByteBuffer - little-endian binary reader/writer
// Backing store for the navigation mesh codec

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Error, ErrorKind};

/// A byte buffer for reading/writing little-endian binary data.
/// Reads advance an internal cursor; writes always append.
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    read_pos: usize,
}

fn read_past_end(wanted: usize, at: usize, size: usize) -> Error {
    Error::new(
        ErrorKind::UnexpectedEof,
        format!("ByteBuffer read of {} bytes at {} past end ({})", wanted, at, size),
    )
}

impl ByteBuffer {
    /// Create a new empty ByteBuffer
    pub fn new() -> Self {
        ByteBuffer {
            data: Vec::new(),
            read_pos: 0,
        }
    }

    /// Create with a pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            data: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Wrap existing bytes for reading
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ByteBuffer {
            data: bytes.to_vec(),
            read_pos: 0,
        }
    }

    /// Get the current size of the buffer
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the current read position
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// Get the raw contents
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the written bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    // ---- Write operations (append) ----

    /// Append raw bytes
    pub fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    /// Write a u8
    pub fn write_u8(&mut self, val: u8) {
        self.data.push(val);
    }

    /// Write a u16 (little-endian)
    pub fn write_u16(&mut self, val: u16) {
        self.data.extend_from_slice(&val.to_le_bytes());
    }

    /// Write a u32 (little-endian)
    pub fn write_u32(&mut self, val: u32) {
        self.data.extend_from_slice(&val.to_le_bytes());
    }

    /// Write an f32 (little-endian)
    pub fn write_f32(&mut self, val: f32) {
        self.data.extend_from_slice(&val.to_le_bytes());
    }

    /// Write consecutive f32 values
    pub fn write_f32_slice(&mut self, vals: &[f32]) {
        for &val in vals {
            self.write_f32(val);
        }
    }

    /// Write a u16-length-prefixed, NUL-terminated string
    pub fn write_prefixed_string(&mut self, val: &str) {
        let len = (val.len() + 1).min(u16::MAX as usize);
        self.write_u16(len as u16);
        self.data.extend_from_slice(&val.as_bytes()[..len - 1]);
        self.data.push(0); // null terminator
    }

    // ---- Read operations ----

    fn ensure(&self, count: usize) -> Result<(), Error> {
        if self.read_pos + count > self.data.len() {
            return Err(read_past_end(count, self.read_pos, self.data.len()));
        }
        Ok(())
    }

    /// Read a u8
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.ensure(1)?;
        let val = self.data[self.read_pos];
        self.read_pos += 1;
        Ok(val)
    }

    /// Read a u16 (little-endian)
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.ensure(2)?;
        let val = (&self.data[self.read_pos..]).read_u16::<LittleEndian>()?;
        self.read_pos += 2;
        Ok(val)
    }

    /// Read a u32 (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.ensure(4)?;
        let val = (&self.data[self.read_pos..]).read_u32::<LittleEndian>()?;
        self.read_pos += 4;
        Ok(val)
    }

    /// Read an f32 (little-endian)
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.ensure(4)?;
        let val = (&self.data[self.read_pos..]).read_f32::<LittleEndian>()?;
        self.read_pos += 4;
        Ok(val)
    }

    /// Read N consecutive f32 values
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], Error> {
        self.ensure(N * 4)?;
        let mut out = [0.0f32; N];
        for v in out.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a u16-length-prefixed string, dropping the trailing NUL if present
    pub fn read_prefixed_string(&mut self) -> Result<String, Error> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).to_string())
    }

    /// Read N bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        self.ensure(count)?;
        let bytes = self.data[self.read_pos..self.read_pos + count].to_vec();
        self.read_pos += count;
        Ok(bytes)
    }

    /// Skip N bytes, failing if that would pass the end
    pub fn read_skip(&mut self, count: usize) -> Result<(), Error> {
        self.ensure(count)?;
        self.read_pos += count;
        Ok(())
    }
}

impl std::fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteBuffer(size={}, rpos={})", self.size(), self.read_pos)
    }
}
