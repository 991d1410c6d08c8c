//! # Fixed-Size Payload
//!
//! Every command and response carries exactly [`MAX_PAYLOAD_SIZE`] bytes.
//! Multi-byte fields are little-endian.

use std::fmt;

use crate::errors::PayloadError;

/// Size of every payload block in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 128;

/// Opaque 128-byte block moved between caller and worker.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Payload([u8; MAX_PAYLOAD_SIZE]);

impl Payload {
    /// An all-zero payload.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0u8; MAX_PAYLOAD_SIZE])
    }

    /// Copy `data` into the front of a zeroed payload.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::TooLarge`] if `data` exceeds [`MAX_PAYLOAD_SIZE`].
    pub fn from_slice(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() > MAX_PAYLOAD_SIZE {
            return Err(PayloadError::TooLarge {
                len: data.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        let mut payload = Self::zeroed();
        payload.0[..data.len()].copy_from_slice(data);
        Ok(payload)
    }

    /// Payload with two little-endian `i32` operands at offsets 0 and 4.
    #[must_use]
    pub fn from_i32_pair(a: i32, b: i32) -> Self {
        let mut payload = Self::zeroed();
        payload.write_i32(0, a);
        payload.write_i32(4, b);
        payload
    }

    /// Payload with a single little-endian `u32` at offset 0.
    #[must_use]
    pub fn from_u32(value: u32) -> Self {
        let mut payload = Self::zeroed();
        payload.write_u32(0, value);
        payload
    }

    pub fn as_bytes(&self) -> &[u8; MAX_PAYLOAD_SIZE] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; MAX_PAYLOAD_SIZE] {
        &mut self.0
    }

    /// Reset every byte to zero.
    pub fn clear(&mut self) {
        self.0 = [0u8; MAX_PAYLOAD_SIZE];
    }

    /// Read a little-endian `u32`. Offsets past the end read as zero.
    #[must_use]
    pub fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.array_at(offset))
    }

    #[must_use]
    pub fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.array_at(offset))
    }

    #[must_use]
    pub fn read_u64(&self, offset: usize) -> u64 {
        u64::from_le_bytes(self.array_at(offset))
    }

    /// Write a little-endian `u32`. Writes past the end are ignored.
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.put(offset, &value.to_le_bytes());
    }

    pub fn write_i32(&mut self, offset: usize, value: i32) {
        self.put(offset, &value.to_le_bytes());
    }

    pub fn write_u64(&mut self, offset: usize, value: u64) {
        self.put(offset, &value.to_le_bytes());
    }

    fn array_at<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = offset
            .checked_add(N)
            .and_then(|end| self.0.get(offset..end))
        {
            out.copy_from_slice(src);
        }
        out
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        if let Some(dst) = offset
            .checked_add(bytes.len())
            .and_then(|end| self.0.get_mut(offset..end))
        {
            dst.copy_from_slice(bytes);
        }
    }

    /// Length of the payload with trailing zero bytes removed.
    fn significant_len(&self) -> usize {
        self.0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.significant_len();
        let shown = len.min(16);
        write!(f, "Payload({}", hex::encode(&self.0[..shown]))?;
        if len > shown {
            write!(f, "..+{}", len - shown)?;
        }
        write!(f, ")")
    }
}
