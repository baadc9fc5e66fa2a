//! Datagram fixtures for tests
//!
//! Builds well-formed (or deliberately damaged) frames byte by byte. This is
//! a fixture helper, not a writer: nothing here is used by the reader.

use crate::constants::{CHANNEL_ID_LEN, HEADER_LEN};

/// Builder for a single on-disk datagram
#[derive(Debug, Clone)]
pub struct DatagramBuilder {
    tag: [u8; 4],
    time_low: u32,
    time_high: u32,
    payload: Vec<u8>,
    declared_size: Option<i32>,
    trailing_size: Option<i32>,
}

impl DatagramBuilder {
    /// Start a datagram with the given 4-byte type tag
    pub fn new(tag: &[u8; 4]) -> Self {
        Self {
            tag: *tag,
            time_low: 0,
            time_high: 0,
            payload: Vec::new(),
            declared_size: None,
            trailing_size: None,
        }
    }

    /// Set the split NT timestamp
    pub fn time(mut self, time_low: u32, time_high: u32) -> Self {
        self.time_low = time_low;
        self.time_high = time_high;
        self
    }

    /// Set the timestamp from a 100 ns tick count
    pub fn ticks(self, ticks: u64) -> Self {
        self.time(ticks as u32, (ticks >> 32) as u32)
    }

    /// Set the payload
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Override the leading size field
    pub fn declared_size(mut self, size: i32) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Override the trailing size field
    pub fn trailing_size(mut self, size: i32) -> Self {
        self.trailing_size = Some(size);
        self
    }

    /// Encode the datagram
    pub fn build(self) -> Vec<u8> {
        let size = (HEADER_LEN + self.payload.len()) as i32;
        let mut out = Vec::with_capacity(size as usize + 8);
        out.extend_from_slice(&self.declared_size.unwrap_or(size).to_le_bytes());
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.time_low.to_le_bytes());
        out.extend_from_slice(&self.time_high.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.trailing_size.unwrap_or(size).to_le_bytes());
        out
    }
}

/// Payload of a RAW0 datagram: channel index followed by sample bytes
pub fn raw0_payload(channel: i16, samples: &[u8]) -> Vec<u8> {
    let mut out = channel.to_le_bytes().to_vec();
    out.extend_from_slice(samples);
    out
}

/// Payload of a RAW3/RAW4 datagram: NUL-padded channel id followed by sample bytes
pub fn raw3_payload(channel_id: &str, samples: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; CHANNEL_ID_LEN];
    let id = channel_id.as_bytes();
    let n = id.len().min(CHANNEL_ID_LEN);
    out[..n].copy_from_slice(&id[..n]);
    out.extend_from_slice(samples);
    out
}

/// Concatenate encoded datagrams into one stream
pub fn stream_of(frames: &[Vec<u8>]) -> Vec<u8> {
    frames.concat()
}
