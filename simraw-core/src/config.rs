//! Reader configuration

use crate::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RESYNCS};
use serde::{Deserialize, Serialize};

/// Options fixed at reader construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Return undecoded frame bytes instead of dispatching to payload decoders
    pub raw_mode: bool,

    /// Capacity of the internal read buffer in bytes
    pub buffer_size: usize,

    /// Consecutive resynchronizations allowed within one read or skip
    pub max_resyncs: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            raw_mode: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_resyncs: DEFAULT_MAX_RESYNCS,
        }
    }
}

impl ReaderConfig {
    /// Configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable raw mode
    pub fn raw_mode(mut self, raw: bool) -> Self {
        self.raw_mode = raw;
        self
    }

    /// Set the read buffer capacity
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Set the resynchronization budget
    pub fn max_resyncs(mut self, attempts: usize) -> Self {
        self.max_resyncs = attempts;
        self
    }
}
