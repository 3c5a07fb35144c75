//! Record log configuration

use crate::encoding::MAX_ENTRY_LEN;
use crate::log::DurabilityMode;
use thingdb_core::{Error, Result};

/// Smallest accepted entry ceiling; an empty record encodes well below this
const MIN_MAX_ENTRY_LEN: usize = 1024;

/// Record log parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Sync policy for appends
    pub mode: DurabilityMode,

    /// Largest accepted entry, measured as the length field (default: 16MB).
    ///
    /// Appends above it are refused. On open, a length field above it is
    /// corruption rather than a torn tail.
    pub max_entry_len: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            mode: DurabilityMode::default(),
            max_entry_len: MAX_ENTRY_LEN,
        }
    }
}

impl LogConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sync policy (builder pattern).
    pub fn with_mode(mut self, mode: DurabilityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the entry ceiling (builder pattern).
    pub fn with_max_entry_len(mut self, len: usize) -> Self {
        self.max_entry_len = len;
        self
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the ceiling is below 1KB or does not
    /// fit the u32 length field.
    pub fn validate(&self) -> Result<()> {
        if self.max_entry_len < MIN_MAX_ENTRY_LEN {
            return Err(Error::Config(format!(
                "max_entry_len must be at least {} bytes",
                MIN_MAX_ENTRY_LEN
            )));
        }
        if u32::try_from(self.max_entry_len).is_err() {
            return Err(Error::Config(format!(
                "max_entry_len must not exceed {} bytes",
                u32::MAX
            )));
        }
        Ok(())
    }
}
