//! Configuration for the weak-memory layer.
//!
//! This module defines all configuration structures used to parameterize the
//! simulation. It provides:
//! 1. **Defaults:** Baseline tunables (buffer capacity, minimum ordering).
//! 2. **Structures:** General, buffer, and ordering sections.
//! 3. **Loading:** JSON text or a JSON file, validated before use.
//!
//! Configuration is supplied as JSON by the host at initialisation, or use `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;
use crate::order::MemoryOrder;

/// Default configuration constants.
mod defaults {
    /// Store lines a thread may hold before the oldest is forced out.
    pub const BUFFER_CAPACITY: usize = 2;

    /// Order bits OR-ed into every operation (0 = honour requested orders).
    pub const MIN_ORDERING: u8 = 0;
}

/// Largest accepted `buffer.capacity`; sequence counters are `i16`.
pub const MAX_CAPACITY: usize = 0x7fff;

/// Root configuration.
///
/// # Example
///
/// ```
/// use weakmem_core::config::Config;
///
/// let json = r#"{
///     "general": { "trace_operations": true },
///     "buffer": { "capacity": 4 },
///     "ordering": { "min_ordering": 3 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.trace_operations);
/// assert_eq!(config.buffer.capacity, 4);
/// assert_eq!(config.ordering.min_ordering, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Store buffer sizing
    #[serde(default)]
    pub buffer: BufferConfig,
    /// Order strengthening
    #[serde(default)]
    pub ordering: OrderingConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed JSON, `ConfigError::Invalid` for
    /// out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks field ranges.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bits = self.ordering.min_ordering;
        if MemoryOrder::from_bits(bits).bits() != bits {
            return Err(ConfigError::Invalid(format!(
                "ordering.min_ordering has unknown bits: {bits:#x}"
            )));
        }
        if self.buffer.capacity > MAX_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "buffer.capacity {} is too large",
                self.buffer.capacity
            )));
        }
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeneralConfig {
    /// Log every store, load, fence, and compare-and-swap at `info` level
    #[serde(default)]
    pub trace_operations: bool,
}

/// Store buffer sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BufferConfig {
    /// Maximum number of store lines per thread (fences are not counted)
    #[serde(default = "BufferConfig::default_capacity")]
    pub capacity: usize,
}

impl BufferConfig {
    /// Returns the default buffer capacity.
    const fn default_capacity() -> usize {
        defaults::BUFFER_CAPACITY
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::BUFFER_CAPACITY,
        }
    }
}

/// Order strengthening.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderingConfig {
    /// Raw `MemoryOrder` bits united with every requested order
    #[serde(default = "OrderingConfig::default_min_ordering")]
    pub min_ordering: u8,
}

impl OrderingConfig {
    /// Returns the default minimum ordering.
    const fn default_min_ordering() -> u8 {
        defaults::MIN_ORDERING
    }

    /// Returns the minimum ordering as a `MemoryOrder`.
    pub const fn min_order(&self) -> MemoryOrder {
        MemoryOrder::from_bits(self.min_ordering)
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            min_ordering: defaults::MIN_ORDERING,
        }
    }
}
