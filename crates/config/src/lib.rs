//! Phantasma Configuration Module
//!
//! This module provides the protocol constants and runtime settings shared by
//! the Phantasma virtual machine crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Register bank size of a frame pushed by a context switch
pub const DEFAULT_REGISTER_COUNT: usize = 32;
/// Largest register bank a `CALL` may request
pub const MAX_REGISTER_COUNT: usize = 32;
/// Upper bound for every variable-length operand in a script
pub const MAX_OPERAND_LENGTH: u64 = 0xFFFF;
/// Name under which the entry script is registered
pub const ENTRY_CONTEXT_NAME: &str = "entry";
/// Size of an address (kind prefix + SHA-256 digest) in bytes
pub const ADDRESS_SIZE: usize = 33;
/// Default cap on the number of live execution frames
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 1024;
/// Default cap on nested context switches
pub const DEFAULT_MAX_SWITCH_DEPTH: usize = 128;

/// Errors produced while loading or validating settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables of a virtual machine instance.
///
/// Every field has a protocol default, so a TOML document only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSettings {
    /// Registers allocated for a frame pushed by a context switch
    pub default_register_count: usize,
    /// Largest register count accepted by `CALL`
    pub max_register_count: usize,
    /// Bound applied to variable-length operands (load payloads, ranges)
    pub max_operand_length: u64,
    /// Maximum number of frames alive at once
    pub max_frame_depth: usize,
    /// Maximum nesting of context switches
    pub max_switch_depth: usize,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            default_register_count: DEFAULT_REGISTER_COUNT,
            max_register_count: MAX_REGISTER_COUNT,
            max_operand_length: MAX_OPERAND_LENGTH,
            max_frame_depth: DEFAULT_MAX_FRAME_DEPTH,
            max_switch_depth: DEFAULT_MAX_SWITCH_DEPTH,
        }
    }
}

impl VmSettings {
    /// Parses settings from a TOML document and validates them.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the settings for values the interpreter cannot honour.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_register_count == 0 {
            return Err(ConfigError::Invalid(
                "default_register_count must be at least 1".to_string(),
            ));
        }
        if self.max_register_count > u8::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "max_register_count {} exceeds the single-byte register count {}",
                self.max_register_count,
                u8::MAX
            )));
        }
        if self.default_register_count > self.max_register_count {
            return Err(ConfigError::Invalid(format!(
                "default_register_count {} is larger than max_register_count {}",
                self.default_register_count, self.max_register_count
            )));
        }
        if self.max_frame_depth == 0 || self.max_switch_depth == 0 {
            return Err(ConfigError::Invalid(
                "frame and switch depth limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for VmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "registers={}/{} operand<={} frames<={} switches<={}",
            self.default_register_count,
            self.max_register_count,
            self.max_operand_length,
            self.max_frame_depth,
            self.max_switch_depth
        )
    }
}
