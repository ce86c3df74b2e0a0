//! Configuration types deserialized from `xylene.toml`.

use serde::Deserialize;
use std::path::PathBuf;
use xylene_common::units::{ByteSize, KIB};

/// The top-level configuration parsed from `xylene.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XyleneConfig {
    /// Where the part catalog lives.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Defaults for bitstream decoding.
    #[serde(default)]
    pub decode: DecodeConfig,
    /// Defaults for bitstream validation.
    #[serde(default)]
    pub validate: ValidateConfig,
    /// Report formatting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Location of the device database catalog.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to a `.json`, `.toml` or `.xcm` catalog, relative to the config file.
    pub path: Option<PathBuf>,
}

/// Bitstream decoding defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeConfig {
    /// Reject the input on any warning.
    #[serde(default)]
    pub strict: bool,
    /// How far into the input to search for the sync word.
    #[serde(default = "default_sync_window")]
    pub sync_window: ByteSize,
    /// Frame length override in 32-bit words.
    pub frame_words: Option<usize>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            strict: false,
            sync_window: default_sync_window(),
            frame_words: None,
        }
    }
}

/// The default sync-word search window.
pub const DEFAULT_SYNC_WINDOW: ByteSize = ByteSize::new(64 * KIB);

fn default_sync_window() -> ByteSize {
    DEFAULT_SYNC_WINDOW
}

/// Bitstream validation defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Promote warnings to fatal.
    #[serde(default)]
    pub strict: bool,
    /// Which frames a bitstream is expected to cover.
    #[serde(default)]
    pub scope: ScopeSetting,
}

/// Frame coverage expected of a bitstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeSetting {
    /// Every column touched must be written completely (default).
    #[default]
    Columns,
    /// Every frame of the part must be written.
    Device,
}

/// Report formatting.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format for command reports.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for command reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}
