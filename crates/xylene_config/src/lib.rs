//! Parsing and validation of `xylene.toml` tool configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`XyleneConfig`] with the database location, decode and validation
//! defaults, and output preferences. Every section is optional.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
