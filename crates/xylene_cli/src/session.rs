//! Shared setup for every command: configuration, database and inputs.

use std::error::Error;
use std::path::Path;

use xylene_bitstream::{decode, BitstreamContainer, DecodeOptions};
use xylene_config::{find_config, load_config, OutputFormat, ScopeSetting, XyleneConfig};
use xylene_core::{Bitstream, ReconfigScope};
use xylene_database::{resolve_db_path, Database};
use xylene_diagnostics::Diagnostics;

use crate::{GlobalArgs, ReportFormat, ScopeArg};

/// Configuration and database loaded for one invocation.
pub struct Session {
    /// The parsed `xylene.toml`, or defaults when none was found.
    pub config: XyleneConfig,
    /// The part database, if one could be located.
    pub database: Option<Database>,
}

impl Session {
    /// Loads the configuration and the part database.
    ///
    /// Uses `--config` when given, otherwise `xylene.toml` in the current
    /// directory if present. An explicit `--db` that does not exist is an
    /// error; a missing database is otherwise tolerated.
    pub fn load(global: &GlobalArgs) -> Result<Self, Box<dyn Error>> {
        let config_path = match &global.config {
            Some(path) => Some(path.clone()),
            None => std::env::current_dir().ok().and_then(|d| find_config(&d)),
        };
        let config = match config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                load_config(&path)?
            }
            None => XyleneConfig::default(),
        };
        let database = load_database(global.db.as_deref(), config.database.path.as_deref())?;
        Ok(Self { config, database })
    }

    /// Returns the database or a user-facing error explaining how to supply one.
    pub fn require_database(&self) -> Result<&Database, Box<dyn Error>> {
        self.database.as_ref().ok_or_else(|| {
            "no part database; pass --db, set XYLENE_DB or add [database] path to xylene.toml"
                .into()
        })
    }

    /// Builds decode options from the configuration.
    pub fn decode_options(&self, strict: bool) -> DecodeOptions<'_> {
        let mut options = DecodeOptions::default()
            .strict(strict)
            .with_sync_window(self.config.decode.sync_window.as_usize());
        if let Some(db) = &self.database {
            options = options.with_database(db);
        }
        if let Some(words) = self.config.decode.frame_words {
            options = options.with_frame_words(words);
        }
        options
    }

    /// Picks the output format: the flag wins over the configuration.
    pub fn format(&self, flag: Option<ReportFormat>) -> ReportFormat {
        flag.unwrap_or(match self.config.output.format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        })
    }

    /// Picks the coverage scope: the flag wins over the configuration.
    pub fn scope(&self, flag: Option<ScopeArg>) -> ReconfigScope {
        match flag {
            Some(ScopeArg::Columns) => ReconfigScope::Columns,
            Some(ScopeArg::Device) => ReconfigScope::Device,
            None => match self.config.validate.scope {
                ScopeSetting::Columns => ReconfigScope::Columns,
                ScopeSetting::Device => ReconfigScope::Device,
            },
        }
    }

    /// Decodes a file without strict mode.
    pub fn decode_file(
        &self,
        path: &Path,
    ) -> Result<(BitstreamContainer, Diagnostics), Box<dyn Error>> {
        let bytes = read_input(path)?;
        let decoded = decode(&bytes, &self.decode_options(false))
            .map_err(|e| format!("{}: {e}", path.display()))?;
        Ok(decoded)
    }

    /// Decodes a file and binds it to its part.
    pub fn bind_file(&self, path: &Path) -> Result<Bitstream, Box<dyn Error>> {
        let db = self.require_database()?;
        let (container, _) = self.decode_file(path)?;
        let bitstream =
            Bitstream::bind(container, db).map_err(|e| format!("{}: {e}", path.display()))?;
        Ok(bitstream)
    }
}

fn load_database(
    explicit: Option<&Path>,
    configured: Option<&Path>,
) -> Result<Option<Database>, Box<dyn Error>> {
    match resolve_db_path(explicit, configured) {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading part database");
            let db = Database::load(&path)?;
            tracing::debug!(parts = db.len(), "part database loaded");
            Ok(Some(db))
        }
        None => match explicit {
            Some(path) => Err(format!("part database {} not found", path.display()).into()),
            None => Ok(None),
        },
    }
}

/// Reads an input file, naming it in the error.
pub fn read_input(path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()).into())
}

/// Returns the display name of an input path.
pub fn origin(path: &Path) -> String {
    path.display().to_string()
}
