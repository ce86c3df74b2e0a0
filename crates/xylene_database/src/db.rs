//! The loaded device database and its lookup operations.

use crate::catalog::{Catalog, PartEntry};
use crate::error::DatabaseError;
use crate::part::PartDescriptor;
use crate::xcm::XcmFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xylene_common::IdCode;

/// Environment variable naming the database catalog.
pub const DB_ENV_VAR: &str = "XYLENE_DB";

/// An immutable catalog of known parts.
///
/// Loaded once; lookups are plain reads, so a `Database` can be shared
/// across threads without locking.
#[derive(Debug, Default)]
pub struct Database {
    parts: Vec<Arc<PartDescriptor>>,
    by_idcode: HashMap<IdCode, usize>,
    by_base_idcode: HashMap<IdCode, usize>,
}

impl Database {
    /// Validates every part of a catalog and builds the lookup tables.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, DatabaseError> {
        let mut db = Database::default();
        for entry in catalog.parts {
            let part = entry.into_descriptor()?;
            let index = db.parts.len();
            if let Some(&other) = db.by_idcode.get(&part.idcode()) {
                return Err(DatabaseError::malformed(
                    part.name(),
                    format!(
                        "IDCODE {} already used by part '{}'",
                        part.idcode(),
                        db.parts[other].name()
                    ),
                ));
            }
            db.by_idcode.insert(part.idcode(), index);
            db.by_base_idcode
                .entry(part.idcode().without_revision())
                .or_insert(index);
            tracing::debug!(
                part = part.name(),
                idcode = %part.idcode(),
                frames = part.frame_count(),
                "loaded part"
            );
            db.parts.push(Arc::new(part));
        }
        Ok(db)
    }

    /// Parses a JSON catalog.
    pub fn from_json_str(json: &str) -> Result<Self, DatabaseError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| DatabaseError::Parse(e.to_string()))?;
        Self::from_catalog(catalog)
    }

    /// Parses a TOML catalog.
    pub fn from_toml_str(text: &str) -> Result<Self, DatabaseError> {
        let catalog: Catalog =
            toml::from_str(text).map_err(|e| DatabaseError::Parse(e.to_string()))?;
        Self::from_catalog(catalog)
    }

    /// Loads a catalog from an XCM container.
    pub fn from_xcm(file: &XcmFile) -> Result<Self, DatabaseError> {
        Self::from_catalog(file.to_catalog()?)
    }

    /// Loads a catalog file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let io_err = |source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        tracing::debug!(path = %path.display(), "loading device database");
        match ext.as_deref() {
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path).map_err(io_err)?),
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path).map_err(io_err)?),
            Some("xcm") => {
                let bytes = std::fs::read(path).map_err(io_err)?;
                Self::from_xcm(&XcmFile::load(&bytes)?)
            }
            _ => Err(DatabaseError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Returns the catalog this database was built from.
    pub fn to_catalog(&self) -> Catalog {
        Catalog {
            parts: self.parts.iter().map(|p| PartEntry::from(&**p)).collect(),
        }
    }

    /// Finds the part with the given IDCODE.
    ///
    /// An exact match wins; otherwise the silicon revision nibble is ignored.
    pub fn lookup(&self, idcode: IdCode) -> Option<&Arc<PartDescriptor>> {
        self.by_idcode
            .get(&idcode)
            .or_else(|| self.by_base_idcode.get(&idcode.without_revision()))
            .map(|&i| &self.parts[i])
    }

    /// Finds a part by name (case-insensitive).
    pub fn lookup_name(&self, name: &str) -> Option<&Arc<PartDescriptor>> {
        self.parts.iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Iterates over every part in catalog order.
    ///
    /// The iterator is `Clone`, so it can be restarted from any point.
    pub fn list_parts(&self) -> std::slice::Iter<'_, Arc<PartDescriptor>> {
        self.parts.iter()
    }

    /// Returns the number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the database holds no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Resolves the database catalog path.
///
/// Checks in order:
/// 1. The `XYLENE_DB` environment variable
/// 2. The explicit path (from `--db`)
/// 3. The path from `xylene.toml`
///
/// Returns `None` if none is set or the path doesn't exist.
pub fn resolve_db_path(explicit: Option<&Path>, config_path: Option<&Path>) -> Option<PathBuf> {
    let env_path = std::env::var_os(DB_ENV_VAR).map(PathBuf::from);
    env_path
        .into_iter()
        .chain(explicit.map(Path::to_path_buf))
        .chain(config_path.map(Path::to_path_buf))
        .find(|p| p.exists())
}
