//! Host configuration.
//!
//! # Responsibility
//! - Resolve the local store file and export directory for host processes.
//!
//! # Invariants
//! - Blank or unset variables fall back to the system temp directory.
//! - Core operations never read the environment themselves.

use std::path::PathBuf;

/// Env var naming the SQLite file that backs local storage.
pub const DB_PATH_ENV: &str = "AGENDA_DB_PATH";
/// Env var naming the directory export files are written to.
pub const EXPORT_DIR_ENV: &str = "AGENDA_EXPORT_DIR";
const DEFAULT_DB_FILE_NAME: &str = "agenda_local_storage.sqlite3";

/// Resolved host paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaConfig {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
}

impl AgendaConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, falling back to temp paths.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            export_dir: non_blank(EXPORT_DIR_ENV).unwrap_or_else(std::env::temp_dir),
        }
    }
}
