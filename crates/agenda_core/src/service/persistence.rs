//! Agenda persistence adapter.
//!
//! # Responsibility
//! - Mirror the agenda document into the local key-value store.
//! - Produce export files and parse imported file contents.
//!
//! # Invariants
//! - Storage and export share one JSON shape: `{title, date, topics}`.
//! - Import parsing never touches the live document; callers replace it only
//!   after `import_from_str` succeeds.
//! - Corrupt stored data is reported, never replaced by the default document.

use crate::model::agenda::AgendaDocument;
use crate::repo::storage_repo::{KeyValueStore, StorageError};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Fixed local-storage key holding the serialized agenda.
pub const STORAGE_KEY: &str = "meetingManagerData";
const EXPORT_FILE_PREFIX: &str = "meeting-";
const EXPORT_FILE_EXTENSION: &str = "json";

static FILE_NAME_UNSAFE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid file name regex")
});

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Imported file content is not a valid agenda document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportParseError {
    /// Parser message without position suffix.
    pub message: String,
    /// 1-based line of the failure, `0` when unknown.
    pub line: usize,
    /// 1-based column of the failure, `0` when unknown.
    pub column: usize,
}

impl Display for ImportParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid agenda file at line {} column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl Error for ImportParseError {}

impl From<serde_json::Error> for ImportParseError {
    fn from(value: serde_json::Error) -> Self {
        let line = value.line();
        let column = value.column();
        let full = value.to_string();
        let suffix = format!(" at line {line} column {column}");
        let message = full
            .strip_suffix(suffix.as_str())
            .unwrap_or(full.as_str())
            .to_string();
        Self {
            message,
            line,
            column,
        }
    }
}

/// Errors from persistence adapter operations.
#[derive(Debug)]
pub enum PersistenceError {
    /// Key-value store failure.
    Storage(StorageError),
    /// Value under the storage key cannot be parsed.
    CorruptStorage {
        key: &'static str,
        cause: ImportParseError,
    },
    /// Document could not be encoded.
    Encode(serde_json::Error),
    /// Export file could not be written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::CorruptStorage { key, cause } => {
                write!(f, "stored agenda under `{key}` is corrupt: {cause}")
            }
            Self::Encode(err) => write!(f, "failed to encode agenda: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::CorruptStorage { cause, .. } => Some(cause),
            Self::Encode(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Downloadable export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `meeting-<date>.json`.
    pub file_name: String,
    /// Pretty-printed JSON document.
    pub contents: String,
}

/// Persistence adapter over one key-value store.
pub struct AgendaPersistence<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> AgendaPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Serializes the whole document and overwrites the stored copy.
    pub fn save(&self, document: &AgendaDocument) -> PersistenceResult<()> {
        let encoded = serde_json::to_string(document).map_err(PersistenceError::Encode)?;
        self.store.set_item(STORAGE_KEY, encoded.as_str())?;
        Ok(())
    }

    /// Loads the stored document, or the built-in default when none exists.
    ///
    /// # Errors
    /// - `CorruptStorage` when a stored value exists but cannot be parsed.
    ///   The stored bytes are left as-is for inspection.
    pub fn load(&self) -> PersistenceResult<AgendaDocument> {
        let Some(raw) = self.store.get_item(STORAGE_KEY)? else {
            info!("event=agenda_load module=persistence status=ok source=default");
            return Ok(AgendaDocument::default());
        };

        match serde_json::from_str::<AgendaDocument>(raw.as_str()) {
            Ok(mut document) => {
                document.regenerate_duplicate_ids();
                info!(
                    "event=agenda_load module=persistence status=ok source=storage topics={} subtopics={}",
                    document.topics.len(),
                    document.subtopic_count()
                );
                Ok(document)
            }
            Err(err) => {
                let cause = ImportParseError::from(err);
                error!(
                    "event=agenda_load module=persistence status=error error_code=corrupt_storage line={} column={}",
                    cause.line, cause.column
                );
                Err(PersistenceError::CorruptStorage {
                    key: STORAGE_KEY,
                    cause,
                })
            }
        }
    }

    /// Drops the stored copy so the next `load` yields the default document.
    pub fn clear(&self) -> PersistenceResult<()> {
        self.store.remove_item(STORAGE_KEY)?;
        Ok(())
    }
}

/// Builds the export payload for `document`.
pub fn export_file(document: &AgendaDocument) -> PersistenceResult<ExportFile> {
    let contents = serde_json::to_string_pretty(document).map_err(PersistenceError::Encode)?;
    Ok(ExportFile {
        file_name: export_file_name(document.date.as_str()),
        contents,
    })
}

/// Writes the export payload into `dir` and returns the written path.
pub fn export_to_dir(
    document: &AgendaDocument,
    dir: impl AsRef<Path>,
) -> PersistenceResult<PathBuf> {
    let export = export_file(document)?;
    let path = dir.as_ref().join(export.file_name.as_str());
    if let Err(source) = std::fs::write(&path, export.contents.as_bytes()) {
        warn!(
            "event=agenda_export module=persistence status=error error_code=write_failed error={}",
            source
        );
        return Err(PersistenceError::Io { path, source });
    }
    info!(
        "event=agenda_export module=persistence status=ok bytes={}",
        export.contents.len()
    );
    Ok(path)
}

/// Parses imported file contents as an agenda document.
///
/// Repeated topic or subtopic ids are replaced so ids stay unique.
pub fn import_from_str(contents: &str) -> Result<AgendaDocument, ImportParseError> {
    let mut document =
        serde_json::from_str::<AgendaDocument>(contents).map_err(ImportParseError::from)?;
    let replaced = document.regenerate_duplicate_ids();
    if replaced > 0 {
        warn!(
            "event=agenda_import module=persistence status=ok duplicate_ids_replaced={}",
            replaced
        );
    }
    Ok(document)
}

/// Deterministic export file name for one agenda date.
///
/// Characters that cannot appear in a single path component are replaced by
/// `_`.
pub fn export_file_name(date: &str) -> String {
    let safe_date = FILE_NAME_UNSAFE_RE.replace_all(date, "_");
    format!("{EXPORT_FILE_PREFIX}{safe_date}.{EXPORT_FILE_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::{export_file_name, import_from_str};

    #[test]
    fn export_file_name_embeds_iso_date() {
        assert_eq!(export_file_name("2024-03-01"), "meeting-2024-03-01.json");
    }

    #[test]
    fn export_file_name_replaces_path_separators() {
        assert_eq!(export_file_name("03/01\\24"), "meeting-03_01_24.json");
        assert_eq!(export_file_name(""), "meeting-.json");
    }

    #[test]
    fn import_error_reports_position() {
        let err = import_from_str("{\n  \"title\": ").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.column > 0);
        assert!(!err.message.contains(" at line "));
    }
}
