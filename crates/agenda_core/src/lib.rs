//! Core logic for the agenda editor.
//! The document tree, its storage mirror and its view projection live here;
//! hosts only forward user events and display the resulting view.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use config::AgendaConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::agenda::{AgendaDocument, ItemId, Subtopic, Topic};
pub use repo::storage_repo::{KeyValueStore, SqliteKeyValueStore, StorageError, StorageResult};
pub use service::agenda_controller::{AgendaController, DispatchOutcome, PresetPrompt, UserPrompt};
pub use service::persistence::{
    export_file, export_file_name, export_to_dir, import_from_str, AgendaPersistence, ExportFile,
    ImportParseError, PersistenceError, PersistenceResult, STORAGE_KEY,
};
pub use view::{render, render_plain_text, AgendaView, RenderMode, UiEvent};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
