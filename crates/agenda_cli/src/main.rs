//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `agenda_core` linkage without a UI host.
//! - Print the stored agenda in print layout.

use agenda_core::db::open_db;
use agenda_core::{
    AgendaConfig, AgendaController, AgendaPersistence, PresetPrompt, SqliteKeyValueStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("agenda_core ping={}", agenda_core::ping());
    println!("agenda_core version={}", agenda_core::core_version());

    let config = AgendaConfig::from_env();
    match print_preview(&config) {
        Ok(text) => {
            println!();
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("agenda preview failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn print_preview(config: &AgendaConfig) -> Result<String, String> {
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteKeyValueStore::try_new(&conn).map_err(|err| err.to_string())?;
    let controller = AgendaController::open(AgendaPersistence::new(store), PresetPrompt::new(false))
        .map_err(|err| err.to_string())?;
    Ok(controller.print_preview())
}
