//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one synchronous function per user action to Dart via FRB.
//! - Return a fresh view snapshot after every action.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary; stale or
//!   out-of-range references come back as `ok=false` envelopes.
//! - Every call opens the local store, loads the agenda, applies at most one
//!   action and lets the controller persist before responding.

use agenda_core::db::open_db;
use agenda_core::view::{SubtopicBinding, TopicBinding};
use agenda_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AgendaConfig, AgendaController, AgendaPersistence, AgendaView, DispatchOutcome, PresetPrompt,
    SqliteKeyValueStore, UiEvent,
};
use log::warn;
use std::path::Path;
use std::sync::OnceLock;
use uuid::Uuid;

static AGENDA_CONFIG: OnceLock<AgendaConfig> = OnceLock::new();

type Controller<'conn> = AgendaController<SqliteKeyValueStore<'conn>, PresetPrompt>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Rendered subtopic row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaSubtopicDto {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Style hook (`subtopic-item` plus `subtopic-completed` when done).
    pub class_name: String,
    pub can_delete: bool,
}

/// Rendered topic card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaTopicDto {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub comment: String,
    pub class_name: String,
    pub subtopics: Vec<AgendaSubtopicDto>,
    pub can_add_subtopic: bool,
    pub can_delete: bool,
    /// Confirmation text Dart must show before calling `agenda_delete_topic`.
    pub delete_confirm: Option<String>,
}

/// Full view snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaViewDto {
    pub generation: u64,
    pub print_mode: bool,
    pub title: String,
    pub date: String,
    pub topics: Vec<AgendaTopicDto>,
}

/// Action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaResponse {
    /// Whether the action was applied (or declined by the user).
    pub ok: bool,
    /// `true` when the host must rebuild its widget tree from `view`.
    pub rebuilt: bool,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// Snapshot after the action; `None` when the agenda could not be opened.
    pub view: Option<AgendaViewDto>,
}

impl AgendaResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            rebuilt: false,
            message: message.into(),
            view: None,
        }
    }
}

/// Export response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaExportResponse {
    pub ok: bool,
    /// `meeting-<date>.json`.
    pub file_name: Option<String>,
    /// Pretty-printed JSON contents offered for download.
    pub contents: Option<String>,
    /// Path of the copy written into the configured export directory.
    pub written_path: Option<String>,
    pub message: String,
}

/// Loads the stored agenda (or the default one) and returns its view.
#[flutter_rust_bridge::frb(sync)]
pub fn agenda_load() -> AgendaResponse {
    with_controller(false, |_| Ok(None))
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_title(title: String) -> AgendaResponse {
    dispatch(false, move |_| Ok(UiEvent::TitleInput(title)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_date(date: String) -> AgendaResponse {
    dispatch(false, move |_| Ok(UiEvent::DateChanged(date)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_add_topic() -> AgendaResponse {
    dispatch(false, |_| Ok(UiEvent::AddTopicClicked))
}

/// Deletes one topic.
///
/// `confirmed` carries the user's answer to the card's `delete_confirm`
/// prompt; `false` leaves the agenda unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn agenda_delete_topic(index: u32, topic_id: String, confirmed: bool) -> AgendaResponse {
    dispatch(confirmed, move |controller| {
        let target = topic_target(controller, index, topic_id.as_str())?;
        Ok(UiEvent::DeleteTopicClicked { target })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_topic_completed(index: u32, topic_id: String, completed: bool) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = topic_target(controller, index, topic_id.as_str())?;
        Ok(UiEvent::TopicToggled {
            target,
            checked: completed,
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_topic_title(index: u32, topic_id: String, title: String) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = topic_target(controller, index, topic_id.as_str())?;
        Ok(UiEvent::TopicTitleInput {
            target,
            value: title,
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_topic_comment(index: u32, topic_id: String, comment: String) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = topic_target(controller, index, topic_id.as_str())?;
        Ok(UiEvent::TopicCommentInput {
            target,
            value: comment,
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_add_subtopic(index: u32, topic_id: String) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = topic_target(controller, index, topic_id.as_str())?;
        Ok(UiEvent::AddSubtopicClicked { target })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_delete_subtopic(
    topic_index: u32,
    topic_id: String,
    index: u32,
    subtopic_id: String,
) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = subtopic_target(
            controller,
            topic_index,
            topic_id.as_str(),
            index,
            subtopic_id.as_str(),
        )?;
        Ok(UiEvent::DeleteSubtopicClicked { target })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_subtopic_completed(
    topic_index: u32,
    topic_id: String,
    index: u32,
    subtopic_id: String,
    completed: bool,
) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = subtopic_target(
            controller,
            topic_index,
            topic_id.as_str(),
            index,
            subtopic_id.as_str(),
        )?;
        Ok(UiEvent::SubtopicToggled {
            target,
            checked: completed,
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn agenda_set_subtopic_title(
    topic_index: u32,
    topic_id: String,
    index: u32,
    subtopic_id: String,
    title: String,
) -> AgendaResponse {
    dispatch(false, move |controller| {
        let target = subtopic_target(
            controller,
            topic_index,
            topic_id.as_str(),
            index,
            subtopic_id.as_str(),
        )?;
        Ok(UiEvent::SubtopicTitleInput {
            target,
            value: title,
        })
    })
}

/// Replaces the agenda with the contents of a user-selected file.
///
/// On parse failure `ok=false`, the message carries the alert text and the
/// returned view still shows the untouched agenda.
#[flutter_rust_bridge::frb(sync)]
pub fn agenda_import(contents: String) -> AgendaResponse {
    dispatch(false, move |_| Ok(UiEvent::ImportFile(contents)))
}

/// Builds the export file and writes a copy into the export directory.
#[flutter_rust_bridge::frb(sync)]
pub fn agenda_export() -> AgendaExportResponse {
    export_at(resolve_config())
}

/// Plain-text print layout of the stored agenda.
///
/// Returns an empty string when the agenda cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn agenda_print_preview() -> String {
    preview_at(resolve_config().db_path.as_path()).unwrap_or_else(|err| {
        warn!("event=ffi_print_preview module=ffi status=error error={err}");
        String::new()
    })
}

fn resolve_config() -> &'static AgendaConfig {
    AGENDA_CONFIG.get_or_init(AgendaConfig::from_env)
}

fn dispatch(
    confirmed: bool,
    build_event: impl FnOnce(&Controller<'_>) -> Result<UiEvent, String>,
) -> AgendaResponse {
    with_controller(confirmed, move |controller| {
        let event = build_event(&*controller)?;
        Ok(Some(controller.dispatch(event)))
    })
}

fn with_controller(
    confirmed: bool,
    action: impl FnOnce(&mut Controller<'_>) -> Result<Option<DispatchOutcome>, String>,
) -> AgendaResponse {
    with_controller_at(resolve_config().db_path.as_path(), confirmed, action)
}

fn with_controller_at(
    db_path: &Path,
    confirmed: bool,
    action: impl FnOnce(&mut Controller<'_>) -> Result<Option<DispatchOutcome>, String>,
) -> AgendaResponse {
    let conn = match open_db(db_path) {
        Ok(conn) => conn,
        Err(err) => return AgendaResponse::failure(format!("agenda DB open failed: {err}")),
    };
    let store = match SqliteKeyValueStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => return AgendaResponse::failure(format!("agenda store init failed: {err}")),
    };
    let mut controller =
        match AgendaController::open(AgendaPersistence::new(store), PresetPrompt::new(confirmed)) {
            Ok(controller) => controller,
            Err(err) => return AgendaResponse::failure(format!("agenda load failed: {err}")),
        };

    let outcome = match action(&mut controller) {
        Ok(outcome) => outcome,
        Err(message) => {
            return AgendaResponse {
                ok: false,
                rebuilt: false,
                message,
                view: Some(to_view_dto(controller.view())),
            };
        }
    };

    let (ok, rebuilt, mut message) = match outcome {
        None => (true, false, "Loaded.".to_string()),
        Some(DispatchOutcome::Rebuilt) => (true, true, "Updated.".to_string()),
        Some(DispatchOutcome::Patched) => (true, false, "Saved.".to_string()),
        Some(DispatchOutcome::Cancelled) => (true, false, "Cancelled.".to_string()),
        Some(DispatchOutcome::Ignored) => (false, false, "Agenda is read-only.".to_string()),
        Some(DispatchOutcome::ImportRejected(err)) => {
            let alert = controller
                .prompt()
                .alerts
                .last()
                .cloned()
                .unwrap_or_default();
            (false, false, format!("{alert}: {err}"))
        }
    };
    if let Some(save_error) = controller.last_save_error() {
        message = format!("{message} Save failed: {save_error}");
    }

    AgendaResponse {
        ok,
        rebuilt,
        message,
        view: Some(to_view_dto(controller.view())),
    }
}

fn export_at(config: &AgendaConfig) -> AgendaExportResponse {
    let failure = |message: String| AgendaExportResponse {
        ok: false,
        file_name: None,
        contents: None,
        written_path: None,
        message,
    };

    let conn = match open_db(config.db_path.as_path()) {
        Ok(conn) => conn,
        Err(err) => return failure(format!("agenda DB open failed: {err}")),
    };
    let store = match SqliteKeyValueStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => return failure(format!("agenda store init failed: {err}")),
    };
    let controller: Controller<'_> =
        match AgendaController::open(AgendaPersistence::new(store), PresetPrompt::default()) {
            Ok(controller) => controller,
            Err(err) => return failure(format!("agenda load failed: {err}")),
        };

    let export = match controller.export_file() {
        Ok(export) => export,
        Err(err) => return failure(format!("agenda export failed: {err}")),
    };
    match controller.export_to_dir(config.export_dir.as_path()) {
        Ok(path) => AgendaExportResponse {
            ok: true,
            file_name: Some(export.file_name),
            contents: Some(export.contents),
            written_path: Some(path.display().to_string()),
            message: "Exported.".to_string(),
        },
        Err(err) => AgendaExportResponse {
            ok: false,
            file_name: Some(export.file_name),
            contents: Some(export.contents),
            written_path: None,
            message: format!("agenda export failed: {err}"),
        },
    }
}

fn preview_at(db_path: &Path) -> Result<String, String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let store = SqliteKeyValueStore::try_new(&conn).map_err(|err| err.to_string())?;
    let controller: Controller<'_> =
        AgendaController::open(AgendaPersistence::new(store), PresetPrompt::default())
            .map_err(|err| err.to_string())?;
    Ok(controller.print_preview())
}

fn topic_target(
    controller: &Controller<'_>,
    index: u32,
    topic_id: &str,
) -> Result<TopicBinding, String> {
    let id = parse_item_id(topic_id)?;
    controller
        .resolve_topic(index as usize, id)
        .ok_or_else(|| format!("stale topic reference: index {index} id {topic_id}"))
}

fn subtopic_target(
    controller: &Controller<'_>,
    topic_index: u32,
    topic_id: &str,
    index: u32,
    subtopic_id: &str,
) -> Result<SubtopicBinding, String> {
    let topic = topic_target(controller, topic_index, topic_id)?;
    let id = parse_item_id(subtopic_id)?;
    controller
        .resolve_subtopic(topic, index as usize, id)
        .ok_or_else(|| format!("stale subtopic reference: index {index} id {subtopic_id}"))
}

fn parse_item_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid item id `{raw}`"))
}

fn to_view_dto(view: &AgendaView) -> AgendaViewDto {
    AgendaViewDto {
        generation: view.generation,
        print_mode: view.mode == agenda_core::RenderMode::Print,
        title: view.header.title.value.clone(),
        date: view.header.date.value.clone(),
        topics: view
            .topics
            .iter()
            .map(|card| AgendaTopicDto {
                index: card.binding.index as u32,
                id: card.binding.id.to_string(),
                title: card.title.value.clone(),
                completed: card.completed,
                comment: card.comment.value.clone(),
                class_name: card.class_name().to_string(),
                subtopics: card
                    .subtopics
                    .iter()
                    .map(|row| AgendaSubtopicDto {
                        index: row.binding.index as u32,
                        id: row.binding.id.to_string(),
                        title: row.title.value.clone(),
                        completed: row.completed,
                        class_name: row.class_name().to_string(),
                        can_delete: row.delete.is_some(),
                    })
                    .collect(),
                can_add_subtopic: card.add_subtopic.is_some(),
                can_delete: card.delete.is_some(),
                delete_confirm: card
                    .delete
                    .as_ref()
                    .and_then(|button| button.confirm)
                    .map(str::to_string),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        agenda_add_topic, agenda_load, agenda_print_preview, agenda_set_topic_completed,
        core_version, export_at, init_logging, ping, preview_at, to_view_dto, topic_target,
        with_controller_at, AgendaResponse, Controller,
    };
    use agenda_core::{AgendaConfig, UiEvent};
    use std::path::Path;

    fn run(
        db_path: &Path,
        confirmed: bool,
        event: impl FnOnce(&Controller<'_>) -> Result<UiEvent, String>,
    ) -> AgendaResponse {
        with_controller_at(db_path, confirmed, |controller| {
            let event = event(&*controller)?;
            Ok(Some(controller.dispatch(event)))
        })
    }

    fn delete_first_topic(controller: &Controller<'_>) -> Result<UiEvent, String> {
        let id = controller.view().topics[0].binding.id.to_string();
        Ok(UiEvent::DeleteTopicClicked {
            target: topic_target(controller, 0, id.as_str())?,
        })
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn load_returns_default_agenda_for_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");

        let response = with_controller_at(&db_path, false, |_| Ok(None));

        assert!(response.ok, "{}", response.message);
        let view = response.view.expect("view snapshot");
        assert_eq!(view.title, "Weekly Agenda");
        assert_eq!(view.topics.len(), 1);
        assert_eq!(view.topics[0].title, "Project Updates");
        assert_eq!(view.topics[0].subtopics.len(), 2);
        assert_eq!(
            view.topics[0].delete_confirm.as_deref(),
            Some("Delete this topic?")
        );
    }

    #[test]
    fn delete_topic_respects_confirmation_answer() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");
        let declined = run(&db_path, false, delete_first_topic);
        assert!(declined.ok);
        assert!(!declined.rebuilt);
        assert_eq!(declined.view.unwrap().topics.len(), 1);

        let accepted = run(&db_path, true, delete_first_topic);
        assert!(accepted.ok);
        assert!(accepted.rebuilt);
        assert!(accepted.view.unwrap().topics.is_empty());

        let reloaded = with_controller_at(&db_path, false, |_| Ok(None));
        assert!(reloaded.view.unwrap().topics.is_empty());
    }

    #[test]
    fn stale_topic_reference_is_rejected_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");
        let unknown = uuid::Uuid::new_v4().to_string();

        let response = run(&db_path, true, |controller| {
            Ok(UiEvent::DeleteTopicClicked {
                target: topic_target(controller, 0, unknown.as_str())?,
            })
        });

        assert!(!response.ok);
        assert!(response.message.contains("stale topic reference"));
        assert_eq!(response.view.unwrap().topics.len(), 1);
    }

    #[test]
    fn invalid_import_reports_alert_and_keeps_agenda() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");
        let before = with_controller_at(&db_path, false, |_| Ok(None)).view.unwrap();

        let response = run(&db_path, false, |_| {
            Ok(UiEvent::ImportFile("not json".to_string()))
        });

        assert!(!response.ok);
        assert!(response.message.starts_with("Invalid file format"));
        let after = response.view.unwrap();
        assert_eq!(after.title, before.title);
        assert_eq!(after.topics, before.topics);
    }

    #[test]
    fn corrupt_store_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");
        {
            let conn = agenda_core::db::open_db(&db_path).unwrap();
            let store = agenda_core::SqliteKeyValueStore::try_new(&conn).unwrap();
            agenda_core::KeyValueStore::set_item(&store, agenda_core::STORAGE_KEY, "{broken")
                .unwrap();
        }

        let response = with_controller_at(&db_path, false, |_| Ok(None));

        assert!(!response.ok);
        assert!(response.view.is_none());
        assert!(response.message.contains("corrupt"));
    }

    #[test]
    fn export_writes_named_file_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgendaConfig {
            db_path: dir.path().join("agenda.sqlite3"),
            export_dir: dir.path().to_path_buf(),
        };
        run(&config.db_path, false, |_| {
            Ok(UiEvent::DateChanged("2024-03-01".to_string()))
        });

        let response = export_at(&config);

        assert!(response.ok, "{}", response.message);
        assert_eq!(response.file_name.as_deref(), Some("meeting-2024-03-01.json"));
        let written =
            std::fs::read_to_string(dir.path().join("meeting-2024-03-01.json")).unwrap();
        assert_eq!(Some(written), response.contents);
    }

    #[test]
    fn print_preview_lists_topics_with_checkboxes() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("agenda.sqlite3");

        let text = preview_at(&db_path).unwrap();

        assert!(text.starts_with("Weekly Agenda\n"));
        assert!(text.contains("[ ] 1. Project Updates"));
        assert!(text.contains("[ ] Frontend Status"));
    }

    #[test]
    fn view_dto_marks_completed_cards() {
        let mut document = agenda_core::AgendaDocument::default();
        document.set_topic_completed(0, true);
        let view = agenda_core::render(&document, agenda_core::RenderMode::Print, 3);

        let dto = to_view_dto(&view);

        assert!(dto.print_mode);
        assert_eq!(dto.generation, 3);
        assert_eq!(dto.topics[0].class_name, "topic-card topic-completed");
        assert!(!dto.topics[0].can_delete);
        assert_eq!(dto.topics[0].delete_confirm, None);
    }

    #[test]
    fn public_api_adds_and_toggles_topic_in_configured_store() {
        let added = agenda_add_topic();
        assert!(added.ok, "{}", added.message);
        assert!(added.rebuilt);
        let view = added.view.expect("view snapshot");
        let topic = view.topics.last().expect("added topic").clone();
        assert_eq!(topic.title, "");

        let toggled = agenda_set_topic_completed(topic.index, topic.id.clone(), true);
        assert!(toggled.ok, "{}", toggled.message);
        assert!(!toggled.rebuilt);
        let toggled_view = toggled.view.expect("view snapshot");
        let card = toggled_view
            .topics
            .iter()
            .find(|card| card.id == topic.id)
            .expect("toggled topic present");
        assert!(card.completed);

        assert!(agenda_load().ok);
        assert!(!agenda_print_preview().is_empty());
    }
}
