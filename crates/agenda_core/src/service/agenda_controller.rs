//! Agenda editing controller.
//!
//! # Responsibility
//! - Own the live document, its persistence adapter and the current view.
//! - Route every user event to exactly one of two paths:
//!   structural (mutate, persist, rebuild) or in-place (mutate, persist, patch).
//!
//! # Invariants
//! - Persistence runs before the rebuild of the same event.
//! - In-place edits never bump the view generation.
//! - Events are only applied through bindings of the current view; a stale
//!   binding is a caller bug and panics.
//! - A failed save is logged and recorded; it never aborts the view update.
//! - Print mode ignores edit events; imports are applied in either mode.

use crate::model::agenda::{AgendaDocument, ItemId};
use crate::repo::storage_repo::KeyValueStore;
use crate::service::persistence::{
    export_file, export_to_dir, import_from_str, AgendaPersistence, ExportFile, ImportParseError,
    PersistenceResult,
};
use crate::view::{
    render, render_plain_text, AgendaView, RenderMode, SubtopicBinding, TopicBinding, UiEvent,
};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

const IMPORT_FAILED_MESSAGE: &str = "Invalid file format";
const INITIAL_GENERATION: u64 = 1;

/// Blocking user prompts supplied by the host.
pub trait UserPrompt {
    /// Asks the user to accept a destructive action.
    fn confirm(&mut self, message: &str) -> bool;
    /// Shows a blocking notification.
    fn alert(&mut self, message: &str);
}

/// Prompt with a fixed confirmation answer that records what was shown.
///
/// Used by hosts that collect the user's decision before dispatching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetPrompt {
    pub confirm_answer: bool,
    pub confirmations: Vec<String>,
    pub alerts: Vec<String>,
}

impl PresetPrompt {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            confirm_answer,
            ..Self::default()
        }
    }
}

impl UserPrompt for PresetPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        self.confirmations.push(message.to_string());
        self.confirm_answer
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sequence shape changed; the view was rebuilt.
    Rebuilt,
    /// A scalar field changed; the existing view was patched.
    Patched,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// Imported content did not parse; the document is unchanged.
    ImportRejected(ImportParseError),
    /// Edit event received while the view is in print mode.
    Ignored,
}

/// Single owner of the live agenda.
pub struct AgendaController<S: KeyValueStore, P: UserPrompt> {
    document: AgendaDocument,
    persistence: AgendaPersistence<S>,
    prompt: P,
    view: AgendaView,
    last_save_error: Option<String>,
}

impl<S: KeyValueStore, P: UserPrompt> AgendaController<S, P> {
    /// Loads the stored agenda (or the default one) and renders it.
    ///
    /// # Errors
    /// - Propagates storage failures and corrupt stored data unchanged.
    pub fn open(persistence: AgendaPersistence<S>, prompt: P) -> PersistenceResult<Self> {
        let document = persistence.load()?;
        Ok(Self::with_document(document, persistence, prompt))
    }

    /// Wraps an already-loaded document without touching storage.
    pub fn with_document(
        document: AgendaDocument,
        persistence: AgendaPersistence<S>,
        prompt: P,
    ) -> Self {
        let view = render(&document, RenderMode::Edit, INITIAL_GENERATION);
        Self {
            document,
            persistence,
            prompt,
            view,
            last_save_error: None,
        }
    }

    pub fn document(&self) -> &AgendaDocument {
        &self.document
    }

    pub fn view(&self) -> &AgendaView {
        &self.view
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn persistence(&self) -> &AgendaPersistence<S> {
        &self.persistence
    }

    /// Message of the most recent failed save, cleared by the next success.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Applies one user event.
    ///
    /// In print mode only `ImportFile` is applied; edit events are ignored.
    ///
    /// # Panics
    /// - When the event carries a binding that does not resolve against the
    ///   current view.
    pub fn dispatch(&mut self, event: UiEvent) -> DispatchOutcome {
        if self.view.mode == RenderMode::Print && !matches!(event, UiEvent::ImportFile(_)) {
            debug!(
                "event=ui_dispatch module=controller status=ignored mode=print structural={}",
                event.is_structural()
            );
            return DispatchOutcome::Ignored;
        }

        match event {
            UiEvent::TitleInput(value) => self.apply_in_place(
                |document| document.set_title(value.as_str()),
                |view| view.patch_title(value.as_str()),
            ),
            UiEvent::DateChanged(value) => self.apply_in_place(
                |document| document.set_date(value.as_str()),
                |view| view.patch_date(value.as_str()),
            ),
            UiEvent::AddTopicClicked => self.apply_structural("add_topic", |document| {
                document.add_topic();
            }),
            UiEvent::TopicToggled { target, checked } => {
                self.ensure_topic(target);
                self.apply_in_place(
                    |document| document.set_topic_completed(target.index, checked),
                    |view| view.patch_topic_completed(target, checked),
                )
            }
            UiEvent::TopicTitleInput { target, value } => {
                self.ensure_topic(target);
                self.apply_in_place(
                    |document| document.set_topic_title(target.index, value.as_str()),
                    |view| view.patch_topic_title(target, value.as_str()),
                )
            }
            UiEvent::TopicCommentInput { target, value } => {
                self.ensure_topic(target);
                self.apply_in_place(
                    |document| document.set_topic_comment(target.index, value.as_str()),
                    |view| view.patch_topic_comment(target, value.as_str()),
                )
            }
            UiEvent::AddSubtopicClicked { target } => {
                self.ensure_topic(target);
                self.apply_structural("add_subtopic", |document| {
                    document.add_subtopic(target.index);
                })
            }
            UiEvent::DeleteTopicClicked { target } => {
                self.ensure_topic(target);
                if !self.confirm_topic_delete(target) {
                    info!("event=agenda_mutation module=controller kind=remove_topic status=cancelled");
                    return DispatchOutcome::Cancelled;
                }
                self.apply_structural("remove_topic", |document| {
                    document.remove_topic(target.index);
                })
            }
            UiEvent::SubtopicToggled { target, checked } => {
                self.ensure_subtopic(target);
                self.apply_in_place(
                    |document| {
                        document.set_subtopic_completed(target.topic_index, target.index, checked)
                    },
                    |view| view.patch_subtopic_completed(target, checked),
                )
            }
            UiEvent::SubtopicTitleInput { target, value } => {
                self.ensure_subtopic(target);
                self.apply_in_place(
                    |document| {
                        document.set_subtopic_title(target.topic_index, target.index, value.as_str())
                    },
                    |view| view.patch_subtopic_title(target, value.as_str()),
                )
            }
            UiEvent::DeleteSubtopicClicked { target } => {
                self.ensure_subtopic(target);
                self.apply_structural("remove_subtopic", |document| {
                    document.remove_subtopic(target.topic_index, target.index);
                })
            }
            UiEvent::ImportFile(contents) => self.import_file(contents.as_str()),
        }
    }

    /// Replaces the document with parsed file contents.
    ///
    /// On parse failure the user is alerted and the live document is left
    /// untouched.
    pub fn import_file(&mut self, contents: &str) -> DispatchOutcome {
        match import_from_str(contents) {
            Ok(imported) => {
                info!(
                    "event=agenda_import module=controller status=ok topics={} subtopics={}",
                    imported.topics.len(),
                    imported.subtopic_count()
                );
                self.apply_structural("replace_all", |document| document.replace_all(imported))
            }
            Err(err) => {
                warn!(
                    "event=agenda_import module=controller status=error error_code=parse_failed line={} column={}",
                    err.line, err.column
                );
                self.prompt.alert(IMPORT_FAILED_MESSAGE);
                DispatchOutcome::ImportRejected(err)
            }
        }
    }

    /// Switches between editor and print presentation.
    ///
    /// Changing mode rebuilds the view; the document and storage are untouched.
    pub fn set_mode(&mut self, mode: RenderMode) {
        if self.view.mode == mode {
            return;
        }
        self.rebuild(mode);
    }

    /// Printable plain-text rendering of the current document.
    pub fn print_preview(&self) -> String {
        render_plain_text(&render(
            &self.document,
            RenderMode::Print,
            self.view.generation,
        ))
    }

    /// Export payload of the current document.
    pub fn export_file(&self) -> PersistenceResult<ExportFile> {
        export_file(&self.document)
    }

    /// Writes the export file into `dir`.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> PersistenceResult<PathBuf> {
        export_to_dir(&self.document, dir)
    }

    /// Looks up a topic binding in the current view by position and id.
    pub fn resolve_topic(&self, index: usize, id: ItemId) -> Option<TopicBinding> {
        self.view
            .topics
            .get(index)
            .map(|card| card.binding)
            .filter(|binding| binding.id == id)
    }

    /// Looks up a subtopic binding in the current view by positions and ids.
    pub fn resolve_subtopic(
        &self,
        topic: TopicBinding,
        index: usize,
        id: ItemId,
    ) -> Option<SubtopicBinding> {
        self.view
            .topic_card(topic)?
            .subtopics
            .get(index)
            .map(|row| row.binding)
            .filter(|binding| binding.id == id)
    }

    fn apply_structural(
        &mut self,
        kind: &'static str,
        mutate: impl FnOnce(&mut AgendaDocument),
    ) -> DispatchOutcome {
        mutate(&mut self.document);
        self.persist();
        self.rebuild(self.view.mode);
        info!(
            "event=agenda_mutation module=controller kind={} status=ok topics={} generation={}",
            kind,
            self.document.topics.len(),
            self.view.generation
        );
        DispatchOutcome::Rebuilt
    }

    fn apply_in_place(
        &mut self,
        mutate: impl FnOnce(&mut AgendaDocument),
        patch: impl FnOnce(&mut AgendaView),
    ) -> DispatchOutcome {
        mutate(&mut self.document);
        self.persist();
        patch(&mut self.view);
        DispatchOutcome::Patched
    }

    fn persist(&mut self) {
        match self.persistence.save(&self.document) {
            Ok(()) => self.last_save_error = None,
            Err(err) => {
                error!(
                    "event=agenda_save module=controller status=error error_code=save_failed error={}",
                    err
                );
                self.last_save_error = Some(err.to_string());
            }
        }
    }

    fn rebuild(&mut self, mode: RenderMode) {
        let generation = self.view.generation + 1;
        self.view = render(&self.document, mode, generation);
    }

    fn confirm_topic_delete(&mut self, target: TopicBinding) -> bool {
        let message = self
            .view
            .topic_card(target)
            .and_then(|card| card.delete.as_ref())
            .and_then(|button| button.confirm);
        match message {
            Some(message) => self.prompt.confirm(message),
            None => true,
        }
    }

    fn ensure_topic(&self, target: TopicBinding) {
        assert!(
            self.view.topic_card(target).is_some(),
            "stale topic binding: index {} id {} generation {} (view generation {}, {} topic(s))",
            target.index,
            target.id,
            target.generation,
            self.view.generation,
            self.view.topics.len()
        );
    }

    fn ensure_subtopic(&self, target: SubtopicBinding) {
        assert!(
            self.view.subtopic_row(target).is_some(),
            "stale subtopic binding: topic {} index {} id {} generation {} (view generation {})",
            target.topic_index,
            target.index,
            target.id,
            target.generation,
            self.view.generation
        );
    }
}
