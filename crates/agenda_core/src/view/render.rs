//! Full-rebuild renderer and control bindings.

use crate::model::agenda::{AgendaDocument, ItemId, Subtopic, Topic};

const TOPIC_TITLE_PLACEHOLDER: &str = "Topic Title";
const TOPIC_COMMENT_PLACEHOLDER: &str = "Add notes or minutes here...";
const SUBTOPIC_TITLE_PLACEHOLDER: &str = "Sub-item";
const ADD_TOPIC_LABEL: &str = "Add Topic";
const ADD_SUBTOPIC_LABEL: &str = "+ Add Sub-item";
const DELETE_TOPIC_LABEL: &str = "Remove Topic";
const DELETE_SUBTOPIC_LABEL: &str = "Remove Sub-item";
const DELETE_TOPIC_CONFIRM: &str = "Delete this topic?";

/// Presentation mode of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Interactive editor with add/delete affordances.
    #[default]
    Edit,
    /// Read-only document view for printing/PDF.
    Print,
}

/// Topic address captured by a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicBinding {
    pub generation: u64,
    pub index: usize,
    pub id: ItemId,
}

/// Subtopic address captured by a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubtopicBinding {
    pub generation: u64,
    pub topic_index: usize,
    pub topic_id: ItemId,
    pub index: usize,
    pub id: ItemId,
}

impl SubtopicBinding {
    /// Binding of the owning topic card.
    pub fn topic(&self) -> TopicBinding {
        TopicBinding {
            generation: self.generation,
            index: self.topic_index,
            id: self.topic_id,
        }
    }
}

/// User interaction reported by a host against a rendered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    TitleInput(String),
    DateChanged(String),
    AddTopicClicked,
    TopicToggled {
        target: TopicBinding,
        checked: bool,
    },
    TopicTitleInput {
        target: TopicBinding,
        value: String,
    },
    TopicCommentInput {
        target: TopicBinding,
        value: String,
    },
    AddSubtopicClicked {
        target: TopicBinding,
    },
    DeleteTopicClicked {
        target: TopicBinding,
    },
    SubtopicToggled {
        target: SubtopicBinding,
        checked: bool,
    },
    SubtopicTitleInput {
        target: SubtopicBinding,
        value: String,
    },
    DeleteSubtopicClicked {
        target: SubtopicBinding,
    },
    /// Full text of a user-selected file.
    ImportFile(String),
}

impl UiEvent {
    /// Whether handling this event changes sequence shape and forces a rebuild.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AddTopicClicked
                | Self::AddSubtopicClicked { .. }
                | Self::DeleteTopicClicked { .. }
                | Self::DeleteSubtopicClicked { .. }
                | Self::ImportFile(_)
        )
    }
}

/// Completion checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub checked: bool,
    /// `false` in print mode.
    pub enabled: bool,
}

/// Single or multi-line text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub value: String,
    pub placeholder: &'static str,
    pub multiline: bool,
    pub read_only: bool,
}

/// Clickable action control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    /// Prompt the user must accept before the action is applied.
    pub confirm: Option<&'static str>,
}

/// Meeting title/date header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub title: TextField,
    pub date: TextField,
    pub add_topic: Option<Button>,
}

/// One rendered subtopic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicRow {
    pub binding: SubtopicBinding,
    pub completed: bool,
    pub toggle: Toggle,
    pub title: TextField,
    pub delete: Option<Button>,
}

impl SubtopicRow {
    pub fn class_name(&self) -> &'static str {
        if self.completed {
            "subtopic-item subtopic-completed"
        } else {
            "subtopic-item"
        }
    }

    pub fn toggled(&self, checked: bool) -> UiEvent {
        UiEvent::SubtopicToggled {
            target: self.binding,
            checked,
        }
    }

    pub fn title_input(&self, value: impl Into<String>) -> UiEvent {
        UiEvent::SubtopicTitleInput {
            target: self.binding,
            value: value.into(),
        }
    }

    /// `None` when the row has no delete control (print mode).
    pub fn delete_clicked(&self) -> Option<UiEvent> {
        self.delete.as_ref().map(|_| UiEvent::DeleteSubtopicClicked {
            target: self.binding,
        })
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.toggle.checked = completed;
    }
}

/// One rendered topic with its subtopic rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCard {
    pub binding: TopicBinding,
    pub completed: bool,
    pub toggle: Toggle,
    pub title: TextField,
    pub comment: TextField,
    pub subtopics: Vec<SubtopicRow>,
    pub add_subtopic: Option<Button>,
    pub delete: Option<Button>,
}

impl TopicCard {
    pub fn class_name(&self) -> &'static str {
        if self.completed {
            "topic-card topic-completed"
        } else {
            "topic-card"
        }
    }

    pub fn toggled(&self, checked: bool) -> UiEvent {
        UiEvent::TopicToggled {
            target: self.binding,
            checked,
        }
    }

    pub fn title_input(&self, value: impl Into<String>) -> UiEvent {
        UiEvent::TopicTitleInput {
            target: self.binding,
            value: value.into(),
        }
    }

    pub fn comment_input(&self, value: impl Into<String>) -> UiEvent {
        UiEvent::TopicCommentInput {
            target: self.binding,
            value: value.into(),
        }
    }

    pub fn add_subtopic_clicked(&self) -> Option<UiEvent> {
        self.add_subtopic
            .as_ref()
            .map(|_| UiEvent::AddSubtopicClicked {
                target: self.binding,
            })
    }

    pub fn delete_clicked(&self) -> Option<UiEvent> {
        self.delete.as_ref().map(|_| UiEvent::DeleteTopicClicked {
            target: self.binding,
        })
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.toggle.checked = completed;
    }
}

/// Complete projection of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaView {
    pub generation: u64,
    pub mode: RenderMode,
    pub header: HeaderView,
    pub topics: Vec<TopicCard>,
}

impl AgendaView {
    pub fn title_input(&self, value: impl Into<String>) -> UiEvent {
        UiEvent::TitleInput(value.into())
    }

    pub fn date_changed(&self, value: impl Into<String>) -> UiEvent {
        UiEvent::DateChanged(value.into())
    }

    pub fn add_topic_clicked(&self) -> Option<UiEvent> {
        self.header
            .add_topic
            .as_ref()
            .map(|_| UiEvent::AddTopicClicked)
    }

    /// Card addressed by `binding`, when it belongs to this view.
    pub fn topic_card(&self, binding: TopicBinding) -> Option<&TopicCard> {
        if binding.generation != self.generation {
            return None;
        }
        self.topics
            .get(binding.index)
            .filter(|card| card.binding.id == binding.id)
    }

    /// Row addressed by `binding`, when it belongs to this view.
    pub fn subtopic_row(&self, binding: SubtopicBinding) -> Option<&SubtopicRow> {
        self.topic_card(binding.topic())?
            .subtopics
            .get(binding.index)
            .filter(|row| row.binding.id == binding.id)
    }

    pub(crate) fn patch_title(&mut self, value: &str) {
        self.header.title.value = value.to_string();
    }

    pub(crate) fn patch_date(&mut self, value: &str) {
        self.header.date.value = value.to_string();
    }

    pub(crate) fn patch_topic_completed(&mut self, binding: TopicBinding, completed: bool) {
        if let Some(card) = self.topic_card_mut(binding) {
            card.set_completed(completed);
        }
    }

    pub(crate) fn patch_topic_title(&mut self, binding: TopicBinding, value: &str) {
        if let Some(card) = self.topic_card_mut(binding) {
            card.title.value = value.to_string();
        }
    }

    pub(crate) fn patch_topic_comment(&mut self, binding: TopicBinding, value: &str) {
        if let Some(card) = self.topic_card_mut(binding) {
            card.comment.value = value.to_string();
        }
    }

    pub(crate) fn patch_subtopic_completed(&mut self, binding: SubtopicBinding, completed: bool) {
        if let Some(row) = self.subtopic_row_mut(binding) {
            row.set_completed(completed);
        }
    }

    pub(crate) fn patch_subtopic_title(&mut self, binding: SubtopicBinding, value: &str) {
        if let Some(row) = self.subtopic_row_mut(binding) {
            row.title.value = value.to_string();
        }
    }

    fn topic_card_mut(&mut self, binding: TopicBinding) -> Option<&mut TopicCard> {
        if binding.generation != self.generation {
            return None;
        }
        self.topics
            .get_mut(binding.index)
            .filter(|card| card.binding.id == binding.id)
    }

    fn subtopic_row_mut(&mut self, binding: SubtopicBinding) -> Option<&mut SubtopicRow> {
        self.topic_card_mut(binding.topic())?
            .subtopics
            .get_mut(binding.index)
            .filter(|row| row.binding.id == binding.id)
    }
}

/// Builds a fresh view of `document`.
///
/// Every card and row captures its current index and id together with
/// `generation`; bindings from an older generation never resolve against the
/// returned view.
pub fn render(document: &AgendaDocument, mode: RenderMode, generation: u64) -> AgendaView {
    let editable = mode == RenderMode::Edit;
    let header = HeaderView {
        title: text_field(document.title.as_str(), "", false, editable),
        date: text_field(document.date.as_str(), "", false, editable),
        add_topic: editable.then(|| button(ADD_TOPIC_LABEL, None)),
    };

    let topics = document
        .topics
        .iter()
        .enumerate()
        .map(|(index, topic)| {
            let binding = TopicBinding {
                generation,
                index,
                id: topic.id,
            };
            render_topic(topic, binding, editable)
        })
        .collect();

    AgendaView {
        generation,
        mode,
        header,
        topics,
    }
}

fn render_topic(topic: &Topic, binding: TopicBinding, editable: bool) -> TopicCard {
    let subtopics = topic
        .subtopics
        .iter()
        .enumerate()
        .map(|(index, subtopic)| {
            let sub_binding = SubtopicBinding {
                generation: binding.generation,
                topic_index: binding.index,
                topic_id: binding.id,
                index,
                id: subtopic.id,
            };
            render_subtopic(subtopic, sub_binding, editable)
        })
        .collect();

    TopicCard {
        binding,
        completed: topic.completed,
        toggle: Toggle {
            checked: topic.completed,
            enabled: editable,
        },
        title: text_field(topic.title.as_str(), TOPIC_TITLE_PLACEHOLDER, false, editable),
        comment: text_field(
            topic.comment.as_str(),
            TOPIC_COMMENT_PLACEHOLDER,
            true,
            editable,
        ),
        subtopics,
        add_subtopic: editable.then(|| button(ADD_SUBTOPIC_LABEL, None)),
        delete: editable.then(|| button(DELETE_TOPIC_LABEL, Some(DELETE_TOPIC_CONFIRM))),
    }
}

fn render_subtopic(subtopic: &Subtopic, binding: SubtopicBinding, editable: bool) -> SubtopicRow {
    SubtopicRow {
        binding,
        completed: subtopic.completed,
        toggle: Toggle {
            checked: subtopic.completed,
            enabled: editable,
        },
        title: text_field(
            subtopic.title.as_str(),
            SUBTOPIC_TITLE_PLACEHOLDER,
            false,
            editable,
        ),
        delete: editable.then(|| button(DELETE_SUBTOPIC_LABEL, None)),
    }
}

fn text_field(
    value: &str,
    placeholder: &'static str,
    multiline: bool,
    editable: bool,
) -> TextField {
    TextField {
        value: value.to_string(),
        placeholder,
        multiline,
        read_only: !editable,
    }
}

fn button(label: &'static str, confirm: Option<&'static str>) -> Button {
    Button { label, confirm }
}
