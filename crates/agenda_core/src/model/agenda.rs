//! Agenda document model.
//!
//! # Responsibility
//! - Define the document/topic/subtopic tree and its wire shape.
//! - Provide positional mutation helpers used by the controller.
//!
//! # Invariants
//! - `id` values are generated at creation and never reassigned.
//! - `topics` and `subtopics` keep insertion order.
//! - Out-of-range indices are caller bugs and panic instead of being clamped.

use chrono::Local;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier for topics and subtopics.
pub type ItemId = Uuid;

const DEFAULT_TITLE: &str = "Weekly Agenda";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

fn new_item_id() -> ItemId {
    Uuid::new_v4()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Text(String),
    Other(IgnoredAny),
}

/// Accepts any JSON value as an id; values that are not UUID strings are
/// replaced with a fresh id.
fn deserialize_item_id<'de, D>(deserializer: D) -> Result<ItemId, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match RawItemId::deserialize(deserializer)? {
        RawItemId::Text(raw) => Uuid::parse_str(raw.trim()).ok(),
        RawItemId::Other(_) => None,
    };
    Ok(id.unwrap_or_else(new_item_id))
}

/// Leaf agenda item owned by one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    /// Filled with a fresh id when an imported file omits it or carries a
    /// non-UUID value.
    #[serde(default = "new_item_id", deserialize_with = "deserialize_item_id")]
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtopic {
    /// Creates a subtopic with a generated id and `completed = false`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_item_id(),
            title: title.into(),
            completed: false,
        }
    }
}

/// Top-level agenda item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default = "new_item_id", deserialize_with = "deserialize_item_id")]
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Free-form meeting notes.
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    /// Creates an empty topic with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_item_id(),
            title: title.into(),
            completed: false,
            comment: String::new(),
            subtopics: Vec::new(),
        }
    }

    fn subtopic_mut(&mut self, index: usize) -> &mut Subtopic {
        self.check_subtopic_index(index);
        &mut self.subtopics[index]
    }

    fn check_subtopic_index(&self, index: usize) {
        let len = self.subtopics.len();
        assert!(
            index < len,
            "subtopic index {index} out of range for topic {} with {len} subtopic(s)",
            self.id
        );
    }
}

/// Root agenda aggregate.
///
/// Serialized as `{title, date, topics}` for both local storage and export
/// files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaDocument {
    pub title: String,
    /// ISO-8601 calendar date (`YYYY-MM-DD`). Not validated.
    pub date: String,
    pub topics: Vec<Topic>,
}

impl Default for AgendaDocument {
    /// Built-in starter agenda dated today.
    fn default() -> Self {
        let mut topic = Topic::new("Project Updates");
        topic.subtopics.push(Subtopic::new("Frontend Status"));
        topic.subtopics.push(Subtopic::new("Backend API"));

        Self {
            title: DEFAULT_TITLE.to_string(),
            date: Local::now().date_naive().format(DEFAULT_DATE_FORMAT).to_string(),
            topics: vec![topic],
        }
    }
}

impl AgendaDocument {
    /// Creates a document with no topics.
    pub fn empty(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            topics: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    /// Appends an empty topic and returns its id.
    pub fn add_topic(&mut self) -> ItemId {
        let topic = Topic::new("");
        let id = topic.id;
        self.topics.push(topic);
        id
    }

    /// Removes the topic at `index`, shifting later topics down by one.
    ///
    /// # Panics
    /// - When `index >= topics.len()`.
    pub fn remove_topic(&mut self, index: usize) -> Topic {
        self.check_topic_index(index);
        self.topics.remove(index)
    }

    pub fn set_topic_completed(&mut self, index: usize, completed: bool) {
        self.topic_mut(index).completed = completed;
    }

    pub fn set_topic_title(&mut self, index: usize, title: impl Into<String>) {
        self.topic_mut(index).title = title.into();
    }

    pub fn set_topic_comment(&mut self, index: usize, comment: impl Into<String>) {
        self.topic_mut(index).comment = comment.into();
    }

    /// Appends an empty subtopic to the addressed topic and returns its id.
    pub fn add_subtopic(&mut self, topic_index: usize) -> ItemId {
        let subtopic = Subtopic::new("");
        let id = subtopic.id;
        self.topic_mut(topic_index).subtopics.push(subtopic);
        id
    }

    /// Removes one subtopic by position.
    ///
    /// # Panics
    /// - When either index is out of range.
    pub fn remove_subtopic(&mut self, topic_index: usize, sub_index: usize) -> Subtopic {
        let topic = self.topic_mut(topic_index);
        topic.check_subtopic_index(sub_index);
        topic.subtopics.remove(sub_index)
    }

    pub fn set_subtopic_completed(
        &mut self,
        topic_index: usize,
        sub_index: usize,
        completed: bool,
    ) {
        self.topic_mut(topic_index).subtopic_mut(sub_index).completed = completed;
    }

    pub fn set_subtopic_title(
        &mut self,
        topic_index: usize,
        sub_index: usize,
        title: impl Into<String>,
    ) {
        self.topic_mut(topic_index).subtopic_mut(sub_index).title = title.into();
    }

    /// Replaces the whole document, e.g. after a successful import.
    pub fn replace_all(&mut self, document: AgendaDocument) {
        *self = document;
    }

    /// Returns the topic at `index`.
    ///
    /// # Panics
    /// - When `index >= topics.len()`.
    pub fn topic(&self, index: usize) -> &Topic {
        self.check_topic_index(index);
        &self.topics[index]
    }

    /// Current position of a topic id, if still present.
    pub fn topic_position(&self, id: ItemId) -> Option<usize> {
        self.topics.iter().position(|topic| topic.id == id)
    }

    /// Current position of a subtopic id under the addressed topic.
    pub fn subtopic_position(&self, topic_index: usize, id: ItemId) -> Option<usize> {
        self.topic(topic_index)
            .subtopics
            .iter()
            .position(|subtopic| subtopic.id == id)
    }

    /// Gives every repeated topic or subtopic id a fresh value.
    ///
    /// The first occurrence keeps its id. Returns how many ids were replaced.
    pub fn regenerate_duplicate_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut replaced = 0;
        for topic in &mut self.topics {
            if !seen.insert(topic.id) {
                topic.id = fresh_unique_id(&seen);
                seen.insert(topic.id);
                replaced += 1;
            }
            for subtopic in &mut topic.subtopics {
                if !seen.insert(subtopic.id) {
                    subtopic.id = fresh_unique_id(&seen);
                    seen.insert(subtopic.id);
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Total number of subtopics across all topics.
    pub fn subtopic_count(&self) -> usize {
        self.topics.iter().map(|topic| topic.subtopics.len()).sum()
    }

    fn topic_mut(&mut self, index: usize) -> &mut Topic {
        self.check_topic_index(index);
        &mut self.topics[index]
    }

    fn check_topic_index(&self, index: usize) {
        let len = self.topics.len();
        assert!(
            index < len,
            "topic index {index} out of range for agenda with {len} topic(s)"
        );
    }
}

fn fresh_unique_id(taken: &HashSet<ItemId>) -> ItemId {
    loop {
        let id = new_item_id();
        if !taken.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AgendaDocument, Topic};

    #[test]
    fn default_document_is_dated_today_in_iso_form() {
        let document = AgendaDocument::default();
        assert_eq!(document.date.len(), 10);
        assert_eq!(document.date.as_bytes()[4], b'-');
        assert_eq!(document.date.as_bytes()[7], b'-');
    }

    #[test]
    #[should_panic(expected = "subtopic index 2 out of range")]
    fn remove_subtopic_panics_past_end() {
        let mut document = AgendaDocument::default();
        document.remove_subtopic(0, 2);
    }

    #[test]
    fn regenerate_duplicate_ids_keeps_first_occurrence() {
        let mut document = AgendaDocument::empty("Dup", "2024-01-01");
        let first = Topic::new("First");
        let mut second = Topic::new("Second");
        second.id = first.id;
        let first_id = first.id;
        document.topics.push(first);
        document.topics.push(second);

        assert_eq!(document.regenerate_duplicate_ids(), 1);
        assert_eq!(document.topics[0].id, first_id);
        assert_ne!(document.topics[1].id, first_id);
        assert_eq!(document.regenerate_duplicate_ids(), 0);
    }
}
