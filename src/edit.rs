//! Inline Edit Controller
//!
//! Holds the one edit in progress (title, due date or tag set), validates it
//! and commits it through an engine.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::engine::{EngineResult, Outcome};
use crate::models::parse_due_date;

/// Tags offered before the user adds any of their own
pub const DEFAULT_TAGS: [&str; 7] = [
    "Important",
    "Personal",
    "Work",
    "Home",
    "Shopping",
    "Urgent",
    "Low Priority",
];

/// Buffered value of an edit
#[derive(Debug, Clone, PartialEq)]
pub enum EditValue {
    Title(String),
    DueDate(Option<NaiveDate>),
    Tags(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    DueDate,
    Tags,
}

impl EditValue {
    pub fn field(&self) -> EditField {
        match self {
            EditValue::Title(_) => EditField::Title,
            EditValue::DueDate(_) => EditField::DueDate,
            EditValue::Tags(_) => EditField::Tags,
        }
    }
}

/// Engine side of an edit: persist, then apply to the node on success
#[async_trait(?Send)]
pub trait EditSink {
    type Id: Copy + PartialEq + Debug + 'static;

    async fn commit(&self, id: Self::Id, value: EditValue) -> EngineResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("another edit is in progress")]
pub struct EditBusy;

#[derive(Debug, Clone, PartialEq)]
pub struct EditState<Id> {
    pub id: Id,
    pub value: EditValue,
}

/// A validated edit detached from the controller
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit<Id> {
    pub id: Id,
    pub value: EditValue,
}

impl<Id: Copy + PartialEq + Debug + 'static> PendingEdit<Id> {
    /// Blank titles never reach the store
    fn validate(state: EditState<Id>) -> Option<Self> {
        let value = match state.value {
            EditValue::Title(title) => {
                let title = title.trim();
                if title.is_empty() {
                    log::debug!("[EDIT] Blank title for {:?} discarded", state.id);
                    return None;
                }
                EditValue::Title(title.to_string())
            }
            other => other,
        };
        Some(Self { id: state.id, value })
    }

    pub async fn save<S>(self, sink: &S) -> EngineResult
    where
        S: EditSink<Id = Id> + ?Sized,
    {
        sink.commit(self.id, self.value).await
    }
}

/// Tags known to the tag picker
#[derive(Debug, Clone, PartialEq)]
pub struct TagVocabulary {
    tags: Vec<String>,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS.iter().map(|t| t.to_string()).collect())
    }
}

impl TagVocabulary {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Known tags starting with `prefix`, case-insensitively
    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        self.tags
            .iter()
            .filter(|t| t.to_lowercase().starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }

    fn learn(&mut self, tag: &str) {
        if !self.contains(tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// The single in-flight edit plus the shared tag vocabulary
#[derive(Debug, Clone)]
pub struct EditController<Id> {
    current: Option<EditState<Id>>,
    vocabulary: TagVocabulary,
}

impl<Id: Copy + PartialEq + Debug + 'static> Default for EditController<Id> {
    fn default() -> Self {
        Self::new(TagVocabulary::default())
    }
}

impl<Id: Copy + PartialEq + Debug + 'static> EditController<Id> {
    pub fn new(vocabulary: TagVocabulary) -> Self {
        Self {
            current: None,
            vocabulary,
        }
    }

    pub fn current(&self) -> Option<&EditState<Id>> {
        self.current.as_ref()
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    pub fn title_buffer(&self) -> Option<&str> {
        match &self.current {
            Some(EditState { value: EditValue::Title(title), .. }) => Some(title),
            _ => None,
        }
    }

    pub fn due_date_buffer(&self) -> Option<NaiveDate> {
        match &self.current {
            Some(EditState { value: EditValue::DueDate(due), .. }) => *due,
            _ => None,
        }
    }

    pub fn tags_buffer(&self) -> &[String] {
        match &self.current {
            Some(EditState { value: EditValue::Tags(tags), .. }) => tags,
            _ => &[],
        }
    }

    pub fn is_editing(&self, id: Id, field: EditField) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.id == id && s.value.field() == field)
    }

    /// Start editing. Restarting the same edit resets its buffer; any other
    /// edit in progress refuses the request.
    fn begin(&mut self, id: Id, value: EditValue) -> Result<(), EditBusy> {
        if let Some(current) = &self.current {
            if current.id != id || current.value.field() != value.field() {
                log::warn!("[EDIT] Edit of {:?} refused, {:?} in progress", id, current.id);
                return Err(EditBusy);
            }
        }
        self.current = Some(EditState { id, value });
        Ok(())
    }

    pub fn begin_title(&mut self, id: Id, title: &str) -> Result<(), EditBusy> {
        self.begin(id, EditValue::Title(title.to_string()))
    }

    pub fn begin_due_date(&mut self, id: Id, due: Option<NaiveDate>) -> Result<(), EditBusy> {
        self.begin(id, EditValue::DueDate(due))
    }

    pub fn begin_tags(&mut self, id: Id, tags: Vec<String>) -> Result<(), EditBusy> {
        self.begin(id, EditValue::Tags(tags))
    }

    pub fn set_title(&mut self, title: &str) {
        if let Some(EditState { value: EditValue::Title(buf), .. }) = &mut self.current {
            *buf = title.to_string();
        }
    }

    pub fn set_due_date(&mut self, due: Option<NaiveDate>) {
        if let Some(EditState { value: EditValue::DueDate(buf), .. }) = &mut self.current {
            *buf = due;
        }
    }

    /// Date input text; empty clears the date
    pub fn set_due_date_text(&mut self, raw: &str) {
        self.set_due_date(parse_due_date(raw));
    }

    fn tag_buffer(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.current {
            Some(EditState { value: EditValue::Tags(tags), .. }) => Some(tags),
            _ => None,
        }
    }

    /// Add a tag to the buffer. New tags join the vocabulary.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            return false;
        }
        let Some(buffer) = self.tag_buffer() else {
            return false;
        };
        if buffer.contains(&tag) {
            return false;
        }
        buffer.push(tag.clone());
        self.vocabulary.learn(&tag);
        true
    }

    /// Remove a tag from the buffer; the vocabulary keeps it
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let Some(buffer) = self.tag_buffer() else {
            return false;
        };
        let before = buffer.len();
        buffer.retain(|t| t != tag);
        buffer.len() != before
    }

    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let present = match &self.current {
            Some(EditState { value: EditValue::Tags(tags), .. }) => tags.iter().any(|t| t == tag),
            _ => return false,
        };
        if present {
            self.remove_tag(tag)
        } else {
            self.add_tag(tag)
        }
    }

    pub fn cancel(&mut self) {
        self.current = None;
    }

    /// Clear the edit and hand back the validated change, if any
    pub fn take(&mut self) -> Option<PendingEdit<Id>> {
        self.current.take().and_then(PendingEdit::validate)
    }

    /// Commit the edit in progress. Edit state is cleared whatever happens.
    pub async fn save<S>(&mut self, sink: &S) -> EngineResult
    where
        S: EditSink<Id = Id> + ?Sized,
    {
        let Some(state) = self.current.take() else {
            return Ok(Outcome::Ignored);
        };
        match PendingEdit::validate(state) {
            Some(pending) => pending.save(sink).await,
            None => Ok(Outcome::Discarded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RemoteError;
    use crate::engine::EngineError;
    use std::cell::RefCell;

    /// Records commits; fails when `fail` is set
    #[derive(Default)]
    struct RecordingSink {
        commits: RefCell<Vec<(u32, EditValue)>>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl EditSink for RecordingSink {
        type Id = u32;

        async fn commit(&self, id: u32, value: EditValue) -> EngineResult {
            if self.fail {
                return Err(EngineError::Remote(RemoteError::new(500, "boom")));
            }
            self.commits.borrow_mut().push((id, value));
            Ok(Outcome::Applied)
        }
    }

    #[tokio::test]
    async fn test_blank_title_is_discarded_without_commit() {
        let sink = RecordingSink::default();
        let mut edit = EditController::default();
        edit.begin_title(1, "Groceries").unwrap();
        edit.set_title("   ");
        assert_eq!(edit.save(&sink).await.unwrap(), Outcome::Discarded);
        assert!(sink.commits.borrow().is_empty());
        assert!(edit.current().is_none());
    }

    #[tokio::test]
    async fn test_save_trims_and_clears() {
        let sink = RecordingSink::default();
        let mut edit = EditController::default();
        edit.begin_title(1, "Groceries").unwrap();
        edit.set_title("  Errands ");
        assert_eq!(edit.save(&sink).await.unwrap(), Outcome::Applied);
        assert_eq!(sink.commits.borrow()[0], (1, EditValue::Title("Errands".into())));
        assert!(edit.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_loses_buffer() {
        let sink = RecordingSink { fail: true, ..Default::default() };
        let mut edit = EditController::default();
        edit.begin_due_date(3, None).unwrap();
        edit.set_due_date_text("2025-06-01");
        assert!(edit.save(&sink).await.is_err());
        assert!(edit.current().is_none());
    }

    #[test]
    fn test_second_edit_is_refused() {
        let mut edit: EditController<u32> = EditController::default();
        edit.begin_title(1, "a").unwrap();
        assert_eq!(edit.begin_title(2, "b"), Err(EditBusy));
        assert_eq!(edit.begin_tags(1, vec![]), Err(EditBusy));
        assert!(edit.begin_title(1, "a again").is_ok());
        assert!(edit.is_editing(1, EditField::Title));
    }

    #[test]
    fn test_new_tag_joins_vocabulary_and_removal_keeps_it() {
        let mut edit: EditController<u32> = EditController::default();
        edit.begin_tags(1, vec!["Work".into()]).unwrap();

        assert!(!edit.add_tag("Work"));
        assert!(edit.add_tag("Garden"));
        assert!(edit.vocabulary().contains("Garden"));
        assert_eq!(edit.vocabulary().tags().len(), DEFAULT_TAGS.len() + 1);

        assert!(edit.remove_tag("Garden"));
        assert!(edit.vocabulary().contains("Garden"));

        assert!(edit.toggle_tag("Urgent"));
        assert!(edit.toggle_tag("Work"));
        match &edit.current().unwrap().value {
            EditValue::Tags(tags) => assert_eq!(tags, &vec!["Urgent".to_string()]),
            other => panic!("unexpected buffer {:?}", other),
        }
    }

    #[test]
    fn test_suggestions_match_prefix() {
        let vocab = TagVocabulary::default();
        assert_eq!(vocab.suggestions("wo"), vec!["Work"]);
        assert_eq!(vocab.suggestions("").len(), DEFAULT_TAGS.len());
    }
}
