//! Frontend Models
//!
//! Task lists and tasks, plus the wire records the remote store speaks.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub type ListId = u32;
pub type TaskId = u32;

/// Deepest task level shown as indentation
pub const MAX_TASK_LEVEL: u8 = 10;

/// Whether a task list holds tasks or other lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Leaf,
    Folder,
}

impl ListKind {
    pub fn from_is_folder(is_folder: bool) -> Self {
        if is_folder {
            ListKind::Folder
        } else {
            ListKind::Leaf
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ListKind::Folder)
    }
}

/// A task list or a folder of task lists
#[derive(Debug, Clone, PartialEq)]
pub struct TaskList {
    pub id: ListId,
    pub title: String,
    pub kind: ListKind,
    /// Containing folder (None = root level)
    pub parent_id: Option<ListId>,
    pub children: Vec<TaskList>,
}

impl TaskList {
    pub fn new(id: ListId, title: &str, kind: ListKind) -> Self {
        Self {
            id,
            title: title.to_string(),
            kind,
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Unknown or missing values read as medium
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

/// A to-do item inside a task list
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// Parent task ID (None = root level)
    pub parent_id: Option<TaskId>,
    /// Depth from the root task, capped at `MAX_TASK_LEVEL`
    pub level: u8,
    pub children: Vec<Task>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    /// Whether children are shown in the flattened view
    pub expanded: bool,
}

impl Task {
    pub fn new(id: TaskId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            completed: false,
            parent_id: None,
            level: 0,
            children: Vec::new(),
            priority: Priority::Medium,
            due_date: None,
            tags: Vec::new(),
            expanded: true,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Level of a node nested under `parent_level`
pub fn child_level(parent_level: u8) -> u8 {
    parent_level.saturating_add(1).min(MAX_TASK_LEVEL)
}

// ========================
// Wire Records
// ========================

/// Task list as returned by `task-lists`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListRecord {
    pub id: ListId,
    pub title: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub parent_id: Option<ListId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<TaskListRecord>,
}

impl TaskListRecord {
    /// Push this record and any embedded children as parented, childless lists.
    /// Embedded children without a `parent_id` belong to the embedding record.
    pub fn flatten_into(self, out: &mut Vec<TaskList>) {
        let TaskListRecord { id, title, is_folder, parent_id, children } = self;
        out.push(TaskList {
            id,
            title,
            kind: ListKind::from_is_folder(is_folder),
            parent_id,
            children: Vec::new(),
        });
        for mut child in children {
            child.parent_id.get_or_insert(id);
            child.flatten_into(out);
        }
    }
}

/// Task as returned by `task-lists/{id}/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "de_priority")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "de_due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub task_list_id: Option<ListId>,
}

impl From<TaskRecord> for Task {
    fn from(r: TaskRecord) -> Self {
        Task {
            id: r.id,
            title: r.title,
            completed: r.completed,
            parent_id: r.parent_id,
            level: r.level.min(MAX_TASK_LEVEL as u32) as u8,
            children: Vec::new(),
            priority: r.priority,
            due_date: r.due_date,
            tags: r.tags,
            expanded: true,
        }
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn de_priority<'de, D: Deserializer<'de>>(d: D) -> Result<Priority, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().map(Priority::parse).unwrap_or_default())
}

/// Accepts `YYYY-MM-DD` or an ISO datetime; unparseable dates read as none
fn de_due_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_due_date))
}

pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let date_part = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("[MODELS] Ignoring due date {:?}: {}", raw, e);
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsWire {
    List(Vec<String>),
    Csv(String),
}

/// Tags arrive as a JSON array or as the server's comma-separated column
fn de_tags<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let tags = match Option::<TagsWire>::deserialize(d)? {
        None => Vec::new(),
        Some(TagsWire::List(list)) => list,
        Some(TagsWire::Csv(csv)) => csv.split(',').map(str::to_string).collect(),
    };
    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
