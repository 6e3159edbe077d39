//! Task Requests
//!
//! Typed wrappers for `task-lists/{id}/tasks` and `tasks/{id}`.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use super::{decode, encode, RemoteResult, RemoteStore};
use crate::models::{ListId, Priority, TaskId, TaskRecord};

// ========================
// Argument Structs
// ========================

#[derive(Debug, Serialize)]
pub struct CreateTaskArgs<'a> {
    pub title: &'a str,
    pub completed: bool,
    pub parent_id: Option<TaskId>,
    pub level: u8,
    pub priority: Priority,
}

/// Partial update of a task. Absent fields are left alone; the nested
/// options serialize `Some(None)` as `null` to clear a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<TaskId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_list_id: Option<ListId>,
}

impl TaskPatch {
    pub fn title(title: &str) -> Self {
        Self { title: Some(title.to_string()), ..Self::default() }
    }

    pub fn completed(completed: bool) -> Self {
        Self { completed: Some(completed), ..Self::default() }
    }

    pub fn reparent(parent_id: Option<TaskId>, level: u8) -> Self {
        Self { parent_id: Some(parent_id), level: Some(level), ..Self::default() }
    }

    pub fn due_date(due_date: Option<NaiveDate>) -> Self {
        Self { due_date: Some(due_date), ..Self::default() }
    }

    pub fn tags(tags: Vec<String>) -> Self {
        Self { tags: Some(tags), ..Self::default() }
    }

    pub fn task_list(list_id: ListId) -> Self {
        Self { task_list_id: Some(list_id), ..Self::default() }
    }
}

// ========================
// Requests
// ========================

pub async fn list_tasks<S: RemoteStore + ?Sized>(store: &S, list_id: ListId) -> RemoteResult<Vec<TaskRecord>> {
    decode(store.fetch(&format!("task-lists/{}/tasks", list_id)).await?)
}

pub async fn create_task<S: RemoteStore + ?Sized>(
    store: &S,
    list_id: ListId,
    args: &CreateTaskArgs<'_>,
) -> RemoteResult<TaskRecord> {
    decode(
        store
            .create(&format!("task-lists/{}/tasks", list_id), encode(args)?)
            .await?,
    )
}

pub async fn update_task<S: RemoteStore + ?Sized>(store: &S, id: TaskId, patch: &TaskPatch) -> RemoteResult<()> {
    store.update(&format!("tasks/{}", id), encode(patch)?).await?;
    Ok(())
}

/// Move a task (and its subtree) into another list, at the root
pub async fn move_task_to_list<S: RemoteStore + ?Sized>(store: &S, id: TaskId, list_id: ListId) -> RemoteResult<()> {
    update_task(store, id, &TaskPatch::task_list(list_id)).await
}

/// Delete a task and its whole subtree
pub async fn delete_task<S: RemoteStore + ?Sized>(store: &S, id: TaskId) -> RemoteResult<()> {
    store.delete(&format!("tasks/{}", id)).await?;
    Ok(())
}

/// Delete a task and hand its children to its parent
pub async fn delete_task_keep_children<S: RemoteStore + ?Sized>(store: &S, id: TaskId) -> RemoteResult<()> {
    store
        .create(&format!("tasks/{}/delete-keep-children", id), json!({}))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let value = serde_json::to_value(TaskPatch::reparent(None, 0)).unwrap();
        assert_eq!(value, json!({ "parent_id": null, "level": 0 }));

        let value = serde_json::to_value(TaskPatch::due_date(NaiveDate::from_ymd_opt(2025, 1, 31))).unwrap();
        assert_eq!(value, json!({ "due_date": "2025-01-31" }));

        let value = serde_json::to_value(TaskPatch::title("Renamed")).unwrap();
        assert_eq!(value, json!({ "title": "Renamed" }));
    }
}
