//! Task List Requests
//!
//! Typed wrappers for the `task-lists` resource.

use serde::Serialize;
use serde_json::json;

use super::{decode, encode, RemoteResult, RemoteStore};
use crate::models::{ListId, TaskListRecord};

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
pub struct CreateListArgs<'a> {
    pub title: &'a str,
    pub is_folder: bool,
}

#[derive(Serialize)]
struct ParentArgs {
    /// Serialized as `null` to move a list back to the root
    parent_id: Option<ListId>,
}

// ========================
// Requests
// ========================

pub async fn list_task_lists<S: RemoteStore + ?Sized>(store: &S) -> RemoteResult<Vec<TaskListRecord>> {
    decode(store.fetch("task-lists").await?)
}

pub async fn get_task_list<S: RemoteStore + ?Sized>(store: &S, id: ListId) -> RemoteResult<TaskListRecord> {
    decode(store.fetch(&format!("task-lists/{}", id)).await?)
}

pub async fn create_task_list<S: RemoteStore + ?Sized>(
    store: &S,
    args: &CreateListArgs<'_>,
) -> RemoteResult<TaskListRecord> {
    decode(store.create("task-lists", encode(args)?).await?)
}

pub async fn rename_task_list<S: RemoteStore + ?Sized>(store: &S, id: ListId, title: &str) -> RemoteResult<()> {
    store
        .update(&format!("task-lists/{}", id), json!({ "title": title }))
        .await?;
    Ok(())
}

pub async fn set_list_parent<S: RemoteStore + ?Sized>(
    store: &S,
    id: ListId,
    parent_id: Option<ListId>,
) -> RemoteResult<()> {
    store
        .update(&format!("task-lists/{}", id), encode(&ParentArgs { parent_id })?)
        .await?;
    Ok(())
}

pub async fn delete_task_list<S: RemoteStore + ?Sized>(store: &S, id: ListId) -> RemoteResult<()> {
    store.delete(&format!("task-lists/{}", id)).await?;
    Ok(())
}
