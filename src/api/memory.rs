//! In-Memory Store
//!
//! In-process implementation of the task-list resource interface, used by
//! tests and offline runs. Mirrors the service's behavior: server-assigned
//! ids, cascade deletes, promote deletes and level bookkeeping.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::models::{
    child_level, parse_due_date, ListId, Priority, TaskId, TaskListRecord, TaskRecord,
};

#[derive(Default)]
struct State {
    next_list_id: ListId,
    next_task_id: TaskId,
    /// Flat records; `children` is always empty here
    lists: Vec<TaskListRecord>,
    /// Storage order is the order the service returns tasks in
    tasks: Vec<TaskRecord>,
    queued_failures: VecDeque<RemoteError>,
    route_failures: Vec<(String, String, RemoteError)>,
    requests: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

#[derive(Deserialize)]
struct NewList {
    title: String,
    #[serde(default)]
    is_folder: bool,
}

#[derive(Deserialize)]
struct ListPatch {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    parent_id: Option<Option<ListId>>,
}

#[derive(Deserialize)]
struct NewTask {
    title: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    parent_id: Option<TaskId>,
    #[serde(default)]
    priority: Option<Priority>,
}

#[derive(Deserialize)]
struct TaskPatchWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    parent_id: Option<Option<TaskId>>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default, deserialize_with = "double_option")]
    due_date: Option<Option<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    task_list_id: Option<ListId>,
}

/// Distinguishes an absent field (None) from an explicit null (Some(None))
fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn bad_request(message: impl Into<String>) -> RemoteError {
    RemoteError::new(400, message)
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a Value) -> RemoteResult<T> {
    T::deserialize(body).map_err(|e| bad_request(format!("Invalid request body: {}", e)))
}

fn parse_id(raw: &str) -> RemoteResult<u32> {
    raw.parse()
        .map_err(|_| RemoteError::new(404, format!("Invalid id {:?}", raw)))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Seeding and inspection
    // ========================

    pub fn add_list(&self, title: &str, is_folder: bool, parent_id: Option<ListId>) -> ListId {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_list_id();
        state.lists.push(TaskListRecord {
            id,
            title: title.to_string(),
            is_folder,
            parent_id,
            children: Vec::new(),
        });
        id
    }

    pub fn add_task(&self, list_id: ListId, title: &str, parent_id: Option<TaskId>) -> TaskId {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_task_id();
        let level = parent_id
            .and_then(|p| state.task(p))
            .map(|p| child_level(p.level as u8) as u32)
            .unwrap_or(0);
        state.tasks.push(TaskRecord {
            id,
            title: title.to_string(),
            completed: false,
            parent_id,
            level,
            priority: Priority::Medium,
            due_date: None,
            tags: Vec::new(),
            task_list_id: Some(list_id),
        });
        id
    }

    /// Change a stored task in place, bypassing the routes
    pub fn edit_task(&self, id: TaskId, edit: impl FnOnce(&mut TaskRecord)) {
        if let Some(task) = self.state.borrow_mut().tasks.iter_mut().find(|t| t.id == id) {
            edit(task);
        }
    }

    pub fn list(&self, id: ListId) -> Option<TaskListRecord> {
        self.state.borrow().lists.iter().find(|l| l.id == id).cloned()
    }

    pub fn task(&self, id: TaskId) -> Option<TaskRecord> {
        self.state.borrow().task(id).cloned()
    }

    pub fn tasks_in(&self, list_id: ListId) -> Vec<TaskRecord> {
        self.state.borrow().tasks_in(list_id)
    }

    /// Requests seen so far, as `METHOD path`
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }

    /// Fail the next request, whatever it is
    pub fn fail_next(&self, error: RemoteError) {
        self.state.borrow_mut().queued_failures.push_back(error);
    }

    /// Fail the next request matching `method` and `path`
    pub fn fail_on(&self, method: &str, path: &str, error: RemoteError) {
        self.state
            .borrow_mut()
            .route_failures
            .push((method.to_string(), path.to_string(), error));
    }

    fn handle(&self, method: &str, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        let mut state = self.state.borrow_mut();
        let path = path.trim_matches('/');
        state.requests.push(format!("{} {}", method, path));

        if let Some(err) = state.queued_failures.pop_front() {
            return Err(err);
        }
        if let Some(pos) = state
            .route_failures
            .iter()
            .position(|(m, p, _)| m == method && p == path)
        {
            return Err(state.route_failures.remove(pos).2);
        }

        let body = body.unwrap_or(Value::Null);
        let segments: Vec<&str> = path.split('/').collect();
        match (method, segments.as_slice()) {
            ("GET", ["task-lists"]) => Ok(state.nested_lists()),
            ("POST", ["task-lists"]) => state.create_list(parse_body(&body)?),
            ("GET", ["task-lists", id]) => {
                let id = parse_id(id)?;
                let list = state.find_list(id)?.clone();
                Ok(json!(state.nest(&list)))
            }
            ("PUT", ["task-lists", id]) => state.update_list(parse_id(id)?, parse_body(&body)?),
            ("DELETE", ["task-lists", id]) => state.delete_list(parse_id(id)?),
            ("GET", ["task-lists", id, "tasks"]) => {
                let id = parse_id(id)?;
                state.find_list(id)?;
                Ok(json!(state.tasks_in(id)))
            }
            ("POST", ["task-lists", id, "tasks"]) => state.create_task(parse_id(id)?, parse_body(&body)?),
            ("PUT", ["tasks", id]) => state.update_task(parse_id(id)?, parse_body(&body)?),
            ("DELETE", ["tasks", id]) => state.delete_task(parse_id(id)?),
            ("POST", ["tasks", id, "delete-keep-children"]) => state.delete_keep_children(parse_id(id)?),
            _ => Err(RemoteError::new(404, "Not found")),
        }
    }
}

impl State {
    fn allocate_list_id(&mut self) -> ListId {
        self.next_list_id += 1;
        self.next_list_id
    }

    fn allocate_task_id(&mut self) -> TaskId {
        self.next_task_id += 1;
        self.next_task_id
    }

    fn task(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn tasks_in(&self, list_id: ListId) -> Vec<TaskRecord> {
        self.tasks
            .iter()
            .filter(|t| t.task_list_id == Some(list_id))
            .cloned()
            .collect()
    }

    fn find_list(&self, id: ListId) -> RemoteResult<&TaskListRecord> {
        self.lists
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| RemoteError::not_found(format!("Task list {}", id)))
    }

    fn find_task_index(&self, id: TaskId) -> RemoteResult<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RemoteError::not_found(format!("Task {}", id)))
    }

    fn nest(&self, list: &TaskListRecord) -> TaskListRecord {
        let mut nested = list.clone();
        nested.children = self
            .lists
            .iter()
            .filter(|l| l.parent_id == Some(list.id))
            .map(|child| self.nest(child))
            .collect();
        nested
    }

    /// Root lists with their children embedded
    fn nested_lists(&self) -> Value {
        let roots: Vec<TaskListRecord> = self
            .lists
            .iter()
            .filter(|l| l.parent_id.is_none())
            .map(|l| self.nest(l))
            .collect();
        json!(roots)
    }

    fn create_list(&mut self, new: NewList) -> RemoteResult<Value> {
        if new.title.trim().is_empty() {
            return Err(bad_request("Title is required"));
        }
        let id = self.allocate_list_id();
        let record = TaskListRecord {
            id,
            title: new.title,
            is_folder: new.is_folder,
            parent_id: None,
            children: Vec::new(),
        };
        self.lists.push(record.clone());
        Ok(json!(record))
    }

    /// Whether `candidate` is `id` or sits below it
    fn list_within(&self, candidate: ListId, id: ListId) -> bool {
        let mut cursor = Some(candidate);
        let mut hops = 0;
        while let Some(current) = cursor {
            if current == id {
                return true;
            }
            hops += 1;
            if hops > self.lists.len() {
                return false;
            }
            cursor = self.lists.iter().find(|l| l.id == current).and_then(|l| l.parent_id);
        }
        false
    }

    fn update_list(&mut self, id: ListId, patch: ListPatch) -> RemoteResult<Value> {
        self.find_list(id)?;
        if let Some(Some(parent)) = patch.parent_id {
            self.find_list(parent)?;
            if self.list_within(parent, id) {
                return Err(bad_request("A list cannot be moved inside itself"));
            }
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(bad_request("Title is required"));
            }
        }
        let list = self
            .lists
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| RemoteError::not_found(format!("Task list {}", id)))?;
        if let Some(title) = patch.title {
            list.title = title;
        }
        if let Some(parent_id) = patch.parent_id {
            list.parent_id = parent_id;
        }
        Ok(json!(list.clone()))
    }

    fn delete_list(&mut self, id: ListId) -> RemoteResult<Value> {
        self.find_list(id)?;
        self.lists.retain(|l| l.id != id);
        // Child lists are released to the root, tasks go with the list
        for list in self.lists.iter_mut().filter(|l| l.parent_id == Some(id)) {
            list.parent_id = None;
        }
        self.tasks.retain(|t| t.task_list_id != Some(id));
        Ok(json!({ "message": "Task list deleted" }))
    }

    fn create_task(&mut self, list_id: ListId, new: NewTask) -> RemoteResult<Value> {
        let list = self.find_list(list_id)?;
        if list.is_folder {
            return Err(bad_request("Folders cannot hold tasks"));
        }
        if new.title.trim().is_empty() {
            return Err(bad_request("Title is required"));
        }
        let level = match new.parent_id {
            Some(pid) => {
                let parent = self
                    .task(pid)
                    .filter(|p| p.task_list_id == Some(list_id))
                    .ok_or_else(|| bad_request(format!("Parent task {} not in list", pid)))?;
                child_level(parent.level as u8) as u32
            }
            None => 0,
        };
        let id = self.allocate_task_id();
        let record = TaskRecord {
            id,
            title: new.title,
            completed: new.completed,
            parent_id: new.parent_id,
            level,
            priority: new.priority.unwrap_or_default(),
            due_date: None,
            tags: Vec::new(),
            task_list_id: Some(list_id),
        };
        self.tasks.push(record.clone());
        Ok(json!(record))
    }

    /// `root` followed by every descendant, breadth first
    fn subtree_ids(&self, root: TaskId) -> Vec<TaskId> {
        let mut ids = vec![root];
        let mut i = 0;
        while i < ids.len() {
            let current = ids[i];
            ids.extend(
                self.tasks
                    .iter()
                    .filter(|t| t.parent_id == Some(current) && !ids.contains(&t.id))
                    .map(|t| t.id)
                    .collect::<Vec<_>>(),
            );
            i += 1;
        }
        ids
    }

    /// Recompute levels below `root` from its own level
    fn relevel_below(&mut self, root: TaskId) {
        for id in self.subtree_ids(root).into_iter().skip(1) {
            let parent_level = self
                .task(id)
                .and_then(|t| t.parent_id)
                .and_then(|p| self.task(p))
                .map(|p| p.level as u8)
                .unwrap_or(0);
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                task.level = child_level(parent_level) as u32;
            }
        }
    }

    fn update_task(&mut self, id: TaskId, patch: TaskPatchWire) -> RemoteResult<Value> {
        let index = self.find_task_index(id)?;
        let list_id = self.tasks[index].task_list_id;

        if let Some(Some(parent)) = patch.parent_id {
            let parent_task = self
                .task(parent)
                .ok_or_else(|| bad_request(format!("Parent task {} not found", parent)))?;
            if parent_task.task_list_id != list_id {
                return Err(bad_request("Parent task belongs to another list"));
            }
            if self.subtree_ids(id).contains(&parent) {
                return Err(bad_request("A task cannot be moved under itself"));
            }
        }
        if let Some(target) = patch.task_list_id {
            self.find_list(target)?;
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(bad_request("Title is required"));
            }
        }

        let moved_list = patch.task_list_id.filter(|target| Some(*target) != list_id);
        let structural = patch.parent_id.is_some() || patch.level.is_some();

        let task = &mut self.tasks[index];
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(parent_id) = patch.parent_id {
            task.parent_id = parent_id;
        }
        if let Some(level) = patch.level {
            task.level = level.min(crate::models::MAX_TASK_LEVEL) as u32;
        }
        if let Some(due) = patch.due_date {
            task.due_date = due.as_deref().and_then(parse_due_date);
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }

        if let Some(target) = moved_list {
            // The subtree follows the task into the other list
            for sub in self.subtree_ids(id) {
                if let Some(t) = self.tasks.iter_mut().find(|t| t.id == sub) {
                    t.task_list_id = Some(target);
                }
            }
            let task = &mut self.tasks[index];
            task.parent_id = None;
            task.level = 0;
        }
        if structural || moved_list.is_some() {
            self.relevel_below(id);
        }
        Ok(json!(self.tasks[index].clone()))
    }

    fn delete_task(&mut self, id: TaskId) -> RemoteResult<Value> {
        self.find_task_index(id)?;
        let doomed = self.subtree_ids(id);
        self.tasks.retain(|t| !doomed.contains(&t.id));
        Ok(json!({ "message": "Task deleted", "deleted": doomed.len() }))
    }

    fn delete_keep_children(&mut self, id: TaskId) -> RemoteResult<Value> {
        let index = self.find_task_index(id)?;
        // Records that stay ahead of the deleted one
        let insert_at = self.tasks[..index]
            .iter()
            .filter(|t| t.parent_id != Some(id))
            .count();
        let removed = self.tasks.remove(index);

        // Children take the deleted task's place, keeping their order
        let mut children = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].parent_id == Some(id) {
                children.push(self.tasks.remove(i));
            } else {
                i += 1;
            }
        }
        let promoted: Vec<TaskId> = children.iter().map(|c| c.id).collect();
        for (offset, mut child) in children.into_iter().enumerate() {
            child.parent_id = removed.parent_id;
            child.level = removed.level;
            self.tasks.insert(insert_at + offset, child);
        }
        for child in &promoted {
            self.relevel_below(*child);
        }
        Ok(json!({ "message": "Task deleted, children kept", "promoted": promoted }))
    }
}

#[async_trait(?Send)]
impl RemoteStore for MemoryStore {
    async fn fetch(&self, path: &str) -> RemoteResult<Value> {
        self.handle("GET", path, None)
    }

    async fn create(&self, path: &str, body: Value) -> RemoteResult<Value> {
        self.handle("POST", path, Some(body))
    }

    async fn update(&self, path: &str, patch: Value) -> RemoteResult<Value> {
        self.handle("PUT", path, Some(patch))
    }

    async fn delete(&self, path: &str) -> RemoteResult<Value> {
        self.handle("DELETE", path, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{self, CreateListArgs, TaskPatch};

    #[tokio::test]
    async fn test_lists_nest_children() {
        let store = MemoryStore::new();
        let folder = store.add_list("Work", true, None);
        store.add_list("Inbox", false, Some(folder));
        store.add_list("Home", false, None);

        let lists = api::list_task_lists(&store).await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].children.len(), 1);
        assert_eq!(lists[0].children[0].title, "Inbox");

        let single = api::get_task_list(&store, folder).await.unwrap();
        assert!(single.is_folder);
        assert_eq!(single.children.len(), 1);
        assert_eq!(api::get_task_list(&store, 99).await.unwrap_err().status, 404);
    }

    #[tokio::test]
    async fn test_create_list_requires_title() {
        let store = MemoryStore::new();
        let err = api::create_task_list(&store, &CreateListArgs { title: " ", is_folder: false })
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_reparent_relevels_descendants() {
        let store = MemoryStore::new();
        let list = store.add_list("Inbox", false, None);
        let a = store.add_task(list, "a", None);
        let b = store.add_task(list, "b", Some(a));
        let c = store.add_task(list, "c", Some(b));
        let d = store.add_task(list, "d", None);

        api::update_task(&store, b, &TaskPatch::reparent(Some(d), 1)).await.unwrap();
        api::update_task(&store, d, &TaskPatch::reparent(Some(a), 1)).await.unwrap();

        assert_eq!(store.task(d).unwrap().level, 1);
        assert_eq!(store.task(b).unwrap().level, 2);
        assert_eq!(store.task(c).unwrap().level, 3);
    }

    #[tokio::test]
    async fn test_reparent_under_own_descendant_is_rejected() {
        let store = MemoryStore::new();
        let list = store.add_list("Inbox", false, None);
        let a = store.add_task(list, "a", None);
        let b = store.add_task(list, "b", Some(a));

        let err = api::update_task(&store, a, &TaskPatch::reparent(Some(b), 2))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_delete_keep_children_promotes_in_place() {
        let store = MemoryStore::new();
        let list = store.add_list("Inbox", false, None);
        let first = store.add_task(list, "first", None);
        let parent = store.add_task(list, "parent", None);
        let last = store.add_task(list, "last", None);
        let x = store.add_task(list, "x", Some(parent));
        let y = store.add_task(list, "y", Some(parent));
        let z = store.add_task(list, "z", Some(y));

        api::delete_task_keep_children(&store, parent).await.unwrap();

        let order: Vec<_> = store.tasks_in(list).iter().map(|t| t.id).collect();
        assert_eq!(order, vec![first, x, y, last, z]);
        assert_eq!(store.task(x).unwrap().parent_id, None);
        assert_eq!(store.task(y).unwrap().level, 0);
        assert_eq!(store.task(z).unwrap().level, 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_next(RemoteError::new(503, "down"));
        assert_eq!(api::list_task_lists(&store).await.unwrap_err().status, 503);
        assert!(api::list_task_lists(&store).await.is_ok());

        store.fail_on("DELETE", "tasks/9", RemoteError::new(500, "boom"));
        assert_eq!(api::delete_task(&store, 9).await.unwrap_err().status, 500);
        assert_eq!(api::delete_task(&store, 9).await.unwrap_err().status, 404);
        assert_eq!(store.requests().len(), 4);
    }
}
