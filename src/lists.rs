//! List Folder Engine
//!
//! The sidebar's task-list tree: loading, creating and deleting lists, and
//! dragging lists in and out of single-level folders. Every change is
//! confirmed by the store before the local tree is touched.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;
use drag_session::{DragSession, Point};

use crate::api::{self, CreateListArgs, RemoteError, RemoteStore};
use crate::edit::{EditSink, EditValue};
use crate::engine::{EngineError, EngineResult, Generation, Observers, Outcome, SubscriptionId};
use crate::models::{ListId, ListKind, TaskList};
use crate::tree::{self, build_hierarchy, detach, find, find_mut};

/// Title given to folders made by dropping one list onto another
pub const DEFAULT_FOLDER_TITLE: &str = "Task Folder";

/// One sidebar row
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub id: ListId,
    pub title: String,
    pub kind: ListKind,
    pub depth: usize,
    pub child_count: usize,
    pub expanded: bool,
}

/// What dropping `source` on `target` does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlan {
    /// Source joins an existing folder
    IntoFolder(ListId),
    /// Both root leaves go into a new folder at the target's position
    NewFolder,
    /// Source leaves its folder
    ToRoot,
    Nothing,
}

/// Resolve a list drop against the current tree
pub fn plan_drop(lists: &[TaskList], source: ListId, target: ListId) -> DropPlan {
    if source == target {
        return DropPlan::Nothing;
    }
    let (Some(src), Some(tgt)) = (find(lists, source), find(lists, target)) else {
        return DropPlan::Nothing;
    };
    // Folders stay at the root
    if src.is_folder() {
        return DropPlan::Nothing;
    }
    if tgt.is_folder() {
        return if src.parent_id == Some(tgt.id) {
            DropPlan::Nothing
        } else {
            DropPlan::IntoFolder(tgt.id)
        };
    }
    match tgt.parent_id {
        Some(folder) if src.parent_id == Some(folder) => DropPlan::Nothing,
        Some(folder) => DropPlan::IntoFolder(folder),
        None if src.parent_id.is_some() => DropPlan::ToRoot,
        None => DropPlan::NewFolder,
    }
}

/// Lift anything nested deeper than one folder level to the root
fn lift_nested(roots: Vec<TaskList>) -> Vec<TaskList> {
    let mut out = Vec::with_capacity(roots.len());
    let mut pending: Vec<TaskList> = roots.into_iter().rev().collect();
    while let Some(mut node) = pending.pop() {
        node.parent_id = None;
        let mut lifted = Vec::new();
        for mut child in std::mem::take(&mut node.children) {
            if node.is_folder() && !child.is_folder() {
                lifted.append(&mut child.children);
                node.children.push(child);
            } else {
                lifted.push(child);
            }
        }
        if !lifted.is_empty() {
            log::warn!(
                "[LISTS] {} list(s) nested below {} lifted to the root",
                lifted.len(),
                node.id
            );
        }
        out.push(node);
        pending.extend(lifted.into_iter().rev());
    }
    out
}

fn log_failure(action: &str, err: RemoteError) -> EngineError {
    log::error!("[LISTS] {} failed: {}", action, err);
    EngineError::Remote(err)
}

pub struct ListFolders<S> {
    store: Rc<S>,
    lists: RefCell<Vec<TaskList>>,
    expanded: RefCell<HashSet<ListId>>,
    drag: RefCell<DragSession<ListId>>,
    generation: Generation,
    observers: Observers,
    folder_title: String,
}

impl<S: RemoteStore> ListFolders<S> {
    pub fn new(store: Rc<S>) -> Self {
        Self::with_folder_title(store, DEFAULT_FOLDER_TITLE)
    }

    pub fn with_folder_title(store: Rc<S>, folder_title: &str) -> Self {
        Self {
            store,
            lists: RefCell::new(Vec::new()),
            expanded: RefCell::new(HashSet::new()),
            drag: RefCell::new(DragSession::new()),
            generation: Generation::default(),
            observers: Observers::default(),
            folder_title: folder_title.to_string(),
        }
    }

    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.unsubscribe(id);
    }

    // ========================
    // Queries
    // ========================

    /// Snapshot of the nested tree
    pub fn lists(&self) -> Vec<TaskList> {
        self.lists.borrow().clone()
    }

    pub fn find(&self, id: ListId) -> Option<TaskList> {
        find(&self.lists.borrow(), id).cloned()
    }

    pub fn is_expanded(&self, id: ListId) -> bool {
        self.expanded.borrow().contains(&id)
    }

    /// Sidebar rows; children of collapsed folders are skipped
    pub fn rows(&self) -> Vec<ListRow> {
        let lists = self.lists.borrow();
        let expanded = self.expanded.borrow();
        let rows = tree::flatten(&lists)
            .filter(|e| e.node.parent_id.map_or(true, |p| expanded.contains(&p)))
            .map(|e| ListRow {
                id: e.node.id,
                title: e.node.title.clone(),
                kind: e.node.kind,
                depth: e.depth,
                child_count: e.node.children.len(),
                expanded: expanded.contains(&e.node.id),
            })
            .collect();
        rows
    }

    pub fn drag_source(&self) -> Option<ListId> {
        self.drag.borrow().source()
    }

    pub fn drop_target(&self) -> Option<ListId> {
        self.drag.borrow().target()
    }

    // ========================
    // Loading and CRUD
    // ========================

    pub async fn load(&self) -> EngineResult {
        let generation = self.generation.bump();
        let records = api::list_task_lists(&*self.store)
            .await
            .map_err(|e| log_failure("Load", e))?;
        if !self.generation.is_current(generation) {
            log::debug!("[LISTS] Stale list snapshot {} discarded", generation);
            return Ok(Outcome::Stale);
        }

        let mut flat = Vec::new();
        for record in records {
            record.flatten_into(&mut flat);
        }
        let roots = lift_nested(build_hierarchy(flat));
        log::info!("[LISTS] Loaded {} root list(s)", roots.len());
        *self.lists.borrow_mut() = roots;
        self.notify();
        Ok(Outcome::Applied)
    }

    pub async fn create_list(&self, title: &str, kind: ListKind) -> EngineResult {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Outcome::Discarded);
        }
        self.generation.bump();
        let args = CreateListArgs { title, is_folder: kind.is_folder() };
        let record = api::create_task_list(&*self.store, &args)
            .await
            .map_err(|e| log_failure("Create list", e))?;

        let list = TaskList::new(record.id, &record.title, ListKind::from_is_folder(record.is_folder));
        log::info!("[LISTS] Created {:?} {}", list.kind, list.id);
        self.lists.borrow_mut().push(list);
        self.notify();
        Ok(Outcome::Applied)
    }

    /// Delete a list. A deleted folder's lists move to the root in its place.
    pub async fn delete_list(&self, id: ListId) -> EngineResult {
        if self.find(id).is_none() {
            return Ok(Outcome::Ignored);
        }
        self.generation.bump();
        api::delete_task_list(&*self.store, id)
            .await
            .map_err(|e| log_failure("Delete list", e))?;

        {
            let mut lists = self.lists.borrow_mut();
            if let Some((mut removed, index)) = detach(&mut lists, id) {
                if removed.parent_id.is_none() {
                    for (offset, mut child) in removed.children.drain(..).enumerate() {
                        child.parent_id = None;
                        lists.insert(index + offset, child);
                    }
                }
            }
        }
        self.expanded.borrow_mut().remove(&id);
        self.notify();
        Ok(Outcome::Applied)
    }

    pub async fn rename_list(&self, id: ListId, title: &str) -> EngineResult {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Outcome::Discarded);
        }
        if self.find(id).is_none() {
            return Err(EngineError::NotFound(format!("List {}", id)));
        }
        self.generation.bump();
        api::rename_task_list(&*self.store, id, title)
            .await
            .map_err(|e| log_failure("Rename list", e))?;

        if let Some(list) = find_mut(&mut self.lists.borrow_mut(), id) {
            list.title = title.to_string();
        }
        self.notify();
        Ok(Outcome::Applied)
    }

    pub fn toggle_folder(&self, id: ListId) {
        let is_folder = self.find(id).is_some_and(|l| l.is_folder());
        if !is_folder {
            return;
        }
        {
            let mut expanded = self.expanded.borrow_mut();
            if !expanded.remove(&id) {
                expanded.insert(id);
            }
        }
        self.notify();
    }

    // ========================
    // Drag and drop
    // ========================

    pub fn drag_start(&self, id: ListId) {
        self.drag.borrow_mut().begin(id);
        self.notify();
    }

    /// Mouse press on a row; the drag starts once the pointer moves past the threshold
    pub fn drag_press(&self, id: ListId, pointer: Point) {
        self.drag.borrow_mut().press(id, pointer);
    }

    pub fn drag_motion(&self, pointer: Point) {
        let started = self.drag.borrow_mut().motion(pointer);
        if started {
            self.notify();
        }
    }

    pub fn drag_over(&self, target: ListId) {
        let changed = self.drag.borrow_mut().hover(target, ());
        if changed {
            self.notify();
        }
    }

    pub fn drag_leave(&self) {
        let changed = self.drag.borrow_mut().leave();
        if changed {
            self.notify();
        }
    }

    /// Gesture ended outside any drop target
    pub fn drag_end(&self) {
        self.drag.borrow_mut().cancel();
        self.notify();
    }

    /// Complete the current gesture
    pub async fn complete_drop(&self) -> EngineResult {
        let released = self.drag.borrow_mut().release();
        self.notify();
        let Some(gesture) = released else {
            return Ok(Outcome::Ignored);
        };
        self.move_list(gesture.source, gesture.target).await
    }

    /// Hover `target` and drop there
    pub async fn drop_on(&self, target: ListId) -> EngineResult {
        self.drag.borrow_mut().hover(target, ());
        self.complete_drop().await
    }

    async fn move_list(&self, source: ListId, target: ListId) -> EngineResult {
        let plan = plan_drop(&self.lists.borrow(), source, target);
        log::info!("[LISTS] Drop {} on {}: {:?}", source, target, plan);
        match plan {
            DropPlan::Nothing => Ok(Outcome::Ignored),
            DropPlan::IntoFolder(folder) => self.move_into_folder(source, folder).await,
            DropPlan::ToRoot => self.move_to_root(source).await,
            DropPlan::NewFolder => self.combine_into_folder(source, target).await,
        }
    }

    async fn move_into_folder(&self, source: ListId, folder: ListId) -> EngineResult {
        self.generation.bump();
        api::set_list_parent(&*self.store, source, Some(folder))
            .await
            .map_err(|e| log_failure("Move into folder", e))?;

        {
            let mut lists = self.lists.borrow_mut();
            if let Some((mut moved, _)) = detach(&mut lists, source) {
                moved.parent_id = Some(folder);
                match find_mut(&mut lists, folder) {
                    Some(f) => f.children.push(moved),
                    None => {
                        moved.parent_id = None;
                        lists.push(moved);
                    }
                }
            }
        }
        self.expanded.borrow_mut().insert(folder);
        self.notify();
        Ok(Outcome::Applied)
    }

    async fn move_to_root(&self, source: ListId) -> EngineResult {
        self.generation.bump();
        api::set_list_parent(&*self.store, source, None)
            .await
            .map_err(|e| log_failure("Move to root", e))?;

        {
            let mut lists = self.lists.borrow_mut();
            if let Some((mut moved, _)) = detach(&mut lists, source) {
                moved.parent_id = None;
                lists.push(moved);
            }
        }
        self.notify();
        Ok(Outcome::Applied)
    }

    async fn combine_into_folder(&self, source: ListId, target: ListId) -> EngineResult {
        self.generation.bump();
        let args = CreateListArgs { title: &self.folder_title, is_folder: true };
        let folder = api::create_task_list(&*self.store, &args)
            .await
            .map_err(|e| log_failure("Create folder", e))?;

        for id in [target, source] {
            if let Err(err) = api::set_list_parent(&*self.store, id, Some(folder.id)).await {
                // Deleting the folder releases anything already moved into it
                if let Err(cleanup) = api::delete_task_list(&*self.store, folder.id).await {
                    log::error!("[LISTS] Removing folder {} failed: {}", folder.id, cleanup);
                }
                return Err(log_failure("Combine into folder", err));
            }
        }

        {
            let mut lists = self.lists.borrow_mut();
            let Some((mut src, _)) = detach(&mut lists, source) else {
                return Ok(Outcome::Ignored);
            };
            let Some((mut tgt, index)) = detach(&mut lists, target) else {
                lists.push(src);
                return Ok(Outcome::Ignored);
            };
            src.parent_id = Some(folder.id);
            tgt.parent_id = Some(folder.id);
            let mut new_folder = TaskList::new(folder.id, &folder.title, ListKind::Folder);
            new_folder.children = vec![tgt, src];
            lists.insert(index, new_folder);
        }
        log::info!("[LISTS] Folder {} created from {} and {}", folder.id, target, source);
        self.expanded.borrow_mut().insert(folder.id);
        self.notify();
        Ok(Outcome::Applied)
    }

    fn notify(&self) {
        self.observers.notify();
    }
}

#[async_trait(?Send)]
impl<S: RemoteStore> EditSink for ListFolders<S> {
    type Id = ListId;

    async fn commit(&self, id: ListId, value: EditValue) -> EngineResult {
        match value {
            EditValue::Title(title) => self.rename_list(id, &title).await,
            other => {
                log::debug!("[LISTS] {:?} edits do not apply to lists", other.field());
                Ok(Outcome::Ignored)
            }
        }
    }
}
