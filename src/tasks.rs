//! Task Hierarchy Engine
//!
//! One list's task tree. Drops resolve into reparent/reorder moves using the
//! hovered row's drop zone; each move is persisted first, spliced into the
//! local tree, then reconciled against a fresh fetch from the store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::NaiveDate;
use drag_session::{zone_for, DragSession, DropZone, Point, RowRect};

use crate::api::{self, CreateTaskArgs, RemoteError, RemoteStore, TaskPatch};
use crate::edit::{EditSink, EditValue};
use crate::engine::{EngineError, EngineResult, Generation, Observers, Outcome, SubscriptionId};
use crate::models::{child_level, ListId, Priority, Task, TaskId};
use crate::tree::{self, build_hierarchy, contains, count_descendants, detach, find, find_mut, siblings_mut};

/// Which tasks the projection shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    /// Due within the next two days
    Soon,
    Upcoming,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::Soon => "soon",
            DueStatus::Upcoming => "upcoming",
        }
    }
}

pub fn due_status(task: &Task, today: NaiveDate) -> Option<DueStatus> {
    let due = task.due_date?;
    let days = (due - today).num_days();
    Some(if days < 0 {
        DueStatus::Overdue
    } else if days <= 2 {
        DueStatus::Soon
    } else {
        DueStatus::Upcoming
    })
}

/// Completed share of the visible tasks, as a rounded percentage.
/// Collapsed subtrees are left out; the filter is not applied.
pub fn progress_of(tasks: &[Task]) -> u8 {
    let (total, completed) = tree::flatten(tasks).fold((0usize, 0usize), |(t, c), e| {
        (t + 1, c + usize::from(e.node.completed))
    });
    if total == 0 {
        return 0;
    }
    ((completed as f64 * 100.0) / total as f64).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the task and everything below it
    Cascade,
    /// Remove only the task; its children take its place
    Promote,
}

/// A deletion waiting for the user to pick a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: TaskId,
    pub children: usize,
    pub descendants: usize,
}

/// One visible row of the task view
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub level: u8,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl TaskRow {
    fn from_task(task: &Task, depth: usize) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            completed: task.completed,
            level: task.level,
            depth,
            has_children: task.has_children(),
            expanded: task.expanded,
            priority: task.priority,
            due_date: task.due_date,
            tags: task.tags.clone(),
        }
    }
}

/// Set `task`'s level and recompute its subtree below it
fn relevel(task: &mut Task, level: u8) {
    task.level = level;
    let next = child_level(level);
    for child in &mut task.children {
        relevel(child, next);
    }
}

/// Order fresh siblings by their previous local position and carry over
/// expansion. Tasks new to this client keep the store's order at the end.
fn reconcile(previous: &[Task], mut fresh: Vec<Task>) -> Vec<Task> {
    let known: HashMap<TaskId, (usize, bool)> = tree::flatten_all(previous)
        .enumerate()
        .map(|(i, e)| (e.node.id, (i, e.node.expanded)))
        .collect();

    fn apply(nodes: &mut Vec<Task>, known: &HashMap<TaskId, (usize, bool)>) {
        nodes.sort_by_key(|t| known.get(&t.id).map_or(usize::MAX, |(i, _)| *i));
        for node in nodes.iter_mut() {
            if let Some((_, expanded)) = known.get(&node.id) {
                node.expanded = *expanded;
            }
            apply(&mut node.children, known);
        }
    }
    apply(&mut fresh, &known);
    fresh
}

fn log_failure(action: &str, err: RemoteError) -> EngineError {
    log::error!("[TASKS] {} failed: {}", action, err);
    EngineError::Remote(err)
}

pub struct TaskTree<S> {
    store: Rc<S>,
    list_id: Cell<Option<ListId>>,
    tasks: RefCell<Vec<Task>>,
    filter: Cell<TaskFilter>,
    pending_delete: Cell<Option<TaskId>>,
    drag: RefCell<DragSession<TaskId, DropZone>>,
    generation: Generation,
    observers: Observers,
}

impl<S: RemoteStore> TaskTree<S> {
    pub fn new(store: Rc<S>) -> Self {
        Self {
            store,
            list_id: Cell::new(None),
            tasks: RefCell::new(Vec::new()),
            filter: Cell::new(TaskFilter::All),
            pending_delete: Cell::new(None),
            drag: RefCell::new(DragSession::new()),
            generation: Generation::default(),
            observers: Observers::default(),
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

    pub fn list_id(&self) -> Option<ListId> {
        self.list_id.get()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    pub fn find(&self, id: TaskId) -> Option<Task> {
        find(&self.tasks.borrow(), id).cloned()
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter.get()
    }

    /// Visible rows: expanded subtrees only, then the filter
    pub fn rows(&self) -> Vec<TaskRow> {
        let filter = self.filter.get();
        tree::flatten(&self.tasks.borrow())
            .filter(|e| filter.matches(e.node))
            .map(|e| TaskRow::from_task(e.node, e.depth))
            .collect()
    }

    pub fn progress(&self) -> u8 {
        progress_of(&self.tasks.borrow())
    }

    pub fn pending_delete(&self) -> Option<PendingDelete> {
        let id = self.pending_delete.get()?;
        let tasks = self.tasks.borrow();
        let task = find(&tasks, id)?;
        Some(PendingDelete {
            id,
            children: task.children.len(),
            descendants: count_descendants(task),
        })
    }

    pub fn drag_source(&self) -> Option<TaskId> {
        self.drag.borrow().source()
    }

    /// Hovered row and the zone the pointer is in
    pub fn drop_target(&self) -> Option<(TaskId, DropZone)> {
        let drag = self.drag.borrow();
        drag.target().zip(drag.zone())
    }

    // ========================
    // Loading
    // ========================

    /// Fetch a list's tasks. Reloading the same list keeps local sibling
    /// order and expansion. The open list only switches once its snapshot
    /// has arrived.
    pub async fn load(&self, list_id: ListId) -> EngineResult {
        let generation = self.generation.bump();
        self.fetch_snapshot(list_id, generation).await
    }

    async fn fetch_snapshot(&self, list_id: ListId, generation: u64) -> EngineResult {
        let records = api::list_tasks(&*self.store, list_id)
            .await
            .map_err(|e| log_failure("Load tasks", e))?;
        if !self.generation.is_current(generation) {
            log::debug!("[TASKS] Stale snapshot {} for list {} discarded", generation, list_id);
            return Ok(Outcome::Stale);
        }

        let fresh = build_hierarchy(records.into_iter().map(Task::from).collect());
        let same_list = self.list_id.replace(Some(list_id)) == Some(list_id);
        if !same_list {
            self.pending_delete.set(None);
            self.drag.borrow_mut().cancel();
        }
        {
            let mut tasks = self.tasks.borrow_mut();
            *tasks = if same_list { reconcile(&tasks, fresh) } else { fresh };
        }
        log::debug!("[TASKS] List {} snapshot {} applied", list_id, generation);
        self.notify();
        Ok(Outcome::Applied)
    }

    /// Refetch after a confirmed structural change. The change already
    /// stands, so a failed refetch only keeps the local splice.
    async fn refetch(&self, generation: u64) {
        let Some(list_id) = self.list_id.get() else {
            return;
        };
        if self.fetch_snapshot(list_id, generation).await.is_err() {
            log::warn!("[TASKS] Reconcile of list {} skipped, keeping local tree", list_id);
        }
    }

    // ========================
    // Task operations
    // ========================

    pub async fn create_task(&self, title: &str, parent: Option<TaskId>, priority: Priority) -> EngineResult {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Outcome::Discarded);
        }
        let Some(list_id) = self.list_id.get() else {
            return Ok(Outcome::Ignored);
        };
        let level = match parent {
            Some(pid) => match self.find(pid) {
                Some(p) => child_level(p.level),
                None => return Ok(Outcome::Ignored),
            },
            None => 0,
        };

        self.generation.bump();
        let args = CreateTaskArgs {
            title,
            completed: false,
            parent_id: parent,
            level,
            priority,
        };
        let record = api::create_task(&*self.store, list_id, &args)
            .await
            .map_err(|e| log_failure("Create task", e))?;

        let mut task = Task::from(record);
        task.parent_id = parent;
        {
            let mut tasks = self.tasks.borrow_mut();
            let parent_level = parent.and_then(|pid| find(&tasks, pid)).map(|p| p.level);
            match (parent, parent_level) {
                (Some(pid), Some(parent_level)) => {
                    relevel(&mut task, child_level(parent_level));
                    if let Some(p) = find_mut(&mut tasks, pid) {
                        p.expanded = true;
                        p.children.push(task);
                    }
                }
                _ => {
                    task.parent_id = None;
                    tasks.push(task);
                }
            }
        }
        self.notify();
        Ok(Outcome::Applied)
    }

    pub async fn toggle_completed(&self, id: TaskId) -> EngineResult {
        let Some(task) = self.find(id) else {
            return Ok(Outcome::Ignored);
        };
        let completed = !task.completed;
        self.generation.bump();
        api::update_task(&*self.store, id, &TaskPatch::completed(completed))
            .await
            .map_err(|e| log_failure("Toggle completion", e))?;

        if let Some(task) = find_mut(&mut self.tasks.borrow_mut(), id) {
            task.completed = completed;
        }
        self.notify();
        Ok(Outcome::Applied)
    }

    pub fn toggle_expanded(&self, id: TaskId) {
        let toggled = match find_mut(&mut self.tasks.borrow_mut(), id) {
            Some(task) => {
                task.expanded = !task.expanded;
                true
            }
            None => false,
        };
        if toggled {
            self.notify();
        }
    }

    pub fn set_filter(&self, filter: TaskFilter) {
        if self.filter.replace(filter) != filter {
            self.notify();
        }
    }

    /// Move a task and its subtree to the root of another list
    pub async fn move_to_list(&self, id: TaskId, list_id: ListId) -> EngineResult {
        if self.list_id.get() == Some(list_id) || self.find(id).is_none() {
            return Ok(Outcome::Ignored);
        }
        let generation = self.generation.bump();
        api::move_task_to_list(&*self.store, id, list_id)
            .await
            .map_err(|e| log_failure("Move to list", e))?;

        detach(&mut self.tasks.borrow_mut(), id);
        log::info!("[TASKS] Task {} moved to list {}", id, list_id);
        self.notify();
        self.refetch(generation).await;
        Ok(Outcome::Applied)
    }

    // ========================
    // Deletion
    // ========================

    /// Delete a leaf right away; a task with children waits for a mode
    pub async fn request_delete(&self, id: TaskId) -> EngineResult {
        let Some(task) = self.find(id) else {
            return Ok(Outcome::Ignored);
        };
        if task.has_children() {
            self.pending_delete.set(Some(id));
            self.notify();
            return Ok(Outcome::NeedsChoice);
        }
        self.delete_cascade(id).await
    }

    pub async fn confirm_delete(&self, mode: DeleteMode) -> EngineResult {
        let Some(id) = self.pending_delete.take() else {
            return Ok(Outcome::Ignored);
        };
        self.notify();
        match mode {
            DeleteMode::Cascade => self.delete_cascade(id).await,
            DeleteMode::Promote => self.delete_promote(id).await,
        }
    }

    pub fn cancel_delete(&self) {
        if self.pending_delete.take().is_some() {
            self.notify();
        }
    }

    async fn delete_cascade(&self, id: TaskId) -> EngineResult {
        self.generation.bump();
        api::delete_task(&*self.store, id)
            .await
            .map_err(|e| log_failure("Delete task", e))?;

        detach(&mut self.tasks.borrow_mut(), id);
        self.notify();
        Ok(Outcome::Applied)
    }

    async fn delete_promote(&self, id: TaskId) -> EngineResult {
        let generation = self.generation.bump();
        api::delete_task_keep_children(&*self.store, id)
            .await
            .map_err(|e| log_failure("Delete task keeping children", e))?;

        {
            let mut tasks = self.tasks.borrow_mut();
            if let Some((removed, index)) = detach(&mut tasks, id) {
                let promoted: Vec<Task> = removed
                    .children
                    .into_iter()
                    .map(|mut child| {
                        child.parent_id = removed.parent_id;
                        relevel(&mut child, removed.level);
                        child
                    })
                    .collect();
                if let Some(siblings) = siblings_mut(&mut tasks, removed.parent_id) {
                    let at = index.min(siblings.len());
                    siblings.splice(at..at, promoted);
                }
            }
        }
        self.notify();
        self.refetch(generation).await;
        Ok(Outcome::Applied)
    }

    // ========================
    // Drag and drop
    // ========================

    pub fn drag_start(&self, id: TaskId) {
        self.drag.borrow_mut().begin(id);
        self.notify();
    }

    /// Mouse press on a row; the drag starts once the pointer moves past the threshold
    pub fn drag_press(&self, id: TaskId, pointer: Point) {
        self.drag.borrow_mut().press(id, pointer);
    }

    pub fn drag_motion(&self, pointer: Point) {
        let started = self.drag.borrow_mut().motion(pointer);
        if started {
            self.notify();
        }
    }

    pub fn drag_over(&self, target: TaskId, zone: DropZone) {
        let changed = self.drag.borrow_mut().hover(target, zone);
        if changed {
            self.notify();
        }
    }

    /// Hover with the zone taken from the pointer over the row's rect
    pub fn drag_over_at(&self, target: TaskId, rect: &RowRect, pointer: Point) {
        self.drag_over(target, zone_for(rect, pointer));
    }

    pub fn drag_leave(&self) {
        let changed = self.drag.borrow_mut().leave();
        if changed {
            self.notify();
        }
    }

    pub fn drag_end(&self) {
        self.drag.borrow_mut().cancel();
        self.notify();
    }

    pub async fn complete_drop(&self) -> EngineResult {
        let released = self.drag.borrow_mut().release();
        self.notify();
        let Some(gesture) = released else {
            return Ok(Outcome::Ignored);
        };
        self.move_task(gesture.source, gesture.target, gesture.zone).await
    }

    pub async fn drop_at(&self, target: TaskId, zone: DropZone) -> EngineResult {
        self.drag.borrow_mut().hover(target, zone);
        self.complete_drop().await
    }

    async fn move_task(&self, source: TaskId, target: TaskId, zone: DropZone) -> EngineResult {
        let placement = {
            let tasks = self.tasks.borrow();
            match (find(&tasks, source), find(&tasks, target)) {
                // Dropping into the dragged subtree would orphan it
                (Some(src), Some(tgt)) if !contains(src, target) => Some(match zone {
                    DropZone::Child => (Some(tgt.id), child_level(tgt.level)),
                    DropZone::Above | DropZone::Below => (tgt.parent_id, tgt.level),
                }),
                _ => None,
            }
        };
        let Some((parent_id, level)) = placement else {
            log::debug!("[TASKS] Drop {} on {} ignored", source, target);
            return Ok(Outcome::Ignored);
        };
        log::info!(
            "[TASKS] Drop {} {} {}: parent={:?} level={}",
            source,
            zone.as_str(),
            target,
            parent_id,
            level
        );

        let generation = self.generation.bump();
        api::update_task(&*self.store, source, &TaskPatch::reparent(parent_id, level))
            .await
            .map_err(|e| log_failure("Move task", e))?;

        {
            let mut tasks = self.tasks.borrow_mut();
            if let Some((mut moved, _)) = detach(&mut tasks, source) {
                moved.parent_id = parent_id;
                relevel(&mut moved, level);
                match zone {
                    DropZone::Child => {
                        if let Some(tgt) = find_mut(&mut tasks, target) {
                            tgt.expanded = true;
                            tgt.children.push(moved);
                        }
                    }
                    DropZone::Above | DropZone::Below => {
                        if let Some(siblings) = siblings_mut(&mut tasks, parent_id) {
                            let at = siblings.iter().position(|t| t.id == target).unwrap_or(siblings.len());
                            let at = if zone == DropZone::Below { at + 1 } else { at };
                            siblings.insert(at.min(siblings.len()), moved);
                        }
                    }
                }
            }
        }
        self.notify();
        self.refetch(generation).await;
        Ok(Outcome::Applied)
    }

    fn notify(&self) {
        self.observers.notify();
    }
}

#[async_trait(?Send)]
impl<S: RemoteStore> EditSink for TaskTree<S> {
    type Id = TaskId;

    async fn commit(&self, id: TaskId, value: EditValue) -> EngineResult {
        if self.find(id).is_none() {
            return Err(EngineError::NotFound(format!("Task {}", id)));
        }
        let patch = match &value {
            EditValue::Title(title) => TaskPatch::title(title),
            EditValue::DueDate(due) => TaskPatch::due_date(*due),
            EditValue::Tags(tags) => TaskPatch::tags(tags.clone()),
        };
        self.generation.bump();
        api::update_task(&*self.store, id, &patch)
            .await
            .map_err(|e| log_failure("Save edit", e))?;

        if let Some(task) = find_mut(&mut self.tasks.borrow_mut(), id) {
            match value {
                EditValue::Title(title) => task.title = title,
                EditValue::DueDate(due) => task.due_date = due,
                EditValue::Tags(tags) => task.tags = tags,
            }
        }
        self.notify();
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::edit::EditController;
    use crate::models::MAX_TASK_LEVEL;
    use crate::testing::YieldingStore;

    struct Fixture {
        store: Rc<MemoryStore>,
        engine: TaskTree<MemoryStore>,
        list: ListId,
    }

    async fn fixture(build: impl FnOnce(&MemoryStore, ListId)) -> Fixture {
        let store = MemoryStore::new();
        let list = store.add_list("Inbox", false, None);
        build(&store, list);
        let store = Rc::new(store);
        let engine = TaskTree::new(store.clone());
        engine.load(list).await.unwrap();
        store.clear_requests();
        Fixture { store, engine, list }
    }

    fn row_ids(engine: &TaskTree<MemoryStore>) -> Vec<TaskId> {
        engine.rows().iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_child_drop_reparents_one_level_below_target() {
        let f = fixture(|s, l| {
            let one = s.add_task(l, "one", None);
            s.add_task(l, "two", Some(one));
            s.add_task(l, "three", None);
        })
        .await;

        f.engine.drag_start(3);
        f.engine.drag_over(3, DropZone::Child);
        assert_eq!(f.engine.complete_drop().await.unwrap(), Outcome::Ignored);

        f.engine.drag_start(3);
        assert_eq!(f.engine.drop_at(2, DropZone::Child).await.unwrap(), Outcome::Applied);
        let moved = f.engine.find(3).unwrap();
        assert_eq!(moved.parent_id, Some(2));
        assert_eq!(moved.level, 2);
        assert!(f.engine.find(2).unwrap().expanded);
        assert_eq!(f.store.task(3).unwrap().level, 2);
        assert!(f.engine.drag_source().is_none());
    }

    #[tokio::test]
    async fn test_sibling_drops_keep_local_order_after_refetch() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
            s.add_task(l, "b", None);
            s.add_task(l, "c", None);
        })
        .await;
        let [a, b, c] = [1, 2, 3];

        f.engine.drag_start(c);
        f.engine.drop_at(a, DropZone::Above).await.unwrap();
        assert_eq!(row_ids(&f.engine), vec![c, a, b]);

        f.engine.drag_start(c);
        f.engine.drop_at(a, DropZone::Below).await.unwrap();
        assert_eq!(row_ids(&f.engine), vec![a, c, b]);

        // Requests: reparent then refetch, twice
        assert_eq!(f.store.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_sibling_drop_takes_target_parent_and_level() {
        let f = fixture(|s, l| {
            let root = s.add_task(l, "root", None);
            s.add_task(l, "nested", Some(root));
            s.add_task(l, "loose", None);
        })
        .await;

        f.engine.drag_start(3);
        f.engine.drop_at(2, DropZone::Below).await.unwrap();
        let loose = f.engine.find(3).unwrap();
        assert_eq!((loose.parent_id, loose.level), (Some(1), 1));
        assert_eq!(row_ids(&f.engine), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_drop_into_own_subtree_is_ignored() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            let b = s.add_task(l, "b", Some(a));
            s.add_task(l, "c", Some(b));
        })
        .await;
        let before = f.engine.tasks();

        f.engine.drag_start(2);
        assert_eq!(f.engine.drop_at(3, DropZone::Child).await.unwrap(), Outcome::Ignored);
        assert_eq!(f.engine.tasks(), before);
        assert!(f.store.requests().is_empty());
    }

    #[tokio::test]
    async fn test_child_level_caps_at_max() {
        let f = fixture(|s, l| {
            let mut parent = None;
            for i in 0..=MAX_TASK_LEVEL {
                parent = Some(s.add_task(l, &format!("depth {}", i), parent));
            }
            s.add_task(l, "loose", None);
        })
        .await;
        let deepest = 1 + MAX_TASK_LEVEL as u32;
        assert_eq!(f.engine.find(deepest).unwrap().level, MAX_TASK_LEVEL);

        let loose = deepest + 1;
        f.engine.drag_start(loose);
        f.engine.drop_at(deepest, DropZone::Child).await.unwrap();
        assert_eq!(f.engine.find(loose).unwrap().level, MAX_TASK_LEVEL);
    }

    #[tokio::test]
    async fn test_failed_move_keeps_tree() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
            s.add_task(l, "b", None);
        })
        .await;
        let before = f.engine.tasks();

        f.store.fail_next(RemoteError::new(500, "down"));
        f.engine.drag_start(2);
        assert!(f.engine.drop_at(1, DropZone::Child).await.is_err());
        assert_eq!(f.engine.tasks(), before);
        assert!(f.engine.drop_target().is_none());
    }

    #[tokio::test]
    async fn test_toggle_completed_twice_restores_progress() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
            s.add_task(l, "c", None);
        })
        .await;
        f.engine.toggle_completed(3).await.unwrap();
        assert_eq!(f.engine.progress(), 33);

        f.engine.toggle_completed(2).await.unwrap();
        assert_eq!(f.engine.progress(), 67);
        f.engine.toggle_completed(2).await.unwrap();
        assert!(!f.engine.find(2).unwrap().completed);
        assert_eq!(f.engine.progress(), 33);
        assert!(!f.store.task(2).unwrap().completed);
    }

    #[test]
    fn test_progress_of_empty_tree_is_zero() {
        assert_eq!(progress_of(&[]), 0);
        let mut done = Task::new(1, "done");
        done.completed = true;
        assert_eq!(progress_of(&[done]), 100);
    }

    #[tokio::test]
    async fn test_progress_skips_collapsed_but_not_filtered_tasks() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
        })
        .await;
        f.engine.toggle_completed(2).await.unwrap();
        assert_eq!(f.engine.progress(), 50);

        f.engine.set_filter(TaskFilter::Active);
        assert_eq!(f.engine.rows().len(), 1);
        assert_eq!(f.engine.progress(), 50);

        f.engine.toggle_expanded(1);
        assert_eq!(f.engine.progress(), 0);
    }

    #[tokio::test]
    async fn test_delete_leaf_removes_one_row() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
            s.add_task(l, "b", None);
        })
        .await;
        assert_eq!(f.engine.request_delete(2).await.unwrap(), Outcome::Applied);
        assert_eq!(row_ids(&f.engine), vec![1]);
        assert!(f.store.task(2).is_none());
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_subtree() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            let b = s.add_task(l, "b", Some(a));
            s.add_task(l, "c", Some(b));
            s.add_task(l, "d", Some(a));
            s.add_task(l, "e", None);
        })
        .await;
        assert_eq!(f.engine.rows().len(), 5);

        assert_eq!(f.engine.request_delete(1).await.unwrap(), Outcome::NeedsChoice);
        let pending = f.engine.pending_delete().unwrap();
        assert_eq!((pending.children, pending.descendants), (2, 3));
        assert!(f.store.requests().is_empty());

        f.engine.confirm_delete(DeleteMode::Cascade).await.unwrap();
        assert_eq!(row_ids(&f.engine), vec![5]);
        assert!(f.engine.pending_delete().is_none());
        assert_eq!(f.store.tasks_in(f.list).len(), 1);
    }

    #[tokio::test]
    async fn test_promote_delete_keeps_children_in_place() {
        let f = fixture(|s, l| {
            let top = s.add_task(l, "top", None);
            let mid = s.add_task(l, "mid", Some(top));
            s.add_task(l, "x", Some(mid));
            let y = s.add_task(l, "y", Some(mid));
            s.add_task(l, "z", Some(y));
            s.add_task(l, "after", Some(top));
        })
        .await;
        let before = f.engine.rows().len();

        f.engine.request_delete(2).await.unwrap();
        f.engine.confirm_delete(DeleteMode::Promote).await.unwrap();

        assert_eq!(f.engine.rows().len(), before - 1);
        assert_eq!(row_ids(&f.engine), vec![1, 3, 4, 5, 6]);
        for id in [3, 4] {
            let child = f.engine.find(id).unwrap();
            assert_eq!((child.parent_id, child.level), (Some(1), 1));
        }
        assert_eq!(f.engine.find(5).unwrap().level, 2);
    }

    #[tokio::test]
    async fn test_cancel_delete_keeps_task() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
        })
        .await;
        f.engine.request_delete(1).await.unwrap();
        f.engine.cancel_delete();
        assert_eq!(f.engine.confirm_delete(DeleteMode::Cascade).await.unwrap(), Outcome::Ignored);
        assert_eq!(f.engine.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_confirm_delete_reports_error_and_keeps_task() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
        })
        .await;
        f.engine.request_delete(1).await.unwrap();
        f.store.fail_next(RemoteError::new(500, "down"));

        let err = f.engine.confirm_delete(DeleteMode::Cascade).await.unwrap_err();
        assert!(matches!(err, EngineError::Remote(ref e) if e.status == 500));
        assert_eq!(f.engine.pending_delete(), None);
        assert_eq!(f.engine.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_filter_leaves_tree_alone() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
            s.add_task(l, "b", None);
        })
        .await;
        f.engine.toggle_completed(1).await.unwrap();
        let tree = f.engine.tasks();

        f.engine.set_filter(TaskFilter::Completed);
        assert_eq!(row_ids(&f.engine), vec![1]);
        f.engine.set_filter(TaskFilter::Active);
        assert_eq!(row_ids(&f.engine), vec![2]);
        assert_eq!(f.engine.tasks(), tree);
    }

    #[tokio::test]
    async fn test_create_task_under_parent() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
        })
        .await;
        f.engine.toggle_expanded(1);

        assert_eq!(
            f.engine.create_task(" ", None, Priority::High).await.unwrap(),
            Outcome::Discarded
        );
        assert!(f.store.requests().is_empty());

        f.engine.create_task("child", Some(1), Priority::High).await.unwrap();
        let parent = f.engine.find(1).unwrap();
        assert!(parent.expanded);
        let child = &parent.children[0];
        assert_eq!((child.level, child.priority), (1, Priority::High));
        assert_eq!(f.store.task(child.id).unwrap().parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_move_to_other_list() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
            s.add_task(l, "c", None);
        })
        .await;
        let other = f.store.add_list("Later", false, None);

        f.engine.move_to_list(3, other).await.unwrap();
        assert!(f.engine.find(3).is_none());
        let moved = f.store.task(3).unwrap();
        assert_eq!((moved.task_list_id, moved.parent_id, moved.level), (Some(other), None, 0));
        assert_eq!(f.store.tasks_in(other).len(), 1);
    }

    #[tokio::test]
    async fn test_edits_apply_to_nested_task() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
        })
        .await;
        let mut edit = EditController::default();

        edit.begin_tags(2, vec![]).unwrap();
        edit.add_tag("Work");
        edit.save(&f.engine).await.unwrap();

        let due = NaiveDate::from_ymd_opt(2025, 5, 1);
        edit.begin_due_date(2, None).unwrap();
        edit.set_due_date(due);
        edit.save(&f.engine).await.unwrap();

        edit.begin_title(2, "b").unwrap();
        edit.set_title("renamed");
        edit.save(&f.engine).await.unwrap();

        let task = f.engine.find(2).unwrap();
        assert_eq!(task.tags, vec!["Work"]);
        assert_eq!(task.due_date, due);
        assert_eq!(task.title, "renamed");
        assert_eq!(f.store.task(2).unwrap().due_date, due);
    }

    #[tokio::test]
    async fn test_failed_edit_is_not_applied() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
        })
        .await;
        let mut edit = EditController::default();
        edit.begin_title(1, "a").unwrap();
        edit.set_title("b");
        f.store.fail_next(RemoteError::new(500, "down"));
        assert!(edit.save(&f.engine).await.is_err());
        assert_eq!(f.engine.find(1).unwrap().title, "a");
        assert!(edit.current().is_none());
    }

    #[tokio::test]
    async fn test_reload_keeps_expansion() {
        let f = fixture(|s, l| {
            let a = s.add_task(l, "a", None);
            s.add_task(l, "b", Some(a));
        })
        .await;
        f.engine.toggle_expanded(1);
        f.engine.load(f.list).await.unwrap();
        assert!(!f.engine.find(1).unwrap().expanded);
        assert_eq!(f.engine.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_discarded() {
        let store = Rc::new(YieldingStore::default());
        let list = store.inner.add_list("Inbox", false, None);
        let task = store.inner.add_task(list, "a", None);
        let engine = TaskTree::new(store.clone());
        engine.load(list).await.unwrap();

        let (load, toggle) = tokio::join!(engine.load(list), engine.toggle_completed(task));
        assert_eq!(load.unwrap(), Outcome::Stale);
        assert_eq!(toggle.unwrap(), Outcome::Applied);
        assert!(engine.find(task).unwrap().completed);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_open_list() {
        let f = fixture(|s, l| {
            s.add_task(l, "from inbox", None);
        })
        .await;
        let other = f.store.add_list("Later", false, None);

        f.store.fail_next(RemoteError::new(500, "down"));
        assert!(f.engine.load(other).await.is_err());
        assert_eq!(f.engine.list_id(), Some(f.list));

        f.engine.create_task("new", None, Priority::Medium).await.unwrap();
        let titles: Vec<String> = f.engine.rows().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["from inbox", "new"]);
        assert_eq!(f.store.tasks_in(f.list).len(), 2);
        assert!(f.store.tasks_in(other).is_empty());
    }

    #[tokio::test]
    async fn test_switching_lists_replaces_tree() {
        let f = fixture(|s, l| {
            s.add_task(l, "from inbox", None);
        })
        .await;
        let other = f.store.add_list("Later", false, None);
        let later = f.store.add_task(other, "from later", None);

        assert_eq!(f.engine.load(other).await.unwrap(), Outcome::Applied);
        assert_eq!(f.engine.list_id(), Some(other));
        assert_eq!(row_ids(&f.engine), vec![later]);
    }

    #[tokio::test]
    async fn test_failed_refetch_still_reports_move() {
        let f = fixture(|s, l| {
            s.add_task(l, "a", None);
            s.add_task(l, "b", None);
        })
        .await;
        f.store.fail_on("GET", &format!("task-lists/{}/tasks", f.list), RemoteError::new(503, "busy"));

        f.engine.drag_start(2);
        assert_eq!(f.engine.drop_at(1, DropZone::Child).await.unwrap(), Outcome::Applied);
        assert_eq!(f.engine.find(2).unwrap().parent_id, Some(1));
        assert_eq!(f.store.task(2).unwrap().parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_drop_through_shared_engine() {
        let store = Rc::new(MemoryStore::new());
        let list = store.add_list("Inbox", false, None);
        let a = store.add_task(list, "a", None);
        let b = store.add_task(list, "b", None);
        let engine = Rc::new(TaskTree::new(store.clone()));
        engine.load(list).await.unwrap();

        engine.drag_start(b);
        engine.drag_over(a, DropZone::Above);
        assert_eq!(engine.complete_drop().await.unwrap(), Outcome::Applied);
        assert_eq!(row_ids(&engine), vec![b, a]);
    }

    #[test]
    fn test_due_status_boundaries() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut task = Task::new(1, "t");
        assert_eq!(due_status(&task, today), None);

        let cases = [(-1, DueStatus::Overdue), (0, DueStatus::Soon), (2, DueStatus::Soon), (3, DueStatus::Upcoming)];
        for (offset, expected) in cases {
            task.due_date = Some(today + chrono::Duration::days(offset));
            assert_eq!(due_status(&task, today), Some(expected), "offset {}", offset);
        }
    }

    #[test]
    fn test_drop_zone_from_pointer() {
        let store = Rc::new(MemoryStore::new());
        let engine = TaskTree::new(store);
        *engine.tasks.borrow_mut() = vec![Task::new(1, "a"), Task::new(2, "b")];
        let rect = RowRect { left: 0.0, top: 0.0, width: 100.0, height: 30.0 };

        engine.drag_start(1);
        engine.drag_over_at(2, &rect, Point::new(80.0, 5.0));
        assert_eq!(engine.drop_target(), Some((2, DropZone::Child)));
        engine.drag_over_at(2, &rect, Point::new(10.0, 5.0));
        assert_eq!(engine.drop_target(), Some((2, DropZone::Above)));
        engine.drag_leave();
        assert_eq!(engine.drop_target(), None);
        engine.drag_end();
        assert!(engine.drag_source().is_none());
    }
}
