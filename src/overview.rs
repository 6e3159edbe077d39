//! Dashboard Overview
//!
//! Counts and highlighted tasks gathered from every list, folder members
//! included.

use chrono::{Duration, NaiveDate};

use crate::api::{self, RemoteStore, TaskPatch};
use crate::engine::{EngineError, EngineResult, Outcome};
use crate::models::{ListId, Priority, Task, TaskId, TaskList, TaskRecord};

/// Days ahead, today included, that count as upcoming
pub const UPCOMING_DAYS: i64 = 7;

/// A task shown outside its list, with its direct subtasks
#[derive(Debug, Clone, PartialEq)]
pub struct ListedTask {
    pub task: Task,
    pub list_id: ListId,
    pub list_title: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    pub total: usize,
    pub completed: usize,
    /// Open tasks due between today and `UPCOMING_DAYS` ahead
    pub upcoming: usize,
    /// Open tasks due before today
    pub overdue: Vec<ListedTask>,
    /// High-priority roots, then high-priority subtasks under a parent that is not
    pub high_priority: Vec<ListedTask>,
}

impl Overview {
    pub fn progress(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 * 100.0) / self.total as f64).round() as u8
    }

    /// Fold one list's flat task records into the overview
    pub fn add_list(&mut self, list: &TaskList, records: &[TaskRecord], today: NaiveDate) {
        let horizon = today + Duration::days(UPCOMING_DAYS);
        let listed = |record: &TaskRecord| {
            let mut task = Task::from(record.clone());
            task.expanded = false;
            task.children = records
                .iter()
                .filter(|r| r.parent_id == Some(record.id))
                .cloned()
                .map(Task::from)
                .collect();
            ListedTask { task, list_id: list.id, list_title: list.title.clone() }
        };

        self.total += records.len();
        self.completed += records.iter().filter(|r| r.completed).count();

        for record in records.iter().filter(|r| !r.completed) {
            match record.due_date {
                Some(due) if due < today => self.overdue.push(listed(record)),
                Some(due) if due <= horizon => self.upcoming += 1,
                _ => {}
            }
        }

        let is_high = |id: TaskId| {
            records
                .iter()
                .any(|r| r.id == id && r.priority == Priority::High)
        };
        let roots = records
            .iter()
            .filter(|r| r.priority == Priority::High && r.parent_id.is_none());
        let subtasks = records.iter().filter(|r| {
            r.priority == Priority::High && r.parent_id.is_some_and(|p| !is_high(p))
        });
        let highlighted: Vec<ListedTask> = roots.chain(subtasks).map(listed).collect();
        self.high_priority.extend(highlighted);
    }

    /// Flip a highlighted task's completion in the store, then in the overview
    pub async fn toggle_completed<S: RemoteStore + ?Sized>(&mut self, store: &S, id: TaskId) -> EngineResult {
        let Some(completed) = self.highlighted(id).map(|t| t.completed) else {
            return Ok(Outcome::Ignored);
        };
        api::update_task(store, id, &TaskPatch::completed(!completed))
            .await
            .map_err(|e| {
                log::error!("[OVERVIEW] Toggle task {} failed: {}", id, e);
                EngineError::Remote(e)
            })?;

        for entry in self.overdue.iter_mut().chain(self.high_priority.iter_mut()) {
            if entry.task.id == id {
                entry.task.completed = !completed;
            }
            for child in entry.task.children.iter_mut().filter(|c| c.id == id) {
                child.completed = !completed;
            }
        }
        if completed {
            self.completed = self.completed.saturating_sub(1);
        } else {
            self.completed += 1;
        }
        Ok(Outcome::Applied)
    }

    fn highlighted(&self, id: TaskId) -> Option<&Task> {
        self.overdue
            .iter()
            .chain(self.high_priority.iter())
            .flat_map(|entry| std::iter::once(&entry.task).chain(entry.task.children.iter()))
            .find(|task| task.id == id)
    }
}

/// Gather the overview from every non-folder list. A list whose tasks fail
/// to load is skipped; failing to load the lists themselves is an error.
pub async fn load_overview<S: RemoteStore + ?Sized>(store: &S, today: NaiveDate) -> EngineResult<Overview> {
    let records = api::list_task_lists(store).await.map_err(|e| {
        log::error!("[OVERVIEW] Load lists failed: {}", e);
        EngineError::Remote(e)
    })?;
    let mut lists = Vec::new();
    for record in records {
        record.flatten_into(&mut lists);
    }

    let mut overview = Overview::default();
    for list in lists.iter().filter(|l| !l.is_folder()) {
        match api::list_tasks(store, list.id).await {
            Ok(tasks) => overview.add_list(list, &tasks, today),
            Err(e) => log::warn!("[OVERVIEW] Skipping list {}: {}", list.id, e),
        }
    }
    log::debug!(
        "[OVERVIEW] {} lists, {} tasks, {} completed",
        lists.len(),
        overview.total,
        overview.completed
    );
    Ok(overview)
}
