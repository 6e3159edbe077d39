//! Application Context
//!
//! Engines and UI signals shared via Leptos Context API.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::HttpStore;
use crate::edit::EditController;
use crate::engine::Outcome;
use crate::lists::ListFolders;
use crate::models::{ListId, TaskId};
use crate::tasks::TaskTree;

pub type Lists = ListFolders<HttpStore>;
pub type Tasks = TaskTree<HttpStore>;

/// App-wide engines and signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    store: StoredValue<Rc<HttpStore>, LocalStorage>,
    lists: StoredValue<Rc<Lists>, LocalStorage>,
    tasks: StoredValue<Rc<Tasks>, LocalStorage>,
    task_edit: StoredValue<Rc<RefCell<EditController<TaskId>>>, LocalStorage>,
    list_edit: StoredValue<Rc<RefCell<EditController<ListId>>>, LocalStorage>,
    /// Bumped whenever the list engine notifies
    pub lists_version: ReadSignal<u32>,
    /// Bumped whenever the task engine notifies
    pub tasks_version: ReadSignal<u32>,
    /// Bumped whenever an edit buffer changes
    pub edit_version: ReadSignal<u32>,
    set_edit_version: WriteSignal<u32>,
    /// Currently open list
    pub selected_list: RwSignal<Option<ListId>>,
    /// Which task to add a child under (None = root)
    pub adding_under: RwSignal<Option<TaskId>>,
}

impl AppContext {
    pub fn new(
        store: Rc<HttpStore>,
        lists: Rc<Lists>,
        tasks: Rc<Tasks>,
        task_edit: EditController<TaskId>,
        list_edit: EditController<ListId>,
    ) -> Self {
        let (lists_version, set_lists_version) = signal(0u32);
        let (tasks_version, set_tasks_version) = signal(0u32);
        let (edit_version, set_edit_version) = signal(0u32);

        // Engines push change notifications into version signals
        lists.subscribe(move || set_lists_version.update(|v| *v += 1));
        tasks.subscribe(move || set_tasks_version.update(|v| *v += 1));

        Self {
            store: StoredValue::new_local(store),
            lists: StoredValue::new_local(lists),
            tasks: StoredValue::new_local(tasks),
            task_edit: StoredValue::new_local(Rc::new(RefCell::new(task_edit))),
            list_edit: StoredValue::new_local(Rc::new(RefCell::new(list_edit))),
            lists_version,
            tasks_version,
            edit_version,
            set_edit_version,
            selected_list: RwSignal::new(None),
            adding_under: RwSignal::new(None),
        }
    }

    /// Store shared by both engines, for cross-list reads
    pub fn store(&self) -> Rc<HttpStore> {
        self.store.get_value()
    }

    pub fn lists(&self) -> Rc<Lists> {
        self.lists.get_value()
    }

    pub fn tasks(&self) -> Rc<Tasks> {
        self.tasks.get_value()
    }

    /// Run `f` against the task edit controller and re-render edit views
    pub fn with_task_edit<R>(&self, f: impl FnOnce(&mut EditController<TaskId>) -> R) -> R {
        let edit = self.task_edit.get_value();
        let result = f(&mut edit.borrow_mut());
        self.set_edit_version.update(|v| *v += 1);
        result
    }

    pub fn with_list_edit<R>(&self, f: impl FnOnce(&mut EditController<ListId>) -> R) -> R {
        let edit = self.list_edit.get_value();
        let result = f(&mut edit.borrow_mut());
        self.set_edit_version.update(|v| *v += 1);
        result
    }

    /// Read the task edit state inside a reactive closure
    pub fn read_task_edit<R>(&self, f: impl FnOnce(&EditController<TaskId>) -> R) -> R {
        self.edit_version.track();
        let edit = self.task_edit.get_value();
        let result = f(&edit.borrow());
        result
    }

    pub fn read_list_edit<R>(&self, f: impl FnOnce(&EditController<ListId>) -> R) -> R {
        self.edit_version.track();
        let edit = self.list_edit.get_value();
        let result = f(&edit.borrow());
        result
    }

    /// Commit the task edit in progress
    pub fn save_task_edit(&self) {
        let pending = self.with_task_edit(|edit| edit.take());
        if let Some(pending) = pending {
            let tasks = self.tasks();
            spawn_local(async move {
                let _ = pending.save(&*tasks).await;
            });
        }
    }

    pub fn save_list_edit(&self) {
        let pending = self.with_list_edit(|edit| edit.take());
        if let Some(pending) = pending {
            let lists = self.lists();
            spawn_local(async move {
                let _ = pending.save(&*lists).await;
            });
        }
    }

    /// Load a list's tasks and open it once they arrive
    pub fn select_list(&self, id: ListId) {
        let ctx = *self;
        let tasks = self.tasks();
        spawn_local(async move {
            if let Ok(Outcome::Applied) = tasks.load(id).await {
                ctx.selected_list.set(Some(id));
                ctx.adding_under.set(None);
            }
        });
    }
}
