//! Task Lists App
//!
//! Builds the engines over the HTTP store and lays out the three panes.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::HttpStore;
use crate::components::{DeleteDialog, ListSidebar, NewTaskForm, OverviewPanel, TagEditor, TaskTreeView};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::edit::{EditController, TagVocabulary};
use crate::lists::ListFolders;
use crate::tasks::TaskTree;

#[component]
pub fn App() -> impl IntoView {
    let config = AppConfig::from_env();
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    let api_base = config.api_base_or(&origin);
    log::info!("[APP] Using API at {}", api_base);

    let store = Rc::new(HttpStore::new(&api_base));
    let lists = Rc::new(ListFolders::with_folder_title(store.clone(), &config.folder_title));
    let tasks = Rc::new(TaskTree::new(store.clone()));
    let task_edit = EditController::new(TagVocabulary::new(config.default_tags.clone()));
    let list_edit = EditController::new(TagVocabulary::default());

    let ctx = AppContext::new(store, lists.clone(), tasks, task_edit, list_edit);
    provide_context(ctx);

    spawn_local(async move {
        if let Err(err) = lists.load().await {
            log::error!("[APP] Failed to load lists: {}", err);
        }
    });

    let heading = move || {
        ctx.lists_version.track();
        ctx.selected_list
            .get()
            .and_then(|id| ctx.lists().find(id))
            .map(|list| list.title)
            .unwrap_or_else(|| "Overview".to_string())
    };

    view! {
        <div class="app-layout">
            // Left: lists and folders
            <ListSidebar />

            // Center: tasks of the open list
            <main class="main-content">
                <h1>{heading}</h1>
                <Show when=move || ctx.selected_list.get().is_none()>
                    <OverviewPanel />
                </Show>
                <NewTaskForm />
                <TaskTreeView />
                <DeleteDialog />
            </main>

            // Right: tag editing
            <TagEditor />
        </div>
    }
}
