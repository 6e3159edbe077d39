//! UI Components
//!
//! Leptos views over the list and task engines.

mod delete_confirm_button;
mod delete_dialog;
mod drag_listeners;
mod list_sidebar;
mod log_panel;
mod new_task_form;
mod overview_panel;
mod tag_editor;
mod task_row;
mod task_tree_view;

pub use delete_confirm_button::DeleteConfirmButton;
pub use delete_dialog::DeleteDialog;
pub use drag_listeners::bind_global_drag;
pub use list_sidebar::ListSidebar;
pub use log_panel::LogPanel;
pub use new_task_form::NewTaskForm;
pub use overview_panel::OverviewPanel;
pub use tag_editor::TagEditor;
pub use task_row::TaskRowView;
pub use task_tree_view::TaskTreeView;

use wasm_bindgen::JsCast;

/// Current value of the `<input>` that fired `ev`
pub(crate) fn input_value(ev: &web_sys::Event) -> String {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}
