//! Task Row Component
//!
//! One task in the tree: toggles, inline title and due-date edits, tags.

use chrono::Local;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::input_value;
use crate::context::AppContext;
use crate::edit::EditField;
use crate::tasks::{due_status, TaskRow};
use crate::models::Task;

#[component]
pub fn TaskRowView(row: TaskRow) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let id = row.id;
    let completed = row.completed;
    let expanded = row.expanded;
    let indent = row.depth * 24;
    let title = row.title.clone();
    let tags = row.tags.clone();

    let due_class = {
        let mut due_only = Task::new(id, "");
        due_only.due_date = row.due_date;
        match due_status(&due_only, Local::now().date_naive()) {
            Some(status) => format!("due-date {}", status.as_str()),
            None => "due-date none".to_string(),
        }
    };
    let due_label = row
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "No due date".to_string());

    let editing = move |field: EditField| ctx.read_task_edit(|edit| edit.is_editing(id, field));

    let toggle_completed = move |_| {
        let tasks = ctx.tasks();
        spawn_local(async move {
            let _ = tasks.toggle_completed(id).await;
        });
    };

    let request_delete = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let tasks = ctx.tasks();
        spawn_local(async move {
            let _ = tasks.request_delete(id).await;
        });
    };

    let begin_title = {
        let title = title.clone();
        move |_| {
            let _ = ctx.with_task_edit(|edit| edit.begin_title(id, &title));
        }
    };
    let begin_due = move |_| {
        let _ = ctx.with_task_edit(|edit| edit.begin_due_date(id, row.due_date));
    };
    let begin_tags = {
        let tags = tags.clone();
        move |_| {
            let _ = ctx.with_task_edit(|edit| edit.begin_tags(id, tags.clone()));
        }
    };

    view! {
        <div
            class=move || if completed { "item-row completed" } else { "item-row" }
            style=format!("margin-left: {}px;", indent)
        >
            // Collapse toggle
            {if row.has_children {
                view! {
                    <button class="collapse-btn" on:click=move |_| ctx.tasks().toggle_expanded(id)>
                        {if expanded { "▼" } else { "▶" }}
                    </button>
                }.into_any()
            } else {
                view! { <span class="collapse-placeholder">"·"</span> }.into_any()
            }}

            <input type="checkbox" checked=completed on:change=toggle_completed />

            <Show
                when=move || editing(EditField::Title)
                fallback=move || view! {
                    <span class="item-text" on:dblclick=begin_title.clone()>{title.clone()}</span>
                }
            >
                <input
                    class="title-input"
                    type="text"
                    prop:value=move || ctx.read_task_edit(|edit| edit.title_buffer().unwrap_or_default().to_string())
                    on:input=move |ev| ctx.with_task_edit(|edit| edit.set_title(&input_value(&ev)))
                    on:keydown=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                        "Enter" => ctx.save_task_edit(),
                        "Escape" => ctx.with_task_edit(|edit| edit.cancel()),
                        _ => {}
                    }
                    on:blur=move |_| ctx.save_task_edit()
                />
            </Show>

            <span class=format!("priority {}", row.priority.as_str())>{row.priority.as_str()}</span>

            <Show
                when=move || editing(EditField::DueDate)
                fallback=move || view! {
                    <span class=due_class.clone() on:click=begin_due>{due_label.clone()}</span>
                }
            >
                <DueDateEditor />
            </Show>

            <span class="tag-list" on:click=begin_tags>
                {if tags.is_empty() {
                    view! { <span class="tag-chip empty">"+ tag"</span> }.into_any()
                } else {
                    tags.iter()
                        .map(|tag| view! { <span class="tag-chip">{tag.clone()}</span> })
                        .collect_view()
                        .into_any()
                }}
            </span>

            <button class="add-child-btn" on:click=move |_| ctx.adding_under.set(Some(id))>"+"</button>
            <button class="delete-btn" on:click=request_delete>"×"</button>
        </div>
    }
}

/// Date input for the due date being edited
#[component]
fn DueDateEditor() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let value = move || {
        ctx.read_task_edit(|edit| {
            edit.due_date_buffer()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
    };

    view! {
        <span class="due-date-editor">
            <input
                type="date"
                prop:value=value
                on:input=move |ev| ctx.with_task_edit(|edit| edit.set_due_date_text(&input_value(&ev)))
            />
            <button class="confirm-btn" on:click=move |_| ctx.save_task_edit()>"✓"</button>
            <button class="clear-btn" on:click=move |_| {
                ctx.with_task_edit(|edit| edit.set_due_date(None));
                ctx.save_task_edit();
            }>"Clear"</button>
            <button class="cancel-btn" on:click=move |_| ctx.with_task_edit(|edit| edit.cancel())>"✗"</button>
        </span>
    }
}
