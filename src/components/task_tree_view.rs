//! Task Tree View Component
//!
//! Displays the open list's tasks as an indented tree with drag-and-drop.
//! The pointer position over a row picks the drop zone (above, below, child).

use leptos::prelude::*;
use leptos::task::spawn_local;

use drag_session::web::{pointer, zone_from_event};

use crate::components::{bind_global_drag, TaskRowView};
use crate::context::AppContext;
use crate::tasks::TaskFilter;

const FILTERS: [TaskFilter; 3] = [TaskFilter::All, TaskFilter::Active, TaskFilter::Completed];

/// Task tree view component with DnD support
#[component]
pub fn TaskTreeView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    bind_global_drag(
        move |p| ctx.tasks().drag_motion(p),
        move || {
            let tasks = ctx.tasks();
            spawn_local(async move {
                let _ = tasks.complete_drop().await;
            });
        },
    );

    let rows = move || {
        ctx.tasks_version.track();
        ctx.tasks().rows()
    };

    view! {
        <div class="tree-view">
            <FilterBar />
            <For
                each=rows
                key=|row| {
                    // Every field a row renders, so edits re-render it
                    (
                        row.id,
                        row.title.clone(),
                        row.completed,
                        row.depth,
                        row.expanded,
                        row.has_children,
                        row.due_date,
                        row.tags.clone(),
                        row.priority,
                    )
                }
                children=move |row| {
                    let id = row.id;
                    let is_dragging = move || {
                        ctx.tasks_version.track();
                        ctx.tasks().drag_source() == Some(id)
                    };
                    let drop_zone = move || {
                        ctx.tasks_version.track();
                        ctx.tasks()
                            .drop_target()
                            .filter(|(target, _)| *target == id)
                            .map(|(_, zone)| zone)
                    };
                    let wrapper_class = move || {
                        let mut c = String::from("tree-item-wrapper");
                        if is_dragging() { c.push_str(" dragging"); }
                        if let Some(zone) = drop_zone() {
                            c.push_str(" drop-");
                            c.push_str(zone.as_str());
                        }
                        c
                    };

                    view! {
                        <div
                            class=wrapper_class
                            on:mousedown=move |ev| ctx.tasks().drag_press(id, pointer(&ev))
                            on:mousemove=move |ev| {
                                if let Some(zone) = zone_from_event(&ev) {
                                    ctx.tasks().drag_over(id, zone);
                                }
                            }
                            on:mouseleave=move |_| ctx.tasks().drag_leave()
                        >
                            <TaskRowView row=row />
                        </div>
                    }
                }
            />
            <Show when=move || { ctx.tasks_version.track(); ctx.tasks().rows().is_empty() }>
                <p class="empty-state">"No tasks here yet."</p>
            </Show>
        </div>
    }
}

/// Filter buttons and the completion bar
#[component]
fn FilterBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let progress = move || {
        ctx.tasks_version.track();
        ctx.tasks().progress()
    };

    view! {
        <div class="filter-bar">
            {FILTERS.iter().map(|filter| {
                let filter = *filter;
                let is_active = move || {
                    ctx.tasks_version.track();
                    ctx.tasks().filter() == filter
                };
                view! {
                    <button
                        type="button"
                        class=move || if is_active() { "filter-btn active" } else { "filter-btn" }
                        on:click=move |_| ctx.tasks().set_filter(filter)
                    >
                        {filter.as_str()}
                    </button>
                }
            }).collect_view()}
            <div class="progress">
                <div class="progress-fill" style=move || format!("width: {}%;", progress())></div>
                <span class="progress-label">{move || format!("{}%", progress())}</span>
            </div>
        </div>
    }
}
