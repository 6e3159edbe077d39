//! Overview Panel
//!
//! Shown while no list is open: totals across lists, overdue tasks and
//! high-priority tasks with their subtasks.

use chrono::Local;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::AppContext;
use crate::models::{Task, TaskId};
use crate::overview::{load_overview, ListedTask, Overview};

#[component]
pub fn OverviewPanel() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let overview = RwSignal::new(None::<Overview>);

    // Reload when lists or the open list change
    Effect::new(move |_| {
        ctx.lists_version.track();
        ctx.tasks_version.track();
        let store = ctx.store();
        spawn_local(async move {
            if let Ok(loaded) = load_overview(&*store, Local::now().date_naive()).await {
                overview.set(Some(loaded));
            }
        });
    });

    let toggle = move |id: TaskId| {
        let store = ctx.store();
        spawn_local(async move {
            let Some(mut current) = overview.get_untracked() else {
                return;
            };
            if current.toggle_completed(&*store, id).await.is_ok() {
                overview.set(Some(current));
            }
        });
    };

    view! {
        <section class="overview">
            {move || overview.get().map(|o| view! {
                <div class="stat-cards">
                    <div class="stat-card">
                        <span class="stat-label">"Tasks"</span>
                        <span class="stat-value">{o.total}</span>
                    </div>
                    <div class="stat-card">
                        <span class="stat-label">"Completed"</span>
                        <span class="stat-value">{o.completed} " (" {o.progress()} "%)"</span>
                    </div>
                    <div class="stat-card">
                        <span class="stat-label">"Due this week"</span>
                        <span class="stat-value">{o.upcoming}</span>
                    </div>
                    <div class="stat-card overdue">
                        <span class="stat-label">"Overdue"</span>
                        <span class="stat-value">{o.overdue.len()}</span>
                    </div>
                </div>

                <h3>"Overdue"</h3>
                <TaskGroup entries=o.overdue toggle=Callback::new(toggle) />

                <h3>"High priority"</h3>
                <TaskGroup entries=o.high_priority toggle=Callback::new(toggle) />
            })}
        </section>
    }
}

#[component]
fn TaskGroup(entries: Vec<ListedTask>, toggle: Callback<TaskId>) -> impl IntoView {
    if entries.is_empty() {
        return view! { <p class="empty-state">"Nothing here."</p> }.into_any();
    }
    view! {
        <ul class="overview-group">
            {entries.into_iter().map(|entry| {
                let subtasks = entry.task.children.clone();
                view! {
                    <li class="overview-task">
                        <TaskLine task=entry.task toggle=toggle />
                        <span class="list-badge">{entry.list_title}</span>
                        {(!subtasks.is_empty()).then(|| view! {
                            <ul class="overview-subtasks">
                                {subtasks.into_iter().map(|child| view! {
                                    <li><TaskLine task=child toggle=toggle /></li>
                                }).collect_view()}
                            </ul>
                        })}
                    </li>
                }
            }).collect_view()}
        </ul>
    }
    .into_any()
}

#[component]
fn TaskLine(task: Task, toggle: Callback<TaskId>) -> impl IntoView {
    let id = task.id;
    let due = task.due_date.map(|d| d.format("%Y-%m-%d").to_string());
    view! {
        <span class=if task.completed { "task-line completed" } else { "task-line" }>
            <input type="checkbox" checked=task.completed on:change=move |_| toggle.run(id) />
            <span class="item-text">{task.title}</span>
            <span class=format!("priority {}", task.priority.as_str())>{task.priority.as_str()}</span>
            {due.map(|d| view! { <span class="due-date">{d}</span> })}
        </span>
    }
}
