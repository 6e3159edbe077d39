//! New Task Form Component
//!
//! Creates a task at the root of the open list or under `adding_under`.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::input_value;
use crate::context::AppContext;
use crate::models::Priority;

const PRIORITIES: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

#[component]
pub fn NewTaskForm() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let (new_title, set_new_title) = signal(String::new());
    let (priority, set_priority) = signal(Priority::default());

    let create_task = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let title = new_title.get();
        if title.trim().is_empty() {
            return;
        }
        let parent = ctx.adding_under.get();
        let priority = priority.get();
        let tasks = ctx.tasks();

        spawn_local(async move {
            if tasks.create_task(&title, parent, priority).await.is_ok() {
                set_new_title.set(String::new());
                ctx.adding_under.set(None);
            }
        });
    };

    view! {
        <Show when=move || ctx.selected_list.get().is_some()>
            <form class="new-item-form" on:submit=create_task>
                <div class="new-item-row">
                    <input
                        type="text"
                        placeholder=move || match ctx.adding_under.get() {
                            Some(pid) => format!("Add subtask under #{}...", pid),
                            None => "Add new task...".to_string(),
                        }
                        prop:value=move || new_title.get()
                        on:input=move |ev| set_new_title.set(input_value(&ev))
                    />
                    <button type="submit">"Add"</button>
                </div>

                <div class="priority-row">
                    {PRIORITIES.iter().map(|p| {
                        let p = *p;
                        view! {
                            <button
                                type="button"
                                class=move || if priority.get() == p { "priority-btn small active" } else { "priority-btn small" }
                                on:click=move |_| set_priority.set(p)
                            >
                                {p.as_str()}
                            </button>
                        }
                    }).collect_view()}
                </div>

                {move || ctx.adding_under.get().map(|pid| view! {
                    <button type="button" class="cancel-btn" on:click=move |_| ctx.adding_under.set(None)>
                        "Cancel (#" {pid} ")"
                    </button>
                })}
            </form>
        </Show>
    }
}
