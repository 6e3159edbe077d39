//! Delete Dialog Component
//!
//! Asks what to do with the children of a task being deleted.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::AppContext;
use crate::tasks::DeleteMode;

#[component]
pub fn DeleteDialog() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let pending = move || {
        ctx.tasks_version.track();
        ctx.tasks().pending_delete()
    };

    let confirm = move |mode: DeleteMode| {
        let tasks = ctx.tasks();
        spawn_local(async move {
            let _ = tasks.confirm_delete(mode).await;
        });
    };

    view! {
        {move || pending().map(|pending| {
            let title = ctx
                .tasks()
                .find(pending.id)
                .map(|task| task.title)
                .unwrap_or_default();
            view! {
                <div class="modal-backdrop">
                    <div class="modal delete-dialog">
                        <h3>"Delete \"" {title} "\"?"</h3>
                        <p>
                            "This task has " {pending.children} " subtask(s), "
                            {pending.descendants} " in total."
                        </p>
                        <div class="modal-actions">
                            <button class="danger-btn" on:click=move |_| confirm(DeleteMode::Cascade)>
                                "Delete all"
                            </button>
                            <button on:click=move |_| confirm(DeleteMode::Promote)>
                                "Keep subtasks"
                            </button>
                            <button class="cancel-btn" on:click=move |_| ctx.tasks().cancel_delete()>
                                "Cancel"
                            </button>
                        </div>
                    </div>
                </div>
            }
        })}
    }
}
