//! Tag Editor Panel
//!
//! Side panel for the tags of the task being edited. Typing filters the
//! vocabulary; Enter adds every `;`-separated tag at once.

use leptos::prelude::*;

use crate::components::input_value;
use crate::context::AppContext;
use crate::edit::EditField;

/// Text after the last semicolon, which is what suggestions match against
fn current_segment(input: &str) -> &str {
    input.rsplit(';').next().unwrap_or("").trim()
}

#[component]
pub fn TagEditor() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let (draft, set_draft) = signal(String::new());

    let editing = move || {
        ctx.read_task_edit(|edit| {
            edit.current()
                .filter(|state| state.value.field() == EditField::Tags)
                .map(|state| state.id)
        })
    };

    let chosen = move || ctx.read_task_edit(|edit| edit.tags_buffer().to_vec());

    let suggestions = move || {
        let text = draft.get();
        let segment = current_segment(&text);
        if segment.is_empty() {
            return Vec::new();
        }
        ctx.read_task_edit(|edit| {
            edit.vocabulary()
                .suggestions(segment)
                .into_iter()
                .filter(|tag| !edit.tags_buffer().iter().any(|t| t.as_str() == *tag))
                .take(5)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    };

    let vocabulary = move || {
        ctx.read_task_edit(|edit| {
            edit.vocabulary()
                .tags()
                .iter()
                .map(|tag| (tag.clone(), edit.tags_buffer().contains(tag)))
                .collect::<Vec<_>>()
        })
    };

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = draft.get();
        ctx.with_task_edit(|edit| {
            for tag in text.split(';') {
                edit.add_tag(tag);
            }
        });
        set_draft.set(String::new());
    };

    let pick = move |tag: String| {
        ctx.with_task_edit(|edit| edit.add_tag(&tag));
        set_draft.set(String::new());
    };

    let close = move || {
        set_draft.set(String::new());
        ctx.with_task_edit(|edit| edit.cancel());
    };

    view! {
        {move || editing().map(|id| view! {
            <aside class="tag-editor">
                <div class="tag-editor-header">
                    <h3>"Tags for #" {id}</h3>
                    <button class="close-btn" on:click=move |_| close()>"✗"</button>
                </div>

                <div class="tag-chips current">
                    {move || chosen().into_iter().map(|tag| {
                        let name = tag.clone();
                        view! {
                            <span class="tag-chip">
                                {tag}
                                <button
                                    class="tag-remove-btn"
                                    on:click=move |_| { ctx.with_task_edit(|edit| edit.remove_tag(&name)); }
                                >
                                    "×"
                                </button>
                            </span>
                        }
                    }).collect_view()}
                </div>

                <form class="tag-input-form" on:submit=submit>
                    <input
                        type="text"
                        placeholder="Add tags (separate with ;)"
                        prop:value=move || draft.get()
                        on:input=move |ev| set_draft.set(input_value(&ev))
                        on:keydown=move |ev: web_sys::KeyboardEvent| {
                            if ev.key() == "Escape" {
                                close();
                            }
                        }
                    />
                </form>

                <ul class="tag-suggestions">
                    {move || suggestions().into_iter().map(|tag| {
                        let picked = tag.clone();
                        view! { <li on:mousedown=move |_| pick(picked.clone())>{tag}</li> }
                    }).collect_view()}
                </ul>

                <div class="tag-chips vocabulary">
                    {move || vocabulary().into_iter().map(|(tag, selected)| {
                        let name = tag.clone();
                        view! {
                            <button
                                type="button"
                                class=if selected { "tag-chip selected" } else { "tag-chip" }
                                on:click=move |_| { ctx.with_task_edit(|edit| edit.toggle_tag(&name)); }
                            >
                                {tag}
                            </button>
                        }
                    }).collect_view()}
                </div>

                <div class="tag-editor-actions">
                    <button class="confirm-btn" on:click=move |_| ctx.save_task_edit()>"Save"</button>
                    <button class="cancel-btn" on:click=move |_| close()>"Cancel"</button>
                </div>
            </aside>
        })}
    }
}
