//! Delete Confirm Button Component
//!
//! Inline confirmation for deleting a list or folder.

use leptos::prelude::*;

/// Two-step delete: × arms it, ✓ runs `on_confirm`, ✗ disarms.
///
/// `prompt` defaults to "Delete?". Clicks never bubble to the row, so the
/// row underneath is not selected or toggled.
#[component]
pub fn DeleteConfirmButton(
    #[prop(into)] button_class: String,
    #[prop(into)] on_confirm: Callback<()>,
    #[prop(optional, into)] prompt: Option<String>,
) -> impl IntoView {
    let armed = RwSignal::new(false);
    let prompt = prompt.unwrap_or_else(|| "Delete?".to_string());

    let arm = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        armed.set(true);
    };
    let confirm = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        armed.set(false);
        on_confirm.run(());
    };
    let disarm = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        armed.set(false);
    };

    view! {
        <Show
            when=move || armed.get()
            fallback=move || view! { <button class=button_class.clone() on:click=arm>"×"</button> }
        >
            <span class="delete-confirm" on:mousedown=|ev| ev.stop_propagation()>
                <span class="delete-confirm-text">{prompt.clone()}</span>
                <button class="confirm-btn" on:click=confirm>"✓"</button>
                <button class="cancel-btn" on:click=disarm>"✗"</button>
            </span>
        </Show>
    }
}
