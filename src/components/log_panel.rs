//! Log Panel
//!
//! Recent log lines from the in-memory logger, read on demand.

use leptos::prelude::*;

use crate::config::APP_NAME;

/// Lines shown at most, newest first
const SHOWN: usize = 50;

#[component]
pub fn LogPanel() -> impl IntoView {
    let (lines, set_lines) = signal(Vec::<String>::new());

    let refresh = move || {
        let recent = rolling_logger::recent();
        set_lines.set(
            recent
                .iter()
                .rev()
                .take(SHOWN)
                .map(|entry| entry.format(APP_NAME))
                .collect(),
        );
    };

    view! {
        <details class="log-panel" on:toggle=move |_| refresh()>
            <summary>"Logs"</summary>
            <div class="log-actions">
                <button type="button" on:click=move |_| refresh()>"Refresh"</button>
                <button type="button" on:click=move |_| {
                    rolling_logger::clear_recent();
                    set_lines.set(Vec::new());
                }>"Clear"</button>
            </div>
            <ul class="log-lines">
                {move || lines.get().into_iter().map(|line| view! { <li>{line}</li> }).collect_view()}
            </ul>
        </details>
    }
}
