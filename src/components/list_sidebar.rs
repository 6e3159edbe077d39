//! List Sidebar Component
//!
//! Task lists and folders with drag-and-drop between them.

use leptos::prelude::*;
use leptos::task::spawn_local;
use drag_session::web::pointer;

use crate::components::{bind_global_drag, input_value, DeleteConfirmButton, LogPanel};
use crate::context::AppContext;
use crate::edit::EditField;
use crate::lists::ListRow;
use crate::models::ListKind;

/// Icon for a sidebar row, chosen by kind
fn list_icon(row: &ListRow) -> &'static str {
    match row.kind {
        ListKind::Folder if row.expanded => "📂",
        ListKind::Folder => "📁",
        ListKind::Leaf => "📋",
    }
}

#[component]
pub fn ListSidebar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    // Pointer tracking and drop on release
    bind_global_drag(
        move |p| ctx.lists().drag_motion(p),
        move || {
            let lists = ctx.lists();
            spawn_local(async move {
                let _ = lists.complete_drop().await;
            });
        },
    );

    let rows = move || {
        ctx.lists_version.track();
        ctx.lists().rows()
    };

    view! {
        <aside class="list-sidebar">
            <div class="sidebar-header">
                <h3>"Lists"</h3>
            </div>
            <NewListForm />
            <ul class="list-tree">
                <For
                    each=rows
                    key=|row| (row.id, row.title.clone(), row.depth, row.expanded, row.child_count)
                    children=move |row| view! { <ListRowView row=row /> }
                />
            </ul>
            <LogPanel />
        </aside>
    }
}

#[component]
fn ListRowView(row: ListRow) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let id = row.id;
    let is_folder = row.kind.is_folder();
    let icon = list_icon(&row);
    let indent = row.depth * 16;
    let title = row.title.clone();

    let is_selected = move || ctx.selected_list.get() == Some(id);
    let is_dragging = move || {
        ctx.lists_version.track();
        ctx.lists().drag_source() == Some(id)
    };
    let is_drop_target = move || {
        ctx.lists_version.track();
        ctx.lists().drop_target() == Some(id)
    };
    let is_renaming = move || ctx.read_list_edit(|edit| edit.is_editing(id, EditField::Title));

    let row_class = move || {
        let mut c = String::from("list-row");
        if is_selected() { c.push_str(" selected"); }
        if is_dragging() { c.push_str(" dragging"); }
        if is_drop_target() { c.push_str(" drop-target"); }
        c
    };

    let on_click = move |_| {
        if is_folder {
            ctx.lists().toggle_folder(id);
        } else {
            ctx.select_list(id);
        }
    };

    let begin_rename = {
        let title = title.clone();
        move |_| {
            let _ = ctx.with_list_edit(|edit| edit.begin_title(id, &title));
        }
    };

    let delete = move |_| {
        let lists = ctx.lists();
        if ctx.selected_list.get_untracked() == Some(id) {
            ctx.selected_list.set(None);
        }
        spawn_local(async move {
            let _ = lists.delete_list(id).await;
        });
    };

    view! {
        <li
            class=row_class
            style=format!("padding-left: {}px;", indent)
            on:mousedown=move |ev| ctx.lists().drag_press(id, pointer(&ev))
            on:mouseenter=move |_| ctx.lists().drag_over(id)
            on:mouseleave=move |_| ctx.lists().drag_leave()
            on:click=on_click
        >
            <span class="list-icon">{icon}</span>
            <Show
                when=is_renaming
                fallback=move || view! {
                    <span class="list-title" on:dblclick=begin_rename.clone()>{title.clone()}</span>
                }
            >
                <input
                    class="rename-input"
                    type="text"
                    prop:value=move || ctx.read_list_edit(|edit| edit.title_buffer().unwrap_or_default().to_string())
                    on:input=move |ev| ctx.with_list_edit(|edit| edit.set_title(&input_value(&ev)))
                    on:keydown=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                        "Enter" => ctx.save_list_edit(),
                        "Escape" => ctx.with_list_edit(|edit| edit.cancel()),
                        _ => {}
                    }
                    on:blur=move |_| ctx.save_list_edit()
                    on:click=move |ev| ev.stop_propagation()
                />
            </Show>
            {is_folder.then(|| view! { <span class="child-count">{row.child_count}</span> })}
            <DeleteConfirmButton button_class="delete-btn" on_confirm=Callback::new(delete) />
        </li>
    }
}

#[component]
fn NewListForm() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let (title, set_title) = signal(String::new());

    let create = move |kind: ListKind| {
        let text = title.get();
        if text.trim().is_empty() {
            return;
        }
        let lists = ctx.lists();
        spawn_local(async move {
            if lists.create_list(&text, kind).await.is_ok() {
                set_title.set(String::new());
            }
        });
    };

    view! {
        <form class="new-list-form" on:submit=move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            create(ListKind::Leaf);
        }>
            <input
                type="text"
                placeholder="New list..."
                prop:value=move || title.get()
                on:input=move |ev| set_title.set(input_value(&ev))
            />
            <button type="submit">"+ List"</button>
            <button type="button" on:click=move |_| create(ListKind::Folder)>"+ Folder"</button>
        </form>
    }
}
