//! Global pointer listeners
//!
//! Drags keep tracking when the pointer leaves the row it started on, so
//! movement and release are bound on the document.

use drag_session::{web::pointer, Point};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Bind document-level `mousemove` and `mouseup` for one drag owner
pub fn bind_global_drag<M, U>(on_move: M, on_up: U)
where
    M: Fn(Point) + 'static,
    U: Fn() + 'static,
{
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        log::warn!("[DND] No document, drag listeners not bound");
        return;
    };

    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        on_move(pointer(&ev));
    });
    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        on_up();
    });

    let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
    let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    on_mousemove.forget();
    on_mouseup.forget();
}
