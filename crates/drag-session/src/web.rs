//! DOM helpers
//!
//! Read pointer positions and row rects from browser mouse events.

use wasm_bindgen::JsCast;

use crate::{zone_for, DropZone, Point, RowRect};

pub fn pointer(ev: &web_sys::MouseEvent) -> Point {
    Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

pub fn row_rect(el: &web_sys::Element) -> RowRect {
    let rect = el.get_bounding_client_rect();
    RowRect {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    }
}

/// Drop zone of the pointer over the element the listener is attached to
pub fn zone_from_event(ev: &web_sys::MouseEvent) -> Option<DropZone> {
    let el = ev.current_target()?.dyn_into::<web_sys::Element>().ok()?;
    Some(zone_for(&row_rect(&el), pointer(ev)))
}
