//! Drag Session
//!
//! Framework-free drag-and-drop state for tree views.
//! Uses a movement threshold to distinguish click from drag, and resolves
//! the pointer position over a hovered row into a drop zone.

#[cfg(feature = "web")]
pub mod web;

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Pointer position in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of a hovered row in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RowRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a dragged row lands relative to the hovered row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropZone {
    /// Sibling placed before the hovered row
    Above,
    /// Sibling placed after the hovered row
    Below,
    /// Nested under the hovered row
    Child,
}

impl DropZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropZone::Above => "above",
            DropZone::Below => "below",
            DropZone::Child => "child",
        }
    }
}

/// Resolve the drop zone for a pointer over a row.
///
/// Right half of the row nests under it. On the left half the upper third
/// inserts above and the remaining two thirds insert below.
pub fn zone_for(rect: &RowRect, pointer: Point) -> DropZone {
    let horizontal_mid = rect.left + rect.width / 2.0;
    let vertical_threshold = rect.top + rect.height / 3.0;
    if pointer.x > horizontal_mid {
        DropZone::Child
    } else if pointer.y < vertical_threshold {
        DropZone::Above
    } else {
        DropZone::Below
    }
}

/// Phase of a drag gesture
#[derive(Clone, Debug, PartialEq)]
enum DragPhase<Id, Z> {
    Idle,
    /// Pressed but not moved past the threshold yet
    Pending { source: Id, origin: Point },
    Dragging { source: Id },
    Hovering { source: Id, target: Id, zone: Z },
}

/// A completed gesture handed to the owning engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gesture<Id, Z> {
    pub source: Id,
    pub target: Id,
    pub zone: Z,
}

/// Single-owner drag state.
///
/// `Z` is the disambiguation carried with the hover target; list views that
/// only care about the target use `()`.
#[derive(Clone, Debug)]
pub struct DragSession<Id, Z = ()> {
    phase: DragPhase<Id, Z>,
}

impl<Id, Z> Default for DragSession<Id, Z> {
    fn default() -> Self {
        Self { phase: DragPhase::Idle }
    }
}

impl<Id: Copy + PartialEq, Z: Copy + PartialEq> DragSession<Id, Z> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press on a row; dragging starts once the pointer moves far enough
    pub fn press(&mut self, source: Id, origin: Point) {
        self.phase = DragPhase::Pending { source, origin };
    }

    /// Start dragging immediately (native drag events already debounce clicks)
    pub fn begin(&mut self, source: Id) {
        self.phase = DragPhase::Dragging { source };
    }

    /// Feed pointer movement. Returns true when this movement started the drag.
    pub fn motion(&mut self, pointer: Point) -> bool {
        if let DragPhase::Pending { source, origin } = self.phase {
            let dx = (pointer.x - origin.x).abs();
            let dy = (pointer.y - origin.y).abs();
            if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
                self.phase = DragPhase::Dragging { source };
                return true;
            }
        }
        false
    }

    /// Hover over a target. Hovering the source itself clears the target.
    /// Returns true when the visible hover state changed.
    pub fn hover(&mut self, target: Id, zone: Z) -> bool {
        let Some(source) = self.source_if_dragging() else {
            return false;
        };
        let next = if source == target {
            DragPhase::Dragging { source }
        } else {
            DragPhase::Hovering { source, target, zone }
        };
        if next == self.phase {
            return false;
        }
        self.phase = next;
        true
    }

    /// Pointer left the hovered row
    pub fn leave(&mut self) -> bool {
        if let DragPhase::Hovering { source, .. } = self.phase {
            self.phase = DragPhase::Dragging { source };
            return true;
        }
        false
    }

    /// Finish the gesture. The session is always back to idle afterwards;
    /// a drop is only produced when hovering a target other than the source.
    pub fn release(&mut self) -> Option<Gesture<Id, Z>> {
        let phase = std::mem::replace(&mut self.phase, DragPhase::Idle);
        match phase {
            DragPhase::Hovering { source, target, zone } if source != target => {
                Some(Gesture { source, target, zone })
            }
            _ => None,
        }
    }

    /// Abort without dropping
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. } | DragPhase::Hovering { .. })
    }

    /// Dragged id, once past the threshold
    pub fn source(&self) -> Option<Id> {
        self.source_if_dragging()
    }

    pub fn target(&self) -> Option<Id> {
        match self.phase {
            DragPhase::Hovering { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn zone(&self) -> Option<Z> {
        match self.phase {
            DragPhase::Hovering { zone, .. } => Some(zone),
            _ => None,
        }
    }

    fn source_if_dragging(&self) -> Option<Id> {
        match self.phase {
            DragPhase::Dragging { source } | DragPhase::Hovering { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RowRect {
        RowRect { left: 0.0, top: 100.0, width: 200.0, height: 30.0 }
    }

    #[test]
    fn test_zone_right_half_is_child() {
        assert_eq!(zone_for(&row(), Point::new(150.0, 101.0)), DropZone::Child);
        assert_eq!(zone_for(&row(), Point::new(101.0, 129.0)), DropZone::Child);
    }

    #[test]
    fn test_zone_left_half_splits_by_third() {
        assert_eq!(zone_for(&row(), Point::new(10.0, 105.0)), DropZone::Above);
        assert_eq!(zone_for(&row(), Point::new(10.0, 110.0)), DropZone::Below);
        assert_eq!(zone_for(&row(), Point::new(100.0, 125.0)), DropZone::Below);
    }

    #[test]
    fn test_press_needs_threshold() {
        let mut s: DragSession<u32> = DragSession::new();
        s.press(1, Point::new(10.0, 10.0));
        assert!(!s.motion(Point::new(12.0, 13.0)));
        assert_eq!(s.source(), None);
        assert!(s.motion(Point::new(10.0, 20.0)));
        assert_eq!(s.source(), Some(1));
    }

    #[test]
    fn test_hover_self_clears_target() {
        let mut s: DragSession<u32, DropZone> = DragSession::new();
        s.begin(1);
        assert!(s.hover(2, DropZone::Child));
        assert_eq!(s.target(), Some(2));
        assert!(!s.hover(2, DropZone::Child));
        assert!(s.hover(2, DropZone::Above));
        assert!(s.hover(1, DropZone::Above));
        assert_eq!(s.target(), None);
        assert!(s.is_dragging());
    }

    #[test]
    fn test_release_always_resets() {
        let mut s: DragSession<u32, DropZone> = DragSession::new();
        s.begin(1);
        assert_eq!(s.release(), None);
        assert!(s.is_idle());

        s.begin(1);
        s.hover(3, DropZone::Below);
        let gesture = s.release().unwrap();
        assert_eq!(gesture, Gesture { source: 1, target: 3, zone: DropZone::Below });
        assert!(s.is_idle());
    }

    #[test]
    fn test_hover_without_drag_is_ignored() {
        let mut s: DragSession<u32> = DragSession::new();
        assert!(!s.hover(2, ()));
        s.press(1, Point::default());
        assert!(!s.hover(2, ()));
        assert_eq!(s.release(), None);
    }

    #[test]
    fn test_leave_and_cancel() {
        let mut s: DragSession<u32> = DragSession::new();
        s.begin(1);
        s.hover(2, ());
        assert!(s.leave());
        assert_eq!(s.target(), None);
        assert!(!s.leave());
        s.cancel();
        assert!(s.is_idle());
    }
}
