use tracing::debug;

use super::geometry::{constrain_offset, hit_test};
use super::types::{Offset, Point, Rect};

/// Pointer drag in progress. Only exists between a press inside the watermark and release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    pub active: bool,
    pub pointer_start: Point,
    /// Pointer position relative to the box's top-left corner when the drag began
    pub drag_anchor_offset: Point,
}

impl DragState {
    /// Start a drag if `pointer` lands inside the last rendered bounding box.
    pub fn begin(pointer: Point, bounding_box: &Rect) -> Option<DragState> {
        if !hit_test(pointer.x, pointer.y, bounding_box) {
            return None;
        }
        debug!("Drag started at ({}, {})", pointer.x, pointer.y);
        Some(DragState {
            active: true,
            pointer_start: pointer,
            drag_anchor_offset: Point::new(pointer.x - bounding_box.x, pointer.y - bounding_box.y),
        })
    }

    /// Unclamped top-left the box would have with the pointer at `pointer`
    pub fn proposed_offset(&self, pointer: Point) -> Offset {
        Offset::new(
            pointer.x - self.drag_anchor_offset.x,
            pointer.y - self.drag_anchor_offset.y,
        )
    }

    /// New offset for the box, kept inside the canvas
    pub fn move_to(
        &self,
        pointer: Point,
        canvas_width: u32,
        canvas_height: u32,
        bounding_box: &Rect,
    ) -> Offset {
        let proposed = self.proposed_offset(pointer);
        let (x, y) = constrain_offset(
            proposed.x,
            proposed.y,
            canvas_width,
            canvas_height,
            bounding_box.width,
            bounding_box.height,
        );
        Offset::new(x, y)
    }

    /// False for move events still at the press position
    pub fn has_moved(&self, pointer: Point) -> bool {
        pointer != self.pointer_start
    }

    pub fn end(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watermark_box() -> Rect {
        Rect {
            x: 100.0,
            y: 50.0,
            width: 120.0,
            height: 24.0,
        }
    }

    #[test]
    fn test_begin_requires_hit() {
        assert!(DragState::begin(Point::new(10.0, 10.0), &watermark_box()).is_none());
        let drag = DragState::begin(Point::new(110.0, 60.0), &watermark_box()).unwrap();
        assert!(drag.active);
        assert_eq!(drag.drag_anchor_offset, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_move_keeps_grab_point_under_pointer() {
        let drag = DragState::begin(Point::new(110.0, 60.0), &watermark_box()).unwrap();
        let offset = drag.move_to(Point::new(310.0, 260.0), 800, 600, &watermark_box());
        assert_eq!(offset, Offset::new(300.0, 250.0));
    }

    #[test]
    fn test_move_is_clamped_to_canvas() {
        let drag = DragState::begin(Point::new(110.0, 60.0), &watermark_box()).unwrap();
        let offset = drag.move_to(Point::new(2000.0, -400.0), 800, 600, &watermark_box());
        assert_eq!(offset, Offset::new(680.0, 0.0));
    }

    #[test]
    fn test_has_moved_compares_with_press_position() {
        let drag = DragState::begin(Point::new(110.0, 60.0), &watermark_box()).unwrap();
        assert!(!drag.has_moved(Point::new(110.0, 60.0)));
        assert!(drag.has_moved(Point::new(111.0, 60.0)));
    }

    #[test]
    fn test_end_deactivates() {
        let mut drag = DragState::begin(Point::new(110.0, 60.0), &watermark_box()).unwrap();
        drag.end();
        assert!(!drag.active);
    }
}
