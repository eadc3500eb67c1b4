use tracing::debug;

use super::types::{Anchor, Point, Rect, TextMetrics, WatermarkConfig, WatermarkGeometry};

/// Distance in preview pixels between the watermark and the canvas edge
pub const EDGE_PADDING: f32 = 20.0;

/// Compute where the watermark sits on a `canvas_width` x `canvas_height` canvas.
///
/// Never fails: empty text or a placement whose centre falls off the canvas yields
/// [`WatermarkGeometry::EMPTY`], which renders nothing.
pub fn resolve_geometry(
    canvas_width: u32,
    canvas_height: u32,
    config: &WatermarkConfig,
    metrics: TextMetrics,
) -> WatermarkGeometry {
    resolve_geometry_scaled(canvas_width, canvas_height, config, metrics, 1.0)
}

/// Same as [`resolve_geometry`] with the edge padding and drag offset multiplied by
/// `scale`. Used when the canvas is a scaled copy of the preview.
pub fn resolve_geometry_scaled(
    canvas_width: u32,
    canvas_height: u32,
    config: &WatermarkConfig,
    metrics: TextMetrics,
    scale: f32,
) -> WatermarkGeometry {
    if config.text.trim().is_empty() {
        return WatermarkGeometry::EMPTY;
    }

    let canvas_w = canvas_width as f32;
    let canvas_h = canvas_height as f32;
    let half_w = metrics.width / 2.0;
    let half_h = metrics.height / 2.0;

    let anchor_point = match config.effective_offset() {
        Some(offset) => {
            let offset = offset.scaled(scale);
            Point::new(offset.x + half_w, offset.y + half_h)
        }
        None => anchor_position(
            config.anchor,
            canvas_w,
            canvas_h,
            metrics,
            EDGE_PADDING * scale,
        ),
    };

    if !(0.0..=canvas_w).contains(&anchor_point.x) || !(0.0..=canvas_h).contains(&anchor_point.y)
    {
        debug!(
            "Watermark centre ({}, {}) outside {}x{} canvas, suppressing",
            anchor_point.x, anchor_point.y, canvas_width, canvas_height
        );
        return WatermarkGeometry::EMPTY;
    }

    WatermarkGeometry {
        anchor_point,
        bounding_box: Rect {
            x: anchor_point.x - half_w,
            y: anchor_point.y - half_h,
            width: metrics.width,
            height: metrics.height,
        },
    }
}

fn anchor_position(
    anchor: Anchor,
    canvas_w: f32,
    canvas_h: f32,
    metrics: TextMetrics,
    padding: f32,
) -> Point {
    let left = padding + metrics.width / 2.0;
    let center_x = canvas_w / 2.0;
    let right = canvas_w - padding - metrics.width / 2.0;
    let top = padding + metrics.height / 2.0;
    let center_y = canvas_h / 2.0;
    let bottom = canvas_h - padding - metrics.height / 2.0;

    match anchor {
        Anchor::TopLeft => Point::new(left, top),
        Anchor::TopCenter => Point::new(center_x, top),
        Anchor::TopRight => Point::new(right, top),
        Anchor::CenterLeft => Point::new(left, center_y),
        Anchor::Center => Point::new(center_x, center_y),
        Anchor::CenterRight => Point::new(right, center_y),
        Anchor::BottomLeft => Point::new(left, bottom),
        Anchor::BottomCenter => Point::new(center_x, bottom),
        Anchor::BottomRight => Point::new(right, bottom),
    }
}

/// Clamp a proposed top-left offset so a `box_width` x `box_height` box stays on the canvas.
///
/// A box wider (or taller) than the canvas pins to 0 on that axis and overhangs the far edge.
pub fn constrain_offset(
    proposed_x: f32,
    proposed_y: f32,
    canvas_width: u32,
    canvas_height: u32,
    box_width: f32,
    box_height: f32,
) -> (f32, f32) {
    let max_x = canvas_width as f32 - box_width;
    let max_y = canvas_height as f32 - box_height;
    (proposed_x.min(max_x).max(0.0), proposed_y.min(max_y).max(0.0))
}

/// Inclusive point-in-rectangle test. An empty box never hits.
pub fn hit_test(pointer_x: f32, pointer_y: f32, bounding_box: &Rect) -> bool {
    if bounding_box.width <= 0.0 {
        return false;
    }
    pointer_x >= bounding_box.x
        && pointer_x <= bounding_box.right()
        && pointer_y >= bounding_box.y
        && pointer_y <= bounding_box.bottom()
}
