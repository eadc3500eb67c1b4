use std::time::Instant;
use tracing::debug;

use crate::schedule::RedrawScheduler;
use crate::watermark::{
    DragState, DrawingSurface, ExportTarget, ExportedImage, ImageSource, Point, RenderError,
    RenderOutcome, WatermarkConfig, WatermarkGeometry, render_export, render_preview,
};

/// One loaded image being watermarked: the preview surface plus the separate pieces of
/// state the renderer reads (config), the pointer writes (drag), and the loader owns
/// (source).
pub struct WatermarkSession<S: DrawingSurface> {
    source: ImageSource,
    pub config: WatermarkConfig,
    surface: S,
    drag: Option<DragState>,
    geometry: WatermarkGeometry,
    redraw: RedrawScheduler,
}

impl<S: DrawingSurface> WatermarkSession<S> {
    pub fn new(source: ImageSource, config: WatermarkConfig, surface: S) -> Self {
        Self {
            source,
            config,
            surface,
            drag: None,
            geometry: WatermarkGeometry::EMPTY,
            redraw: RedrawScheduler::new(),
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Geometry from the last render, used for hit-testing
    pub fn geometry(&self) -> WatermarkGeometry {
        self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|drag| drag.active)
    }

    /// Repaint the preview. An anchor-placed watermark is pinned into `config.offset`
    /// so a following drag starts from where it was drawn.
    pub fn render(&mut self) -> Result<RenderOutcome, RenderError> {
        let outcome = render_preview(
            &mut self.surface,
            &self.source.image,
            &self.config,
            self.source.display_width,
            self.source.display_height,
        )?;
        self.geometry = outcome.geometry;
        if self.config.effective_offset().is_none() {
            self.config.pin_to(&outcome.geometry);
        }
        Ok(outcome)
    }

    /// Returns true if the press landed on the watermark and a drag began
    pub fn pointer_down(&mut self, pointer: Point) -> bool {
        self.drag = DragState::begin(pointer, &self.geometry.bounding_box);
        self.drag.is_some()
    }

    /// Move the watermark with the pointer. Returns true when the config changed and
    /// a redraw is needed.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let Some(drag) = self.drag.filter(|drag| drag.active && drag.has_moved(pointer)) else {
            return false;
        };
        let offset = drag.move_to(
            pointer,
            self.source.display_width,
            self.source.display_height,
            &self.geometry.bounding_box,
        );
        if self.config.offset == Some(offset) {
            return false;
        }
        debug!("Watermark dragged to ({}, {})", offset.x, offset.y);
        self.config.offset = Some(offset);
        true
    }

    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.as_mut() {
            drag.end();
        }
        self.drag = None;
    }

    /// Ask for a repaint after the debounce delay. Requests during a drag use the
    /// short frame delay so the watermark tracks the pointer.
    pub fn request_redraw(&mut self, now: Instant) {
        self.redraw.request(now, self.is_dragging());
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw.is_pending()
    }

    /// Repaint if a requested redraw has come due. Returns `None` when nothing was drawn.
    pub fn poll_redraw(&mut self, now: Instant) -> Result<Option<RenderOutcome>, RenderError> {
        if !self.redraw.take_due(now) {
            return Ok(None);
        }
        debug!(
            "Redrawing ({} requests coalesced so far)",
            self.redraw.coalesced()
        );
        self.render().map(Some)
    }

    /// Render at the original resolution onto `target_surface` and encode
    pub fn export<E: DrawingSurface>(
        &self,
        target_surface: &mut E,
        jpeg_quality: u8,
    ) -> Result<ExportedImage, RenderError> {
        let target = ExportTarget {
            jpeg_quality,
            ..ExportTarget::original_size(&self.source)
        };
        render_export(target_surface, &self.source.image, &self.config, &target)
    }
}
