//! Pan/zoom state of the rendered surface
//!
//! Pure coordinate logic, kept apart from the widget so it can be tested
//! without an egui context. The surface is the field drawn as one textured
//! rectangle; [`SurfaceView::screen_to_surface`] is the unprojection that
//! feeds picking.

use egui::{Pos2, Rect, Vec2};

/// Zoom step multiplier for the +/- buttons and keys
pub const ZOOM_STEP: f32 = 1.25;

/// Zoom step multiplier for the scroll wheel
pub const SCROLL_ZOOM_STEP: f32 = 1.08;

/// Minimum zoom level (10% of fit-to-view)
pub const MIN_ZOOM: f32 = 0.1;

/// Maximum zoom level. Survey lines are thousands of samples long, so
/// single cells only become visible deep in.
pub const MAX_ZOOM: f32 = 200.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceView {
    /// 1.0 = fit-to-view
    pub zoom: f32,
    /// Pan offset in screen pixels
    pub pan_offset: Vec2,
}

impl Default for SurfaceView {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
        }
    }
}

impl SurfaceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to fit-to-view
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        (self.zoom - 1.0).abs() < 0.001 && self.pan_offset.length() < 0.5
    }

    pub fn zoom_in(&mut self, center: Pos2, viewport_center: Pos2) {
        self.zoom_around_point(ZOOM_STEP, center, viewport_center);
    }

    pub fn zoom_out(&mut self, center: Pos2, viewport_center: Pos2) {
        self.zoom_around_point(1.0 / ZOOM_STEP, center, viewport_center);
    }

    /// Zoom by `zoom_delta`, keeping the content under `screen_pos` fixed.
    ///
    /// The pan offset is relative to the viewport center, so
    /// `pan_new = d * (1 - ratio) + pan_old * ratio` with `d` the cursor's
    /// offset from that center.
    pub fn zoom_around_point(&mut self, zoom_delta: f32, screen_pos: Pos2, viewport_center: Pos2) {
        if zoom_delta == 1.0 {
            return;
        }

        let old_zoom = self.zoom;
        let new_zoom = (old_zoom * zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - old_zoom).abs() < 0.0001 {
            return;
        }

        let ratio = new_zoom / old_zoom;
        let d = screen_pos - viewport_center;
        self.pan_offset = d * (1.0 - ratio) + self.pan_offset * ratio;
        self.zoom = new_zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan_offset += delta;
    }

    /// Size of the surface at zoom 1: the largest rect with the field's
    /// aspect ratio that fits the viewport.
    pub fn fit_size(viewport: Vec2, field_size: (u32, u32)) -> Vec2 {
        let aspect = field_size.0 as f32 / field_size.1.max(1) as f32;
        if aspect > viewport.x / viewport.y {
            Vec2::new(viewport.x, viewport.x / aspect)
        } else {
            Vec2::new(viewport.y * aspect, viewport.y)
        }
    }

    /// Screen rect the surface is drawn into.
    pub fn surface_rect(&self, viewport: Rect, base_size: Vec2) -> Rect {
        let zoomed = base_size * self.zoom;
        let centered = (viewport.size() - zoomed) / 2.0;
        Rect::from_min_size(viewport.min + centered + self.pan_offset, zoomed)
    }

    /// Normalized surface coordinate `(u, v)` of a screen position, with
    /// `v = 0` at the bottom edge. `None` off the surface.
    pub fn screen_to_surface(&self, screen_pos: Pos2, surface: Rect) -> Option<(f32, f32)> {
        if !surface.contains(screen_pos) || surface.width() <= 0.0 || surface.height() <= 0.0 {
            return None;
        }
        let u = (screen_pos.x - surface.min.x) / surface.width();
        let v = 1.0 - (screen_pos.y - surface.min.y) / surface.height();
        Some((u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
    }

    /// Screen position of the center of field cell `(x, y)`, `y = 0` on top.
    pub fn cell_center_to_screen(&self, cell: (u32, u32), surface: Rect, field_size: (u32, u32)) -> Pos2 {
        let rel_x = (cell.0 as f32 + 0.5) / field_size.0 as f32;
        let rel_y = (cell.1 as f32 + 0.5) / field_size.1 as f32;
        Pos2::new(
            surface.min.x + rel_x * surface.width(),
            surface.min.y + rel_y * surface.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::locate;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_fit_size_wide_field() {
        let size = SurfaceView::fit_size(Vec2::new(800.0, 600.0), (4144, 690));
        assert!((size.x - 800.0).abs() < 0.01);
        assert!((size.y - 800.0 * 690.0 / 4144.0).abs() < 0.01);
    }

    #[test]
    fn test_surface_rect_centered_at_default() {
        let view = SurfaceView::new();
        let rect = view.surface_rect(viewport(), Vec2::new(400.0, 300.0));
        assert!((rect.center().x - 400.0).abs() < 0.01);
        assert!((rect.center().y - 300.0).abs() < 0.01);
        assert!((rect.width() - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut view = SurfaceView::new();
        let base = Vec2::new(400.0, 300.0);
        let cursor = Pos2::new(500.0, 350.0);

        let before = view.surface_rect(viewport(), base);
        let uv_before = view.screen_to_surface(cursor, before).unwrap();

        view.zoom_around_point(2.0, cursor, viewport().center());
        let after = view.surface_rect(viewport(), base);
        let uv_after = view.screen_to_surface(cursor, after).unwrap();

        assert!((uv_before.0 - uv_after.0).abs() < 1e-4);
        assert!((uv_before.1 - uv_after.1).abs() < 1e-4);
        assert!((view.zoom - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = SurfaceView::new();
        view.zoom_around_point(1e6, Pos2::ZERO, Pos2::ZERO);
        assert_eq!(view.zoom, MAX_ZOOM);
        view.zoom_around_point(1e-9, Pos2::ZERO, Pos2::ZERO);
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_screen_to_surface_flips_vertical() {
        let view = SurfaceView::new();
        let surface = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0));

        let (u, v) = view.screen_to_surface(Pos2::new(100.0, 100.0), surface).unwrap();
        assert_eq!((u, v), (0.0, 1.0));

        let (u, v) = view.screen_to_surface(Pos2::new(300.0, 200.0), surface).unwrap();
        assert_eq!((u, v), (1.0, 0.0));

        assert!(view.screen_to_surface(Pos2::new(99.0, 150.0), surface).is_none());
    }

    #[test]
    fn test_hover_round_trip_through_pick() {
        // Cell center on screen -> (u, v) -> same cell
        let view = SurfaceView::new();
        let surface = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(300.0, 120.0));
        let size = (30u32, 12u32);
        for &(x, y) in &[(0u32, 0u32), (29, 11), (7, 3), (15, 6)] {
            let screen = view.cell_center_to_screen((x, y), surface, size);
            let (u, v) = view.screen_to_surface(screen, surface).unwrap();
            let loc = locate(u, v, size.0, size.1).unwrap();
            assert_eq!((loc.x, loc.y), (x, y));
        }
    }

    #[test]
    fn test_reset_and_default() {
        let mut view = SurfaceView::new();
        assert!(view.is_default());
        view.pan_by(Vec2::new(10.0, 0.0));
        assert!(!view.is_default());
        view.reset();
        assert!(view.is_default());
    }
}
