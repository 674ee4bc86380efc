use serde::{Deserialize, Serialize};
use sitetree_core::{Vec2, Viewport};
use sitetree_graph::Rect;

/// A viewport maps scene coordinates to screen coordinates as
/// `screen = scene * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Screen-space margin kept around fitted content.
    pub fit_padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_padding: 40.0,
            min_zoom: 0.1,
            max_zoom: 4.0,
        }
    }
}

impl ViewportConfig {
    /// Clamp into the configured range. An inverted range is treated as
    /// its swap and NaN bounds are ignored, so this never panics.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        let low = self.min_zoom.min(self.max_zoom);
        let high = self.min_zoom.max(self.max_zoom);
        zoom.max(low).min(high)
    }

    pub fn is_valid(&self) -> bool {
        self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom
    }
}

/// Tracks the live viewport of one document.
///
/// The first layout with content fits it into the screen. After that the
/// stored viewport wins, so refetches and re-layouts never move the camera.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
    current: Option<Viewport>,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Viewport to show after a layout. Fits `bounds` into `screen` only when
    /// nothing has been stored yet.
    pub fn on_layout(&mut self, bounds: Rect, screen: Vec2) -> Viewport {
        if let Some(viewport) = self.current {
            return viewport;
        }
        match self.fit(bounds, screen) {
            Some(viewport) => {
                tracing::debug!("Fitted viewport to content: {:?}", viewport);
                self.current = Some(viewport);
                viewport
            }
            None => Viewport::default(),
        }
    }

    /// Zoom and pan that center `bounds` inside `screen`. `None` for empty bounds.
    pub fn fit(&self, bounds: Rect, screen: Vec2) -> Option<Viewport> {
        if bounds.is_empty() || screen.x <= 0.0 || screen.y <= 0.0 {
            return None;
        }
        let padding = self.config.fit_padding.max(0.0);
        let available = Vec2::new(
            (screen.x - 2.0 * padding).max(1.0),
            (screen.y - 2.0 * padding).max(1.0),
        );
        let zoom = self
            .config
            .clamp_zoom((available.x / bounds.width()).min(available.y / bounds.height()));
        let center = bounds.center();
        Some(Viewport {
            x: screen.x / 2.0 - center.x * zoom,
            y: screen.y / 2.0 - center.y * zoom,
            zoom,
        })
    }

    /// Pan/zoom from the user. Kept in memory only; persisted by an explicit
    /// tab save.
    pub fn on_viewport_changed(&mut self, viewport: Viewport) {
        self.current = Some(Viewport {
            zoom: self.config.clamp_zoom(viewport.zoom),
            ..viewport
        });
    }

    pub fn saved(&self) -> Option<Viewport> {
        self.current
    }

    /// Multiply zoom by `factor` while keeping the scene point under the
    /// screen-space `anchor` fixed.
    pub fn zoom_by(&mut self, factor: f32, anchor: Vec2) -> Viewport {
        let viewport = self.current.unwrap_or_default();
        if factor <= 0.0 {
            return viewport;
        }
        let zoom = self.config.clamp_zoom(viewport.zoom * factor);
        if (zoom - viewport.zoom).abs() <= f32::EPSILON {
            return viewport;
        }
        let scene_x = (anchor.x - viewport.x) / viewport.zoom;
        let scene_y = (anchor.y - viewport.y) / viewport.zoom;
        let zoomed = Viewport {
            x: anchor.x - scene_x * zoom,
            y: anchor.y - scene_y * zoom,
            zoom,
        };
        self.current = Some(zoomed);
        zoomed
    }

    /// Seed from a tab's stored viewport.
    pub fn restore(&mut self, viewport: Option<Viewport>) {
        self.current = viewport;
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::from_pos_size(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 500.0))
    }

    const SCREEN: Vec2 = Vec2::new(1080.0, 580.0);

    #[test]
    fn test_inverted_zoom_range_does_not_panic() {
        let config = ViewportConfig {
            min_zoom: 5.0,
            max_zoom: 1.0,
            ..Default::default()
        };
        assert!(!config.is_valid());
        assert_eq!(config.clamp_zoom(10.0), 5.0);
        assert_eq!(config.clamp_zoom(0.5), 1.0);

        let mut viewport = ViewportController::new(config);
        viewport.on_viewport_changed(Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 20.0,
        });
        assert_eq!(viewport.saved().map(|v| v.zoom), Some(5.0));

        let nan = ViewportConfig {
            min_zoom: f32::NAN,
            ..Default::default()
        };
        assert_eq!(nan.clamp_zoom(9.0), nan.max_zoom);
    }

    #[test]
    fn test_first_layout_fits_content() {
        let mut viewport = ViewportController::default();
        let fitted = viewport.on_layout(bounds(), SCREEN);

        assert!((fitted.zoom - 1.0).abs() < 1e-5);
        assert!((fitted.x - 40.0).abs() < 1e-3);
        assert!((fitted.y - 40.0).abs() < 1e-3);
        assert_eq!(viewport.saved(), Some(fitted));
    }

    #[test]
    fn test_later_layouts_restore_saved_viewport() {
        let mut viewport = ViewportController::default();
        viewport.on_layout(bounds(), SCREEN);
        let moved = Viewport {
            x: 5.0,
            y: 6.0,
            zoom: 2.0,
        };
        viewport.on_viewport_changed(moved);

        let bigger = Rect::from_pos_size(Vec2::ZERO, Vec2::new(5000.0, 5000.0));
        assert_eq!(viewport.on_layout(bigger, SCREEN), moved);
    }

    #[test]
    fn test_fit_zoom_is_clamped() {
        let mut viewport = ViewportController::default();
        let tiny = Rect::from_pos_size(Vec2::ZERO, Vec2::new(1.0, 1.0));
        assert_eq!(viewport.on_layout(tiny, SCREEN).zoom, 4.0);

        viewport.reset();
        let huge = Rect::from_pos_size(Vec2::ZERO, Vec2::new(1.0e6, 1.0e6));
        assert_eq!(viewport.on_layout(huge, SCREEN).zoom, 0.1);
    }

    #[test]
    fn test_empty_bounds_do_not_consume_the_fit() {
        let mut viewport = ViewportController::default();
        assert_eq!(viewport.on_layout(Rect::default(), SCREEN), Viewport::default());
        assert_eq!(viewport.saved(), None);

        let fitted = viewport.on_layout(bounds(), SCREEN);
        assert_eq!(viewport.saved(), Some(fitted));
    }

    #[test]
    fn test_zoom_by_keeps_anchor_fixed() {
        let mut viewport = ViewportController::default();
        viewport.restore(Some(Viewport {
            x: 100.0,
            y: 50.0,
            zoom: 1.0,
        }));
        let anchor = Vec2::new(300.0, 250.0);
        let scene_before = ((anchor.x - 100.0) / 1.0, (anchor.y - 50.0) / 1.0);

        let zoomed = viewport.zoom_by(2.0, anchor);
        assert_eq!(zoomed.zoom, 2.0);
        let scene_after = (
            (anchor.x - zoomed.x) / zoomed.zoom,
            (anchor.y - zoomed.y) / zoomed.zoom,
        );
        assert!((scene_before.0 - scene_after.0).abs() < 1e-3);
        assert!((scene_before.1 - scene_after.1).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_by_ignores_non_positive_factor() {
        let mut viewport = ViewportController::default();
        assert_eq!(viewport.zoom_by(0.0, Vec2::ZERO), Viewport::default());
        assert_eq!(viewport.saved(), None);
    }

    #[test]
    fn test_reset_forgets_viewport() {
        let mut viewport = ViewportController::default();
        viewport.on_viewport_changed(Viewport {
            x: 1.0,
            y: 1.0,
            zoom: 99.0,
        });
        assert_eq!(viewport.saved().map(|v| v.zoom), Some(4.0));
        viewport.reset();
        assert_eq!(viewport.saved(), None);
    }
}
