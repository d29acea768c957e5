// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Area-based visibility metric.
//!
//! The ratio is the clipped (on-screen) area over the element's full
//! bounding area. Using areas rather than a single-axis intersection ratio
//! keeps the metric stable for elements that are offset both horizontally
//! and vertically.

use kurbo::Rect;

/// One intersection sample for one element, as delivered by the host's
/// viewport watcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// The element's full bounding rectangle in viewport coordinates.
    pub bounds: Option<Rect>,
    /// The part of `bounds` inside the (margin-adjusted) observation root.
    pub clipped: Option<Rect>,
    /// Height of the physical viewport in CSS pixels.
    pub viewport_height: f64,
    /// Whether the host reports the element as intersecting the root.
    pub intersecting: bool,
}

impl Sample {
    /// Visible-area ratio of this sample; see [`visible_ratio`].
    #[must_use]
    pub fn ratio(&self) -> f64 {
        visible_ratio(self.clipped, self.bounds)
    }

    /// Whether the element is taller than the viewport, in which case it can
    /// never reach a large area ratio.
    #[must_use]
    pub fn overflows_viewport(&self) -> bool {
        self.bounds
            .is_some_and(|b| b.height().abs() > self.viewport_height && self.viewport_height > 0.0)
    }
}

/// Returns `clipped.area() / bounds.area()` clamped to `0.0..=1.0`.
///
/// Returns `0.0` if either rectangle is missing or the full area is zero.
#[must_use]
pub fn visible_ratio(clipped: Option<Rect>, bounds: Option<Rect>) -> f64 {
    let (Some(clipped), Some(bounds)) = (clipped, bounds) else {
        return 0.0;
    };
    let full = bounds.area().abs();
    if full.is_nan() || full <= 0.0 {
        return 0.0;
    }
    (clipped.area().abs() / full).clamp(0.0, 1.0)
}

/// The physical viewport of the host page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Viewport {
    /// Returns the observation root: the viewport with `bottom_margin`
    /// (a fraction of the height) removed from its bottom edge.
    #[must_use]
    pub fn root_rect(&self, bottom_margin: f64) -> Rect {
        let bottom = self.height * (1.0 - bottom_margin.clamp(0.0, 1.0));
        Rect::new(0.0, 0.0, self.width, bottom)
    }

    /// Builds the [`Sample`] a viewport watcher would deliver for an element
    /// with the given bounds.
    #[must_use]
    pub fn sample(&self, bounds: Rect, bottom_margin: f64) -> Sample {
        let clipped = clip_to_root(bounds, self.root_rect(bottom_margin));
        Sample {
            bounds: Some(bounds),
            clipped,
            viewport_height: self.height,
            intersecting: clipped.is_some(),
        }
    }
}

/// Intersects `bounds` with `root`, returning `None` when they do not touch.
///
/// Edge-adjacent rectangles yield a zero-area intersection, which is still
/// reported as intersecting, matching the browser's behavior.
#[must_use]
pub fn clip_to_root(bounds: Rect, root: Rect) -> Option<Rect> {
    let b = bounds.abs();
    let touches = b.x0 <= root.x1 && b.x1 >= root.x0 && b.y0 <= root.y1 && b.y1 >= root.y0;
    touches.then(|| b.intersect(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_area_based() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let clipped = Rect::new(0.0, 0.0, 50.0, 50.0);
        let r = visible_ratio(Some(clipped), Some(bounds));
        assert!((r - 0.25).abs() < 1e-12, "quarter of the area, got {r}");
    }

    #[test]
    fn ratio_missing_or_degenerate_is_zero() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(visible_ratio(None, Some(bounds)), 0.0, "no clip");
        assert_eq!(visible_ratio(Some(bounds), None), 0.0, "no bounds");
        let flat = Rect::new(0.0, 10.0, 100.0, 10.0);
        assert_eq!(visible_ratio(Some(flat), Some(flat)), 0.0, "zero area");
    }

    #[test]
    fn ratio_is_clamped() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let bigger = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert_eq!(visible_ratio(Some(bigger), Some(bounds)), 1.0, "clamped to one");
    }

    #[test]
    fn root_rect_shrinks_bottom() {
        let vp = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        assert_eq!(vp.root_rect(0.2), Rect::new(0.0, 0.0, 1000.0, 640.0), "20% margin");
    }

    #[test]
    fn viewport_sample_clips_to_root() {
        let vp = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        // Element straddles the margin-adjusted bottom (640): half of it is in.
        let s = vp.sample(Rect::new(0.0, 540.0, 1000.0, 740.0), 0.2);
        assert!(s.intersecting, "straddling element intersects");
        assert!((s.ratio() - 0.5).abs() < 1e-12, "half visible, got {}", s.ratio());

        let below = vp.sample(Rect::new(0.0, 900.0, 1000.0, 1000.0), 0.2);
        assert!(!below.intersecting, "below the fold");
        assert_eq!(below.ratio(), 0.0, "nothing visible");
    }

    #[test]
    fn tall_elements_overflow() {
        let vp = Viewport {
            width: 100.0,
            height: 500.0,
        };
        assert!(
            vp.sample(Rect::new(0.0, 0.0, 100.0, 2000.0), 0.0)
                .overflows_viewport(),
            "taller than viewport"
        );
        assert!(
            !vp.sample(Rect::new(0.0, 0.0, 100.0, 200.0), 0.0)
                .overflows_viewport(),
            "fits"
        );
    }
}
