// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport-edge noise suppression.
//!
//! Sub-pixel layout jitter makes samples taken while an element's top or
//! bottom sits right on a viewport boundary flip between "in" and "out".
//! [`near_viewport_edge`] flags those samples so the state machine can skip
//! them entirely.

use kurbo::Rect;

/// Returns `true` if the top of `bounds` is within `tolerance` pixels of the
/// viewport's top edge, or its bottom is within `tolerance` pixels of the
/// viewport's bottom edge.
#[must_use]
pub fn near_viewport_edge(bounds: Rect, viewport_height: f64, tolerance: f64) -> bool {
    let b = bounds.abs();
    (b.y0 - 0.0).abs() <= tolerance || (b.y1 - viewport_height).abs() <= tolerance
}

/// Like [`near_viewport_edge`], but treats missing geometry as trustworthy.
///
/// A host that cannot measure the element has nothing to be noisy about;
/// the metric already reports a zero ratio for it.
#[must_use]
pub fn near_edge_opt(bounds: Option<Rect>, viewport_height: f64, tolerance: f64) -> bool {
    bounds.is_some_and(|b| near_viewport_edge(b, viewport_height, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VH: f64 = 800.0;

    #[test]
    fn top_edge_within_tolerance() {
        assert!(
            near_viewport_edge(Rect::new(0.0, 4.0, 10.0, 300.0), VH, 6.0),
            "4px below the top"
        );
        assert!(
            near_viewport_edge(Rect::new(0.0, -5.5, 10.0, 300.0), VH, 6.0),
            "just above the top"
        );
    }

    #[test]
    fn bottom_edge_within_tolerance() {
        assert!(
            near_viewport_edge(Rect::new(0.0, 500.0, 10.0, 797.0), VH, 6.0),
            "bottom 3px above the fold"
        );
        assert!(
            near_viewport_edge(Rect::new(0.0, 500.0, 10.0, 806.0), VH, 6.0),
            "bottom exactly at tolerance"
        );
    }

    #[test]
    fn interior_is_trusted() {
        assert!(
            !near_viewport_edge(Rect::new(0.0, 100.0, 10.0, 400.0), VH, 6.0),
            "well inside"
        );
        assert!(
            !near_viewport_edge(Rect::new(0.0, 7.0, 10.0, 400.0), VH, 6.0),
            "7px is outside a 6px tolerance"
        );
    }

    #[test]
    fn missing_geometry_is_not_an_edge() {
        assert!(!near_edge_opt(None, VH, 6.0), "no bounds");
    }
}
