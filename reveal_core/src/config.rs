// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for the reveal controller.
//!
//! [`RevealConfig`] collects every threshold and delay used by the metric,
//! the edge guard, the visibility state machine, the cascade stager and the
//! startup gate. Presets are `const fn`s so hosts can build them in statics.

use alloc::format;
use alloc::string::String;

use crate::time::Duration;

/// Intersection thresholds handed to the host's viewport watcher.
///
/// Coarse on purpose: the state machine works on the area ratio of each
/// sample, so a handful of callbacks per crossing is enough.
pub const DEFAULT_THRESHOLDS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Errors reported by [`RevealConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A ratio lies outside `0.0..=1.0`.
    #[error("{name} must lie in 0..=1, got {value}")]
    RatioOutOfRange {
        /// Which field was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The hysteresis band is empty or inverted.
    #[error("exit ratio {exit} must be below enter ratio {enter}")]
    InvertedHysteresis {
        /// Ratio required to become visible.
        enter: f64,
        /// Ratio required to become hidden.
        exit: f64,
    },
    /// The edge tolerance is negative or not finite.
    #[error("edge tolerance must be a finite, non-negative pixel count, got {0}")]
    BadEdgeTolerance(f64),
    /// The confirmation window is zero, which would disable debouncing.
    #[error("the confirmation window must be longer than zero")]
    ZeroStableWindow,
    /// The threshold ladder is empty or not strictly increasing.
    #[error("intersection thresholds must be non-empty and strictly increasing")]
    BadThresholds,
}

/// Configuration for the reveal controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealConfig {
    /// Minimum visible-area ratio for a hidden element to request becoming
    /// visible.
    pub enter_ratio: f64,
    /// Maximum visible-area ratio for a visible element to request becoming
    /// hidden. Must be below [`enter_ratio`](Self::enter_ratio).
    pub exit_ratio: f64,
    /// Pixel tolerance around the top and bottom viewport edges inside which
    /// samples are considered noise.
    pub edge_px: f64,
    /// Confirmation window: how long a requested state change must survive
    /// before it is committed.
    pub stable: Duration,
    /// Delay added per child index in a cascade container.
    pub stagger_step: Duration,
    /// Settle delay between the startup gate firing and initialization.
    pub settle: Duration,
    /// Absolute fallback after which the startup gate fires even if no loader
    /// signal or load event arrived.
    pub loader_timeout: Duration,
    /// Fraction of the viewport height removed from the bottom of the
    /// observation root, so elements confirm slightly before the physical
    /// edge.
    pub root_margin_bottom: f64,
    /// Threshold ladder for the host's intersection watcher.
    pub thresholds: &'static [f64],
    /// Rendering frames to yield after a disclosure widget opens before its
    /// contents are observed again.
    pub disclosure_frames: u8,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self::web()
    }
}

impl RevealConfig {
    /// Default configuration for browser pages.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            enter_ratio: 0.30,
            exit_ratio: 0.08,
            edge_px: 6.0,
            stable: Duration::from_millis(150),
            stagger_step: Duration::from_millis(80),
            settle: Duration::from_millis(50),
            loader_timeout: Duration::from_secs(8),
            root_margin_bottom: 0.20,
            thresholds: &DEFAULT_THRESHOLDS,
            disclosure_frames: 2,
        }
    }

    /// Checks the configuration for values that would break the state
    /// machine's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("enter_ratio", self.enter_ratio)?;
        check_ratio("exit_ratio", self.exit_ratio)?;
        check_ratio("root_margin_bottom", self.root_margin_bottom)?;
        if self.exit_ratio >= self.enter_ratio {
            return Err(ConfigError::InvertedHysteresis {
                enter: self.enter_ratio,
                exit: self.exit_ratio,
            });
        }
        if !self.edge_px.is_finite() || self.edge_px < 0.0 {
            return Err(ConfigError::BadEdgeTolerance(self.edge_px));
        }
        if self.stable == Duration::ZERO {
            return Err(ConfigError::ZeroStableWindow);
        }
        let ladder_ok = !self.thresholds.is_empty()
            && self.thresholds.iter().all(|t| (0.0..=1.0).contains(t))
            && self.thresholds.windows(2).all(|w| w[0] < w[1]);
        if !ladder_ok {
            return Err(ConfigError::BadThresholds);
        }
        Ok(())
    }

    /// Renders the observer root margin in CSS syntax, e.g. `0px 0px -20% 0px`.
    #[must_use]
    pub fn root_margin_css(&self) -> String {
        let pct = self.root_margin_bottom * 100.0;
        if pct == 0.0 {
            String::from("0px")
        } else {
            format!("0px 0px -{pct}% 0px")
        }
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RatioOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_preset_is_valid() {
        assert_eq!(RevealConfig::web().validate(), Ok(()), "preset must validate");
        assert_eq!(RevealConfig::default(), RevealConfig::web(), "default is web");
    }

    #[test]
    fn inverted_band_is_rejected() {
        let cfg = RevealConfig {
            exit_ratio: 0.4,
            ..RevealConfig::web()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvertedHysteresis {
                enter: 0.30,
                exit: 0.4
            }),
            "exit above enter"
        );
    }

    #[test]
    fn out_of_range_ratio_names_the_field() {
        let cfg = RevealConfig {
            enter_ratio: 1.5,
            ..RevealConfig::web()
        };
        assert!(
            matches!(
                cfg.validate(),
                Err(ConfigError::RatioOutOfRange {
                    name: "enter_ratio",
                    ..
                })
            ),
            "enter_ratio out of range"
        );
    }

    #[test]
    fn zero_window_and_bad_ladder_are_rejected() {
        let cfg = RevealConfig {
            stable: Duration::ZERO,
            ..RevealConfig::web()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroStableWindow), "zero window");

        let cfg = RevealConfig {
            thresholds: &[0.5, 0.25],
            ..RevealConfig::web()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::BadThresholds), "unsorted ladder");
    }

    #[test]
    fn root_margin_renders_as_css() {
        assert_eq!(RevealConfig::web().root_margin_css(), "0px 0px -20% 0px", "20%");
        let flush = RevealConfig {
            root_margin_bottom: 0.0,
            ..RevealConfig::web()
        };
        assert_eq!(flush.root_margin_css(), "0px", "no margin");
    }
}
