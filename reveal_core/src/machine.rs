// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element visibility state machine.
//!
//! [`VisibilityState`] turns a stream of intersection [`Sample`]s into stable
//! show/hide decisions:
//!
//! - **Hysteresis**: a hidden element must reach
//!   [`enter_ratio`](RevealConfig::enter_ratio) to request becoming visible; a
//!   visible element must drop to [`exit_ratio`](RevealConfig::exit_ratio) to
//!   request becoming hidden.
//! - **Edge guard**: samples taken while the element sits on a viewport
//!   boundary are ignored outright.
//! - **Debounce**: a request only takes effect if it still holds when its
//!   confirmation fires [`stable`](RevealConfig::stable) later.
//!
//! ```text
//!            ratio ≥ enter          confirm ok
//!   Hidden ───────────────► Hidden+pending(show) ───────────► Visible
//!     ▲                         │ ratio < enter / edge / stale      │
//!     │                         ▼                                   │
//!     │                      Hidden                                 │ ratio ≤ exit
//!     │        confirm ok                                           ▼
//!     └─────────────────── Visible+pending(hide) ◄──────────────────┘
//! ```
//!
//! The machine never touches timers. [`VisibilityState::observe`] says when a
//! confirmation must be scheduled, tagged with a per-element generation;
//! [`VisibilityState::confirm`] ignores any confirmation whose generation is no
//! longer current, so a late timer from a superseded request is harmless even
//! if the host failed to cancel it.

use kurbo::Rect;

use crate::config::RevealConfig;
use crate::edge::near_edge_opt;
use crate::element::ElementId;
use crate::metric::Sample;

/// Identifies one scheduled confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConfirmTicket {
    /// The element the confirmation belongs to.
    pub element: ElementId,
    /// Request generation captured when the confirmation was scheduled.
    pub generation: u32,
}

/// A state change awaiting confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    visible: bool,
    generation: u32,
}

/// What [`VisibilityState::observe`] decided for one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// The sample was taken at a viewport edge and ignored; no pending
    /// request was scheduled or cancelled.
    EdgeSuppressed,
    /// The sample agrees with the confirmed state or the pending request.
    Unchanged,
    /// The sample agrees with the confirmed state again, so the opposite
    /// pending request was withdrawn. Its confirmation must be cancelled.
    Withdrawn {
        /// Generation of the withdrawn request.
        generation: u32,
    },
    /// A new request was recorded; a confirmation must be scheduled.
    Schedule {
        /// The requested state.
        visible: bool,
        /// Generation to hand back to [`VisibilityState::confirm`].
        generation: u32,
    },
}

/// Result of a confirmation firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The confirmation was superseded or nothing was pending.
    Stale,
    /// The element is now at a viewport edge; the request was dropped.
    EdgeAbort,
    /// The latest sample no longer supports the request; it was dropped.
    RolledBack,
    /// The element is now confirmed visible.
    Shown,
    /// The element is now confirmed hidden.
    Hidden {
        /// Whether the element was entirely out of view (ratio exactly zero).
        /// Only then is the cascade stagger cleared.
        fully_out: bool,
    },
}

/// Hysteresis and debounce state for one observed element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityState {
    visible: bool,
    pending: Option<Pending>,
    generation: u32,
    last_ratio: f64,
    last_intersecting: bool,
    last_overflowing: bool,
}

impl Default for VisibilityState {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityState {
    /// Creates a confirmed-hidden state with nothing pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            visible: false,
            pending: None,
            generation: 0,
            last_ratio: 0.0,
            last_intersecting: false,
            last_overflowing: false,
        }
    }

    /// The last confirmed state.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// The state awaiting confirmation, if any.
    #[must_use]
    pub fn pending_request(&self) -> Option<bool> {
        self.pending.map(|p| p.visible)
    }

    /// Generation of the pending request, if any.
    #[must_use]
    pub fn pending_generation(&self) -> Option<u32> {
        self.pending.map(|p| p.generation)
    }

    /// The most recent sampled ratio.
    #[must_use]
    pub const fn last_ratio(&self) -> f64 {
        self.last_ratio
    }

    /// Feeds one intersection sample.
    pub fn observe(&mut self, sample: &Sample, config: &RevealConfig) -> Observation {
        self.last_ratio = sample.ratio();
        self.last_intersecting = sample.intersecting;
        self.last_overflowing = sample.overflows_viewport();

        if near_edge_opt(sample.bounds, sample.viewport_height, config.edge_px) {
            return Observation::EdgeSuppressed;
        }

        let want = self.wants_visible(config);
        match self.pending {
            Some(p) if p.visible == want => Observation::Unchanged,
            // A pending request always differs from the confirmed state, so a
            // sample that disagrees with it agrees with the confirmed state.
            Some(p) => {
                self.pending = None;
                self.generation = self.generation.wrapping_add(1);
                Observation::Withdrawn {
                    generation: p.generation,
                }
            }
            None if want == self.visible => Observation::Unchanged,
            None => {
                self.generation = self.generation.wrapping_add(1);
                self.pending = Some(Pending {
                    visible: want,
                    generation: self.generation,
                });
                Observation::Schedule {
                    visible: want,
                    generation: self.generation,
                }
            }
        }
    }

    /// Handles a confirmation firing.
    ///
    /// `bounds` and `viewport_height` describe the element's geometry *now*,
    /// which may differ from the last sample if it moved during the window.
    pub fn confirm(
        &mut self,
        generation: u32,
        bounds: Option<Rect>,
        viewport_height: f64,
        config: &RevealConfig,
    ) -> ConfirmOutcome {
        let Some(pending) = self.pending.filter(|p| p.generation == generation) else {
            return ConfirmOutcome::Stale;
        };
        self.pending = None;

        if near_edge_opt(bounds, viewport_height, config.edge_px) {
            return ConfirmOutcome::EdgeAbort;
        }
        if self.wants_visible(config) != pending.visible {
            return ConfirmOutcome::RolledBack;
        }

        self.visible = pending.visible;
        if self.visible {
            ConfirmOutcome::Shown
        } else {
            ConfirmOutcome::Hidden {
                fully_out: self.last_ratio <= 0.0,
            }
        }
    }

    /// Marks the state confirmed-visible without observation.
    ///
    /// Used when the controller runs without a viewport watcher and shows
    /// everything up front.
    pub fn force_visible(&mut self) {
        self.visible = true;
        self.pending = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Forces the state back to confirmed-hidden with nothing pending.
    ///
    /// Returns the generation of a request that was pending, whose
    /// confirmation the caller must cancel.
    pub fn reset(&mut self) -> Option<u32> {
        let cancelled = self.pending_generation();
        self.visible = false;
        self.pending = None;
        self.generation = self.generation.wrapping_add(1);
        self.last_ratio = 0.0;
        self.last_intersecting = false;
        self.last_overflowing = false;
        cancelled
    }

    /// Applies the hysteresis thresholds to the latest sample.
    ///
    /// Elements taller than the viewport can never reach a large area ratio,
    /// so for them any on-screen intersection counts as entering and only a
    /// complete exit counts as leaving.
    fn wants_visible(&self, config: &RevealConfig) -> bool {
        let ratio = self.last_ratio;
        if self.visible {
            let leaving = if self.last_overflowing {
                ratio <= 0.0 || !self.last_intersecting
            } else {
                ratio <= config.exit_ratio
            };
            !leaving
        } else {
            ratio >= config.enter_ratio
                || (self.last_overflowing && self.last_intersecting && ratio > 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Viewport;

    const VP: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    fn cfg() -> RevealConfig {
        RevealConfig {
            root_margin_bottom: 0.0,
            ..RevealConfig::web()
        }
    }

    /// A 200px-tall, full-width element whose top is at `top`.
    fn sample_at(top: f64) -> Sample {
        VP.sample(Rect::new(0.0, top, 1000.0, top + 200.0), 0.0)
    }

    /// Sample with exactly `ratio` of a 200px element visible at the bottom,
    /// kept well away from the edge tolerance.
    fn sample_ratio(ratio: f64) -> Sample {
        sample_at(800.0 - 200.0 * ratio)
    }

    fn current(top: f64) -> Option<Rect> {
        Some(Rect::new(0.0, top, 1000.0, top + 200.0))
    }

    #[test]
    fn enter_requires_enter_ratio() {
        let mut s = VisibilityState::new();
        assert_eq!(s.observe(&sample_ratio(0.25), &cfg()), Observation::Unchanged, "below enter");
        assert_eq!(
            s.observe(&sample_ratio(0.5), &cfg()),
            Observation::Schedule {
                visible: true,
                generation: 1
            },
            "crossing enter schedules"
        );
        assert_eq!(s.pending_request(), Some(true), "pending show");
        assert!(!s.is_visible(), "not yet confirmed");
    }

    #[test]
    fn confirm_commits_when_still_valid() {
        let mut s = VisibilityState::new();
        let Observation::Schedule { generation, .. } = s.observe(&sample_ratio(0.5), &cfg()) else {
            panic!("expected schedule");
        };
        assert_eq!(
            s.confirm(generation, current(700.0), 800.0, &cfg()),
            ConfirmOutcome::Shown,
            "commit"
        );
        assert!(s.is_visible(), "confirmed visible");
        assert_eq!(s.pending_request(), None, "nothing pending");
    }

    #[test]
    fn repeated_samples_do_not_reschedule() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        assert_eq!(s.observe(&sample_ratio(0.75), &cfg()), Observation::Unchanged, "same request");
        assert_eq!(s.pending_generation(), Some(1), "generation unchanged");
    }

    #[test]
    fn hysteresis_band_keeps_visible() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        s.confirm(1, current(700.0), 800.0, &cfg());
        // 0.2 is below enter but above exit: a visible element stays.
        assert_eq!(s.observe(&sample_ratio(0.2), &cfg()), Observation::Unchanged, "inside band");
        assert_eq!(
            s.observe(&sample_ratio(0.05), &cfg()),
            Observation::Schedule {
                visible: false,
                generation: 2
            },
            "below exit schedules hide"
        );
    }

    #[test]
    fn blip_is_absorbed_by_debounce() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        s.confirm(1, current(700.0), 800.0, &cfg());

        let Observation::Schedule { generation, .. } = s.observe(&sample_ratio(0.05), &cfg()) else {
            panic!("expected hide request");
        };
        assert_eq!(
            s.observe(&sample_ratio(0.5), &cfg()),
            Observation::Withdrawn { generation },
            "back in view withdraws"
        );
        assert_eq!(
            s.confirm(generation, current(700.0), 800.0, &cfg()),
            ConfirmOutcome::Stale,
            "late timer is stale"
        );
        assert!(s.is_visible(), "never hidden");
    }

    #[test]
    fn edge_samples_mutate_nothing() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        let before = (s.is_visible(), s.pending_request(), s.pending_generation());

        // Bottom edge 3px above the fold.
        let edge = VP.sample(Rect::new(0.0, 0.0, 1000.0, 797.0), 0.0);
        assert_eq!(s.observe(&edge, &cfg()), Observation::EdgeSuppressed, "suppressed");
        assert_eq!(
            (s.is_visible(), s.pending_request(), s.pending_generation()),
            before,
            "state untouched"
        );
    }

    #[test]
    fn confirm_aborts_at_edge() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        assert_eq!(
            s.confirm(1, current(2.0), 800.0, &cfg()),
            ConfirmOutcome::EdgeAbort,
            "moved onto the top edge"
        );
        assert!(!s.is_visible(), "rolled back to hidden");
        assert_eq!(s.pending_request(), None, "request dropped");
    }

    #[test]
    fn confirm_revalidates_latest_ratio() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        s.confirm(1, current(700.0), 800.0, &cfg());
        let Observation::Schedule { generation, .. } = s.observe(&sample_ratio(0.05), &cfg()) else {
            panic!("expected hide request");
        };
        // An edge sample is ignored for scheduling but still records its
        // ratio, which no longer supports hiding.
        let edge = VP.sample(Rect::new(0.0, 0.0, 1000.0, 200.0), 0.0);
        assert_eq!(s.observe(&edge, &cfg()), Observation::EdgeSuppressed, "suppressed");
        assert_eq!(
            s.confirm(generation, current(300.0), 800.0, &cfg()),
            ConfirmOutcome::RolledBack,
            "latest ratio says stay visible"
        );
        assert!(s.is_visible(), "visible state untouched");
        assert_eq!(s.pending_request(), None, "request dropped");
    }

    #[test]
    fn partial_exit_keeps_cascade() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        s.confirm(1, current(700.0), 800.0, &cfg());
        s.observe(&sample_ratio(0.05), &cfg());
        assert_eq!(
            s.confirm(2, current(790.0), 800.0, &cfg()),
            ConfirmOutcome::Hidden { fully_out: false },
            "partial exit"
        );

        s.observe(&sample_ratio(0.5), &cfg());
        s.confirm(3, current(700.0), 800.0, &cfg());
        s.observe(&sample_at(1200.0), &cfg());
        assert_eq!(
            s.confirm(4, current(1200.0), 800.0, &cfg()),
            ConfirmOutcome::Hidden { fully_out: true },
            "full exit"
        );
    }

    #[test]
    fn tall_elements_enter_on_any_intersection() {
        let mut s = VisibilityState::new();
        let tall = VP.sample(Rect::new(0.0, 500.0, 1000.0, 4500.0), 0.0);
        assert!(tall.ratio() < cfg().enter_ratio, "cannot reach enter ratio");
        assert!(
            matches!(
                s.observe(&tall, &cfg()),
                Observation::Schedule { visible: true, .. }
            ),
            "intersecting tall element requests show"
        );
        assert_eq!(
            s.confirm(1, Some(Rect::new(0.0, 500.0, 1000.0, 4500.0)), 800.0, &cfg()),
            ConfirmOutcome::Shown,
            "confirmed"
        );
        // Still filling part of the screen with a ratio below exit: stays
        // visible.
        let scrolled = VP.sample(Rect::new(0.0, -3700.0, 1000.0, 300.0), 0.0);
        assert!(scrolled.ratio() < cfg().exit_ratio, "below exit ratio");
        assert_eq!(s.observe(&scrolled, &cfg()), Observation::Unchanged, "stays visible");
    }

    #[test]
    fn reset_returns_pending_generation() {
        let mut s = VisibilityState::new();
        s.observe(&sample_ratio(0.5), &cfg());
        assert_eq!(s.reset(), Some(1), "pending request reported");
        assert_eq!(s.reset(), None, "nothing left");
        assert_eq!(
            s.confirm(1, current(700.0), 800.0, &cfg()),
            ConfirmOutcome::Stale,
            "old confirmation ignored after reset"
        );
    }
}
