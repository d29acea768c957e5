// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the reveal controller.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! registry and startup gate emit. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink` plus the host time the
//! current callback is running at. When the `trace` feature is **off**, every
//! `Tracer` emit method compiles to nothing. When **on**, each method performs
//! a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::element::ElementId;
use crate::gate::GateSignal;
use crate::machine::{ConfirmOutcome, Observation};
use crate::registry::Mode;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle changes the registry applies to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegistryAction {
    /// Added to the registry and handed to the viewport watcher.
    Registered,
    /// Revealed immediately without observation (bypass mode).
    Revealed,
    /// Removed from the DOM; pending work cancelled and slot freed.
    Removed,
    /// Reset to hidden because its disclosure widget opened.
    ResetForOpen,
    /// Reset and unobserved because its disclosure widget closed.
    ResetForClose,
    /// Observed again after the post-open frame wait.
    Reobserved,
    /// An operation referred to a handle that is no longer live.
    StaleHandle,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every intersection sample fed to the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleEvent {
    /// Host time of the callback.
    pub at: HostTime,
    /// The sampled element.
    pub element: ElementId,
    /// Visible-area ratio of the sample.
    pub ratio: f64,
    /// What the state machine decided.
    pub outcome: Observation,
}

/// Emitted when a confirmation fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfirmEvent {
    /// Host time of the callback.
    pub at: HostTime,
    /// The element being confirmed.
    pub element: ElementId,
    /// Generation carried by the confirmation.
    pub generation: u32,
    /// Latest sampled ratio at confirmation time.
    pub ratio: f64,
    /// How the confirmation resolved.
    pub outcome: ConfirmOutcome,
}

/// Emitted when the registry changes an element's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryEvent {
    /// Host time of the callback.
    pub at: HostTime,
    /// The element concerned.
    pub element: ElementId,
    /// What happened.
    pub action: RegistryAction,
}

/// Emitted once when the registry initializes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeEvent {
    /// Host time of the callback.
    pub at: HostTime,
    /// The mode the registry runs in for the rest of the session.
    pub mode: Mode,
    /// Number of candidates found by the initial scan.
    pub candidates: usize,
}

/// Emitted for every signal the startup gate receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateEvent {
    /// Host time of the callback.
    pub at: HostTime,
    /// The signal.
    pub signal: GateSignal,
    /// Whether this signal opened the gate (only the first one does).
    pub accepted: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the reveal controller.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for every intersection sample.
    fn on_sample(&mut self, e: &SampleEvent) {
        _ = e;
    }

    /// Called when a confirmation fires.
    fn on_confirm(&mut self, e: &ConfirmEvent) {
        _ = e;
    }

    /// Called on element lifecycle changes.
    fn on_registry(&mut self, e: &RegistryEvent) {
        _ = e;
    }

    /// Called once when the registry picks its mode.
    fn on_mode(&mut self, e: &ModeEvent) {
        _ = e;
    }

    /// Called for every startup gate signal.
    fn on_gate(&mut self, e: &GateEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`] and the current host time.
///
/// When the `trace` feature is **off**, every emit method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    now: HostTime,
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self {
                now: HostTime::default(),
                sink: Some(sink),
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self::none()
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            now: HostTime::default(),
            #[cfg(feature = "trace")]
            sink: None,
            #[cfg(not(feature = "trace"))]
            _marker: core::marker::PhantomData,
        }
    }

    /// Stamps subsequent events with `now`.
    #[inline]
    #[must_use]
    pub fn at(mut self, now: HostTime) -> Self {
        self.now = now;
        self
    }

    /// Host time events are stamped with.
    #[inline]
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// Emits a [`SampleEvent`].
    #[inline]
    pub fn sample(&mut self, e: &SampleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sample(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ConfirmEvent`].
    #[inline]
    pub fn confirm(&mut self, e: &ConfirmEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_confirm(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RegistryEvent`].
    #[inline]
    pub fn registry(&mut self, e: &RegistryEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_registry(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ModeEvent`].
    #[inline]
    pub fn mode(&mut self, e: &ModeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_mode(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GateEvent`].
    #[inline]
    pub fn gate(&mut self, e: &GateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_gate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Shorthand for a [`RegistryEvent`] stamped with the current time.
    #[inline]
    pub(crate) fn lifecycle(&mut self, element: ElementId, action: RegistryAction) {
        let e = RegistryEvent {
            at: self.now,
            element,
            action,
        };
        self.registry(&e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementStore;

    #[test]
    fn noop_sink_accepts_everything() {
        let mut store = ElementStore::new();
        let element = store.insert(false);
        let mut sink = NoopSink;
        sink.on_sample(&SampleEvent {
            at: HostTime(1),
            element,
            ratio: 0.5,
            outcome: Observation::Unchanged,
        });
        sink.on_gate(&GateEvent {
            at: HostTime(2),
            signal: GateSignal::TimedOut,
            accepted: true,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none().at(HostTime(10));
        assert_eq!(tracer.now(), HostTime(10), "timestamp kept");
        tracer.gate(&GateEvent {
            at: tracer.now(),
            signal: GateSignal::Manual,
            accepted: false,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            actions: Vec<RegistryAction>,
        }
        impl TraceSink for RecordingSink {
            fn on_registry(&mut self, e: &RegistryEvent) {
                self.actions.push(e.action);
            }
        }

        let mut store = ElementStore::new();
        let element = store.insert(false);
        let mut sink = RecordingSink {
            actions: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink).at(HostTime(5));
        tracer.lifecycle(element, RegistryAction::Registered);
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.actions, &[RegistryAction::Registered], "dispatched");
    }
}
