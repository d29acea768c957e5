// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup gate.
//!
//! Reveal work must not start while the page loader still covers the page.
//! The host arms three triggers when the document is ready (the loader's
//! finish event, the window `load` event, and a
//! [`loader_timeout`](crate::config::RevealConfig::loader_timeout) timer) and
//! forwards whichever fires to [`StartupGate::signal`]. The first signal opens
//! the gate and returns the settle delay; after that delay the host calls
//! [`StartupGate::settled`], which answers `true` exactly once. That is the
//! moment to run [`Registry::initialize`](crate::registry::Registry::initialize).
//!
//! ```text
//!   Armed ──signal()──► Open ──settled()──► Settled
//!     │                  │ signal() → None    │ settled() → false
//! ```

use crate::config::RevealConfig;
use crate::time::Duration;
use crate::trace::{GateEvent, Tracer};

/// What opened the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateSignal {
    /// The page loader reported that it finished, or was already gone.
    LoaderFinished,
    /// The window finished loading.
    WindowLoaded,
    /// Neither arrived within the loader timeout.
    TimedOut,
    /// Application code asked to start now.
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Armed,
    Open(GateSignal),
    Settled(GateSignal),
}

/// Fire-once gate in front of registry initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartupGate {
    settle: Duration,
    timeout: Duration,
    phase: Phase,
}

impl StartupGate {
    /// Creates an armed gate using the settle delay and loader timeout from
    /// `config`.
    #[must_use]
    pub const fn new(config: &RevealConfig) -> Self {
        Self {
            settle: config.settle,
            timeout: config.loader_timeout,
            phase: Phase::Armed,
        }
    }

    /// How long the host waits for the loader before signalling
    /// [`GateSignal::TimedOut`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delivers a trigger.
    ///
    /// The first call returns the settle delay to wait before calling
    /// [`settled`](Self::settled). Every later call returns `None`.
    pub fn signal(&mut self, signal: GateSignal, tracer: &mut Tracer<'_>) -> Option<Duration> {
        let accepted = self.phase == Phase::Armed;
        if accepted {
            self.phase = Phase::Open(signal);
        }
        tracer.gate(&GateEvent {
            at: tracer.now(),
            signal,
            accepted,
        });
        accepted.then_some(self.settle)
    }

    /// Called when the settle delay has elapsed.
    ///
    /// Returns `true` exactly once, on the first call after the gate opened.
    pub fn settled(&mut self) -> bool {
        match self.phase {
            Phase::Open(signal) => {
                self.phase = Phase::Settled(signal);
                true
            }
            Phase::Armed | Phase::Settled(_) => false,
        }
    }

    /// Whether a trigger has been accepted.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.phase, Phase::Armed)
    }

    /// The trigger that opened the gate, if any.
    #[must_use]
    pub const fn opened_by(&self) -> Option<GateSignal> {
        match self.phase {
            Phase::Armed => None,
            Phase::Open(s) | Phase::Settled(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Candidate, Environment, Registry};
    use crate::time::HostTime;
    use alloc::vec::Vec;

    #[test]
    fn first_signal_wins() {
        let cfg = RevealConfig::web();
        let mut gate = StartupGate::new(&cfg);
        assert!(!gate.is_open(), "armed");
        assert_eq!(
            gate.signal(GateSignal::LoaderFinished, &mut Tracer::none()),
            Some(cfg.settle),
            "first signal opens"
        );
        assert_eq!(
            gate.signal(GateSignal::WindowLoaded, &mut Tracer::none()),
            None,
            "second signal ignored"
        );
        assert_eq!(gate.opened_by(), Some(GateSignal::LoaderFinished), "winner kept");
    }

    #[test]
    fn settled_fires_once_and_only_after_open() {
        let mut gate = StartupGate::new(&RevealConfig::web());
        assert!(!gate.settled(), "not open yet");
        gate.signal(GateSignal::Manual, &mut Tracer::none());
        assert!(gate.settled(), "first settle");
        assert!(!gate.settled(), "second settle refused");
        assert_eq!(gate.opened_by(), Some(GateSignal::Manual), "still reports trigger");
    }

    #[test]
    fn timeout_alone_initializes_exactly_once() {
        let cfg = RevealConfig::web();
        let mut gate = StartupGate::new(&cfg);
        let mut registry = Registry::new(cfg);
        let env = Environment {
            reduced_motion: false,
            intersection_supported: true,
        };

        // Virtual timer queue: (due, what). The loader never reports.
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Timer {
            LoaderTimeout,
            Settle,
        }
        let mut timers = Vec::from([(HostTime(0) + gate.timeout(), Timer::LoaderTimeout)]);
        let mut inits = 0;
        while let Some((due, timer)) = timers.pop() {
            let mut tracer = Tracer::none().at(due);
            match timer {
                Timer::LoaderTimeout => {
                    if let Some(settle) = gate.signal(GateSignal::TimedOut, &mut tracer) {
                        timers.push((due + settle, Timer::Settle));
                    }
                    // A late manual retrigger changes nothing.
                    assert_eq!(gate.signal(GateSignal::Manual, &mut tracer), None, "retrigger");
                }
                Timer::Settle => {
                    if gate.settled() {
                        let first = registry.initialize(env, &[Candidate::default()], &mut tracer);
                        inits += usize::from(first.is_some());
                    }
                    assert!(!gate.settled(), "settles once");
                    let again = registry.initialize(env, &[Candidate::default()], &mut tracer);
                    assert!(again.is_none(), "initialize is idempotent");
                }
            }
        }
        assert_eq!(inits, 1, "initialized exactly once");
        assert_eq!(registry.len(), 1, "one candidate registered");
        assert_eq!(gate.opened_by(), Some(GateSignal::TimedOut), "timeout opened the gate");
    }
}
