// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event, in
//! arrival order, as a [`RecordedEvent`]. Recordings feed
//! [`chrome::export`](crate::chrome::export) and test assertions.

use reveal_core::element::ElementId;
use reveal_core::machine::ConfirmOutcome;
use reveal_core::time::HostTime;
use reveal_core::trace::{
    ConfirmEvent, GateEvent, ModeEvent, RegistryEvent, SampleEvent, TraceSink,
};

/// A recorded event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`SampleEvent`].
    Sample(SampleEvent),
    /// A [`ConfirmEvent`].
    Confirm(ConfirmEvent),
    /// A [`RegistryEvent`].
    Registry(RegistryEvent),
    /// A [`ModeEvent`].
    Mode(ModeEvent),
    /// A [`GateEvent`].
    Gate(GateEvent),
}

impl RecordedEvent {
    /// Host time the event was emitted at.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::Sample(e) => e.at,
            Self::Confirm(e) => e.at,
            Self::Registry(e) => e.at,
            Self::Mode(e) => e.at,
            Self::Gate(e) => e.at,
        }
    }

    /// The element the event concerns, if any.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Sample(e) => Some(e.element),
            Self::Confirm(e) => Some(e.element),
            Self::Registry(e) => Some(e.element),
            Self::Mode(_) | Self::Gate(_) => None,
        }
    }
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Confirmation outcomes for `element`, in order.
    pub fn outcomes(&self, element: ElementId) -> impl Iterator<Item = ConfirmOutcome> + '_ {
        self.events.iter().filter_map(move |e| match e {
            RecordedEvent::Confirm(c) if c.element == element => Some(c.outcome),
            _ => None,
        })
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for RecorderSink {
    fn on_sample(&mut self, e: &SampleEvent) {
        self.events.push(RecordedEvent::Sample(*e));
    }

    fn on_confirm(&mut self, e: &ConfirmEvent) {
        self.events.push(RecordedEvent::Confirm(*e));
    }

    fn on_registry(&mut self, e: &RegistryEvent) {
        self.events.push(RecordedEvent::Registry(*e));
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        self.events.push(RecordedEvent::Mode(*e));
    }

    fn on_gate(&mut self, e: &GateEvent) {
        self.events.push(RecordedEvent::Gate(*e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use reveal_core::config::RevealConfig;
    use reveal_core::metric::{Sample, Viewport};
    use reveal_core::registry::{Candidate, Command, Environment, Mode, Registry};
    use reveal_core::trace::{RegistryAction, Tracer};

    /// A 200px element fully inside an 800px viewport.
    fn in_view() -> Sample {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        viewport.sample(Rect::new(0.0, 300.0, 1000.0, 500.0), 0.0)
    }

    #[test]
    fn records_in_arrival_order() {
        let mut rec = RecorderSink::new();
        let mut reg = Registry::new(RevealConfig::default());
        let env = Environment {
            reduced_motion: false,
            intersection_supported: true,
        };
        let ids = {
            let mut tracer = Tracer::new(&mut rec).at(HostTime(10));
            reg.initialize(env, &[Candidate::default(), Candidate { cascade: true }], &mut tracer)
                .unwrap()
        };

        let events = rec.events();
        assert_eq!(events.len(), 3, "mode plus two registrations");
        assert!(
            matches!(events[0], RecordedEvent::Mode(m) if m.mode == Mode::Observing && m.candidates == 2),
            "mode first: {:?}",
            events[0]
        );
        for (event, id) in events[1..].iter().zip(&ids) {
            assert!(
                matches!(event, RecordedEvent::Registry(r) if r.action == RegistryAction::Registered),
                "registration: {event:?}"
            );
            assert_eq!(event.element(), Some(*id), "element");
            assert_eq!(event.at(), HostTime(10), "timestamp");
        }
    }

    #[test]
    fn outcomes_filter_by_element() {
        let mut rec = RecorderSink::new();
        let config = RevealConfig::default();
        let mut reg = Registry::new(config);
        let env = Environment {
            reduced_motion: false,
            intersection_supported: true,
        };
        let ids = reg
            .initialize(env, &[Candidate::default(), Candidate::default()], &mut Tracer::none())
            .unwrap();
        let _ = reg.flush();

        let start = HostTime(0);
        {
            let mut tracer = Tracer::new(&mut rec).at(start);
            reg.sample(ids[0], &in_view(), &mut tracer);
            reg.sample(ids[1], &in_view(), &mut tracer);
        }
        let tickets: Vec<_> = reg
            .flush()
            .iter()
            .filter_map(|c| match *c {
                Command::ScheduleConfirm { ticket, .. } => Some(ticket),
                _ => None,
            })
            .collect();
        assert_eq!(tickets.len(), 2, "one confirmation per element");
        {
            let later = HostTime(start.ticks() + config.stable.ticks());
            let mut tracer = Tracer::new(&mut rec).at(later);
            reg.confirm(tickets[0], None, 800.0, &mut tracer);
        }

        let first: Vec<_> = rec.outcomes(ids[0]).collect();
        assert_eq!(first, [ConfirmOutcome::Shown], "first element shown");
        assert_eq!(rec.outcomes(ids[1]).count(), 0, "second never confirmed");

        rec.clear();
        assert!(rec.events().is_empty(), "cleared");
    }
}
