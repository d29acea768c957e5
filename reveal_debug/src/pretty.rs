// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use reveal_core::machine::{ConfirmOutcome, Observation};
use reveal_core::time::HostTime;
use reveal_core::trace::{
    ConfirmEvent, GateEvent, ModeEvent, RegistryEvent, SampleEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    quiet_samples: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("quiet_samples", &self.quiet_samples)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            quiet_samples: true,
        }
    }

    /// Also prints samples that changed nothing. Off by default; scrolling
    /// produces a lot of them.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.quiet_samples = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.ticks() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_sample(&mut self, e: &SampleEvent) {
        let what = match e.outcome {
            Observation::Unchanged if self.quiet_samples => return,
            Observation::Unchanged => "unchanged".to_owned(),
            Observation::EdgeSuppressed => "at edge, ignored".to_owned(),
            Observation::Withdrawn { generation } => format!("withdraw #{generation}"),
            Observation::Schedule {
                visible,
                generation,
            } => format!(
                "request {} #{generation}",
                if visible { "show" } else { "hide" }
            ),
        };
        let _ = writeln!(
            self.writer,
            "[reveal] {:>9.1}ms {:?} ratio {:.2}: {what}",
            ms(e.at),
            e.element,
            e.ratio,
        );
    }

    fn on_confirm(&mut self, e: &ConfirmEvent) {
        let what = match e.outcome {
            ConfirmOutcome::Stale => "stale",
            ConfirmOutcome::EdgeAbort => "aborted at edge",
            ConfirmOutcome::RolledBack => "rolled back",
            ConfirmOutcome::Shown => "SHOWN",
            ConfirmOutcome::Hidden { fully_out: true } => "HIDDEN (stagger cleared)",
            ConfirmOutcome::Hidden { fully_out: false } => "HIDDEN",
        };
        let _ = writeln!(
            self.writer,
            "[reveal] {:>9.1}ms {:?} confirm #{} ratio {:.2}: {what}",
            ms(e.at),
            e.element,
            e.generation,
            e.ratio,
        );
    }

    fn on_registry(&mut self, e: &RegistryEvent) {
        let _ = writeln!(
            self.writer,
            "[reveal] {:>9.1}ms {:?} {:?}",
            ms(e.at),
            e.element,
            e.action,
        );
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        let _ = writeln!(
            self.writer,
            "[reveal] {:>9.1}ms init: {:?}, {} candidates",
            ms(e.at),
            e.mode,
            e.candidates,
        );
    }

    fn on_gate(&mut self, e: &GateEvent) {
        let verdict = if e.accepted { "opens gate" } else { "ignored" };
        let _ = writeln!(
            self.writer,
            "[reveal] {:>9.1}ms gate: {:?} {verdict}",
            ms(e.at),
            e.signal,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reveal_core::config::RevealConfig;
    use reveal_core::gate::GateSignal;
    use reveal_core::registry::{Candidate, Environment, Registry};
    use reveal_core::trace::Tracer;

    fn element() -> reveal_core::element::ElementId {
        let mut reg = Registry::new(RevealConfig::default());
        let env = Environment {
            reduced_motion: false,
            intersection_supported: true,
        };
        let ids = reg
            .initialize(env, &[Candidate::default()], &mut Tracer::none())
            .unwrap();
        ids[0]
    }

    #[test]
    fn schedule_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_sample(&SampleEvent {
            at: HostTime(1_500),
            element: element(),
            ratio: 0.5,
            outcome: Observation::Schedule {
                visible: true,
                generation: 2,
            },
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[reveal]"), "got: {output}");
        assert!(output.contains("1.5ms"), "got: {output}");
        assert!(output.contains("request show #2"), "got: {output}");
    }

    #[test]
    fn unchanged_samples_are_quiet_unless_verbose() {
        let event = SampleEvent {
            at: HostTime(0),
            element: element(),
            ratio: 0.9,
            outcome: Observation::Unchanged,
        };

        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_sample(&event);
        assert!(quiet.into_inner().is_empty(), "quiet by default");

        let mut verbose = PrettyPrintSink::with_writer(Vec::<u8>::new()).verbose();
        verbose.on_sample(&event);
        let output = String::from_utf8(verbose.into_inner()).unwrap();
        assert!(output.contains("unchanged"), "got: {output}");
    }

    #[test]
    fn gate_and_confirm_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_gate(&GateEvent {
            at: HostTime(3_000_000),
            signal: GateSignal::TimedOut,
            accepted: true,
        });
        sink.on_confirm(&ConfirmEvent {
            at: HostTime(3_200_000),
            element: element(),
            generation: 1,
            ratio: 0.0,
            outcome: ConfirmOutcome::Hidden { fully_out: true },
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].contains("TimedOut opens gate"), "got: {output}");
        assert!(lines[1].contains("HIDDEN (stagger cleared)"), "got: {output}");
    }
}
