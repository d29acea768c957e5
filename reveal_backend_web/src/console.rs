// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser console trace sink.

use alloc::format;
use alloc::string::String;

use reveal_core::machine::{ConfirmOutcome, Observation};
use reveal_core::trace::{
    ConfirmEvent, GateEvent, ModeEvent, RegistryEvent, SampleEvent, TraceSink,
};

/// A [`TraceSink`] that writes one `[reveal]`-prefixed line per event to the
/// browser console.
///
/// Samples that change nothing are skipped; scrolling produces a lot of them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn log(line: &str) {
        web_sys::console::log_1(&line.into());
    }
}

impl TraceSink for ConsoleSink {
    fn on_sample(&mut self, e: &SampleEvent) {
        if let Some(line) = sample_line(e) {
            Self::log(&line);
        }
    }

    fn on_confirm(&mut self, e: &ConfirmEvent) {
        Self::log(&confirm_line(e));
    }

    fn on_registry(&mut self, e: &RegistryEvent) {
        Self::log(&format!("[reveal] {:?} {:?}", e.element, e.action));
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        Self::log(&format!(
            "[reveal] mode {:?}, {} candidates",
            e.mode, e.candidates
        ));
    }

    fn on_gate(&mut self, e: &GateEvent) {
        let verdict = if e.accepted { "start" } else { "ignored" };
        Self::log(&format!("[reveal] gate {:?} -> {verdict}", e.signal));
    }
}

pub(crate) fn sample_line(e: &SampleEvent) -> Option<String> {
    let what = match e.outcome {
        Observation::Unchanged => return None,
        Observation::EdgeSuppressed => String::from("edge, ignored"),
        Observation::Withdrawn { generation } => format!("withdraw #{generation}"),
        Observation::Schedule {
            visible,
            generation,
        } => format!(
            "request {} #{generation}",
            if visible { "show" } else { "hide" }
        ),
    };
    Some(format!(
        "[reveal] {:?} ratio {:.2}: {what}",
        e.element, e.ratio
    ))
}

pub(crate) fn confirm_line(e: &ConfirmEvent) -> String {
    let what = match e.outcome {
        ConfirmOutcome::Stale => "stale",
        ConfirmOutcome::EdgeAbort => "aborted at edge",
        ConfirmOutcome::RolledBack => "rolled back",
        ConfirmOutcome::Shown => "shown",
        ConfirmOutcome::Hidden { fully_out: true } => "hidden, stagger cleared",
        ConfirmOutcome::Hidden { fully_out: false } => "hidden",
    };
    format!(
        "[reveal] {:?} confirm #{} ratio {:.2}: {what}",
        e.element, e.generation, e.ratio
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reveal_core::element::ElementStore;
    use reveal_core::time::HostTime;

    #[test]
    fn quiet_samples_are_skipped() {
        let element = ElementStore::new().insert(false);
        let e = SampleEvent {
            at: HostTime(0),
            element,
            ratio: 0.1,
            outcome: Observation::Unchanged,
        };
        assert_eq!(sample_line(&e), None, "unchanged sample is not logged");
    }

    #[test]
    fn lines_carry_prefix_and_outcome() {
        let element = ElementStore::new().insert(false);
        let sample = SampleEvent {
            at: HostTime(0),
            element,
            ratio: 0.5,
            outcome: Observation::Schedule {
                visible: true,
                generation: 3,
            },
        };
        assert_eq!(
            sample_line(&sample).as_deref(),
            Some("[reveal] ElementId(0@gen0) ratio 0.50: request show #3"),
            "sample line"
        );
        let confirm = ConfirmEvent {
            at: HostTime(0),
            element,
            generation: 3,
            ratio: 0.0,
            outcome: ConfirmOutcome::Hidden { fully_out: true },
        };
        assert_eq!(
            confirm_line(&confirm),
            "[reveal] ElementId(0@gen0) confirm #3 ratio 0.00: hidden, stagger cleared",
            "confirm line"
        );
    }
}
