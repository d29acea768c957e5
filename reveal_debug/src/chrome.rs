// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events recorded by a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each element gets its own track (`tid` = slot index + 1); gate and mode
//! events go on track 0. Confirmed visibility is drawn as a `visible` span
//! from `Shown` to the next `Hidden`.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use reveal_core::element::ElementId;
use reveal_core::machine::{ConfirmOutcome, Observation};
use reveal_core::time::HostTime;

use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are host ticks, which are already microseconds.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::new();

    for recorded in events {
        match recorded {
            RecordedEvent::Sample(e) => {
                // Samples that change nothing would drown the timeline.
                let (name, args) = match e.outcome {
                    Observation::Unchanged => continue,
                    Observation::EdgeSuppressed => ("EdgeSuppressed", json!({})),
                    Observation::Withdrawn { generation } => {
                        ("Withdrawn", json!({ "generation": generation }))
                    }
                    Observation::Schedule {
                        visible,
                        generation,
                    } => (
                        if visible { "RequestShow" } else { "RequestHide" },
                        json!({ "generation": generation }),
                    ),
                };
                out.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Sample",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": track(e.element),
                    "s": "t",
                    "args": merge(args, json!({ "ratio": e.ratio })),
                }));
            }
            RecordedEvent::Confirm(e) => {
                let ts = us(e.at);
                let tid = track(e.element);
                match e.outcome {
                    ConfirmOutcome::Shown => out.push(json!({
                        "ph": "B",
                        "name": "visible",
                        "cat": "Element",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                    })),
                    ConfirmOutcome::Hidden { .. } => out.push(json!({
                        "ph": "E",
                        "name": "visible",
                        "cat": "Element",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                    })),
                    ConfirmOutcome::Stale | ConfirmOutcome::EdgeAbort | ConfirmOutcome::RolledBack => {}
                }
                out.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.outcome),
                    "cat": "Confirm",
                    "ts": ts,
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": {
                        "generation": e.generation,
                        "ratio": e.ratio,
                    }
                }));
            }
            RecordedEvent::Registry(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.action),
                    "cat": "Registry",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": track(e.element),
                    "s": "t",
                    "args": {
                        "generation": e.element.generation(),
                    }
                }));
            }
            RecordedEvent::Mode(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.mode),
                    "cat": "Startup",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "candidates": e.candidates,
                    }
                }));
            }
            RecordedEvent::Gate(e) => {
                let scope = if e.accepted { "g" } else { "t" };
                out.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.signal),
                    "cat": "Startup",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": 0,
                    "s": scope,
                    "args": {
                        "accepted": e.accepted,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn us(t: HostTime) -> u64 {
    t.ticks()
}

fn track(id: ElementId) -> u64 {
    u64::from(id.index()) + 1
}

fn merge(mut a: Value, b: Value) -> Value {
    if let (Some(a), Value::Object(b)) = (a.as_object_mut(), b) {
        a.extend(b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use reveal_core::config::RevealConfig;
    use reveal_core::gate::GateSignal;
    use reveal_core::registry::{Candidate, Environment, Registry};
    use reveal_core::trace::{ConfirmEvent, GateEvent, SampleEvent, TraceSink, Tracer};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_gate(&GateEvent {
            at: HostTime(1_000),
            signal: GateSignal::LoaderFinished,
            accepted: true,
        });
        let ids = {
            let mut reg = Registry::new(RevealConfig::default());
            let env = Environment {
                reduced_motion: false,
                intersection_supported: true,
            };
            let mut tracer = Tracer::new(&mut rec).at(HostTime(101_000));
            reg.initialize(env, &[Candidate::default()], &mut tracer)
                .unwrap()
        };
        rec.on_sample(&SampleEvent {
            at: HostTime(200_000),
            element: ids[0],
            ratio: 0.4,
            outcome: Observation::Schedule {
                visible: true,
                generation: 1,
            },
        });
        rec.on_sample(&SampleEvent {
            at: HostTime(210_000),
            element: ids[0],
            ratio: 0.5,
            outcome: Observation::Unchanged,
        });
        rec.on_confirm(&ConfirmEvent {
            at: HostTime(350_000),
            element: ids[0],
            generation: 1,
            ratio: 0.5,
            outcome: ConfirmOutcome::Shown,
        });

        let mut out = Vec::new();
        export(rec.events(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        let names: Vec<&str> = parsed.iter().filter_map(|e| e["name"].as_str()).collect();
        assert_eq!(
            names,
            [
                "LoaderFinished",
                "Observing",
                "Registered",
                "RequestShow",
                "visible",
                "Shown"
            ],
            "unchanged sample skipped, span opened before the instant"
        );

        assert_eq!(parsed[0]["tid"], 0, "gate on the startup track");
        assert_eq!(parsed[3]["tid"], 1, "element on its own track");
        assert_eq!(parsed[3]["ts"], 200_000, "ticks are microseconds");
        assert_eq!(parsed[3]["args"]["ratio"], 0.4, "ratio merged into args");
        assert_eq!(parsed[3]["args"]["generation"], 1, "generation kept");
        assert_eq!(parsed[4]["ph"], "B", "visible span begins");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty(), "nothing recorded, nothing exported");
    }
}
