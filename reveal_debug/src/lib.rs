// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for reveal
//! diagnostics.
//!
//! This crate provides [`TraceSink`](reveal_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one `[reveal]` line per event.
//! - [`recorder::RecorderSink`]: keeps every event in memory, in order.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from a
//!   recording, with one track per element.

pub mod chrome;
pub mod pretty;
pub mod recorder;
