// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-agnostic core of a reveal-on-scroll controller.
//!
//! `reveal_core` decides when page elements marked for reveal should animate
//! into view. It is `no_std` compatible (with `alloc`), owns no timers and
//! touches no document: hosts feed it events and apply the commands it
//! queues.
//!
//! # Architecture
//!
//! ```text
//!   Host triggers ──► StartupGate::signal() ──► settle ──► Registry::initialize()
//!
//!   Host watcher ──► Sample ──► Registry::sample()
//!                                   │  VisibilityState::observe()
//!                                   ▼
//!   Host timer ──► Registry::confirm() ──► Commands ──► Host::apply()
//!                                   │  VisibilityState::confirm()
//!                                   ▼
//!                       Cascade::arm() / disarm(), active marker
//! ```
//!
//! **[`metric`]**: Area-based visible ratio from clipped and full bounds.
//!
//! **[`edge`]**: Viewport-edge jitter suppression.
//!
//! **[`cascade`]**: Idempotent stagger bookkeeping for cascade containers.
//!
//! **[`machine`]**: Per-element hysteresis and debounce state machine with
//! generation-checked confirmations.
//!
//! **[`registry`]**: The observation registry: element side-table, disclosure
//! and removal handling, and the outbound [`Command`](registry::Command)
//! queue.
//!
//! **[`gate`]**: Fire-once startup gate in front of initialization.
//!
//! **[`backend`]**: The [`Host`](backend::Host) trait platform backends
//! implement.
//!
//! **[`config`]**: Tunables with web defaults.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod cascade;
pub mod config;
pub mod edge;
pub mod element;
pub mod gate;
pub mod machine;
pub mod metric;
pub mod registry;
pub mod time;
pub mod trace;
