// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! The core never touches a document, a timer or a frame callback. Each host
//! provides the following pieces:
//!
//! - **Viewport watcher**: Delivers [`Sample`]s for observed elements to
//!   [`Registry::sample`] (e.g. an `IntersectionObserver` configured with
//!   [`RevealConfig::root_margin_css`] and
//!   [`RevealConfig::thresholds`]).
//!
//! - **Timers**: Runs [`Command::ScheduleConfirm`] timers and calls
//!   [`Registry::confirm`] with the element's geometry at firing time.
//!   Cancelling is best effort: a confirmation that fires after being
//!   superseded is recognized as stale by its generation.
//!
//! - **Frames**: Counts rendering frames for [`Command::AwaitFrames`] and
//!   calls [`Registry::frames_elapsed`].
//!
//! - **Mutation and disclosure listeners**: Report inserted candidates to
//!   [`Registry::register`], detached ones to [`Registry::removed`], and
//!   disclosure toggles to [`Registry::disclosure_opened`] /
//!   [`Registry::disclosure_closed`].
//!
//! - **Startup triggers**: Feed the loader event, the window load event and
//!   a timeout into a [`StartupGate`](crate::gate::StartupGate).
//!
//! - **Host**: Implements the [`Host`] trait to apply queued commands to the
//!   document.
//!
//! # Crate boundaries
//!
//! `reveal_core` owns the data model, the decision logic and this contract
//! module. Backend crates depend on `reveal_core` and provide platform glue.
//!
//! [`Sample`]: crate::metric::Sample
//! [`Registry::sample`]: crate::registry::Registry::sample
//! [`Registry::confirm`]: crate::registry::Registry::confirm
//! [`Registry::frames_elapsed`]: crate::registry::Registry::frames_elapsed
//! [`Registry::register`]: crate::registry::Registry::register
//! [`Registry::removed`]: crate::registry::Registry::removed
//! [`Registry::disclosure_opened`]: crate::registry::Registry::disclosure_opened
//! [`Registry::disclosure_closed`]: crate::registry::Registry::disclosure_closed
//! [`RevealConfig::root_margin_css`]: crate::config::RevealConfig::root_margin_css
//! [`RevealConfig::thresholds`]: crate::config::RevealConfig::thresholds
//! [`Command::ScheduleConfirm`]: crate::registry::Command::ScheduleConfirm
//! [`Command::AwaitFrames`]: crate::registry::Command::AwaitFrames

use crate::registry::{Commands, Registry};

/// Applies queued registry commands to a platform-native document.
///
/// The DOM host and test doubles implement this trait.
///
/// # Event loop pseudocode
///
/// Every host callback follows the same shape:
///
/// ```rust,ignore
/// fn on_intersection(entries: &[Entry]) {
///     let mut tracer = Tracer::new(&mut sink).at(now());
///     for entry in entries {
///         registry.sample(id_of(entry), &sample_of(entry), &mut tracer);
///     }
///     let commands = registry.flush();
///     host.apply(&registry, &commands);
/// }
/// ```
pub trait Host {
    /// Applies `commands` in order, reading configuration from `registry` as
    /// needed.
    fn apply(&mut self, registry: &Registry, commands: &Commands);
}
