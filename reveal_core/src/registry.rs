// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The observation registry.
//!
//! [`Registry`] owns every registered reveal candidate and routes host events
//! (intersection samples, confirmation timers, DOM removals, disclosure
//! toggles) into the per-element [`VisibilityState`] machines. It never
//! touches the host directly: each operation appends [`Command`]s to an
//! internal buffer, and [`Registry::flush`] hands the batch to a
//! [`Host`](crate::backend::Host) implementation to apply.
//!
//! One registry exists per page. The host constructs it and passes it to
//! whatever needs to (un)register elements; there is no global instance.
//!
//! # Modes
//!
//! [`Registry::initialize`] picks the [`Mode`] once. In [`Mode::Bypass`]
//! (reduced motion requested, or no viewport-intersection primitive) every
//! candidate is revealed the moment it registers and nothing is observed.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::cascade::Cascade;
use crate::config::RevealConfig;
use crate::element::{ElementId, ElementStore};
use crate::machine::{ConfirmOutcome, ConfirmTicket, Observation, VisibilityState};
use crate::metric::Sample;
use crate::time::Duration;
use crate::trace::{ConfirmEvent, ModeEvent, RegistryAction, SampleEvent, Tracer};

/// Host capabilities and user preferences read once at initialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    /// The user asked for reduced motion.
    pub reduced_motion: bool,
    /// The host can watch viewport intersections.
    pub intersection_supported: bool,
}

impl Environment {
    /// The mode a registry initialized in this environment runs in.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.reduced_motion || !self.intersection_supported {
            Mode::Bypass
        } else {
            Mode::Observing
        }
    }
}

/// How the registry handles candidates for the rest of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Candidates are observed and revealed as they scroll into view.
    Observing,
    /// Candidates are revealed immediately and never observed.
    Bypass,
}

/// A reveal candidate found in the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Candidate {
    /// The candidate also carries the cascade marker.
    pub cascade: bool,
}

/// Identifies one disclosure-open frame wait.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(pub u32);

impl fmt::Debug for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchId({})", self.0)
    }
}

/// An instruction for the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start delivering intersection samples for the element.
    Observe(ElementId),
    /// Stop delivering intersection samples for the element.
    Unobserve(ElementId),
    /// Set or clear the active marker on the element.
    SetActive(ElementId, bool),
    /// Give the element's direct child at index *i* a transition delay of
    /// `i ×` [`stagger_step`](RevealConfig::stagger_step).
    Stagger(ElementId),
    /// Clear the transition delays of the element's direct children.
    ClearStagger(ElementId),
    /// Call [`Registry::confirm`] with `ticket` after the given delay.
    ScheduleConfirm {
        /// Ticket to hand back.
        ticket: ConfirmTicket,
        /// Delay before firing.
        after: Duration,
    },
    /// Cancel the confirmation scheduled for `ticket`.
    CancelConfirm(ConfirmTicket),
    /// Call [`Registry::frames_elapsed`] with `batch` after the given number
    /// of rendering frames.
    AwaitFrames {
        /// Batch to hand back.
        batch: BatchId,
        /// Frames to wait.
        frames: u8,
    },
    /// The element left the document; the host may drop its handle to it.
    Release(ElementId),
}

/// A batch of [`Command`]s produced since the last flush, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commands {
    list: Vec<Command>,
}

impl Commands {
    /// Clears the batch, keeping its allocation.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Number of commands in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The commands in application order.
    #[must_use]
    pub fn as_slice(&self) -> &[Command] {
        &self.list
    }

    /// Iterates over the commands in application order.
    pub fn iter(&self) -> core::slice::Iter<'_, Command> {
        self.list.iter()
    }

    fn push(&mut self, command: Command) {
        self.list.push(command);
    }
}

impl<'a> IntoIterator for &'a Commands {
    type Item = &'a Command;
    type IntoIter = core::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

/// Members of an opened disclosure widget waiting for layout to settle.
#[derive(Clone, Debug)]
struct FrameWait {
    batch: BatchId,
    members: Vec<ElementId>,
}

/// The observation registry. See the [module docs](self).
pub struct Registry {
    config: RevealConfig,
    mode: Option<Mode>,
    elements: ElementStore,
    out: Commands,
    waits: Vec<FrameWait>,
    next_batch: u32,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("mode", &self.mode)
            .field("elements", &self.elements.len())
            .field("queued", &self.out.len())
            .field("waits", &self.waits.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an uninitialized registry.
    ///
    /// The configuration is expected to be [valid](RevealConfig::validate).
    #[must_use]
    pub fn new(config: RevealConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid reveal config");
        Self {
            config,
            mode: None,
            elements: ElementStore::new(),
            out: Commands::default(),
            waits: Vec::new(),
            next_batch: 0,
        }
    }

    /// The configuration this registry runs with.
    #[must_use]
    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// The mode chosen by [`initialize`](Self::initialize), or `None` before
    /// it ran.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Picks the mode and registers the initial candidates.
    ///
    /// Returns the handles of `candidates` in order. Only the first call has
    /// any effect; later calls return `None` and queue nothing.
    pub fn initialize(
        &mut self,
        env: Environment,
        candidates: &[Candidate],
        tracer: &mut Tracer<'_>,
    ) -> Option<Vec<ElementId>> {
        if self.mode.is_some() {
            return None;
        }
        let mode = env.mode();
        self.mode = Some(mode);
        tracer.mode(&ModeEvent {
            at: tracer.now(),
            mode,
            candidates: candidates.len(),
        });

        let mut ids = Vec::with_capacity(candidates.len());
        for &candidate in candidates {
            ids.extend(self.register(candidate, tracer));
        }
        Some(ids)
    }

    /// Registers a candidate inserted after initialization.
    ///
    /// Returns `None` before [`initialize`](Self::initialize); the initial
    /// scan will pick the candidate up.
    pub fn register(&mut self, candidate: Candidate, tracer: &mut Tracer<'_>) -> Option<ElementId> {
        let mode = self.mode?;
        let id = self.elements.insert(candidate.cascade);
        match mode {
            Mode::Observing => {
                self.observe(id);
                tracer.lifecycle(id, RegistryAction::Registered);
            }
            Mode::Bypass => {
                if let Some(record) = self.elements.get_mut(id) {
                    record.visibility.force_visible();
                }
                self.show(id);
                tracer.lifecycle(id, RegistryAction::Revealed);
            }
        }
        Some(id)
    }

    /// Feeds one intersection sample for `id`.
    ///
    /// Samples for elements that are no longer observed (late deliveries
    /// after an unobserve) are dropped.
    pub fn sample(&mut self, id: ElementId, sample: &Sample, tracer: &mut Tracer<'_>) {
        let Some(record) = self.elements.get_mut(id) else {
            tracer.lifecycle(id, RegistryAction::StaleHandle);
            return;
        };
        if !record.observed {
            return;
        }
        let outcome = record.visibility.observe(sample, &self.config);
        match outcome {
            Observation::Schedule { generation, .. } => {
                debug_assert_eq!(
                    record.visibility.pending_generation(),
                    Some(generation),
                    "scheduled request must be the pending one"
                );
                self.out.push(Command::ScheduleConfirm {
                    ticket: ConfirmTicket {
                        element: id,
                        generation,
                    },
                    after: self.config.stable,
                });
            }
            Observation::Withdrawn { generation } => {
                self.out.push(Command::CancelConfirm(ConfirmTicket {
                    element: id,
                    generation,
                }));
            }
            Observation::EdgeSuppressed | Observation::Unchanged => {}
        }
        tracer.sample(&SampleEvent {
            at: tracer.now(),
            element: id,
            ratio: sample.ratio(),
            outcome,
        });
    }

    /// Handles a confirmation timer firing.
    ///
    /// `bounds` is the element's geometry now (`None` if it cannot be
    /// measured) and `viewport_height` the current viewport height.
    pub fn confirm(
        &mut self,
        ticket: ConfirmTicket,
        bounds: Option<Rect>,
        viewport_height: f64,
        tracer: &mut Tracer<'_>,
    ) {
        let id = ticket.element;
        let Some(record) = self.elements.get_mut(id) else {
            tracer.lifecycle(id, RegistryAction::StaleHandle);
            return;
        };
        let outcome =
            record
                .visibility
                .confirm(ticket.generation, bounds, viewport_height, &self.config);
        let ratio = record.visibility.last_ratio();
        match outcome {
            ConfirmOutcome::Shown => self.show(id),
            ConfirmOutcome::Hidden { fully_out } => self.hide(id, fully_out),
            ConfirmOutcome::Stale | ConfirmOutcome::EdgeAbort | ConfirmOutcome::RolledBack => {}
        }
        tracer.confirm(&ConfirmEvent {
            at: tracer.now(),
            element: id,
            generation: ticket.generation,
            ratio,
            outcome,
        });
    }

    /// Handles a candidate leaving the document.
    ///
    /// Cancels its pending confirmation, stops observing it and frees its
    /// slot. The handle is stale afterwards.
    pub fn removed(&mut self, id: ElementId, tracer: &mut Tracer<'_>) {
        let Some(record) = self.elements.remove(id) else {
            tracer.lifecycle(id, RegistryAction::StaleHandle);
            return;
        };
        if let Some(generation) = record.visibility.pending_generation() {
            self.out.push(Command::CancelConfirm(ConfirmTicket {
                element: id,
                generation,
            }));
        }
        if record.observed {
            self.out.push(Command::Unobserve(id));
        }
        self.forget_waits(&[id]);
        self.out.push(Command::Release(id));
        tracer.lifecycle(id, RegistryAction::Removed);
    }

    /// Handles a disclosure widget opening.
    ///
    /// `members` are the candidates inside the widget's content. They are
    /// reset to hidden, their stagger is cleared and they stop being
    /// observed until [`frames_elapsed`](Self::frames_elapsed) is called with
    /// the returned batch, so the first sample after opening sees the final
    /// layout.
    ///
    /// Returns `None` when nothing needs waiting for: bypass mode, before
    /// initialization, or no live members.
    pub fn disclosure_opened(
        &mut self,
        members: &[ElementId],
        tracer: &mut Tracer<'_>,
    ) -> Option<BatchId> {
        if self.mode != Some(Mode::Observing) {
            return None;
        }
        let mut live = Vec::with_capacity(members.len());
        for &id in members {
            if self.reset(id) {
                tracer.lifecycle(id, RegistryAction::ResetForOpen);
                live.push(id);
            } else {
                tracer.lifecycle(id, RegistryAction::StaleHandle);
            }
        }
        if live.is_empty() {
            return None;
        }
        let batch = BatchId(self.next_batch);
        self.next_batch = self.next_batch.wrapping_add(1);
        self.waits.push(FrameWait {
            batch,
            members: live,
        });
        self.out.push(Command::AwaitFrames {
            batch,
            frames: self.config.disclosure_frames,
        });
        Some(batch)
    }

    /// Re-observes the members of an opened disclosure widget once its
    /// rendering frames have elapsed.
    ///
    /// Members removed or closed in the meantime are skipped. Unknown batches
    /// are ignored.
    pub fn frames_elapsed(&mut self, batch: BatchId, tracer: &mut Tracer<'_>) {
        let Some(pos) = self.waits.iter().position(|w| w.batch == batch) else {
            return;
        };
        let wait = self.waits.swap_remove(pos);
        for id in wait.members {
            if self.elements.get(id).is_some_and(|r| !r.observed) {
                self.observe(id);
                tracer.lifecycle(id, RegistryAction::Reobserved);
            }
        }
    }

    /// Handles a disclosure widget closing: resets `members` to hidden and
    /// stops observing them.
    ///
    /// The members keep their handles, so reopening the widget passes the
    /// same ones to [`disclosure_opened`](Self::disclosure_opened).
    pub fn disclosure_closed(&mut self, members: &[ElementId], tracer: &mut Tracer<'_>) {
        if self.mode != Some(Mode::Observing) {
            return;
        }
        self.forget_waits(members);
        for &id in members {
            if self.reset(id) {
                tracer.lifecycle(id, RegistryAction::ResetForClose);
            } else {
                tracer.lifecycle(id, RegistryAction::StaleHandle);
            }
        }
    }

    /// Returns the queued commands and starts a new batch.
    pub fn flush(&mut self) -> Commands {
        core::mem::take(&mut self.out)
    }

    /// Like [`flush`](Self::flush), but swaps the queue into a
    /// caller-provided buffer to avoid allocation.
    pub fn flush_into(&mut self, commands: &mut Commands) {
        commands.clear();
        core::mem::swap(commands, &mut self.out);
    }

    /// The visibility state of a live element.
    #[must_use]
    pub fn state(&self, id: ElementId) -> Option<&VisibilityState> {
        self.elements.get(id).map(|r| &r.visibility)
    }

    /// Whether the element currently carries the active marker.
    #[must_use]
    pub fn is_active(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|r| r.active)
    }

    /// Whether the element is currently observed.
    #[must_use]
    pub fn is_observed(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|r| r.observed)
    }

    /// The cascade state of a live element.
    #[must_use]
    pub fn cascade(&self, id: ElementId) -> Option<Cascade> {
        self.elements.get(id).map(|r| r.cascade)
    }

    /// Number of registered elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if no element is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates over the handles of all registered elements.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.ids()
    }

    fn observe(&mut self, id: ElementId) {
        if let Some(record) = self.elements.get_mut(id) {
            if !record.observed {
                record.observed = true;
                self.out.push(Command::Observe(id));
            }
        }
    }

    /// Arms the cascade (first time only) and sets the active marker.
    fn show(&mut self, id: ElementId) {
        let Some(record) = self.elements.get_mut(id) else {
            return;
        };
        // Delays go in before the marker so the transition picks them up.
        if record.cascade.arm() {
            self.out.push(Command::Stagger(id));
        }
        if !record.active {
            record.active = true;
            self.out.push(Command::SetActive(id, true));
        }
    }

    /// Clears the active marker; clears the stagger only on a full exit.
    fn hide(&mut self, id: ElementId, fully_out: bool) {
        let Some(record) = self.elements.get_mut(id) else {
            return;
        };
        if record.active {
            record.active = false;
            self.out.push(Command::SetActive(id, false));
        }
        if fully_out && record.cascade.disarm() {
            self.out.push(Command::ClearStagger(id));
        }
    }

    /// Returns the element to its just-registered state, unobserved.
    ///
    /// Returns `false` for stale handles.
    fn reset(&mut self, id: ElementId) -> bool {
        let Some(record) = self.elements.get_mut(id) else {
            return false;
        };
        if let Some(generation) = record.visibility.reset() {
            self.out.push(Command::CancelConfirm(ConfirmTicket {
                element: id,
                generation,
            }));
        }
        if record.active {
            record.active = false;
            self.out.push(Command::SetActive(id, false));
        }
        if record.cascade.disarm() {
            self.out.push(Command::ClearStagger(id));
        }
        if record.observed {
            record.observed = false;
            self.out.push(Command::Unobserve(id));
        }
        true
    }

    fn forget_waits(&mut self, members: &[ElementId]) {
        for wait in &mut self.waits {
            wait.members.retain(|m| !members.contains(m));
        }
        self.waits.retain(|w| !w.members.is_empty());
    }
}
