// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host.
//!
//! Applies queued [`Commands`] to live elements: toggles the active class,
//! writes and clears child transition delays, drives the viewport watcher,
//! and runs confirmation timers and frame waits.
//!
//! [`Commands`]: reveal_core::registry::Commands

use alloc::vec::Vec;

use js_sys::{Object, WeakMap};
use kurbo::Rect;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, HtmlElement, IntersectionObserver};

use reveal_core::backend::Host;
use reveal_core::cascade::stagger_delay;
use reveal_core::config::RevealConfig;
use reveal_core::element::ElementId;
use reveal_core::machine::ConfirmTicket;
use reveal_core::registry::{Command, Commands, Registry};

use crate::markup::{Markup, css_millis};
use crate::observer;
use crate::raf::FrameWaiter;
use crate::timer::Timers;

/// Maps registry handles to DOM elements and applies registry commands to
/// them.
///
/// Elements are kept in a slot table indexed by [`ElementId::index`]; the
/// reverse lookup goes through a JS `WeakMap`, so the host never keeps a
/// detached element alive on its own account.
pub struct DomHost {
    markup: Markup,
    slots: Vec<Option<(ElementId, Element)>>,
    reverse: WeakMap,
    observer: Option<IntersectionObserver>,
    timers: Timers<ConfirmTicket>,
    frames: FrameWaiter,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("markup", &self.markup)
            .field("slots_len", &self.slots.len())
            .field("observing", &self.observer.is_some())
            .field("timers", &self.timers.len())
            .field("frame_waits", &self.frames.pending())
            .finish_non_exhaustive()
    }
}

impl DomHost {
    /// Creates a host with no bound elements and no viewport watcher.
    pub(crate) fn new(markup: Markup, timers: Timers<ConfirmTicket>, frames: FrameWaiter) -> Self {
        Self {
            markup,
            slots: Vec::new(),
            reverse: WeakMap::new(),
            observer: None,
            timers,
            frames,
        }
    }

    /// Installs the viewport watcher that `Observe` commands feed.
    pub(crate) fn set_observer(&mut self, observer: IntersectionObserver) {
        self.observer = Some(observer);
    }

    /// Associates a freshly registered handle with its element.
    pub(crate) fn bind(&mut self, id: ElementId, el: Element) {
        let slot = id.index() as usize;
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        self.reverse
            .set(el.unchecked_ref::<Object>(), &JsValue::from(id.index()));
        self.slots[slot] = Some((id, el));
    }

    /// The handle bound to `el`, if any.
    #[must_use]
    pub fn id_of(&self, el: &Element) -> Option<ElementId> {
        let idx = self.reverse.get(el.unchecked_ref::<Object>()).as_f64()?;
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "the map only stores slot indices written from u32"
        )]
        let slot = idx as usize;
        match self.slots.get(slot)? {
            Some((id, bound)) if bound == el => Some(*id),
            _ => None,
        }
    }

    /// The element bound to `id`, if the handle is current.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        match self.slots.get(id.index() as usize)? {
            Some((bound, el)) if *bound == id => Some(el),
            _ => None,
        }
    }

    /// Current geometry of the element bound to `id`.
    #[must_use]
    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.element(id).map(observer::bounds)
    }

    /// Removes the fired confirmation timer behind `key`.
    pub(crate) fn take_timer(&mut self, key: u32) -> Option<ConfirmTicket> {
        self.timers.take(key)
    }

    fn release(&mut self, id: ElementId) {
        if let Some(slot) = self.slots.get_mut(id.index() as usize)
            && slot.as_ref().is_some_and(|(bound, _)| *bound == id)
            && let Some((_, el)) = slot.take()
        {
            self.reverse.delete(el.unchecked_ref::<Object>());
        }
    }

    fn set_active(&self, id: ElementId, on: bool) {
        let Some(el) = self.element(id) else {
            return;
        };
        let classes = el.class_list();
        let _ = if on {
            classes.add_1(self.markup.active_class)
        } else {
            classes.remove_1(self.markup.active_class)
        };
    }

    fn stagger(&self, id: ElementId, registry: &Registry) {
        let Some(el) = self.element(id) else {
            return;
        };
        let step = registry.config().stagger_step;
        let children = el.children();
        for i in 0..children.length() {
            let Some(child) = children.item(i).and_then(|c| c.dyn_into::<HtmlElement>().ok())
            else {
                continue;
            };
            let delay = stagger_delay(i as usize, step);
            let _ = child
                .style()
                .set_property("transition-delay", &css_millis(delay.as_millis()));
        }
        // Flush styles so the delays are in place before the class flips.
        let _ = el.get_bounding_client_rect();
    }

    fn clear_stagger(&self, id: ElementId) {
        let Some(el) = self.element(id) else {
            return;
        };
        let children = el.children();
        for i in 0..children.length() {
            if let Some(child) = children.item(i).and_then(|c| c.dyn_into::<HtmlElement>().ok()) {
                let _ = child.style().remove_property("transition-delay");
            }
        }
    }
}

impl Host for DomHost {
    /// Applies commands in order.
    fn apply(&mut self, registry: &Registry, commands: &Commands) {
        for command in commands {
            match *command {
                Command::Observe(id) => {
                    if let (Some(observer), Some(el)) = (&self.observer, self.element(id)) {
                        observer.observe(el);
                    }
                }
                Command::Unobserve(id) => {
                    if let (Some(observer), Some(el)) = (&self.observer, self.element(id)) {
                        observer.unobserve(el);
                    }
                }
                Command::SetActive(id, on) => self.set_active(id, on),
                Command::Stagger(id) => self.stagger(id, registry),
                Command::ClearStagger(id) => self.clear_stagger(id),
                Command::ScheduleConfirm { ticket, after } => self.timers.schedule(ticket, after),
                Command::CancelConfirm(ticket) => self.timers.cancel(ticket),
                Command::AwaitFrames { batch, frames } => self.frames.wait(batch, frames),
                Command::Release(id) => self.release(id),
            }
        }
    }
}

/// Reveals every candidate in `document` without any observation.
///
/// This is the fallback when the controller cannot be set up at all: content
/// must never stay hidden because the animation machinery failed.
pub fn reveal_all(document: &Document, markup: &Markup, config: &RevealConfig) {
    let Ok(list) = document.query_selector_all(markup.candidate) else {
        return;
    };
    for i in 0..list.length() {
        let Some(el) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        if el.class_list().contains(markup.cascade_class) {
            let children = el.children();
            for c in 0..children.length() {
                if let Some(child) = children.item(c).and_then(|n| n.dyn_into::<HtmlElement>().ok())
                {
                    let delay = stagger_delay(c as usize, config.stagger_step);
                    let _ = child
                        .style()
                        .set_property("transition-delay", &css_millis(delay.as_millis()));
                }
            }
        }
        let _ = el.class_list().add_1(markup.active_class);
    }
}
