// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wiring between browser events, the startup gate and the registry.
//!
//! Every browser callback funnels through [`Inner::dispatch`], which borrows
//! the registry and the [`DomHost`], runs one registry operation, flushes the
//! queued commands and applies them. None of the applied commands call back
//! synchronously (observer callbacks, timers and frames all arrive as later
//! tasks), so the borrows never overlap.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, HtmlDetailsElement,
    IntersectionObserverEntry, MutationRecord, Window,
};

use reveal_core::backend::Host as _;
use reveal_core::gate::{GateSignal, StartupGate};
use reveal_core::registry::{Candidate, Mode, Registry};
use reveal_core::trace::Tracer;

use crate::console::ConsoleSink;
use crate::error::SetupError;
use crate::markup::{WebOptions, describe_thresholds};
use crate::observer::{self, ObserverClosure};
use crate::presenter::DomHost;
use crate::raf::FrameWaiter;
use crate::timer::Timers;

/// Timers the startup gate runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateTimer {
    LoaderTimeout,
    Settle,
}

/// A running reveal controller.
///
/// The page keeps the controller state alive, so dropping this handle stops
/// nothing: timers and listeners registered with the browser keep firing for
/// the rest of the page.
pub struct Controller {
    inner: Rc<Inner>,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("mode", &self.mode())
            .field("registry", &self.inner.registry.borrow())
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Opens the startup gate now, as if the loader had finished.
    ///
    /// Safe to call any number of times; only the first trigger of the page
    /// counts.
    pub fn trigger(&self) {
        self.inner.signal(GateSignal::Manual);
    }

    /// The registry mode, once initialized.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.inner.registry.borrow().mode()
    }
}

struct Inner {
    window: Window,
    document: Document,
    options: WebOptions,
    registry: RefCell<Registry>,
    host: RefCell<DomHost>,
    gate: RefCell<StartupGate>,
    gate_timers: RefCell<Timers<GateTimer>>,
    /// Observer callbacks; must outlive the observers they were handed to.
    callbacks: RefCell<Vec<ObserverClosure>>,
}

/// Sets the controller up and arms the startup gate.
///
/// Registry initialization happens later, once the gate opens and settles.
pub(crate) fn start(options: WebOptions) -> Result<Controller, SetupError> {
    options.config.validate()?;
    let window = web_sys::window().ok_or(SetupError::NoWindow)?;
    let document = window.document().ok_or(SetupError::NoDocument)?;

    let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
        let on_confirm = weak.clone();
        let timers = Timers::new(move |key| {
            if let Some(inner) = on_confirm.upgrade() {
                inner.on_confirm_timer(key);
            }
        });
        let on_frames = weak.clone();
        let frames = FrameWaiter::new(move |batch| {
            if let Some(inner) = on_frames.upgrade() {
                inner.dispatch(|registry, _, tracer| registry.frames_elapsed(batch, tracer));
            }
        });
        let on_gate = weak.clone();
        let gate_timers = Timers::new(move |key| {
            if let Some(inner) = on_gate.upgrade() {
                inner.on_gate_timer(key);
            }
        });
        Inner {
            host: RefCell::new(DomHost::new(options.markup.clone(), timers, frames)),
            gate: RefCell::new(StartupGate::new(&options.config)),
            registry: RefCell::new(Registry::new(options.config)),
            gate_timers: RefCell::new(gate_timers),
            callbacks: RefCell::new(Vec::new()),
            window,
            document,
            options,
        }
    });
    // Browser callbacks only hold weak references.
    keep_for_page(&inner);

    if inner.document.ready_state() == "loading" {
        let weak = Rc::downgrade(&inner);
        let on_ready = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                inner.arm_gate();
            }
        }) as Box<dyn FnMut(_)>);
        inner.document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
            &once(),
        )?;
        on_ready.forget();
    } else {
        inner.arm_gate();
    }

    Ok(Controller { inner })
}

/// Leaks one strong reference so `inner` outlives every handle to it.
fn keep_for_page<T>(inner: &Rc<T>) {
    core::mem::forget(Rc::clone(inner));
}

fn once() -> AddEventListenerOptions {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    options
}

impl Inner {
    /// Runs one registry operation and applies what it queued.
    fn dispatch(&self, f: impl FnOnce(&mut Registry, &mut DomHost, &mut Tracer<'_>)) {
        let mut registry = self.registry.borrow_mut();
        let mut host = self.host.borrow_mut();
        let mut sink = ConsoleSink;
        let mut tracer = self.tracer(&mut sink);
        f(&mut registry, &mut host, &mut tracer);
        let commands = registry.flush();
        host.apply(&registry, &commands);
    }

    fn tracer<'a>(&self, sink: &'a mut ConsoleSink) -> Tracer<'a> {
        let tracer = if self.options.debug {
            Tracer::new(sink)
        } else {
            Tracer::none()
        };
        tracer.at(crate::now())
    }

    fn log(&self, message: &str) {
        if self.options.debug {
            web_sys::console::log_1(&JsValue::from_str(message));
        }
    }

    // -- startup gate ------------------------------------------------------

    /// Starts the loader timeout and listens for the loader and load events.
    fn arm_gate(self: &Rc<Self>) {
        let timeout = self.gate.borrow().timeout();
        self.gate_timers
            .borrow_mut()
            .schedule(GateTimer::LoaderTimeout, timeout);

        let markup = &self.options.markup;
        if observer::loader_finished(&self.window, &self.document, markup) {
            self.log("[reveal] loader already finished");
            self.signal(GateSignal::LoaderFinished);
            return;
        }

        let listen = |target: &web_sys::EventTarget, event: &str, signal: GateSignal| {
            let weak = Rc::downgrade(self);
            let callback = Closure::wrap(Box::new(move |_event: Event| {
                if let Some(inner) = weak.upgrade() {
                    inner.signal(signal);
                }
            }) as Box<dyn FnMut(_)>);
            let added = target.add_event_listener_with_callback_and_add_event_listener_options(
                event,
                callback.as_ref().unchecked_ref(),
                &once(),
            );
            if added.is_ok() {
                callback.forget();
            }
        };
        listen(&self.window, markup.loader_event, GateSignal::LoaderFinished);
        // Once the document is complete the load event has already fired;
        // the timeout covers that case.
        if self.document.ready_state() != "complete" {
            listen(&self.window, "load", GateSignal::WindowLoaded);
        }
    }

    fn signal(&self, signal: GateSignal) {
        let mut sink = ConsoleSink;
        let mut tracer = self.tracer(&mut sink);
        let settle = self.gate.borrow_mut().signal(signal, &mut tracer);
        if let Some(settle) = settle {
            let mut timers = self.gate_timers.borrow_mut();
            timers.cancel(GateTimer::LoaderTimeout);
            timers.schedule(GateTimer::Settle, settle);
        }
    }

    fn on_gate_timer(self: &Rc<Self>, key: u32) {
        let fired = self.gate_timers.borrow_mut().take(key);
        match fired {
            Some(GateTimer::LoaderTimeout) => self.signal(GateSignal::TimedOut),
            Some(GateTimer::Settle) => {
                let settled = self.gate.borrow_mut().settled();
                if settled && let Err(err) = self.initialize() {
                    self.fail(&err);
                }
            }
            None => {}
        }
    }

    // -- registry ----------------------------------------------------------

    fn initialize(self: &Rc<Self>) -> Result<(), SetupError> {
        let mut env = observer::environment(&self.window);
        let markup = &self.options.markup;

        if env.mode() == Mode::Observing {
            let weak = Rc::downgrade(self);
            let callback: ObserverClosure = Closure::wrap(Box::new(move |entries: Array| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_intersections(&entries);
                }
            }) as Box<dyn FnMut(Array)>);
            match observer::intersection_observer(&self.options.config, &callback) {
                Ok(io) => {
                    let config = &self.options.config;
                    self.log(&alloc::format!(
                        "[reveal] observing: thresholds {}, root margin {}",
                        describe_thresholds(config.thresholds),
                        config.root_margin_css(),
                    ));
                    self.host.borrow_mut().set_observer(io);
                    self.callbacks.borrow_mut().push(callback);
                }
                Err(err) => {
                    // Without a watcher nothing would ever be revealed.
                    warn(&SetupError::from(err));
                    env.intersection_supported = false;
                }
            }
        }

        let root = self.document.document_element().ok_or(SetupError::NoDocument)?;
        let elements = observer::matching(&root, markup.candidate);
        let candidates: Vec<Candidate> = elements
            .iter()
            .map(|el| Candidate {
                cascade: el.class_list().contains(markup.cascade_class),
            })
            .collect();
        self.dispatch(|registry, host, tracer| {
            if let Some(ids) = registry.initialize(env, &candidates, tracer) {
                for (id, el) in ids.into_iter().zip(elements) {
                    host.bind(id, el);
                }
            }
        });

        self.watch_mutations(&root)?;
        self.watch_disclosures()?;
        Ok(())
    }

    fn watch_mutations(self: &Rc<Self>, root: &Element) -> Result<(), SetupError> {
        let weak = Rc::downgrade(self);
        let callback: ObserverClosure = Closure::wrap(Box::new(move |records: Array| {
            if let Some(inner) = weak.upgrade() {
                inner.on_mutations(&records);
            }
        }) as Box<dyn FnMut(Array)>);
        let mo = observer::mutation_observer(root, &callback)?;
        self.callbacks.borrow_mut().push(callback);
        // The observer stays registered with the document for the page's
        // lifetime.
        core::mem::forget(mo);
        Ok(())
    }

    fn watch_disclosures(self: &Rc<Self>) -> Result<(), SetupError> {
        let weak = Rc::downgrade(self);
        let callback = Closure::wrap(Box::new(move |event: Event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_toggle(&event);
            }
        }) as Box<dyn FnMut(_)>);
        // `toggle` does not bubble; listen in the capture phase so widgets
        // inserted later are covered too.
        self.document.add_event_listener_with_callback_and_bool(
            "toggle",
            callback.as_ref().unchecked_ref(),
            true,
        )?;
        callback.forget();
        Ok(())
    }

    fn on_intersections(&self, entries: &Array) {
        let viewport_height = observer::viewport_height(&self.window);
        self.dispatch(|registry, host, tracer| {
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                if let Some(id) = host.id_of(&entry.target()) {
                    registry.sample(id, &observer::sample(&entry, viewport_height), tracer);
                }
            }
        });
    }

    fn on_confirm_timer(&self, key: u32) {
        let Some(ticket) = self.host.borrow_mut().take_timer(key) else {
            return;
        };
        let viewport_height = observer::viewport_height(&self.window);
        self.dispatch(|registry, host, tracer| {
            let bounds = host.bounds(ticket.element);
            registry.confirm(ticket, bounds, viewport_height, tracer);
        });
    }

    fn on_mutations(&self, records: &Array) {
        let markup = &self.options.markup;
        self.dispatch(|registry, host, tracer| {
            for record in records.iter() {
                let record: MutationRecord = record.unchecked_into();

                let removed = record.removed_nodes();
                for i in 0..removed.length() {
                    let Some(node) = removed.get(i) else { continue };
                    for el in observer::matching(&node, markup.candidate) {
                        // Moved nodes are reported as removed and re-added.
                        if !el.is_connected()
                            && let Some(id) = host.id_of(&el)
                        {
                            registry.removed(id, tracer);
                        }
                    }
                }

                let added = record.added_nodes();
                for i in 0..added.length() {
                    let Some(node) = added.get(i) else { continue };
                    for el in observer::matching(&node, markup.candidate) {
                        if host.id_of(&el).is_some() || !el.is_connected() {
                            continue;
                        }
                        let candidate = Candidate {
                            cascade: el.class_list().contains(markup.cascade_class),
                        };
                        if let Some(id) = registry.register(candidate, tracer) {
                            host.bind(id, el);
                        }
                    }
                }
            }
        });
    }

    fn on_toggle(&self, event: &Event) {
        let markup = &self.options.markup;
        let Some(details) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlDetailsElement>().ok())
        else {
            return;
        };
        if !details.matches(markup.disclosure).unwrap_or(false) {
            return;
        }
        // A widget without its content element is left alone.
        let Ok(Some(content)) = details.query_selector(markup.disclosure_content) else {
            return;
        };
        let open = details.open();
        self.dispatch(|registry, host, tracer| {
            let members: Vec<_> = observer::matching(&content, markup.candidate)
                .iter()
                .filter_map(|el| host.id_of(el))
                .collect();
            if members.is_empty() {
                return;
            }
            if open {
                registry.disclosure_opened(&members, tracer);
            } else {
                registry.disclosure_closed(&members, tracer);
            }
        });
    }

    /// Logs a setup failure and shows everything the registry does not
    /// already manage.
    fn fail(&self, err: &SetupError) {
        warn(err);
        if self.registry.borrow().mode().is_none() {
            crate::reveal_all(&self.document, &self.options.markup, &self.options.config);
        }
    }
}

pub(crate) fn warn(err: &SetupError) {
    web_sys::console::warn_1(&JsValue::from_str(&alloc::format!("[reveal] {err}")));
}
