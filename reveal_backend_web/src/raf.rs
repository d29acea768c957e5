// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame counting.
//!
//! [`FrameWaiter`] lets the registry wait a number of rendering frames before
//! trusting layout again (after a disclosure widget opens). It only keeps a
//! `requestAnimationFrame` callback registered while at least one wait is
//! outstanding.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use reveal_core::registry::BatchId;

// Direct global bindings instead of `web_sys::Window` methods: avoids
// fetching (and unwrapping) the Window object on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;
}

/// Counts rendering frames for outstanding batches and reports the ones
/// whose wait is over.
pub(crate) struct FrameWaiter {
    inner: Rc<WaiterInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct WaiterInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Set once in `new()`. It only holds a weak handle back to this struct,
    /// so dropping the waiter drops the closure.
    closure: RefCell<Option<RafClosure>>,

    /// Outstanding waits: frames left and the batch to report.
    waits: RefCell<Vec<(u8, BatchId)>>,

    /// Called once per batch whose frames have elapsed.
    on_ready: RefCell<Box<dyn FnMut(BatchId)>>,

    /// Whether a frame callback is currently registered.
    armed: Cell<bool>,
}

impl FrameWaiter {
    /// Creates an idle waiter that reports finished batches to `on_ready`.
    pub(crate) fn new(on_ready: impl FnMut(BatchId) + 'static) -> Self {
        let inner = Rc::new(WaiterInner {
            closure: RefCell::new(None),
            waits: RefCell::new(Vec::new()),
            on_ready: RefCell::new(Box::new(on_ready)),
            armed: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.armed.set(false);

            // Count the frame. The borrow is scoped so `on_ready` may queue
            // new waits.
            let ready: Vec<BatchId> = {
                let mut waits = inner.waits.borrow_mut();
                let mut ready = Vec::new();
                for (left, batch) in waits.iter_mut() {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        ready.push(*batch);
                    }
                }
                waits.retain(|(left, _)| *left > 0);
                ready
            };

            if !inner.waits.borrow().is_empty() {
                inner.arm();
            }
            for batch in ready {
                inner.on_ready.borrow_mut()(batch);
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Reports `batch` after `frames` rendering frames.
    ///
    /// A zero-frame wait still completes on the next frame.
    pub(crate) fn wait(&self, batch: BatchId, frames: u8) {
        self.inner.waits.borrow_mut().push((frames.max(1), batch));
        self.inner.arm();
    }

    /// Number of outstanding waits.
    pub(crate) fn pending(&self) -> usize {
        self.inner.waits.borrow().len()
    }
}

impl WaiterInner {
    fn arm(&self) {
        if self.armed.get() {
            return;
        }
        if let Some(ref closure) = *self.closure.borrow() {
            request_animation_frame(closure.as_ref().unchecked_ref());
            self.armed.set(true);
        }
    }
}

impl core::fmt::Debug for FrameWaiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameWaiter")
            .field("pending", &self.inner.waits.borrow().len())
            .field("armed", &self.inner.armed.get())
            .finish_non_exhaustive()
    }
}
