// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-backed timers.
//!
//! One long-lived closure serves every timer: each `setTimeout` call passes a
//! numeric key as the extra argument, and [`Timers::take`] maps the key back to
//! what was scheduled. Nothing is allocated per timer on the JS side, so a
//! cancelled timer leaks nothing.

use alloc::boxed::Box;
use alloc::vec::Vec;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use reveal_core::time::Duration;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, ms: f64, key: u32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// A table of running timers carrying payloads of type `T`.
pub(crate) struct Timers<T> {
    callback: Closure<dyn FnMut(u32)>,
    running: Vec<Running<T>>,
    next_key: u32,
}

struct Running<T> {
    key: u32,
    handle: i32,
    payload: T,
}

impl<T: Copy + PartialEq> Timers<T> {
    /// Creates an empty table whose timers call `on_fire` with their key.
    pub(crate) fn new(on_fire: impl FnMut(u32) + 'static) -> Self {
        Self {
            callback: Closure::wrap(Box::new(on_fire) as Box<dyn FnMut(u32)>),
            running: Vec::new(),
            next_key: 0,
        }
    }

    /// Starts a timer for `payload`.
    pub(crate) fn schedule(&mut self, payload: T, after: Duration) {
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);
        let handle = set_timeout(self.callback.as_ref(), after.as_millis_f64(), key);
        self.running.push(Running {
            key,
            handle,
            payload,
        });
    }

    /// Cancels every running timer carrying `payload`.
    pub(crate) fn cancel(&mut self, payload: T) {
        self.running.retain(|r| {
            let hit = r.payload == payload;
            if hit {
                clear_timeout(r.handle);
            }
            !hit
        });
    }

    /// Removes the timer behind `key` once it fired, returning its payload.
    pub(crate) fn take(&mut self, key: u32) -> Option<T> {
        let pos = self.running.iter().position(|r| r.key == key)?;
        Some(self.running.swap_remove(pos).payload)
    }

    /// Number of timers still running.
    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }
}

impl<T> core::fmt::Debug for Timers<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timers")
            .field("running", &self.running.len())
            .field("next_key", &self.next_key)
            .finish_non_exhaustive()
    }
}
