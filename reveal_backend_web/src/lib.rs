// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for reveal.
//!
//! This crate connects [`reveal_core`] to the DOM:
//!
//! - [`DomHost`]: applies registry commands to elements, timers and frames
//! - [`start`]: arms the startup gate and wires observers and listeners
//! - [`ConsoleSink`]: `[reveal]` trace lines on the browser console
//! - [`reveal_all`]: the no-animation fallback
//!
//! Built as a `cdylib`, the module starts itself with the site defaults and
//! exposes `window.revealStart()` as the manual trigger.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

mod console;
mod controller;
mod error;
mod markup;
mod observer;
mod presenter;
mod raf;
mod timer;

use alloc::boxed::Box;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

pub use console::ConsoleSink;
pub use controller::Controller;
pub use error::SetupError;
pub use markup::{Markup, WebOptions};
pub use presenter::{DomHost, reveal_all};
pub use reveal_core::backend::Host;

use reveal_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Sets up a controller for the current document.
///
/// Waits for `DOMContentLoaded` if the document is still loading, then arms
/// the startup gate. Elements are registered once the gate opens and the
/// settle delay has passed.
///
/// The controller runs for the rest of the page whether or not the returned
/// handle is kept; the handle is only needed for [`Controller::trigger`].
///
/// # Errors
///
/// Returns an error if the configuration is invalid or there is no window or
/// document. Nothing on the page has been touched in that case.
pub fn start(options: WebOptions) -> Result<Controller, SetupError> {
    controller::start(options)
}

/// Module entry point: starts with the site defaults.
///
/// On failure every candidate is revealed immediately, so content never stays
/// hidden.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn start_reveal() {
    let options = WebOptions::default();
    match start(options.clone()) {
        Ok(controller) => expose_trigger(controller),
        Err(err) => {
            controller::warn(&err);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                reveal_all(&document, &options.markup, &options.config);
            }
        }
    }
}

/// Publishes `window.revealStart()`, which opens the startup gate by hand.
fn expose_trigger(controller: Controller) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let trigger = Closure::wrap(Box::new(move || controller.trigger()) as Box<dyn FnMut()>);
    let _ = js_sys::Reflect::set(&window, &JsValue::from_str("revealStart"), trigger.as_ref());
    trigger.forget();
}
