// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser watchers and environment probes.
//!
//! Builds the `IntersectionObserver` and `MutationObserver` the controller
//! uses, converts observer entries into [`Sample`]s, and reads the user
//! preferences and capabilities that pick the registry mode.

use alloc::vec::Vec;

use js_sys::Array;
use kurbo::Rect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{
    Document, DomRectReadOnly, Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, MutationObserver, MutationObserverInit, Node, Window,
};

use reveal_core::config::RevealConfig;
use reveal_core::metric::Sample;
use reveal_core::registry::Environment;

use crate::markup::Markup;

/// Callback type shared by both observers: the first argument is the array
/// of entries or records.
pub(crate) type ObserverClosure = Closure<dyn FnMut(Array)>;

/// Reads the reduced-motion preference and intersection support.
pub(crate) fn environment(window: &Window) -> Environment {
    let reduced_motion = window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .is_some_and(|mq| mq.matches());
    let intersection_supported =
        js_sys::Reflect::has(window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false);
    Environment {
        reduced_motion,
        intersection_supported,
    }
}

/// Height of the layout viewport in CSS pixels.
pub(crate) fn viewport_height(window: &Window) -> f64 {
    window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0)
}

/// Creates the viewport watcher with the configured root margin and
/// threshold ladder.
pub(crate) fn intersection_observer(
    config: &RevealConfig,
    callback: &ObserverClosure,
) -> Result<IntersectionObserver, JsValue> {
    let thresholds = Array::new();
    for &t in config.thresholds {
        thresholds.push(&JsValue::from_f64(t));
    }
    let init = IntersectionObserverInit::new();
    init.set_root_margin(&config.root_margin_css());
    init.set_threshold(&thresholds);
    IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
}

/// Creates a mutation watcher over the whole subtree of `root`.
pub(crate) fn mutation_observer(
    root: &Node,
    callback: &ObserverClosure,
) -> Result<MutationObserver, JsValue> {
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(root, &init)?;
    Ok(observer)
}

/// Converts a DOM rectangle into viewport coordinates.
pub(crate) fn rect(r: &DomRectReadOnly) -> Rect {
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

/// The element's current bounding rectangle.
pub(crate) fn bounds(el: &Element) -> Rect {
    rect(&el.get_bounding_client_rect())
}

/// Builds the [`Sample`] for one observer entry.
pub(crate) fn sample(entry: &IntersectionObserverEntry, viewport_height: f64) -> Sample {
    let intersecting = entry.is_intersecting();
    Sample {
        bounds: Some(rect(&entry.bounding_client_rect())),
        clipped: intersecting.then(|| rect(&entry.intersection_rect())),
        viewport_height,
        intersecting,
    }
}

/// Every element matching `selector` at or below `node`, in document order.
pub(crate) fn matching(node: &Node, selector: &str) -> Vec<Element> {
    let mut out = Vec::new();
    let Some(el) = node.dyn_ref::<Element>() else {
        return out;
    };
    if el.matches(selector).unwrap_or(false) {
        out.push(el.clone());
    }
    if let Ok(list) = el.query_selector_all(selector) {
        for i in 0..list.length() {
            if let Some(found) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                out.push(found);
            }
        }
    }
    out
}

/// Whether the page loader is gone: absent, marked finished, or not
/// rendered.
pub(crate) fn loader_finished(window: &Window, document: &Document, markup: &Markup) -> bool {
    let Some(loader) = document.get_element_by_id(markup.loader_id) else {
        return true;
    };
    if loader.class_list().contains(markup.loader_hidden_class) {
        return true;
    }
    let Ok(Some(style)) = window.get_computed_style(&loader) else {
        return false;
    };
    let prop = |name: &str| style.get_property_value(name).unwrap_or_default();
    prop("display") == "none"
        || prop("visibility") == "hidden"
        || prop("opacity").parse::<f64>().is_ok_and(|o| o == 0.0)
}
