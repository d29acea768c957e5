// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup contract and startup options.

use alloc::format;
use alloc::string::String;

use reveal_core::config::RevealConfig;

/// Selectors, class names and event names the controller relies on.
///
/// The defaults match the stylesheet shipped with the site: candidates carry
/// `.reveal`, cascade containers also carry `.cascade`, and the `active`
/// class is what the stylesheet animates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markup {
    /// Selector for reveal candidates.
    pub candidate: &'static str,
    /// Class that makes a candidate stagger its direct children.
    pub cascade_class: &'static str,
    /// Class toggled on candidates that are revealed.
    pub active_class: &'static str,
    /// Selector for disclosure widgets whose contents are re-armed on toggle.
    pub disclosure: &'static str,
    /// Selector for a disclosure widget's content element.
    pub disclosure_content: &'static str,
    /// Id of the page loader element.
    pub loader_id: &'static str,
    /// Class the loader carries once it has finished.
    pub loader_hidden_class: &'static str,
    /// Window event the loader dispatches when it finishes.
    pub loader_event: &'static str,
}

impl Default for Markup {
    fn default() -> Self {
        Self::site()
    }
}

impl Markup {
    /// The markup used by the site's templates.
    #[must_use]
    pub const fn site() -> Self {
        Self {
            candidate: ".reveal",
            cascade_class: "cascade",
            active_class: "active",
            disclosure: "details.smooth-toggle",
            disclosure_content: ".smooth-content",
            loader_id: "page-loader",
            loader_hidden_class: "hidden",
            loader_event: "page-loader-finished",
        }
    }
}

/// Everything [`start`](crate::start) needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WebOptions {
    /// Decision tunables.
    pub config: RevealConfig,
    /// Markup contract.
    pub markup: Markup,
    /// Log every trace event to the browser console with a `[reveal]`
    /// prefix.
    pub debug: bool,
}

/// Formats a duration in milliseconds as a CSS time value.
#[must_use]
pub(crate) fn css_millis(ms: u64) -> String {
    format!("{ms}ms")
}

/// Formats the observer threshold ladder as a JS-friendly list for logs.
#[must_use]
pub(crate) fn describe_thresholds(thresholds: &[f64]) -> String {
    let mut out = String::from("[");
    for (i, t) in thresholds.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{t}"));
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_markup_defaults() {
        let m = Markup::default();
        assert_eq!(m.candidate, ".reveal", "candidate selector");
        assert_eq!(m.active_class, "active", "active class");
        assert_eq!(m.loader_event, "page-loader-finished", "loader event");
        assert_eq!(m.disclosure, "details.smooth-toggle", "disclosure widgets");
    }

    #[test]
    fn options_default_to_quiet_web_config() {
        let o = WebOptions::default();
        assert!(!o.debug, "console logging off");
        assert_eq!(o.config, RevealConfig::web(), "web preset");
    }

    #[test]
    fn css_formatting() {
        assert_eq!(css_millis(160), "160ms", "delay string");
        assert_eq!(
            describe_thresholds(&[0.0, 0.25, 1.0]),
            "[0, 0.25, 1]",
            "threshold list"
        );
    }
}
