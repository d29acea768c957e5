// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setup errors.

use alloc::string::String;

use reveal_core::config::ConfigError;
use wasm_bindgen::JsValue;

/// Why the controller could not be set up.
///
/// None of these reach the page: [`start_reveal`](crate::start_reveal) logs
/// the error and falls back to revealing everything.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    /// There is no global `window`.
    #[error("no global window")]
    NoWindow,
    /// The window has no document.
    #[error("window has no document")]
    NoDocument,
    /// A browser API threw.
    #[error("browser API failed: {0}")]
    Js(String),
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<JsValue> for SetupError {
    fn from(value: JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| String::from("non-string exception")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        assert_eq!(SetupError::NoWindow.to_string(), "no global window", "no window");
        let config = SetupError::from(ConfigError::ZeroStableWindow);
        assert_eq!(
            config.to_string(),
            ConfigError::ZeroStableWindow.to_string(),
            "config errors pass through"
        );
    }
}
