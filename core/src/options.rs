#![deny(missing_docs)]

//! # Options & Configuration
//!
//! Per-call [`ValidationOptions`] and per-document [`ValidatorConfig`].
//!
//! Options are passed by reference down the recursive validation tree. A level
//! that needs a different value (e.g. the parameter validator after it has
//! decoded the style, or a media type injecting its content type) clones and
//! overrides locally; nothing is written back to the caller's value.

use serde::{Deserialize, Serialize};

/// Base scope used when a fragment is registered without a retrieval URI.
pub const DEFAULT_BASE_SCOPE: &str = "http://example.invalid/";

/// Content type assumed by parameters with `content` when none is requested.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Options for a single top-level validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Convert string instances to the declared primitive type.
    /// `None` uses the context default (on for parameters, off for schemas).
    #[serde(default)]
    pub coerce_types: Option<bool>,
    /// Run the parameter style decoder on string input.
    #[serde(default = "default_true")]
    pub parse_style: bool,
    /// Content type of the instance, used to pick among `content` entries.
    #[serde(default)]
    pub content_type: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            coerce_types: None,
            parse_style: true,
            content_type: None,
        }
    }
}

impl ValidationOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets type coercion explicitly.
    pub fn coerce_types(mut self, coerce: bool) -> Self {
        self.coerce_types = Some(coerce);
        self
    }

    /// Enables or disables style decoding.
    pub fn parse_style(mut self, parse: bool) -> Self {
        self.parse_style = parse;
        self
    }

    /// Sets the instance content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether coercion applies, falling back to `context_default` when unset.
    pub fn coercion_enabled(&self, context_default: bool) -> bool {
        self.coerce_types.unwrap_or(context_default)
    }
}

/// Construction-time settings shared by the validator objects of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    /// Content type used for `content` lookups when the call does not name one.
    pub default_content_type: String,
    /// Base URI for fragments registered without a retrieval URI.
    pub base_scope: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            base_scope: DEFAULT_BASE_SCOPE.to_string(),
        }
    }
}
