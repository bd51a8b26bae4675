//! Language tags and their lenient resolution to provider codes.
//!
//! A `LanguageTag` is whatever display name a client declared. It is never
//! rejected: unknown destination names resolve to English and unknown source
//! names resolve to auto-detection.

use crate::i18n::{LanguageRegistry, AUTO_DETECT_CODE, AUTO_DETECT_NAME, DEFAULT_TARGET_CODE};
use serde::Serialize;
use std::fmt;

/// A client-declared language preference (e.g., "Spanish").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The "Auto Detect" tag, used when a sender's declared language is unknown.
    pub fn auto_detect() -> Self {
        Self(AUTO_DETECT_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Resolve a destination language name to a provider code.
///
/// Unknown names fall back to English.
pub fn resolve_target_code(name: &str) -> &'static str {
    LanguageRegistry::get()
        .get_by_name(name)
        .map(|config| config.code)
        .unwrap_or(DEFAULT_TARGET_CODE)
}

/// Resolve an optional source language name to a provider code.
///
/// Absent, empty, "Auto Detect" and unknown names all resolve to `auto`.
pub fn resolve_source_code(name: Option<&str>) -> &'static str {
    match name {
        None | Some("") | Some(AUTO_DETECT_NAME) => AUTO_DETECT_CODE,
        Some(name) => LanguageRegistry::get()
            .get_by_name(name)
            .map(|config| config.code)
            .unwrap_or(AUTO_DETECT_CODE),
    }
}

/// The source label echoed back in successful results.
pub fn source_label(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => AUTO_DETECT_NAME.to_string(),
    }
}
