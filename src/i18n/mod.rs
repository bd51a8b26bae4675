//! Internationalization (i18n) module.
//!
//! Everything that maps client-facing language names to provider codes lives
//! here, together with the counters that describe translation traffic.
//!
//! # Architecture
//!
//! - `registry`: the closed table of supported languages and their codes
//! - `language`: `LanguageTag` plus lenient name-to-code resolution
//! - `metrics`: per-gateway translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use polyglot_relay::i18n::{resolve_source_code, resolve_target_code};
//!
//! assert_eq!(resolve_target_code("Spanish"), "es");
//! assert_eq!(resolve_target_code("Nonexistent"), "en");
//! assert_eq!(resolve_source_code(None), "auto");
//! ```

mod language;
mod metrics;
mod registry;

pub use language::{resolve_source_code, resolve_target_code, source_label, LanguageTag};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{
    LanguageConfig, LanguageRegistry, AUTO_DETECT_CODE, AUTO_DETECT_NAME, DEFAULT_TARGET_CODE,
};
