//! Language registry: Single source of truth for all supported languages.
//!
//! Clients declare languages by display name ("Spanish", "Auto Detect"), while
//! the translation provider speaks ISO 639-1 codes. This table is the closed
//! mapping between the two. It uses a singleton pattern with `OnceLock` so the
//! table is built once and shared read-only afterwards.

use serde::Serialize;
use std::sync::OnceLock;

/// Display name a client uses to ask for provider-side language detection.
pub const AUTO_DETECT_NAME: &str = "Auto Detect";

/// Provider code that requests language detection.
pub const AUTO_DETECT_CODE: &str = "auto";

/// Code used for destination names that are not in the table.
pub const DEFAULT_TARGET_CODE: &str = "en";

/// Configuration for a supported language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageConfig {
    /// Display name used by clients (e.g., "English", "Auto Detect")
    pub name: &'static str,

    /// Provider code (e.g., "en", "auto")
    pub code: &'static str,

    /// Native name of the language (e.g., "Español", "日本語")
    pub native_name: &'static str,
}

/// Global language registry singleton.
///
/// Initialized once on first access and immutable thereafter.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Look up a language by its display name (exact match).
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.name == name)
    }

    /// All entries, including the auto-detect pseudo-language.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    let language = |name, code, native_name| LanguageConfig {
        name,
        code,
        native_name,
    };

    vec![
        language("English", "en", "English"),
        language("Spanish", "es", "Español"),
        language("French", "fr", "Français"),
        language("German", "de", "Deutsch"),
        language("Japanese", "ja", "日本語"),
        language("Korean", "ko", "한국어"),
        language(AUTO_DETECT_NAME, AUTO_DETECT_CODE, AUTO_DETECT_NAME),
    ]
}
