use crate::i18n::{resolve_source_code, resolve_target_code, source_label, TranslationMetrics};
use crate::provider::{ProviderError, TranslationProvider, MAX_TEXT_CHARS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Text returned by the lookup endpoint when a translation fails.
pub const TRANSLATION_FAILED: &str = "Translation Failed";

/// Upper bound on a single provider call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    /// `source_language` is the declared source name (or "Auto Detect"),
    /// not the language the provider detected.
    Translated {
        text: String,
        source_language: String,
    },
    Failed {
        reason: String,
    },
}

impl TranslationResult {
    /// Translated text, or the literal failure marker.
    pub fn into_text_or_marker(self) -> String {
        match self {
            TranslationResult::Translated { text, .. } => text,
            TranslationResult::Failed { .. } => TRANSLATION_FAILED.to_string(),
        }
    }
}

/// Stateless adapter between language display names and the provider.
///
/// Cloning is cheap; clones share the provider and the metrics.
#[derive(Clone)]
pub struct TranslationGateway {
    provider: Arc<dyn TranslationProvider>,
    timeout: Duration,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationGateway {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    /// Set the bound on each provider call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text` into `dest_language_name`.
    ///
    /// Never fails: provider errors and timeouts come back as
    /// `TranslationResult::Failed`. Unknown destination names translate to
    /// English, unknown or absent source names request auto-detection.
    pub async fn translate(
        &self,
        text: &str,
        dest_language_name: &str,
        source_language_name: Option<&str>,
    ) -> TranslationResult {
        let target_code = resolve_target_code(dest_language_name);
        let source_code = resolve_source_code(source_language_name);

        match self.fetch(text, source_code, target_code).await {
            Ok(text) => TranslationResult::Translated {
                text,
                source_language: source_label(source_language_name),
            },
            Err(e) => {
                warn!(
                    "Translation {} → {} failed: {}",
                    source_code, target_code, e
                );
                TranslationResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> Result<String, ProviderError> {
        // Length is checked on the text as received, before trimming
        let len = text.chars().count();
        if len >= MAX_TEXT_CHARS {
            return Err(ProviderError::PayloadTooLong {
                len,
                max: MAX_TEXT_CHARS,
            });
        }

        let text = text.trim();
        if text.is_empty() || source_code == target_code {
            debug!("Skipping provider for {} → {}", source_code, target_code);
            self.metrics.record_skipped();
            return Ok(text.to_string());
        }

        self.metrics.record_provider_call();
        let call = self.provider.translate(text, source_code, target_code);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(translated)) => Ok(translated),
            Ok(Err(e)) => {
                self.metrics.record_provider_failure();
                Err(e)
            }
            Err(_) => {
                self.metrics.record_timeout();
                Err(ProviderError::Timeout(self.timeout))
            }
        }
    }
}
