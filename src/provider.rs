use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default endpoint of Google's public translate API.
pub const DEFAULT_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Largest text (in characters) the provider accepts in one request.
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Translation provider error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),

    #[error("Text is {len} characters long, provider limit is {max}")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),
}

/// An external translation service.
///
/// Codes are provider codes (`en`, `es`, `auto`), already resolved from
/// display names by the gateway.
pub trait TranslationProvider: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source_code: &'a str,
        target_code: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// Client for the `translate_a/single` JSON endpoint.
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    api_url: String,
}

impl GoogleTranslateProvider {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn request(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", source_code),
                ("tl", target_code),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        parse_translation(&payload)
    }
}

impl TranslationProvider for GoogleTranslateProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source_code: &'a str,
        target_code: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.request(text, source_code, target_code))
    }
}

/// Extract the translated text from a `translate_a/single` payload.
///
/// The payload is a nested array: `[[["Hola", "Hello", ...], ...], null, "en", ...]`.
/// Long inputs come back split into several segments which are concatenated.
fn parse_translation(payload: &Value) -> Result<String, ProviderError> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::MalformedResponse("missing segment list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response contained no translated segments".to_string(),
        ));
    }

    if let Some(detected) = payload.get(2).and_then(Value::as_str) {
        debug!("Provider detected source language: {}", detected);
    }

    Ok(translated)
}
