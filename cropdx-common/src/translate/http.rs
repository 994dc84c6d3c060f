//! LibreTranslate-compatible HTTP client
//!
//! `POST {base_url}/translate` with `{q, source, target, format, api_key?}`,
//! answer `{"translatedText": "..."}`. Every failure degrades to the phrase
//! table and then to the original text.

use super::{StaticTranslator, Translator};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Translation request failures (never surfaced to API clients)
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Remote translator with static fallback
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    fallback: StaticTranslator,
}

impl HttpTranslator {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build translation client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/translate", base_url.trim_end_matches('/')),
            api_key,
            fallback: StaticTranslator,
        })
    }

    /// One request to the remote service
    pub async fn request(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> std::result::Result<String, TranslateError> {
        let body = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        if parsed.translated_text.trim().is_empty() {
            return Err(TranslateError::Parse("empty translatedText".to_string()));
        }
        Ok(parsed.translated_text)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        match self.request(text, source, target).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation service failed, using fallback: {}", e);
                self.fallback.translate(text, source, target).await
            }
        }
    }
}
