//! Ordered LibreTranslate-compatible endpoints, tried until one succeeds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{build_client, classify_send_error, read_body, Translate};
use crate::error::{EndpointFailure, FailureCause, TranslateError, TranslateResult};

/// Public instances used when no endpoint is configured.
pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://translate.argosopentech.com/translate",
    "https://libretranslate.de/translate",
    "https://libretranslate.com/translate",
];

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

pub struct FallbackChainProvider {
    client: reqwest::Client,
    endpoints: Vec<String>,
    source_lang: String,
    target_lang: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl FallbackChainProvider {
    /// An empty `endpoints` list falls back to [`DEFAULT_ENDPOINTS`].
    pub fn new(
        endpoints: Vec<String>,
        source_lang: &str,
        target_lang: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> TranslateResult<Self> {
        let endpoints = if endpoints.is_empty() {
            DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect()
        } else {
            endpoints
        };
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            client: build_client(timeout)?,
            endpoints,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            api_key,
            timeout,
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn request(&self, endpoint: &str, text: &str) -> Result<String, FailureCause> {
        let body = LibreRequest {
            q: text,
            source: &self.source_lang,
            target: &self.target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(endpoint)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.timeout))?;

        let raw = read_body(response, self.timeout).await?;
        let parsed: LibreResponse =
            serde_json::from_str(&raw).map_err(|e| FailureCause::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            if error.to_lowercase().contains("api key") {
                return Err(FailureCause::AuthRequired);
            }
            return Err(FailureCause::Rejected(error));
        }

        let translated = parsed
            .translated_text
            .ok_or(FailureCause::MissingTranslation)?;
        if translated.trim().is_empty() {
            return Err(FailureCause::Empty);
        }
        Ok(translated)
    }
}

#[async_trait]
impl Translate for FallbackChainProvider {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let mut failures = Vec::new();
        for endpoint in &self.endpoints {
            debug!("Trying translation endpoint {}", endpoint);
            match self.request(endpoint, text).await {
                Ok(translated) => {
                    if !failures.is_empty() {
                        info!(
                            "Endpoint {} succeeded after {} failed endpoint(s)",
                            endpoint,
                            failures.len()
                        );
                    }
                    return Ok(translated);
                }
                Err(cause) => {
                    warn!("Translation endpoint {} failed: {}", endpoint, cause);
                    failures.push(EndpointFailure::new(endpoint.as_str(), cause));
                }
            }
        }

        Err(TranslateError::ProviderAllEndpointsExhausted { failures })
    }

    fn provider_name(&self) -> &str {
        "LibreTranslate fallback chain"
    }
}

impl std::fmt::Debug for FallbackChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChainProvider")
            .field("endpoints", &self.endpoints)
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
