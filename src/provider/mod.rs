//! Translation providers.
//!
//! [`Translate`] is the seam the controller calls through. [`Provider`] is the
//! closed set of HTTP-backed implementations selected from configuration:
//! a single free endpoint ([`DirectProvider`]) or an ordered list of
//! LibreTranslate-compatible endpoints tried in turn
//! ([`FallbackChainProvider`]).

mod direct;
mod fallback;
mod mock;
mod validator;

pub use direct::{DirectProvider, DEFAULT_DIRECT_URL};
pub use fallback::{FallbackChainProvider, DEFAULT_ENDPOINTS};
pub use mock::{MockMode, MockTranslator};
pub use validator::{TranslationValidator, ValidationReport};

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{ProviderKind, TranslatorConfig};
use crate::error::{FailureCause, TranslateError, TranslateResult};

/// Longest error body kept from a failed HTTP response.
const ERROR_BODY_LIMIT: usize = 100;

#[async_trait]
pub trait Translate: Send + Sync {
    /// Translate `text` from the configured source to the target language.
    async fn translate(&self, text: &str) -> TranslateResult<String>;

    fn provider_name(&self) -> &str;
}

#[derive(Debug)]
pub enum Provider {
    Direct(DirectProvider),
    FallbackChain(FallbackChainProvider),
}

impl Provider {
    pub fn from_config(config: &TranslatorConfig) -> TranslateResult<Self> {
        let provider = match config.provider {
            ProviderKind::Direct => Provider::Direct(DirectProvider::new(
                &config.direct_url,
                &config.source_lang,
                &config.target_lang,
                config.request_timeout,
            )?),
            ProviderKind::Fallback => Provider::FallbackChain(FallbackChainProvider::new(
                config.endpoints.clone(),
                &config.source_lang,
                &config.target_lang,
                config.api_key.clone(),
                config.request_timeout,
            )?),
        };
        Ok(provider)
    }
}

#[async_trait]
impl Translate for Provider {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        match self {
            Provider::Direct(direct) => direct.translate(text).await,
            Provider::FallbackChain(chain) => chain.translate(text).await,
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Provider::Direct(direct) => direct.provider_name(),
            Provider::FallbackChain(chain) => chain.provider_name(),
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> TranslateResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TranslateError::Client(e.to_string()))
}

/// Map a transport-level reqwest error onto a failure cause.
pub(crate) fn classify_send_error(error: &reqwest::Error, timeout: Duration) -> FailureCause {
    if error.is_timeout() {
        FailureCause::Timeout(timeout)
    } else {
        FailureCause::Network(error.to_string())
    }
}

/// Read a response body, failing on non-2xx status or a blank body.
pub(crate) async fn read_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, FailureCause> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(FailureCause::Http {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_send_error(&e, timeout))?;
    if body.trim().is_empty() {
        return Err(FailureCause::Malformed("empty response body".to_string()));
    }
    Ok(body)
}
