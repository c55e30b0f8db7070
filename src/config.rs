use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::extract::MIN_UNIT_CHARS;
use crate::provider::DEFAULT_DIRECT_URL;
use crate::render::DEFAULT_ERROR_DISPLAY;

/// Which provider variant translates paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Single free endpoint
    #[default]
    Direct,
    /// Ordered LibreTranslate-compatible endpoints
    Fallback,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "google" | "google-free" => Ok(ProviderKind::Direct),
            "fallback" | "libre" | "libretranslate" => Ok(ProviderKind::Fallback),
            other => anyhow::bail!(
                "unknown provider '{}' (expected 'direct' or 'fallback')",
                other
            ),
        }
    }
}

#[derive(Clone)]
pub struct TranslatorConfig {
    // Language pair
    pub source_lang: String,
    pub target_lang: String,

    // Provider
    pub provider: ProviderKind,
    pub direct_url: String,
    /// Replaces the default fallback endpoints when non-empty
    pub endpoints: Vec<String>,
    pub api_key: Option<String>,
    pub request_timeout: Duration,

    // Mode switching
    pub yield_every: usize,
    pub yield_pause: Duration,
    pub error_display: Duration,
    pub min_unit_chars: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "zh".to_string(),
            provider: ProviderKind::Direct,
            direct_url: DEFAULT_DIRECT_URL.to_string(),
            endpoints: Vec::new(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            yield_every: 5,
            yield_pause: Duration::from_millis(50),
            error_display: DEFAULT_ERROR_DISPLAY,
            min_unit_chars: MIN_UNIT_CHARS,
        }
    }
}

impl TranslatorConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Language pair
            source_lang: std::env::var("READER_SOURCE_LANG").unwrap_or(defaults.source_lang),
            target_lang: std::env::var("READER_TARGET_LANG").unwrap_or(defaults.target_lang),

            // Provider
            provider: match std::env::var("READER_PROVIDER") {
                Ok(value) => value
                    .parse::<ProviderKind>()
                    .context("Invalid READER_PROVIDER")?,
                Err(_) => defaults.provider,
            },
            direct_url: std::env::var("READER_DIRECT_URL").unwrap_or(defaults.direct_url),
            endpoints: std::env::var("READER_ENDPOINTS")
                .map(|v| parse_endpoints(&v))
                .unwrap_or_default(),
            api_key: std::env::var("READER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            request_timeout: std::env::var("READER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),

            // Mode switching
            yield_every: defaults.yield_every,
            yield_pause: defaults.yield_pause,
            error_display: defaults.error_display,
            min_unit_chars: defaults.min_unit_chars,
        })
    }
}

/// Comma-separated endpoint list, blanks dropped.
fn parse_endpoints(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

impl std::fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("provider", &self.provider)
            .field("direct_url", &self.direct_url)
            .field("endpoints", &self.endpoints)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("request_timeout", &self.request_timeout)
            .field("yield_every", &self.yield_every)
            .field("yield_pause", &self.yield_pause)
            .field("error_display", &self.error_display)
            .field("min_unit_chars", &self.min_unit_chars)
            .finish()
    }
}
