//! Deterministic, network-free translator.
//!
//! Used by the controller tests and the integration suite to drive mode
//! switches without an HTTP endpoint. Counts calls so cache reuse can be
//! asserted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Translate;
use crate::error::{TranslateError, TranslateResult};

#[derive(Debug, Clone)]
pub enum MockMode {
    /// `"hello"` → `"hello_zh"`
    Suffix(String),

    /// Fixed source → translation table; unknown text fails
    Mappings(HashMap<String, String>),

    /// Every call fails with this message
    Error(String),

    /// Every call succeeds with whitespace
    Blank,
}

#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn suffix(target: &str) -> Self {
        Self::new(MockMode::Suffix(target.to_string()))
    }

    pub fn mappings<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(MockMode::Mappings(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(MockMode::Error(message.to_string()))
    }

    /// Simulated latency applied before every call resolves.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `translate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translate for MockTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.mode {
            MockMode::Suffix(target) => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                map.get(text)
                    .cloned()
                    .ok_or_else(|| TranslateError::ProviderRejected {
                        endpoint: "mock".to_string(),
                        message: format!("no mapping for {:?}", text),
                    })
            }
            MockMode::Error(message) => Err(TranslateError::ProviderNetwork {
                endpoint: "mock".to_string(),
                message: message.clone(),
            }),
            MockMode::Blank => Ok("  ".to_string()),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
