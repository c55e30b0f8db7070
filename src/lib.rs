//! In-page paragraph translation for long-form reading.
//!
//! Extracts the paragraphs of a chapter page, translates them through a
//! pluggable provider with per-paragraph caching, and switches the page
//! between original, translated and bilingual views.

pub mod cache;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod extract;
pub mod memory;
pub mod metrics;
pub mod provider;
pub mod render;
pub mod retry;

pub use cache::TranslationCache;
pub use config::{ProviderKind, TranslatorConfig};
pub use controller::{ModeController, ReadingMode, SwitchReport, TranslationOutcome};
pub use document::{DocumentPort, Matcher, NodeId, Selector};
pub use error::{EndpointFailure, FailureCause, TranslateError, TranslateResult};
pub use extract::{ParagraphIndex, TextUnit, TextUnitExtractor};
pub use memory::{Element, MemoryDocument};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use provider::{
    DirectProvider, FallbackChainProvider, MockMode, MockTranslator, Provider, Translate,
};
pub use render::RenderingPort;
pub use retry::RetryConfig;
