//! Reading-mode state machine.
//!
//! A [`ModeController`] owns the current [`ReadingMode`] and the translation
//! cache for one document. Every [`switch_mode`](ModeController::switch_mode)
//! call re-extracts paragraphs, walks them in order and drives the rendering
//! port. Paragraph numbers come from a [`ParagraphIndex`] so a cached
//! translation stays with its paragraph when the page changes between switches. Paragraph failures are recovered locally so one bad response never
//! stops the rest of the chapter from rendering.
//!
//! Switches may overlap (a reader clicking "original" while a translation pass
//! is still fetching). Each switch takes a generation number; a pass whose
//! generation is no longer current stops before its next render call, so the
//! latest request always determines what is on screen.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::config::TranslatorConfig;
use crate::document::DocumentPort;
use crate::error::TranslateResult;
use crate::document::NodeId;
use crate::extract::{ParagraphIndex, TextUnit, TextUnitExtractor};
use crate::metrics::TranslationMetrics;
use crate::provider::{Provider, Translate, TranslationValidator};
use crate::render::RenderingPort;

const PROGRESS_MESSAGE: &str = "Translating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadingMode {
    /// Source text only
    #[default]
    Original,
    /// Translation replaces the source text
    Translated,
    /// Source text followed by its translation
    Bilingual,
}

impl ReadingMode {
    fn needs_translation(self) -> bool {
        !matches!(self, ReadingMode::Original)
    }
}

impl fmt::Display for ReadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadingMode::Original => "original",
            ReadingMode::Translated => "translated",
            ReadingMode::Bilingual => "bilingual",
        };
        f.write_str(name)
    }
}

impl FromStr for ReadingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(ReadingMode::Original),
            "translated" | "translation" => Ok(ReadingMode::Translated),
            "bilingual" => Ok(ReadingMode::Bilingual),
            other => anyhow::bail!(
                "unknown reading mode '{}' (expected original, translated or bilingual)",
                other
            ),
        }
    }
}

/// How one paragraph's translation was resolved during a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Hit(String),
    Fetched(String),
    Failed(String),
}

impl TranslationOutcome {
    fn text(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Hit(text) | TranslationOutcome::Fetched(text) => Some(text),
            TranslationOutcome::Failed(_) => None,
        }
    }
}

/// Summary of a single `switch_mode` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub mode: ReadingMode,
    /// Paragraph index and outcome, for translating modes
    pub outcomes: Vec<(usize, TranslationOutcome)>,
    /// Paragraphs whose anchor was detached before they could be rendered
    pub skipped: usize,
    /// Superseded by a later switch before finishing
    pub cancelled: bool,
    /// The controller was already in the requested mode
    pub unchanged: bool,
}

impl SwitchReport {
    fn new(mode: ReadingMode) -> Self {
        Self {
            mode,
            outcomes: Vec::new(),
            skipped: 0,
            cancelled: false,
            unchanged: false,
        }
    }

    pub fn hits(&self) -> usize {
        self.count(|o| matches!(o, TranslationOutcome::Hit(_)))
    }

    pub fn fetched(&self) -> usize {
        self.count(|o| matches!(o, TranslationOutcome::Fetched(_)))
    }

    pub fn failures(&self) -> usize {
        self.count(|o| matches!(o, TranslationOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&TranslationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

pub struct ModeController {
    mode: Mutex<ReadingMode>,
    cache: Mutex<TranslationCache>,
    indices: Mutex<ParagraphIndex>,
    generation: AtomicU64,
    translator: Arc<dyn Translate>,
    extractor: TextUnitExtractor,
    metrics: TranslationMetrics,
    yield_every: usize,
    yield_pause: Duration,
}

impl ModeController {
    pub fn new(translator: Arc<dyn Translate>) -> Self {
        let defaults = TranslatorConfig::default();
        Self {
            mode: Mutex::new(ReadingMode::Original),
            cache: Mutex::new(TranslationCache::new()),
            indices: Mutex::new(ParagraphIndex::new()),
            generation: AtomicU64::new(0),
            translator,
            extractor: TextUnitExtractor::new(defaults.min_unit_chars),
            metrics: TranslationMetrics::new(),
            yield_every: defaults.yield_every,
            yield_pause: defaults.yield_pause,
        }
    }

    /// Build a controller around the provider selected by `config`.
    pub fn from_config(config: &TranslatorConfig) -> TranslateResult<Self> {
        let provider = Provider::from_config(config)?;
        info!("Using translation provider: {}", provider.provider_name());
        Ok(Self::new(Arc::new(provider))
            .with_extractor(TextUnitExtractor::new(config.min_unit_chars))
            .with_yield(config.yield_every, config.yield_pause))
    }

    pub fn with_extractor(mut self, extractor: TextUnitExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Pause for `pause` after every `every` paragraphs; `0` never pauses.
    pub fn with_yield(mut self, every: usize, pause: Duration) -> Self {
        self.yield_every = every;
        self.yield_pause = pause;
        self
    }

    pub fn mode(&self) -> ReadingMode {
        *self.lock_mode()
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    pub fn translator(&self) -> &dyn Translate {
        self.translator.as_ref()
    }

    /// Cached translation for paragraph `index`, if any.
    pub fn cached(&self, index: usize) -> Option<String> {
        self.lock_cache().get(index)
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Page-lifetime number given to the paragraph at `anchor`.
    pub fn index_of(&self, anchor: NodeId) -> Option<usize> {
        self.lock_indices().get(anchor)
    }

    fn lock_mode(&self) -> MutexGuard<'_, ReadingMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, TranslationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_indices(&self) -> MutexGuard<'_, ParagraphIndex> {
        self.indices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Switch the document to `target`.
    ///
    /// Returns [`TranslateError::ExtractionEmpty`](crate::error::TranslateError::ExtractionEmpty)
    /// when the document has no
    /// translatable paragraphs; the mode is updated regardless.
    pub async fn switch_mode<D, R>(
        &self,
        target: ReadingMode,
        document: &D,
        renderer: &R,
    ) -> TranslateResult<SwitchReport>
    where
        D: DocumentPort + ?Sized,
        R: RenderingPort + ?Sized,
    {
        let generation = {
            let mut mode = self.lock_mode();
            if *mode == target {
                debug!("Already in {} mode", target);
                let mut report = SwitchReport::new(target);
                report.unchanged = true;
                return Ok(report);
            }
            *mode = target;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        info!("Switching to {} mode", target);

        let mut units = self.extractor.require_units(document)?;
        self.lock_indices().assign(&mut units);
        let mut report = SwitchReport::new(target);

        for (position, unit) in units.iter().enumerate() {
            if target.needs_translation()
                && self.yield_every > 0
                && position > 0
                && position % self.yield_every == 0
            {
                tokio::time::sleep(self.yield_pause).await;
            }
            if !self.is_current(generation) {
                report.cancelled = true;
                break;
            }
            if !renderer.is_attached(unit.anchor) {
                warn!("Paragraph {} is no longer attached, skipping", unit.index);
                report.skipped += 1;
                continue;
            }

            if !target.needs_translation() {
                if Self::render_original(unit, renderer).is_err() {
                    report.skipped += 1;
                }
                continue;
            }

            let outcome = self.resolve(unit, renderer).await;
            if !self.is_current(generation) {
                debug!("Switch to {} superseded at paragraph {}", target, unit.index);
                report.cancelled = true;
                break;
            }
            match Self::render_translation(target, unit, &outcome, renderer) {
                Ok(()) => report.outcomes.push((unit.index, outcome)),
                Err(e) => {
                    warn!("Could not render paragraph {}: {}", unit.index, e);
                    report.skipped += 1;
                }
            }
        }

        if report.cancelled {
            info!("Switch to {} cancelled by a newer request", target);
        } else {
            info!(
                "Switched to {} mode: {} cached, {} fetched, {} failed, {} skipped",
                target,
                report.hits(),
                report.fetched(),
                report.failures(),
                report.skipped
            );
        }
        Ok(report)
    }

    /// Restore the original text, drop every cached translation and return
    /// to [`ReadingMode::Original`]. Any switch in progress is cancelled and
    /// the metrics start over. Paragraph numbers are kept.
    pub fn reset<D, R>(&self, document: &D, renderer: &R)
    where
        D: DocumentPort + ?Sized,
        R: RenderingPort + ?Sized,
    {
        {
            let mut mode = self.lock_mode();
            *mode = ReadingMode::Original;
            self.generation.fetch_add(1, Ordering::SeqCst);
        }

        for unit in self.extractor.extract(document) {
            if let Err(e) = Self::render_original(&unit, renderer) {
                debug!("Reset skipped paragraph {}: {}", unit.index, e);
            }
        }
        self.lock_cache().clear();
        self.metrics.reset();
        info!("Reader reset to original mode");
    }

    /// Cache lookup, falling back to the provider on a miss.
    async fn resolve<R>(&self, unit: &TextUnit, renderer: &R) -> TranslationOutcome
    where
        R: RenderingPort + ?Sized,
    {
        if let Some(text) = self.lock_cache().get(unit.index) {
            self.metrics.record_cache_hit();
            return TranslationOutcome::Hit(text);
        }
        self.metrics.record_cache_miss();

        if let Err(e) = renderer.show_progress(unit.anchor, PROGRESS_MESSAGE) {
            debug!("No progress indicator for paragraph {}: {}", unit.index, e);
        }

        self.metrics.record_api_call();
        let result = self
            .translator
            .translate(&unit.source_text)
            .await
            .and_then(|raw| TranslationValidator::finalize(&unit.source_text, &raw));

        if let Err(e) = renderer.clear_progress(unit.anchor) {
            debug!("Could not clear progress for paragraph {}: {}", unit.index, e);
        }

        match result {
            Ok(text) => {
                self.lock_cache().set(unit.index, &text);
                TranslationOutcome::Fetched(text)
            }
            Err(e) => {
                self.metrics.record_api_failure();
                warn!("Translation of paragraph {} failed: {}", unit.index, e);
                TranslationOutcome::Failed(e.to_string())
            }
        }
    }

    fn render_original<R>(unit: &TextUnit, renderer: &R) -> TranslateResult<()>
    where
        R: RenderingPort + ?Sized,
    {
        renderer.show_original(unit.anchor)?;
        renderer.remove_translation(unit.anchor)
    }

    fn render_translation<R>(
        mode: ReadingMode,
        unit: &TextUnit,
        outcome: &TranslationOutcome,
        renderer: &R,
    ) -> TranslateResult<()>
    where
        R: RenderingPort + ?Sized,
    {
        let Some(text) = outcome.text() else {
            renderer.show_original(unit.anchor)?;
            let message = match outcome {
                TranslationOutcome::Failed(reason) => format!("Translation failed: {}", reason),
                _ => "Translation failed".to_string(),
            };
            return renderer.show_error(unit.anchor, &message);
        };

        if mode == ReadingMode::Translated {
            renderer.hide_original(unit.anchor)?;
        } else {
            renderer.show_original(unit.anchor)?;
        }
        renderer.show_translation(unit.anchor, text)
    }
}

impl fmt::Debug for ModeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode())
            .field("provider", &self.translator.provider_name())
            .field("cached", &self.cache_len())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}
