//! Paragraph extraction.
//!
//! Finds the main content container of a work page and turns its paragraphs
//! into ordered [`TextUnit`]s. Pages mix the chapter body with summaries,
//! author notes and prefaces that share the same generic content marker, so
//! container resolution walks a fixed selector list from most to least
//! structural and rejects matches that sit inside one of those regions.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::document::{DocumentPort, Matcher, NodeId, Selector};
use crate::error::{TranslateError, TranslateResult};
use crate::render::TRANSLATION_OUTPUT_CLASS;
use crate::retry::{with_retry, RetryConfig};

/// Paragraphs shorter than this (after trimming) are decorative, not content.
pub const MIN_UNIT_CHARS: usize = 3;

const CONTENT_MARKER: Matcher = Matcher::Class("userstuff");
const PARAGRAPH: Matcher = Matcher::Tag("p");

/// The coarse chapter wrapper. Paragraphs may live one `.userstuff` deeper.
const CHAPTERS: Selector = Selector::new(Matcher::Id("chapters"));

/// Container candidates, first match wins.
pub const CONTAINER_SELECTORS: [Selector; 7] = [
    Selector::within(Matcher::Id("chapters"), CONTENT_MARKER),
    CHAPTERS,
    Selector::new(CONTENT_MARKER),
    Selector::within(Matcher::Class("chapter"), CONTENT_MARKER),
    Selector::new(Matcher::Class("chapter")),
    Selector::within(Matcher::Attr("role", "article"), CONTENT_MARKER),
    Selector::new(Matcher::Attr("role", "article")),
];

/// Regions a content-marker container must not be nested in.
const NON_BODY_REGIONS: [Matcher; 3] = [
    Matcher::Class("summary"),
    Matcher::Class("notes"),
    Matcher::Class("preface"),
];

/// Regions whose paragraphs are never translated.
const METADATA_REGIONS: [Matcher; 4] = [
    Matcher::Class("summary"),
    Matcher::Class("notes"),
    Matcher::Class("preface"),
    Matcher::Class("afterword"),
];

/// One translatable paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Position among qualifying paragraphs, starting at 0. A
    /// [`ParagraphIndex`] replaces it with the page-lifetime number.
    pub index: usize,
    /// Trimmed text snapshot taken at extraction time
    pub source_text: String,
    /// Where derived content for this paragraph is attached
    pub anchor: NodeId,
}

#[derive(Debug, Clone)]
pub struct TextUnitExtractor {
    min_chars: usize,
}

impl Default for TextUnitExtractor {
    fn default() -> Self {
        Self::new(MIN_UNIT_CHARS)
    }
}

impl TextUnitExtractor {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Extract the ordered paragraphs of `document`.
    ///
    /// Returns an empty vector when no container resolves or nothing
    /// qualifies; the page may simply not have finished rendering.
    pub fn extract<D>(&self, document: &D) -> Vec<TextUnit>
    where
        D: DocumentPort + ?Sized,
    {
        let Some((container, selector)) = Self::resolve_container(document) else {
            warn!("No content container found");
            return Vec::new();
        };
        debug!("Using content container {} ({})", container, selector);

        let mut candidates = document.query_all(container, &PARAGRAPH);
        if candidates.is_empty() && selector == CHAPTERS {
            if let Some(body) = Self::nested_content(document, container) {
                debug!("No paragraphs directly under {}, descending into {}", selector, body);
                candidates = document.query_all(body, &PARAGRAPH);
            }
        }

        let units: Vec<TextUnit> = candidates
            .into_iter()
            .filter(|node| !document.matches(*node, &Matcher::Class(TRANSLATION_OUTPUT_CLASS)))
            .filter(|node| document.closest(*node, &METADATA_REGIONS).is_none())
            .filter_map(|node| {
                let text = document.text_content(node).trim().to_string();
                (text.chars().count() >= self.min_chars).then_some((node, text))
            })
            .enumerate()
            .map(|(index, (anchor, source_text))| TextUnit {
                index,
                source_text,
                anchor,
            })
            .collect();

        info!("Found {} translatable paragraphs", units.len());
        units
    }

    /// Like [`extract`](Self::extract), but reports an empty result as
    /// [`TranslateError::ExtractionEmpty`].
    pub fn require_units<D>(&self, document: &D) -> TranslateResult<Vec<TextUnit>>
    where
        D: DocumentPort + ?Sized,
    {
        let units = self.extract(document);
        if units.is_empty() {
            return Err(TranslateError::ExtractionEmpty);
        }
        Ok(units)
    }

    /// Extract, retrying after a delay while the page yields nothing.
    pub async fn extract_with_retry<D>(
        &self,
        document: &D,
        retry: &RetryConfig,
    ) -> TranslateResult<Vec<TextUnit>>
    where
        D: DocumentPort + ?Sized,
    {
        with_retry(retry, "Paragraph extraction", || async move {
            self.require_units(document)
        })
        .await
    }

    fn resolve_container<D>(document: &D) -> Option<(NodeId, Selector)>
    where
        D: DocumentPort + ?Sized,
    {
        for selector in CONTAINER_SELECTORS {
            let Some(node) = document.query_first(&selector) else {
                continue;
            };
            if selector.target == CONTENT_MARKER
                && document.closest(node, &NON_BODY_REGIONS).is_some()
            {
                debug!("{} matched inside summary/notes, trying next selector", selector);
                continue;
            }
            return Some((node, selector));
        }
        None
    }

    /// First content marker under `container` that is not a metadata region.
    fn nested_content<D>(document: &D, container: NodeId) -> Option<NodeId>
    where
        D: DocumentPort + ?Sized,
    {
        document
            .query_all(container, &CONTENT_MARKER)
            .into_iter()
            .find(|node| document.closest(*node, &METADATA_REGIONS).is_none())
    }
}

/// Page-lifetime paragraph numbering.
///
/// Extraction numbers paragraphs by position, which shifts when content is
/// detached or inserted ahead of them. A registry gives each anchor a number
/// the first time it is seen and keeps it; numbers are never reused.
#[derive(Debug, Default)]
pub struct ParagraphIndex {
    assigned: HashMap<NodeId, usize>,
    next: usize,
}

impl ParagraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite each unit's index to the number its anchor was first given.
    pub fn assign(&mut self, units: &mut [TextUnit]) {
        let next = &mut self.next;
        for unit in units.iter_mut() {
            unit.index = *self.assigned.entry(unit.anchor).or_insert_with(|| {
                let index = *next;
                *next += 1;
                index
            });
        }
    }

    pub fn get(&self, anchor: NodeId) -> Option<usize> {
        self.assigned.get(&anchor).copied()
    }

    /// Anchors numbered so far, detached ones included.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
