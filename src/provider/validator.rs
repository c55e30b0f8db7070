//! Sanity checks on provider output.
//!
//! A blank result is an error. A result that is suspiciously short compared
//! to its source, or that simply echoes the source back, is accepted but
//! reported as a warning.

use tracing::warn;

use crate::error::{TranslateError, TranslateResult};

/// Results shorter than this fraction of the source length are flagged.
const MIN_LENGTH_RATIO: f64 = 0.1;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make the translation unusable
    pub errors: Vec<String>,

    /// Suspicious but usable results
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub struct TranslationValidator;

impl TranslationValidator {
    /// Inspect a translation of `original` without modifying it.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let original = original.trim();
        let translated = translated.trim();

        if translated.is_empty() {
            report.errors.push("Translation is empty".to_string());
            return report;
        }

        let source_len = original.chars().count();
        let translated_len = translated.chars().count();
        if (translated_len as f64) < source_len as f64 * MIN_LENGTH_RATIO {
            report.warnings.push(format!(
                "Translation is unusually short: source has {} chars, translation has {}",
                source_len, translated_len
            ));
        }

        if source_len > 0 && translated == original {
            report
                .warnings
                .push("Translation is identical to the source text".to_string());
        }

        report
    }

    /// Trim a provider result and reject it if nothing is left.
    ///
    /// Warnings are logged; the trimmed text is returned as the accepted
    /// translation.
    pub fn finalize(original: &str, translated: &str) -> TranslateResult<String> {
        let report = Self::validate(original, translated);
        if report.has_errors() {
            return Err(TranslateError::ProviderEmptyResult);
        }
        if report.has_warnings() {
            warn!("Translation validation warnings: {:?}", report.warnings);
        }
        Ok(translated.trim().to_string())
    }
}
