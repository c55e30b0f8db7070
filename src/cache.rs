//! Per-paragraph translation cache.
//!
//! Keyed by the paragraph's extraction index. A blank value is never a valid
//! translation: `set` refuses to store one, and `get` purges one if it is
//! found so the next lookup fetches again.

use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct TranslationCache {
    entries: HashMap<usize, String>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached translation for `index`, or `None` on a miss.
    pub fn get(&mut self, index: usize) -> Option<String> {
        let blank = self.entries.get(&index)?.trim().is_empty();
        if blank {
            warn!("Purging empty cached translation for paragraph {}", index);
            self.entries.remove(&index);
            return None;
        }
        self.entries.get(&index).cloned()
    }

    /// Store a translation. Blank text is ignored.
    pub fn set(&mut self, index: usize, text: &str) {
        if text.trim().is_empty() {
            debug!("Not caching empty translation for paragraph {}", index);
            return;
        }
        self.entries.insert(index, text.to_string());
    }

    pub fn invalidate(&mut self, index: usize) {
        self.entries.remove(&index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    fn insert_raw(&mut self, index: usize, text: &str) {
        self.entries.insert(index, text.to_string());
    }
}
