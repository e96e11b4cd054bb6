// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Autocomplete index over the shared word set.

use std::sync::Arc;

use tracing::debug;

use etymon_core::{EphemeralStore, EtymonError};

/// The single global sorted set holding every indexed word.
pub const WORDS_KEY: &str = "autocomplete:words";

/// Case-insensitive prefix index.
///
/// Words are stored lowercased with score 0, so the store orders them
/// lexicographically and a prefix query is a bounded range scan. Words are
/// never removed.
#[derive(Clone)]
pub struct AutocompleteIndex {
    store: Arc<dyn EphemeralStore>,
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

impl AutocompleteIndex {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// Index one word. Adding a known word changes nothing.
    pub async fn add_word(&self, word: &str) -> Result<(), EtymonError> {
        self.add_words(&[word]).await
    }

    /// Index a batch of words in one store round trip. Blank words are
    /// skipped.
    pub async fn add_words<S: AsRef<str>>(&self, words: &[S]) -> Result<(), EtymonError> {
        let members: Vec<String> = words
            .iter()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        if members.is_empty() {
            return Ok(());
        }
        self.store.sorted_set_add(WORDS_KEY, &members).await?;
        debug!(batch = members.len(), "words indexed");
        Ok(())
    }

    /// Up to `limit` indexed words starting with `prefix`, ascending.
    ///
    /// An empty prefix matches every word.
    pub async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>, EtymonError> {
        etymon_prometheus::record_autocomplete_query();
        if limit == 0 {
            return Ok(Vec::new());
        }
        let prefix = prefix.to_lowercase();
        self.store
            .sorted_set_range_by_prefix(WORDS_KEY, &prefix, limit)
            .await
    }

    /// Number of distinct indexed words.
    pub async fn count(&self) -> Result<u64, EtymonError> {
        let words = self.store.sorted_set_card(WORDS_KEY).await?;
        etymon_prometheus::set_vocabulary_size(words);
        Ok(words)
    }
}
