use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::translate::Translator;

/// Ordered, duplicate-free list of scenario titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    titles: Vec<String>,
}

impl ScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every new title found in `raw_text`; returns how many were added.
    pub fn accumulate(&mut self, raw_text: &str) -> usize {
        let mut seen: HashSet<String> = self.titles.iter().cloned().collect();
        let before = self.titles.len();
        for line in split_lines(raw_text) {
            if seen.insert(line.clone()) {
                self.titles.push(line);
            }
        }
        self.titles.len() - before
    }

    pub fn clear(&mut self) {
        self.titles.clear();
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// One English sentence and its translated counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLine {
    pub english: String,
    pub translation: String,
}

/// Split on line breaks, trim, and drop blank lines.
pub fn split_lines(raw_text: &str) -> Vec<String> {
    raw_text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Union the titles in `raw_text` into a copy of `existing`.
pub fn accumulate_scenarios(raw_text: &str, existing: &ScenarioSet) -> ScenarioSet {
    let mut next = existing.clone();
    next.accumulate(raw_text);
    next
}

/// Fallback shown in place of a translation that could not be fetched.
pub fn unavailable_translation(reason: &AppError) -> String {
    format!("Translation unavailable: {}", reason)
}

/// Pair every non-blank line of `raw_text` with its translation.
///
/// All lines are translated concurrently; each future carries its line index and
/// the results are written back by index, so output order always matches input
/// order. A failed line gets the "unavailable" fallback and never fails the batch.
pub async fn format_conversation(
    raw_text: &str,
    translator: &dyn Translator,
    target_lang: &str,
) -> Vec<ConversationLine> {
    let lines = split_lines(raw_text);
    let total = lines.len();
    debug!("Formatting conversation: {} lines -> {}", total, target_lang);

    let tasks = lines.into_iter().enumerate().map(move |(index, english)| async move {
        let translation = match translator.translate(&english, target_lang).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation failed for line {}: {}", index, e);
                unavailable_translation(&e)
            }
        };
        (index, ConversationLine { english, translation })
    });

    let mut slots: Vec<Option<ConversationLine>> = vec![None; total];
    for (index, line) in join_all(tasks).await {
        slots[index] = Some(line);
    }
    slots.into_iter().flatten().collect()
}
