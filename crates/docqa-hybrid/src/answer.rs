//! Extractive answer synthesis over retrieved contexts.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use docqa_core::chunker::{split_sentences, SentenceBoundary};
use docqa_core::config::AnswerSettings;

use crate::smalltalk;

pub const REFUSAL: &str = "I don't know based on the indexed documents.";

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9']+").expect("valid word regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// 1-based ranks of the contexts that contributed, ascending.
    pub cited: Vec<usize>,
}

impl Answer {
    fn uncited(text: &str) -> Self {
        Self { text: text.to_string(), cited: vec![] }
    }

    pub fn is_refusal(&self) -> bool { self.text == REFUSAL }
}

#[derive(Debug, Clone, Default)]
pub struct AnswerSynthesizer {
    settings: AnswerSettings,
}

impl AnswerSynthesizer {
    pub fn new(settings: AnswerSettings) -> Self { Self { settings } }

    /// Pick the query-overlapping sentences of the top contexts and cite them.
    ///
    /// Small talk short-circuits only when `strict` is off. The overlap guard
    /// (fewer than `min_overlap_tokens` distinct shared tokens means refusal)
    /// applies in both modes.
    pub fn synthesize(&self, query: &str, contexts: &[String], strict: bool) -> Answer {
        if !strict {
            if let Some(reply) = smalltalk::reply(query) {
                return Answer::uncited(reply);
            }
        }
        if contexts.is_empty() {
            return Answer::uncited(REFUSAL);
        }

        let query_words = word_set(query);
        let mut kept: Vec<String> = Vec::new();
        let mut cited = Vec::new();
        let mut shared: BTreeSet<String> = BTreeSet::new();
        for (i, context) in contexts.iter().take(self.settings.max_contexts).enumerate() {
            let mut scored: Vec<(BTreeSet<String>, String)> = split_sentences(context, SentenceBoundary::Any)
                .into_iter()
                .map(|s| (word_set(&s).intersection(&query_words).cloned().collect::<BTreeSet<_>>(), s))
                .filter(|(overlap, _)| !overlap.is_empty())
                .collect();
            // stable: equal overlap keeps sentence order
            scored.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
            scored.truncate(self.settings.sentences_per_context);
            if scored.is_empty() {
                continue;
            }
            cited.push(i + 1);
            for (overlap, sentence) in scored {
                shared.extend(overlap);
                kept.push(sentence);
            }
        }

        if kept.is_empty() || shared.len() < self.settings.min_overlap_tokens {
            return Answer::uncited(REFUSAL);
        }

        let body = trim_to_words(&kept.join(" "), self.settings.word_budget);
        let marks: String = cited.iter().map(|r| format!("[{}]", r)).collect();
        Answer { text: format!("{} {}", body, marks), cited }
    }
}

fn word_set(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Keep at most `limit` whitespace words; a cut body loses trailing `,.;:`
/// and gains an ellipsis.
fn trim_to_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return text.to_string();
    }
    let cut = words[..limit].join(" ");
    format!("{}\u{2026}", cut.trim_end_matches(&[',', '.', ';', ':'][..]))
}
