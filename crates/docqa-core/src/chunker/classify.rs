//! Pure line classifier used by the chunker.

use once_cell::sync::Lazy;
use regex::Regex;

static MD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.*)$").expect("valid heading regex"));
static KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\n:]{1,40}:\s+.+$").expect("valid key-value regex"));

pub const ROW_DELIMITERS: [char; 4] = [',', ';', '|', '\t'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Carries the heading text with markup removed.
    Heading(String),
    KeyValue,
    Row { delimiter: char },
    Plain,
}

impl LineKind {
    pub fn is_row(&self) -> bool {
        matches!(self, LineKind::Row { .. })
    }
}

/// Classify a trimmed, non-empty line. Checks run in order: heading,
/// key-value, row, plain.
pub fn classify(line: &str) -> LineKind {
    if let Some(heading) = heading_text(line) {
        return LineKind::Heading(heading);
    }
    if KEY_VALUE.is_match(line) {
        return LineKind::KeyValue;
    }
    if let Some(delimiter) = row_delimiter(line) {
        return LineKind::Row { delimiter };
    }
    LineKind::Plain
}

fn heading_text(line: &str) -> Option<String> {
    if let Some(caps) = MD_HEADING.captures(line) {
        let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        return (!text.is_empty()).then(|| text.to_string());
    }
    // short title-case line without trailing punctuation
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=12).contains(&words.len()) {
        return None;
    }
    let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
    let ends_alnum = line.chars().next_back().is_some_and(char::is_alphanumeric);
    if !starts_upper || !ends_alnum {
        return None;
    }
    let capitalized = words.iter().filter(|w| w.chars().next().is_some_and(char::is_uppercase)).count();
    let ratio = capitalized as f32 / words.len() as f32;
    (ratio > 0.6).then(|| line.trim().to_string())
}

fn row_delimiter(line: &str) -> Option<char> {
    ROW_DELIMITERS.into_iter().find(|d| line.matches(*d).count() >= 2)
}
