/// Which characters may open a new sentence after `.`, `!` or `?` plus whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceBoundary {
    /// ASCII upper-case letter, digit, `"`, `'` or `(`.
    Capitalized,
    /// Anything.
    Any,
}

impl SentenceBoundary {
    fn opens(self, c: char) -> bool {
        match self {
            SentenceBoundary::Capitalized => c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '('),
            SentenceBoundary::Any => true,
        }
    }
}

/// Collapse whitespace, then split after sentence-ending punctuation.
pub fn split_sentences(text: &str, boundary: SentenceBoundary) -> Vec<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Vec::new();
    }
    let chars: Vec<(usize, char)> = collapsed.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..chars.len().saturating_sub(1) {
        let (idx, c) = chars[i];
        if c == ' ' && matches!(chars[i - 1].1, '.' | '!' | '?') && boundary.opens(chars[i + 1].1) {
            push_trimmed(&mut out, &collapsed[start..idx]);
            start = idx + 1;
        }
    }
    push_trimmed(&mut out, &collapsed[start..]);
    out
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

/// Coarse token estimate: `round(1.3 × words)`, at least one word.
pub fn approx_tokens(s: &str) -> usize {
    let words = s.split_whitespace().count().max(1);
    (1.3 * words as f64).round() as usize
}
