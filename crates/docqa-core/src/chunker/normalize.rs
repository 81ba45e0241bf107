use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\r\n]+").expect("valid inline-space regex"));
static AROUND_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("valid newline regex"));

/// NFC-normalize, replace NUL, collapse runs of intra-line whitespace and
/// trim around line breaks. Line breaks themselves are preserved.
pub fn normalize_text(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    let nfc = nfc.replace('\0', " ");
    let collapsed = INLINE_SPACE.replace_all(&nfc, " ");
    let trimmed = AROUND_NEWLINE.replace_all(&collapsed, "\n");
    trimmed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_spaces_but_keeps_lines() {
        let out = normalize_text("  a \t  b  \n\n   c\u{0}d  ");
        assert_eq!(out, "a b\n\nc d");
    }

    #[test]
    fn composes_unicode() {
        // "e" + combining acute accent
        let out = normalize_text("cafe\u{0301}");
        assert_eq!(out, "caf\u{e9}");
    }
}
