//! Negation detector: a local, syntax-free heuristic.
//!
//! A hit is negated when a cue word appears as a whole word in the `window_chars`
//! characters right before it. No scope tracking across clauses, no double
//! negation: "not sure, but I feel strong" keeps "strong" only if the cue falls
//! outside the window.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Cue words, matched case-insensitively as whole words.
pub const NEGATION_CUES: [&str; 11] = [
    "no", "not", "don't", "dont", "never", "isn't", "ain't", "can't", "cannot", "won't", "without",
];

static CUE_RE: Lazy<Regex> = Lazy::new(|| {
    let alts = NEGATION_CUES
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alts})\b")).expect("negation cue regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegationDetector {
    window_chars: usize,
}

impl NegationDetector {
    pub fn new(window_chars: usize) -> Self {
        Self { window_chars }
    }

    pub fn window_chars(&self) -> usize {
        self.window_chars
    }

    /// See [`is_negated`].
    pub fn is_negated(&self, text: &str, match_index: usize) -> bool {
        is_negated(text, match_index, self.window_chars)
    }
}

/// True if a negation cue occurs in the `window_chars` characters preceding the
/// byte offset `match_index` (clamped to the start of the string).
pub fn is_negated(text: &str, match_index: usize, window_chars: usize) -> bool {
    if window_chars == 0 {
        return false;
    }
    let window = preceding_window(text, match_index, window_chars);
    if window.is_empty() {
        return false;
    }
    // Typographic apostrophes ("don’t") count as plain ones.
    let window: Cow<'_, str> = if window.contains('\u{2019}') {
        Cow::Owned(window.replace('\u{2019}', "'"))
    } else {
        Cow::Borrowed(window)
    };
    CUE_RE.is_match(&window)
}

/// Up to `window_chars` characters ending at `idx`.
fn preceding_window(text: &str, idx: usize, window_chars: usize) -> &str {
    let mut end = idx.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .nth(window_chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &head[start..]
}
