//! Term matcher: literal lexicon scanning per category.
//!
//! - Single words match only between non-word characters ("cap" never hits "escape").
//! - Phrases (terms with an internal space) match as contiguous substrings.
//! - Repeats count; occurrences of the *same* term never overlap.
//! - Each hit is checked by the negation detector; negated hits are dropped.

use std::borrow::Cow;

use crate::analyze::negation::NegationDetector;
use crate::config::MatchingCfg;
use crate::taxonomy::{Category, Taxonomy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermKind {
    Word,
    Phrase,
}

#[derive(Debug, Clone)]
struct CompiledTerm {
    /// Term as written in the config; reported in the matched-term trail.
    raw: String,
    /// Normalized needle actually searched for.
    needle: String,
    kind: TermKind,
}

#[derive(Debug, Clone)]
struct CompiledLexicon {
    label: String,
    terms: Vec<CompiledTerm>,
}

/// Per-label outcome of scanning one category.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatch {
    pub label: String,
    /// Weighted hit count (word hits × word weight + phrase hits × phrase weight).
    pub score: f64,
    /// Terms with at least one un-negated hit, first-hit order, no repeats.
    pub matched_terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TermMatcher {
    categories: [Vec<CompiledLexicon>; 3],
    word_weight: f64,
    phrase_weight: f64,
    case_insensitive: bool,
    negation: NegationDetector,
}

impl TermMatcher {
    pub fn new(taxonomy: &Taxonomy, matching: &MatchingCfg, negation: NegationDetector) -> Self {
        let compile = |c: Category| {
            taxonomy
                .entries(c)
                .iter()
                .map(|e| CompiledLexicon {
                    label: e.label.clone(),
                    terms: e
                        .terms
                        .iter()
                        .filter_map(|t| compile_term(t, matching.case_insensitive))
                        .collect(),
                })
                .collect::<Vec<_>>()
        };
        Self {
            categories: [
                compile(Category::Needs),
                compile(Category::Decisions),
                compile(Category::Values),
            ],
            word_weight: matching.word_weight,
            phrase_weight: matching.phrase_weight,
            case_insensitive: matching.case_insensitive,
            negation,
        }
    }

    /// Lowercase (when case-insensitive) so byte offsets stay consistent with needles.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Scan `text` against every label of `category`, in declaration order.
    pub fn match_category(&self, text: &str, category: Category) -> Vec<LabelMatch> {
        let hay = self.normalize(text);
        self.match_normalized(&hay, category)
    }

    pub(crate) fn match_normalized(&self, hay: &str, category: Category) -> Vec<LabelMatch> {
        self.categories[category.index()]
            .iter()
            .map(|lex| {
                let mut score = 0.0;
                let mut matched_terms: Vec<String> = Vec::new();
                for term in &lex.terms {
                    let (weight, hits) = match term.kind {
                        TermKind::Word => (self.word_weight, word_hits(hay, &term.needle)),
                        TermKind::Phrase => (self.phrase_weight, phrase_hits(hay, &term.needle)),
                    };
                    let kept = hits
                        .into_iter()
                        .filter(|&i| !self.negation.is_negated(hay, i))
                        .count();
                    if kept > 0 {
                        score += weight * kept as f64;
                        if !matched_terms.contains(&term.raw) {
                            matched_terms.push(term.raw.clone());
                        }
                    }
                }
                LabelMatch {
                    label: lex.label.clone(),
                    score,
                    matched_terms,
                }
            })
            .collect()
    }
}

fn compile_term(raw: &str, case_insensitive: bool) -> Option<CompiledTerm> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let needle = if case_insensitive {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    };
    let kind = if needle.contains(char::is_whitespace) {
        TermKind::Phrase
    } else {
        TermKind::Word
    };
    Some(CompiledTerm {
        raw: raw.to_string(),
        needle,
        kind,
    })
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start offsets of non-overlapping phrase occurrences (forward scan).
fn phrase_hits(hay: &str, needle: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(rel) = hay[pos..].find(needle) {
        let i = pos + rel;
        out.push(i);
        pos = i + needle.len();
    }
    out
}

/// Start offsets of word occurrences bounded by non-word characters.
fn word_hits(hay: &str, needle: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(rel) = hay[pos..].find(needle) {
        let i = pos + rel;
        let end = i + needle.len();
        let before_ok = hay[..i].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = hay[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            out.push(i);
            pos = end;
        } else {
            // retry one char further; a bounded hit may still start inside this candidate
            pos = i + hay[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out
}
