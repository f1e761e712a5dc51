//! Score aggregation: per-(category, label) accumulators, rounding and ranking.
//!
//! Scores start at 0 and only grow. Lexicon hits and rule boosts are folded in,
//! then each category is rounded to 2 decimals, stably sorted by descending
//! score (ties keep declaration order) and optionally truncated.

use serde::{Deserialize, Serialize};

use crate::analyze::matcher::LabelMatch;
use crate::analyze::rules::RuleApplication;
use crate::classification::AnalysisResult;
use crate::taxonomy::{Category, Taxonomy};

/// Accumulated evidence for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub label: String,
    pub score: f64,
    #[serde(default)]
    pub matched_terms: Vec<String>,
    #[serde(default)]
    pub rationale: Vec<String>,
}

impl ScoreEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score: 0.0,
            matched_terms: Vec::new(),
            rationale: Vec::new(),
        }
    }
}

/// Call-local working state; one entry per configured label.
#[derive(Debug, Clone)]
pub struct Accumulator {
    categories: [Vec<ScoreEntry>; 3],
}

impl Accumulator {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let init = |c: Category| {
            taxonomy
                .labels_of(c)
                .into_iter()
                .map(ScoreEntry::new)
                .collect::<Vec<_>>()
        };
        Self {
            categories: [
                init(Category::Needs),
                init(Category::Decisions),
                init(Category::Values),
            ],
        }
    }

    fn entry_mut(&mut self, category: Category, label: &str) -> Option<&mut ScoreEntry> {
        self.categories[category.index()]
            .iter_mut()
            .find(|e| e.label == label)
    }

    /// Fold lexicon results for one category.
    pub fn add_matches(&mut self, category: Category, matches: Vec<LabelMatch>) {
        for m in matches {
            if let Some(e) = self.entry_mut(category, &m.label) {
                e.score += m.score;
                for t in m.matched_terms {
                    if !e.matched_terms.contains(&t) {
                        e.matched_terms.push(t);
                    }
                }
            }
        }
    }

    /// Fold one rule application; targets may span several categories.
    pub fn apply_rule(&mut self, app: &RuleApplication) {
        for b in &app.boosts {
            let line = app.rationale_for(b);
            if let Some(e) = self.entry_mut(b.category, &b.label) {
                e.score += b.weight;
                e.rationale.push(line);
            }
        }
    }

    /// Round, rank and (when `top_n` is set) truncate every category.
    pub fn finish(self, top_n: Option<usize>) -> AnalysisResult {
        let [needs, decisions, values] = self.categories;
        AnalysisResult {
            needs: rank(needs, top_n),
            decisions: rank(decisions, top_n),
            values: rank(values, top_n),
        }
    }
}

/// Round to 2 decimals, half away from zero.
///
/// Ties are judged on the binary value of `x * 100.0`: `0.125` is exact and
/// rounds up to `0.13`, while `1.005` is stored just below the tie and rounds
/// down to `1.0`.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Stable descending sort by rounded score; ties keep input order.
pub fn rank(mut entries: Vec<ScoreEntry>, top_n: Option<usize>) -> Vec<ScoreEntry> {
    for e in entries.iter_mut() {
        e.score = round2(e.score);
    }
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(n) = top_n {
        entries.truncate(n);
    }
    entries
}
