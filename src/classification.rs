//! Result shapes handed to callers.
//!
//! `AnalysisResult` is the lexical engine's full-detail output. `Classification`
//! is the uniform shape shared by the lexical engine and external classifiers;
//! consumers branch on the explicit `source` tag instead of probing fields.

use serde::{Deserialize, Serialize};

use crate::analyze::scoring::ScoreEntry;
use crate::taxonomy::Category;

/// Ranked score entries for each category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub needs: Vec<ScoreEntry>,
    pub decisions: Vec<ScoreEntry>,
    pub values: Vec<ScoreEntry>,
}

impl AnalysisResult {
    pub fn category(&self, category: Category) -> &[ScoreEntry] {
        match category {
            Category::Needs => &self.needs,
            Category::Decisions => &self.decisions,
            Category::Values => &self.values,
        }
    }

    pub fn entry(&self, category: Category, label: &str) -> Option<&ScoreEntry> {
        self.category(category).iter().find(|e| e.label == label)
    }

    /// Score of a label, 0 when it was truncated away.
    pub fn score_of(&self, category: Category, label: &str) -> f64 {
        self.entry(category, label).map_or(0.0, |e| e.score)
    }

    pub fn into_classification(self, input: impl Into<String>) -> Classification {
        let conv = |v: Vec<ScoreEntry>| v.into_iter().map(LabelScore::from).collect();
        Classification {
            input: input.into(),
            source: ClassificationSource::Lexical,
            needs: conv(self.needs),
            decisions: conv(self.decisions),
            values: conv(self.values),
            rationale: None,
        }
    }
}

/// Where a classification came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationSource {
    /// Lexicon + rule engine.
    Lexical,
    /// Normalized response of an external model based classifier.
    External { provider: String },
}

/// Common per-label item: label, score and an optional explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl From<ScoreEntry> for LabelScore {
    fn from(e: ScoreEntry) -> Self {
        let mut parts = Vec::new();
        if !e.matched_terms.is_empty() {
            parts.push(format!("matched: {}", e.matched_terms.join(", ")));
        }
        parts.extend(e.rationale);
        Self {
            label: e.label,
            score: e.score,
            explanation: if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub input: String,
    pub source: ClassificationSource,
    pub needs: Vec<LabelScore>,
    pub decisions: Vec<LabelScore>,
    pub values: Vec<LabelScore>,
    /// Overall remark (external classifiers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Classification {
    pub fn category(&self, category: Category) -> &[LabelScore] {
        match category {
            Category::Needs => &self.needs,
            Category::Decisions => &self.decisions,
            Category::Values => &self.values,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.source, ClassificationSource::External { .. })
    }
}
