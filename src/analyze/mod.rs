// src/analyze/mod.rs
//! Analysis pipeline entry: the lexical classification engine.
//!
//! Order per call:
//! 1) fresh accumulator with every configured label at 0
//! 2) term matcher per category (lexicon hits, negation-filtered)
//! 3) rule engine once over the raw text (cross-category boosts + rationale)
//! 4) round, rank, truncate
//!
//! The engine is immutable after construction and holds no per-call state, so
//! one instance is shared (`Arc<Engine>`) across all request handlers.

pub mod debug;
pub mod external;
pub mod matcher;
pub mod negation;
pub mod rules;
pub mod scoring;

use serde_json::Value;
use tracing::info;

use crate::classification::{AnalysisResult, Classification};
use crate::config::CompassConfig;
use crate::error::{ConfigError, InputError};
use crate::logging::dev_log_analysis;
use crate::taxonomy::{Category, Taxonomy};

// Re-export convenient types.
pub use crate::analyze::matcher::{LabelMatch, TermMatcher};
pub use crate::analyze::negation::{is_negated, NegationDetector, NEGATION_CUES};
pub use crate::analyze::rules::{Boost, Rule, RuleApplication, RuleSet};
pub use crate::analyze::scoring::{Accumulator, ScoreEntry};

/// Output size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Keep the configured top-N entries per category.
    TopN,
    /// Keep every label; nothing is truncated.
    Full,
}

#[derive(Debug, Clone)]
pub struct Engine {
    taxonomy: Taxonomy,
    matcher: TermMatcher,
    rules: RuleSet,
    top_n: usize,
}

impl Engine {
    /// Validate and compile a configuration. All configuration errors surface here.
    pub fn new(cfg: CompassConfig) -> Result<Self, ConfigError> {
        let taxonomy = Taxonomy::from_config(&cfg.taxonomy)?;
        let rules = RuleSet::compile(&cfg.rules, &taxonomy)?;
        let matcher = TermMatcher::new(
            &taxonomy,
            &cfg.matching,
            NegationDetector::new(cfg.negation.window_chars),
        );
        info!(
            labels = taxonomy.label_count(),
            terms = taxonomy.term_count(),
            rules = rules.len(),
            top_n = cfg.matching.top_n,
            "compass engine ready"
        );
        Ok(Self {
            taxonomy,
            matcher,
            rules,
            top_n: cfg.matching.top_n,
        })
    }

    /// Engine over the shipped default configuration.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(CompassConfig::builtin()?)
    }

    /// Engine over the environment-resolved configuration (`COMPASS_CONFIG_PATH`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(CompassConfig::from_env()?)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Top-N ranked labels per category.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        self.aggregate(text, Mode::TopN)
    }

    /// Every label per category, ranked, nothing dropped.
    pub fn analyze_full(&self, text: &str) -> AnalysisResult {
        self.aggregate(text, Mode::Full)
    }

    /// Analyze dynamically typed input; anything but a JSON string is rejected
    /// before any scoring happens.
    pub fn analyze_value(&self, input: &Value) -> Result<AnalysisResult, InputError> {
        match input {
            Value::String(s) => Ok(self.analyze(s)),
            other => Err(InputError::InvalidInput(format!(
                "expected text, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Lexical analysis in the uniform classification shape.
    pub fn classify(&self, text: &str) -> Classification {
        self.analyze(text).into_classification(text)
    }

    /// Lexical terms per label for one category (no rules, no ranking).
    pub fn match_terms(&self, text: &str, category: Category) -> Vec<LabelMatch> {
        self.matcher.match_category(text, category)
    }

    /// Rule applications for `text` in production order.
    pub fn apply_rules(&self, text: &str) -> Vec<RuleApplication> {
        self.rules.apply(text)
    }

    /// The whole pipeline. A pure function of (text, configuration).
    pub fn aggregate(&self, text: &str, mode: Mode) -> AnalysisResult {
        let mut acc = Accumulator::new(&self.taxonomy);

        let hay = self.matcher.normalize(text);
        for c in Category::ALL {
            acc.add_matches(c, self.matcher.match_normalized(&hay, c));
        }

        let applications = self.rules.apply(text);
        for app in &applications {
            acc.apply_rule(app);
        }
        if !applications.is_empty() {
            ::metrics::counter!("compass_rule_applications_total")
                .increment(applications.len() as u64);
        }

        let top_n = match mode {
            Mode::TopN => Some(self.top_n),
            Mode::Full => None,
        };
        let result = acc.finish(top_n);
        dev_log_analysis(text, &result, applications.len());
        result
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eng() -> Engine {
        Engine::builtin().expect("builtin engine")
    }

    #[test]
    fn default_sentence_surfaces_support_and_obligation() {
        let r = eng().analyze("I hate feeling like I have to do everything on my own.");
        assert_eq!(r.needs[0].label, "Pity");
        assert_eq!(r.decisions[0].label, "Necessity");
        // "have to" (1.7) + forced_obligation rule (1.0)
        assert_eq!(r.decisions[0].score, 2.7);
        assert_eq!(r.decisions[0].matched_terms, vec!["have to"]);
        assert_eq!(r.decisions[0].rationale.len(), 1);
        // "on my own" (1.7) vs lack_of_support boost (1.0) on Connection
        assert_eq!(r.values[0].label, "Freedom");
        assert_eq!(r.values[1].label, "Connection");
    }

    #[test]
    fn analyze_value_rejects_non_text() {
        let e = eng();
        assert!(e.analyze_value(&json!("I am strong")).is_ok());
        assert_eq!(
            e.analyze_value(&json!(42)),
            Err(InputError::InvalidInput("expected text, got a number".into()))
        );
        assert!(e.analyze_value(&Value::Null).is_err());
    }

    #[test]
    fn full_mode_keeps_every_label() {
        let e = eng();
        let full = e.analyze_full("");
        for c in Category::ALL {
            assert_eq!(full.category(c).len(), e.taxonomy().labels_of(c).len());
        }
        let top = e.analyze("");
        for c in Category::ALL {
            assert_eq!(top.category(c).len(), 3);
        }
    }

    #[test]
    fn shared_across_threads() {
        let e = std::sync::Arc::new(eng());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let e = e.clone();
                std::thread::spawn(move || e.analyze("I blacked out and broke the rules"))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn engine_rejects_rule_with_unknown_label() {
        let mut cfg = CompassConfig::builtin().unwrap();
        cfg.rules[0].boosts[0].label = "Chaos".into();
        assert!(matches!(
            Engine::new(cfg),
            Err(ConfigError::UnknownRuleTarget { .. })
        ));
    }
}
