//! Compound pattern rules.
//!
//! A rule is pure data: a name, a regex over the raw input, and a list of
//! `(category, label, weight)` boosts. One generic loop applies every rule:
//! for each non-overlapping match, every boost is added to its label and one
//! rationale line per boost is recorded. Rules are strictly additive.
//!
//! TOML shape:
//! ```toml
//! [[rules]]
//! name = "lack_of_support"
//! pattern = '(?i)\bnobody\s+helps\b'
//! negation_window = 14   # optional
//! boosts = [
//!     { category = "needs",  label = "Pity",       weight = 1.0 },
//!     { category = "values", label = "Connection", weight = 1.0 },
//! ]
//! ```

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::analyze::negation::is_negated;
use crate::analyze::scoring::round2;
use crate::config::{check_weight, RuleCfg};
use crate::error::ConfigError;
use crate::taxonomy::{Category, Taxonomy};

/// One weighted target of a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boost {
    pub category: Category,
    pub label: String,
    pub weight: f64,
}

/// A compiled, validated rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pattern: Regex,
    pub negation_window: Option<usize>,
    pub boosts: Vec<Boost>,
}

impl Rule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// One match of one rule and the boosts it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleApplication {
    pub rule: String,
    /// Literal matched substring of the input.
    pub matched: String,
    /// Byte span of the match in the input.
    pub span: (usize, usize),
    pub boosts: Vec<Boost>,
}

impl RuleApplication {
    /// Human-readable trail line for one boost of this application.
    pub fn rationale_for(&self, boost: &Boost) -> String {
        rationale(&self.rule, boost.weight, &boost.label, &self.matched)
    }
}

/// e.g. ``rule `rule_breaking` +1.50 to Deviance via "broke the rules"``
///
/// Weights are rounded with `round2`, same as scores (`{:.2}` rounds ties to even).
pub fn rationale(rule: &str, weight: f64, label: &str, matched: &str) -> String {
    format!(
        "rule `{rule}` +{:.2} to {label} via \"{matched}\"",
        round2(weight)
    )
}

/// Ordered, immutable rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile and validate against the taxonomy. Any problem is a `ConfigError`.
    pub fn compile(cfgs: &[RuleCfg], taxonomy: &Taxonomy) -> Result<Self, ConfigError> {
        let mut rules: Vec<Rule> = Vec::with_capacity(cfgs.len());
        for rc in cfgs {
            if rules.iter().any(|r| r.name == rc.name) {
                return Err(ConfigError::DuplicateRule(rc.name.clone()));
            }
            let pattern = Regex::new(&rc.pattern).map_err(|e| ConfigError::InvalidPattern {
                rule: rc.name.clone(),
                source: e,
            })?;
            let boosts = rc
                .boosts
                .iter()
                .map(|b| {
                    let category = b.category.parse::<Category>()?;
                    if !taxonomy.contains(category, &b.label) {
                        return Err(ConfigError::UnknownRuleTarget {
                            rule: rc.name.clone(),
                            category: category.to_string(),
                            label: b.label.clone(),
                        });
                    }
                    check_weight(&format!("rule `{}` → {}", rc.name, b.label), b.weight)?;
                    Ok(Boost {
                        category,
                        label: b.label.clone(),
                        weight: b.weight,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;
            rules.push(Rule {
                name: rc.name.clone(),
                pattern,
                negation_window: rc.negation_window,
                boosts,
            });
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }

    /// Evaluate every rule, in declaration order, over the raw text.
    pub fn apply(&self, text: &str) -> Vec<RuleApplication> {
        let mut out = Vec::new();
        for rule in &self.rules {
            for m in rule.pattern.find_iter(text) {
                if m.as_str().is_empty() {
                    continue;
                }
                if let Some(win) = rule.negation_window {
                    if is_negated(text, m.start(), win) {
                        debug!(rule = %rule.name, "rule match negated");
                        continue;
                    }
                }
                out.push(RuleApplication {
                    rule: rule.name.clone(),
                    matched: m.as_str().to_string(),
                    span: (m.start(), m.end()),
                    boosts: rule.boosts.clone(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoostCfg, LabelCfg, TaxonomyCfg};

    fn taxonomy() -> Taxonomy {
        let l = |name: &str| LabelCfg {
            label: name.into(),
            terms: vec![],
        };
        Taxonomy::from_config(&TaxonomyCfg {
            needs: vec![l("Pity")],
            decisions: vec![l("Deviance"), l("Novelty")],
            values: vec![l("Connection")],
        })
        .unwrap()
    }

    fn boost(category: &str, label: &str, weight: f64) -> BoostCfg {
        BoostCfg {
            category: category.into(),
            label: label.into(),
            weight,
        }
    }

    fn rule(name: &str, pattern: &str, boosts: Vec<BoostCfg>) -> RuleCfg {
        RuleCfg {
            name: name.into(),
            pattern: pattern.into(),
            negation_window: None,
            boosts,
        }
    }

    #[test]
    fn every_match_applies_every_boost() {
        let set = RuleSet::compile(
            &[rule(
                "lack_of_support",
                r"(?i)\bnobody\s+helps\b",
                vec![boost("needs", "Pity", 1.0), boost("values", "Connection", 0.5)],
            )],
            &taxonomy(),
        )
        .unwrap();

        let apps = set.apply("Nobody helps. nobody helps me ever.");
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].matched, "Nobody helps");
        assert_eq!(apps[1].matched, "nobody helps");
        assert_eq!(apps[0].boosts.len(), 2);
        assert_eq!(apps[0].boosts[1].category, Category::Values);
        assert_eq!(
            apps[0].rationale_for(&apps[0].boosts[0]),
            "rule `lack_of_support` +1.00 to Pity via \"Nobody helps\""
        );
    }

    #[test]
    fn rationale_weight_matches_rounded_score() {
        let tax = taxonomy();
        let set = RuleSet::compile(
            &[rule("tiny", r"(?i)\bsigh\b", vec![boost("needs", "Pity", 0.125)])],
            &tax,
        )
        .unwrap();
        let apps = set.apply("sigh");
        assert_eq!(
            apps[0].rationale_for(&apps[0].boosts[0]),
            "rule `tiny` +0.13 to Pity via \"sigh\""
        );

        let mut acc = crate::analyze::scoring::Accumulator::new(&tax);
        acc.apply_rule(&apps[0]);
        let result = acc.finish(None);
        assert_eq!(result.needs[0].score, 0.13);
        assert!(result.needs[0].rationale[0].contains("+0.13"));
    }

    #[test]
    fn rules_run_in_declaration_order() {
        let set = RuleSet::compile(
            &[
                rule("second_word", r"rules", vec![boost("decisions", "Deviance", 1.0)]),
                rule("first_word", r"broke", vec![boost("decisions", "Deviance", 0.5)]),
            ],
            &taxonomy(),
        )
        .unwrap();
        let apps = set.apply("broke the rules");
        let names: Vec<_> = apps.iter().map(|a| a.rule.as_str()).collect();
        assert_eq!(names, vec!["second_word", "first_word"]);
        assert_eq!(set.names(), vec!["second_word", "first_word"]);
    }

    #[test]
    fn negation_window_override_skips_negated_matches() {
        let mut rc = rule(
            "trying_new",
            r"(?i)\btry\s+something\s+new\b",
            vec![boost("decisions", "Novelty", 1.0)],
        );
        rc.negation_window = Some(14);
        let set = RuleSet::compile(&[rc], &taxonomy()).unwrap();
        assert!(set.apply("I never try something new").is_empty());
        assert_eq!(set.apply("I try something new").len(), 1);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let tax = taxonomy();
        let bad_re = rule("bad", r"(unclosed", vec![]);
        assert!(matches!(
            RuleSet::compile(&[bad_re], &tax),
            Err(ConfigError::InvalidPattern { .. })
        ));

        let unknown_label = rule("x", r"x", vec![boost("needs", "Deviance", 1.0)]);
        assert!(matches!(
            RuleSet::compile(&[unknown_label], &tax),
            Err(ConfigError::UnknownRuleTarget { .. })
        ));

        let unknown_cat = rule("x", r"x", vec![boost("wants", "Pity", 1.0)]);
        assert!(matches!(
            RuleSet::compile(&[unknown_cat], &tax),
            Err(ConfigError::UnknownCategory(_))
        ));

        let negative = rule("x", r"x", vec![boost("needs", "Pity", -1.0)]);
        assert!(matches!(
            RuleSet::compile(&[negative], &tax),
            Err(ConfigError::InvalidWeight { .. })
        ));

        let dup = [rule("x", r"x", vec![]), rule("x", r"y", vec![])];
        assert!(matches!(
            RuleSet::compile(&dup, &tax),
            Err(ConfigError::DuplicateRule(_))
        ));
    }

    #[test]
    fn empty_matches_are_ignored() {
        let set = RuleSet::compile(
            &[rule("optional", r"x*", vec![boost("needs", "Pity", 1.0)])],
            &taxonomy(),
        )
        .unwrap();
        assert!(set.apply("abc").is_empty());
        assert_eq!(set.apply("axxb").len(), 1);
    }
}
