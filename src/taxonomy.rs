//! # Taxonomy Registry
//!
//! Static mapping of category → label → lexicon terms. The three categories are
//! fixed; labels and their terms come from configuration and never change after
//! the registry is built.
//!
//! Label order is the declaration order from the config file. It doubles as the
//! tie-break order when ranking, so it is preserved everywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{LabelCfg, TaxonomyCfg};
use crate::error::ConfigError;

/// One of the three fixed classification groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Needs,
    Decisions,
    Values,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Category; 3] = [Category::Needs, Category::Decisions, Category::Values];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Needs => "needs",
            Category::Decisions => "decisions",
            Category::Values => "values",
        }
    }

    /// Stable slot used by per-category arrays.
    pub(crate) fn index(&self) -> usize {
        match self {
            Category::Needs => 0,
            Category::Decisions => 1,
            Category::Values => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "needs" => Ok(Category::Needs),
            "decisions" => Ok(Category::Decisions),
            "values" => Ok(Category::Values),
            _ => Err(ConfigError::UnknownCategory(s.to_string())),
        }
    }
}

/// A label and its ordered lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconEntry {
    pub label: String,
    pub terms: Vec<String>,
}

/// Immutable registry of labels and terms for every category.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: [Vec<LexiconEntry>; 3],
}

impl Taxonomy {
    /// Build from the config section, rejecting duplicate labels within a category.
    pub fn from_config(cfg: &TaxonomyCfg) -> Result<Self, ConfigError> {
        Ok(Self {
            categories: [
                build_category(Category::Needs, &cfg.needs)?,
                build_category(Category::Decisions, &cfg.decisions)?,
                build_category(Category::Values, &cfg.values)?,
            ],
        })
    }

    /// Ordered labels of a category given by name.
    pub fn labels(&self, category: &str) -> Result<Vec<&str>, ConfigError> {
        let c = category.parse::<Category>()?;
        Ok(self.labels_of(c))
    }

    /// Ordered terms of a (category, label) pair given by name.
    pub fn terms(&self, category: &str, label: &str) -> Result<&[String], ConfigError> {
        let c = category.parse::<Category>()?;
        self.terms_of(c, label)
    }

    pub fn labels_of(&self, category: Category) -> Vec<&str> {
        self.entries(category)
            .iter()
            .map(|e| e.label.as_str())
            .collect()
    }

    pub fn terms_of(&self, category: Category, label: &str) -> Result<&[String], ConfigError> {
        self.entries(category)
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.terms.as_slice())
            .ok_or_else(|| ConfigError::UnknownLabel {
                category: category.to_string(),
                label: label.to_string(),
            })
    }

    pub fn contains(&self, category: Category, label: &str) -> bool {
        self.entries(category).iter().any(|e| e.label == label)
    }

    /// Entries of a category in declaration order.
    pub fn entries(&self, category: Category) -> &[LexiconEntry] {
        &self.categories[category.index()]
    }

    pub fn label_count(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn term_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.iter())
            .map(|e| e.terms.len())
            .sum()
    }
}

fn build_category(category: Category, labels: &[LabelCfg]) -> Result<Vec<LexiconEntry>, ConfigError> {
    let mut out: Vec<LexiconEntry> = Vec::with_capacity(labels.len());
    for l in labels {
        if out.iter().any(|e| e.label == l.label) {
            return Err(ConfigError::DuplicateLabel {
                category: category.to_string(),
                label: l.label.clone(),
            });
        }
        out.push(LexiconEntry {
            label: l.label.clone(),
            terms: l.terms.clone(),
        });
    }
    Ok(out)
}
