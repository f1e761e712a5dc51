//! Error kinds surfaced by the classifier.
//!
//! Configuration problems are fatal at load time and never show up during an
//! analysis call. Input problems are reported to the caller before any scoring.

use std::path::PathBuf;

/// Errors raised while loading or validating a taxonomy/rule configuration,
/// and by registry lookups with unknown names.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown category `{0}` (expected needs, decisions or values)")]
    UnknownCategory(String),

    #[error("unknown label `{label}` in category `{category}`")]
    UnknownLabel { category: String, label: String },

    #[error("rule `{rule}` targets unknown label `{label}` in category `{category}`")]
    UnknownRuleTarget {
        rule: String,
        category: String,
        label: String,
    },

    #[error("duplicate label `{label}` in category `{category}`")]
    DuplicateLabel { category: String, label: String },

    #[error("duplicate rule name `{0}`")]
    DuplicateRule(String),

    #[error("rule `{rule}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid weight for {what}: {value}")]
    InvalidWeight { what: String, value: f64 },

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised for input that cannot be analyzed at all.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised at the boundary toward an external (model based) classifier.
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("external classifier is not configured")]
    Disabled,

    #[error("external classifier `{provider}` failed: {message}")]
    Provider { provider: String, message: String },

    #[error("failed to parse external classifier response as JSON")]
    UnparsableResponse { raw: String },
}
