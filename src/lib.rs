// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod classification;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod taxonomy;

// Lexical engine (matcher, negation, rules, scoring) + external boundary + debug routes
pub mod analyze;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{Engine, Mode, ScoreEntry};
pub use crate::api::router;
pub use crate::classification::{AnalysisResult, Classification, ClassificationSource, LabelScore};
pub use crate::config::CompassConfig;
pub use crate::error::{ConfigError, ExternalError, InputError};
pub use crate::taxonomy::{Category, Taxonomy};
