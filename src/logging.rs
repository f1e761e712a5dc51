// src/logging.rs
//! Tracing setup and anonymized dev diagnostics.
//!
//! Dev logging requires BOTH:
//!   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
//!   - COMPASS_DEV_LOG=1
//!
//! Raw input text is never logged, only a short hash of it.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::classification::AnalysisResult;

pub const ENV_DEV_LOG: &str = "COMPASS_DEV_LOG";

fn is_dev_env() -> bool {
    cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        )
}

pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    on && is_dev_env()
}

/// Install a compact fmt subscriber when dev logging is on. No-op otherwise,
/// and never panics if a global subscriber already exists.
pub fn init_dev_tracing() {
    if !dev_logging_enabled() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("behavior_compass=debug,compass=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// First 6 bytes of SHA-256 as hex.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Minimal dev log of one analysis: hashed id, leading label per category, rationale sample.
pub(crate) fn dev_log_analysis(text: &str, result: &AnalysisResult, rule_hits: usize) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let lead = |v: &[crate::analyze::scoring::ScoreEntry]| {
        v.first()
            .map(|e| format!("{}={:.2}", e.label, e.score))
            .unwrap_or_default()
    };
    let rationale: Vec<String> = result
        .needs
        .iter()
        .chain(&result.decisions)
        .chain(&result.values)
        .flat_map(|e| e.rationale.iter().cloned())
        .collect();
    info!(
        target: "compass",
        %id, rule_hits,
        needs = %lead(&result.needs),
        decisions = %lead(&result.decisions),
        values = %lead(&result.values),
        rationale = ?truncate_vec(&rationale, 5)
    );
}
