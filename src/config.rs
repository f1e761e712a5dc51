// src/config.rs
//! Configuration schema (TOML) for taxonomy, lexicons, matching weights and rules.
//!
//! Resolution order:
//! - `COMPASS_CONFIG_PATH` set → read that file (errors are fatal).
//! - otherwise → the built-in `config/compass.toml` embedded at build time.
//!
//! `COMPASS_TOP_N` optionally overrides `matching.top_n`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;

// --- env names & defaults ---
pub const ENV_CONFIG_PATH: &str = "COMPASS_CONFIG_PATH";
pub const ENV_TOP_N: &str = "COMPASS_TOP_N";

pub const DEFAULT_WORD_WEIGHT: f64 = 1.0;
pub const DEFAULT_PHRASE_WEIGHT: f64 = 1.7;
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_NEGATION_WINDOW: usize = 14;

const BUILTIN_CONFIG: &str = include_str!("../config/compass.toml");

fn default_word_weight() -> f64 {
    DEFAULT_WORD_WEIGHT
}
fn default_phrase_weight() -> f64 {
    DEFAULT_PHRASE_WEIGHT
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_true() -> bool {
    true
}
fn default_negation_window() -> usize {
    DEFAULT_NEGATION_WINDOW
}

/// Root of the TOML document.
#[derive(Debug, Clone, Deserialize)]
pub struct CompassConfig {
    #[serde(default)]
    pub matching: MatchingCfg,
    #[serde(default)]
    pub negation: NegationCfg,
    pub taxonomy: TaxonomyCfg,
    #[serde(default)]
    pub rules: Vec<RuleCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingCfg {
    #[serde(default = "default_word_weight")]
    pub word_weight: f64,
    #[serde(default = "default_phrase_weight")]
    pub phrase_weight: f64,
    /// Entries kept per category in the default (truncated) mode.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Lowercase text and terms before matching. The only mode the shipped config uses.
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
}

impl Default for MatchingCfg {
    fn default() -> Self {
        Self {
            word_weight: DEFAULT_WORD_WEIGHT,
            phrase_weight: DEFAULT_PHRASE_WEIGHT,
            top_n: DEFAULT_TOP_N,
            case_insensitive: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NegationCfg {
    /// Characters inspected before a lexicon hit.
    #[serde(default = "default_negation_window")]
    pub window_chars: usize,
}

impl Default for NegationCfg {
    fn default() -> Self {
        Self {
            window_chars: DEFAULT_NEGATION_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyCfg {
    #[serde(default)]
    pub needs: Vec<LabelCfg>,
    #[serde(default)]
    pub decisions: Vec<LabelCfg>,
    #[serde(default)]
    pub values: Vec<LabelCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelCfg {
    pub label: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleCfg {
    pub name: String,
    pub pattern: String, // regex (already escaped in TOML)
    /// When set, a match preceded by a negation cue within this many chars is skipped.
    #[serde(default)]
    pub negation_window: Option<usize>,
    #[serde(default)]
    pub boosts: Vec<BoostCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoostCfg {
    pub category: String,
    pub label: String,
    pub weight: f64,
}

impl CompassConfig {
    /// Parse and sanity-check a TOML string. Label/rule cross references are
    /// validated later, when the engine compiles the config.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let cfg: CompassConfig = toml::from_str(toml_str)?;
        cfg.check_matching()?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// The configuration shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// Resolve from the environment (see module docs).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) if !p.trim().is_empty() => {
                let path = PathBuf::from(p);
                info!(path = %path.display(), "loading compass config");
                Self::load_from_file(&path)?
            }
            _ => Self::builtin()?,
        };

        let raw = std::env::var(ENV_TOP_N).ok();
        if let Some(n) = parse_top_n_env(raw.as_deref()) {
            cfg.matching.top_n = n;
        } else if raw.is_some() {
            warn!(var = ENV_TOP_N, "ignoring invalid top-n override");
        }
        Ok(cfg)
    }

    fn check_matching(&self) -> Result<(), ConfigError> {
        check_weight("matching.word_weight", self.matching.word_weight)?;
        check_weight("matching.phrase_weight", self.matching.phrase_weight)?;
        if self.matching.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(())
    }
}

/// Weights must be finite and non-negative: scores only ever grow.
pub(crate) fn check_weight(what: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            what: what.to_string(),
            value,
        })
    }
}

// parse optional positive integer env
fn parse_top_n_env(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn builtin_config_parses_with_defaults() {
        let cfg = CompassConfig::builtin().expect("builtin config");
        assert_eq!(cfg.matching.top_n, 3);
        assert!((cfg.matching.phrase_weight - 1.7).abs() < 1e-9);
        assert!((cfg.matching.word_weight - 1.0).abs() < 1e-9);
        assert_eq!(cfg.negation.window_chars, 14);
        assert_eq!(cfg.taxonomy.needs.len(), 6);
        assert_eq!(cfg.taxonomy.decisions.len(), 6);
        assert_eq!(cfg.taxonomy.values.len(), 6);
        assert!(!cfg.rules.is_empty());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = CompassConfig::from_toml_str(
            r#"
[[taxonomy.needs]]
label = "Pity"
terms = ["poor me"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.matching.top_n, DEFAULT_TOP_N);
        assert!(cfg.matching.case_insensitive);
        assert_eq!(cfg.negation.window_chars, DEFAULT_NEGATION_WINDOW);
        assert!(cfg.rules.is_empty());
    }

    #[test]
    fn rejects_bad_matching_values() {
        let neg = "[matching]\nword_weight = -1.0\n[taxonomy]\n";
        assert!(matches!(
            CompassConfig::from_toml_str(neg),
            Err(ConfigError::InvalidWeight { .. })
        ));
        let zero = "[matching]\ntop_n = 0\n[taxonomy]\n";
        assert!(matches!(
            CompassConfig::from_toml_str(zero),
            Err(ConfigError::ZeroTopN)
        ));
        assert!(matches!(
            CompassConfig::from_toml_str("taxonomy = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn top_n_env_parsing() {
        assert_eq!(parse_top_n_env(Some(" 5 ")), Some(5));
        assert_eq!(parse_top_n_env(Some("0")), None);
        assert_eq!(parse_top_n_env(Some("many")), None);
        assert_eq!(parse_top_n_env(None), None);
    }

    #[test]
    #[serial]
    fn env_path_and_override_are_honoured() {
        let dir = std::env::temp_dir().join(format!("compass_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("compass.toml");
        fs::write(
            &path,
            "[[taxonomy.values]]\nlabel = \"Freedom\"\nterms = [\"free\"]\n",
        )
        .unwrap();

        std::env::set_var(ENV_CONFIG_PATH, &path);
        std::env::set_var(ENV_TOP_N, "2");
        let cfg = CompassConfig::from_env();
        std::env::remove_var(ENV_CONFIG_PATH);
        std::env::remove_var(ENV_TOP_N);

        let cfg = cfg.expect("config from env");
        assert_eq!(cfg.taxonomy.values[0].label, "Freedom");
        assert_eq!(cfg.matching.top_n, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    #[serial]
    fn missing_env_file_is_an_io_error() {
        std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/compass.toml");
        let res = CompassConfig::from_env();
        std::env::remove_var(ENV_CONFIG_PATH);
        assert!(matches!(res, Err(ConfigError::Io { .. })));
    }
}
