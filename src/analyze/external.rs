//! Boundary toward an external (model based) classifier.
//!
//! The model itself is opaque: an [`ExternalClassifier`] turns a prompt into raw
//! content. Everything after that is local and deterministic: JSON extraction,
//! envelope unwrapping and normalization into the canonical [`Classification`]
//! shape, so callers treat lexical and external results the same way.
//!
//! Shipped clients:
//! - [`DisabledClassifier`]: always `ExternalError::Disabled` (default).
//! - [`FixedResponseClassifier`]: canned content for tests/local runs
//!   (`EXTERNAL_CLASSIFIER_MODE=mock`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classification::{Classification, ClassificationSource, LabelScore};
use crate::error::ExternalError;
use crate::taxonomy::{Category, Taxonomy};

pub const ENV_EXTERNAL_MODE: &str = "EXTERNAL_CLASSIFIER_MODE";

/// Scores from external classifiers are clamped into this range.
pub const EXTERNAL_SCORE_MAX: f64 = 5.0;

#[async_trait]
pub trait ExternalClassifier: Send + Sync {
    /// Send the prompt and return the model's raw content.
    async fn complete(&self, prompt: &str) -> Result<String, ExternalError>;
    /// Provider name for diagnostics and the result's source tag.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynExternalClassifier = Arc<dyn ExternalClassifier>;

pub struct DisabledClassifier;

#[async_trait]
impl ExternalClassifier for DisabledClassifier {
    async fn complete(&self, _prompt: &str) -> Result<String, ExternalError> {
        Err(ExternalError::Disabled)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns the same content for every prompt.
#[derive(Debug, Clone)]
pub struct FixedResponseClassifier {
    pub content: String,
}

impl FixedResponseClassifier {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Neutral canned answer naming labels of the default taxonomy.
    pub fn neutral() -> Self {
        Self::new(
            r#"{"needs":[{"label":"Significance","score":1,"why":"Neutral hint (mock)"}],
"decisions":[{"label":"Necessity","score":1,"why":"Neutral hint (mock)"}],
"values":[{"label":"Growth","score":1,"why":"Neutral hint (mock)"}],
"rationale":"mock classifier"}"#,
        )
    }
}

#[async_trait]
impl ExternalClassifier for FixedResponseClassifier {
    async fn complete(&self, _prompt: &str) -> Result<String, ExternalError> {
        Ok(self.content.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory driven by `EXTERNAL_CLASSIFIER_MODE` (`mock` → canned client, else disabled).
pub fn build_from_env() -> DynExternalClassifier {
    match std::env::var(ENV_EXTERNAL_MODE).ok().as_deref() {
        Some("mock") => Arc::new(FixedResponseClassifier::neutral()),
        _ => Arc::new(DisabledClassifier),
    }
}

/// Strict instruction so the model returns JSON restricted to known labels.
pub fn build_prompt(taxonomy: &Taxonomy, text: &str) -> String {
    let list = |c: Category| taxonomy.labels_of(c).join(", ");
    format!(
        r#"You are a Behavior Compass analyst. Classify the user's short text into three groups with these allowed labels only.

Allowed:
- Needs: {needs}
- Decisions: {decisions}
- Values: {values}

Instructions:
1) Pick the top 3 per group (fewer is OK if evidence is weak).
2) Score each 0..5 (0 = no support, 5 = very strong).
3) Include a brief "why" (1-2 sentences) citing specific words/phrases from the text when possible.
4) Output STRICT JSON ONLY, no prose.

Return shape:
{{
  "input": string,
  "needs":   [{{"label": "...", "score": number, "why": "..."}}, ...],
  "decisions":[{{"label": "...", "score": number, "why": "..."}}, ...],
  "values":  [{{"label": "...", "score": number, "why": "..."}}, ...],
  "rationale": "1-2 sentences overall (optional)"
}}

User text:
"""{text}""""#,
        needs = list(Category::Needs),
        decisions = list(Category::Decisions),
        values = list(Category::Values),
        text = text.trim(),
    )
}

/// Parse the whole content as JSON, else the slice between the first `{` and the last `}`.
pub fn extract_json(content: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(content) {
        return Some(v);
    }
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

/// Unwrap chat-completion style envelopes down to the classification object.
fn unwrap_envelope(v: Value) -> Option<Value> {
    let inner = v
        .pointer("/choices/0/message/content")
        .or_else(|| v.pointer("/message/content"))
        .or_else(|| v.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    match inner {
        Some(content) => extract_json(&content),
        None if v.is_object() => Some(v),
        None => None,
    }
}

/// Normalize an external response object into the canonical shape:
/// unknown labels dropped, scores clamped to [0, 5], at most `top_n` items per
/// category (model order kept).
pub fn normalize_external(
    obj: &Value,
    input: &str,
    taxonomy: &Taxonomy,
    top_n: usize,
    provider: &str,
) -> Classification {
    let items = |c: Category| -> Vec<LabelScore> {
        obj.get(c.as_str())
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|it| {
                        let label = it.get("label").and_then(Value::as_str)?;
                        if !taxonomy.contains(c, label) {
                            debug!(category = %c, label, "dropping unknown external label");
                            return None;
                        }
                        let explanation = it
                            .get("why")
                            .or_else(|| it.get("rationale"))
                            .and_then(Value::as_str)
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_owned);
                        Some(LabelScore {
                            label: label.to_string(),
                            score: clamp_score(it.get("score")),
                            explanation,
                        })
                    })
                    .take(top_n)
                    .collect()
            })
            .unwrap_or_default()
    };

    let input = obj
        .get("input")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(input)
        .to_string();
    let rationale = obj
        .get("rationale")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    Classification {
        input,
        source: ClassificationSource::External {
            provider: provider.to_string(),
        },
        needs: items(Category::Needs),
        decisions: items(Category::Decisions),
        values: items(Category::Values),
        rationale,
    }
}

fn clamp_score(v: Option<&Value>) -> f64 {
    v.and_then(Value::as_f64)
        .filter(|x| x.is_finite())
        .map_or(0.0, |x| x.clamp(0.0, EXTERNAL_SCORE_MAX))
}

/// Prompt → external call → JSON extraction → normalization.
pub async fn classify_external(
    client: &dyn ExternalClassifier,
    taxonomy: &Taxonomy,
    text: &str,
    top_n: usize,
) -> Result<Classification, ExternalError> {
    let prompt = build_prompt(taxonomy, text);
    let content = client.complete(&prompt).await?;
    let parsed = extract_json(&content).and_then(unwrap_envelope);
    match parsed {
        Some(obj) => Ok(normalize_external(
            &obj,
            text,
            taxonomy,
            top_n,
            client.provider_name(),
        )),
        None => {
            warn!(provider = client.provider_name(), "unparsable external response");
            Err(ExternalError::UnparsableResponse { raw: content })
        }
    }
}
