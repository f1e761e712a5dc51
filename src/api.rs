use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shuttle_axum::axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analyze::external::{self, classify_external, DynExternalClassifier};
use crate::analyze::{debug, Engine};
use crate::classification::Classification;
use crate::error::{ExternalError, InputError};
use crate::metrics::{record_classification, record_error};

pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

/// Shared, read-only state: one engine for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub external: DynExternalClassifier,
}

impl AppState {
    pub fn new(engine: Engine, external: DynExternalClassifier) -> Self {
        Self {
            engine: Arc::new(engine),
            external,
        }
    }

    /// Engine from `COMPASS_CONFIG_PATH` (or the built-in config) + external client from env.
    pub fn from_env() -> anyhow::Result<Self> {
        let engine = Engine::from_env()?;
        Ok(Self::new(engine, external::build_from_env()))
    }
}

fn debug_routes_enabled() -> bool {
    std::env::var(ENV_DEBUG_ROUTES).ok().as_deref() == Some("1")
}

pub fn router(state: AppState) -> Router {
    let mut r = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/classify", post(classify))
        .route("/batch", post(classify_batch));
    if debug_routes_enabled() {
        r = r.merge(debug::router());
    }
    r.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassifyMode {
    Rules,
    Full,
    Ai,
}

impl std::str::FromStr for ClassifyMode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rules" => Ok(Self::Rules),
            "full" => Ok(Self::Full),
            "ai" => Ok(Self::Ai),
            other => Err(InputError::InvalidInput(format!(
                "unknown mode `{other}` (expected rules, full or ai)"
            ))),
        }
    }
}

// `mode` stays a raw string so a bad value gets the JSON error body, not axum's rejection.
#[derive(Deserialize)]
struct ClassifyQuery {
    #[serde(default)]
    mode: Option<String>,
}

impl ClassifyQuery {
    fn mode(&self) -> Result<ClassifyMode, InputError> {
        self.mode
            .as_deref()
            .map_or(Ok(ClassifyMode::Rules), str::parse)
    }
}

#[derive(Serialize)]
struct ClassifyResp {
    ok: bool,
    #[serde(flatten)]
    classification: Classification,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "ok": false, "error": message.into() }))).into_response()
}

/// Pull `text` out of a request body; anything but a JSON string is invalid input.
fn text_field(body: &[u8]) -> Result<String, InputError> {
    let v: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    text_of(&v)
}

fn text_of(v: &Value) -> Result<String, InputError> {
    match v.get("text") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(InputError::InvalidInput("`text` must be a string".into())),
        None => Err(InputError::InvalidInput("missing `text`".into())),
    }
}

/// Batch body: a JSON array of `{ "text": string }`. The first bad item rejects the batch.
fn batch_texts(body: &[u8]) -> Result<Vec<String>, InputError> {
    let v: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let items = v.as_array().ok_or_else(|| {
        InputError::InvalidInput("expected an array of `{ \"text\": string }` items".into())
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, it)| {
            text_of(it).map_err(|InputError::InvalidInput(msg)| {
                InputError::InvalidInput(format!("item {i}: {msg}"))
            })
        })
        .collect()
}

async fn classify(
    State(state): State<AppState>,
    Query(q): Query<ClassifyQuery>,
    body: Bytes,
) -> Response {
    let (mode, text) = match q.mode().and_then(|m| text_field(&body).map(|t| (m, t))) {
        Ok(v) => v,
        Err(e) => {
            record_error("invalid_input");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let classification = match mode {
        ClassifyMode::Rules => {
            record_classification("rules");
            state.engine.classify(&text)
        }
        ClassifyMode::Full => {
            record_classification("full");
            state.engine.analyze_full(&text).into_classification(text.as_str())
        }
        ClassifyMode::Ai => {
            record_classification("ai");
            let res = classify_external(
                state.external.as_ref(),
                state.engine.taxonomy(),
                &text,
                state.engine.top_n(),
            )
            .await;
            match res {
                Ok(c) => c,
                Err(ExternalError::Disabled) => {
                    record_error("external_disabled");
                    return error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        ExternalError::Disabled.to_string(),
                    );
                }
                Err(e) => {
                    warn!(error = %e, "external classification failed");
                    record_error("external_failed");
                    return error_response(StatusCode::BAD_GATEWAY, e.to_string());
                }
            }
        }
    };

    Json(ClassifyResp {
        ok: true,
        classification,
    })
    .into_response()
}

async fn classify_batch(State(state): State<AppState>, body: Bytes) -> Response {
    let texts = match batch_texts(&body) {
        Ok(t) => t,
        Err(e) => {
            record_error("invalid_input");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };
    let out = texts
        .iter()
        .map(|text| {
            record_classification("batch");
            state.engine.classify(text)
        })
        .collect::<Vec<_>>();
    Json(out).into_response()
}
