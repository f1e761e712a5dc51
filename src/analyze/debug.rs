//! Debug endpoints: inspect taxonomy/rules and preview untruncated analyses.
//! Mounted by `api::router` only when `DEBUG_ROUTES=1`.

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::AppState;
use crate::classification::AnalysisResult;
use crate::taxonomy::{Category, LexiconEntry};

#[derive(Debug, Serialize)]
pub struct TaxonomyOut {
    pub needs: Vec<LexiconEntry>,
    pub decisions: Vec<LexiconEntry>,
    pub values: Vec<LexiconEntry>,
}

#[derive(Debug, Serialize)]
pub struct RuleOut {
    pub name: String,
    pub pattern: String,
    pub negation_window: Option<usize>,
    pub boosts: Vec<crate::analyze::Boost>,
}

#[derive(Debug, Serialize)]
pub struct RulesOut {
    pub count: usize,
    pub rules: Vec<RuleOut>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/debug/taxonomy", get(get_taxonomy))
        .route("/debug/rules", get(get_rules))
        .route("/debug/preview", get(get_preview))
}

async fn get_taxonomy(State(state): State<AppState>) -> Json<TaxonomyOut> {
    let t = state.engine.taxonomy();
    Json(TaxonomyOut {
        needs: t.entries(Category::Needs).to_vec(),
        decisions: t.entries(Category::Decisions).to_vec(),
        values: t.entries(Category::Values).to_vec(),
    })
}

async fn get_rules(State(state): State<AppState>) -> Json<RulesOut> {
    let rules = state
        .engine
        .rules()
        .iter()
        .map(|r| RuleOut {
            name: r.name.clone(),
            pattern: r.pattern().to_string(),
            negation_window: r.negation_window,
            boosts: r.boosts.clone(),
        })
        .collect::<Vec<_>>();
    Json(RulesOut {
        count: rules.len(),
        rules,
    })
}

/// GET /debug/preview?text=... → every label with matched terms and rationale.
async fn get_preview(
    State(state): State<AppState>,
    Query(q): Query<PreviewQuery>,
) -> Json<AnalysisResult> {
    Json(state.engine.analyze_full(&q.text))
}
