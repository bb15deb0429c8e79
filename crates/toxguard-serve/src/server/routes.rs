use crate::error::AppError;
use crate::page::{self, ScoreView};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use toxguard_core::{Prediction, SubtypeLabel, ToxicityLabel};
use toxguard_telemetry::metrics::{record_error, record_prediction};
use tracing::{info, warn};

// ============================================================================
// Health and metrics
// ============================================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "scorer": state.scorer.name() }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

// ============================================================================
// Form
// ============================================================================

const EMPTY_COMMENT_NOTICE: &str = "Please enter a comment to analyze.";

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

pub async fn index() -> Result<Html<String>, AppError> {
    Ok(Html(page::render(None)?))
}

pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CommentForm>,
) -> Result<Html<String>, AppError> {
    if form.comment.trim().is_empty() {
        return Ok(Html(page::render_notice(EMPTY_COMMENT_NOTICE)?));
    }

    let prediction = score(&state, &form.comment, "form").await?;
    let view = ScoreView::new(form.comment, &prediction);
    Ok(Html(page::render(Some(&view))?))
}

// ============================================================================
// JSON API
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub toxicity: f32,
    pub label: ToxicityLabel,
    pub subtypes: BTreeMap<SubtypeLabel, f32>,
    /// Subtypes at or above the decision threshold
    pub triggered: Vec<SubtypeLabel>,
}

impl From<&Prediction> for ScoreResponse {
    fn from(prediction: &Prediction) -> Self {
        Self {
            toxicity: prediction.toxicity,
            label: prediction.label(),
            subtypes: prediction.subtype_scores().collect(),
            triggered: prediction.triggered_subtypes(),
        }
    }
}

pub async fn api_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::InvalidRequest("text must not be empty".to_string()));
    }
    let prediction = score(&state, &req.text, "api").await?;
    Ok(Json(ScoreResponse::from(&prediction)))
}

async fn score(state: &AppState, text: &str, route: &'static str) -> Result<Prediction, AppError> {
    let start = Instant::now();
    match state.scorer.score(text).await {
        Ok(prediction) => {
            let latency = start.elapsed();
            record_prediction(prediction.label(), latency);
            info!(
                route,
                toxicity = prediction.toxicity,
                label = %prediction.label(),
                latency_us = latency.as_micros() as u64,
                "scored comment"
            );
            Ok(prediction)
        }
        Err(e) => {
            record_error(route);
            warn!(route, "scoring failed: {}", e);
            Err(e.into())
        }
    }
}
