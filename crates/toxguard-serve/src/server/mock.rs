//! Stub prediction endpoint
//!
//! Accepts `{"text": ...}` and always answers with the same prediction. It
//! exists so the replay client can be pointed at something that speaks the
//! expected request and response shapes.

use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MOCK_PREDICTION: &str = "not_toxic";
pub const MOCK_CONFIDENCE: f64 = 0.87;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
}

impl Default for PredictResponse {
    fn default() -> Self {
        Self {
            prediction: MOCK_PREDICTION.to_string(),
            confidence: MOCK_CONFIDENCE,
        }
    }
}

pub async fn predict(Json(req): Json<PredictRequest>) -> impl IntoResponse {
    debug!(chars = req.text.chars().count(), "mock prediction");
    Json(PredictResponse::default())
}
