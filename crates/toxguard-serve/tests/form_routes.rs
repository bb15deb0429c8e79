//! Form app routes against a fixed scorer

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use std::sync::Arc;
use toxguard_core::{Error, Prediction, Result};
use toxguard_model::ToxicityScorer;
use toxguard_serve::{build_form_app, AppState};
use tower::ServiceExt;

struct FixedScorer(Prediction);

#[async_trait]
impl ToxicityScorer for FixedScorer {
    async fn score(&self, _text: &str) -> Result<Prediction> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingScorer;

#[async_trait]
impl ToxicityScorer for FailingScorer {
    async fn score(&self, _text: &str) -> Result<Prediction> {
        Err(Error::model("forward pass failed"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn toxic_app() -> Router {
    let prediction = Prediction::new(0.9, [0.2, 0.1, 0.0, 0.7, 0.55, 0.05]);
    build_form_app(AppState::new(Arc::new(FixedScorer(prediction))))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let response = toxic_app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<form"));
    assert!(!html.contains("Classification:"));
}

#[tokio::test]
async fn test_post_renders_scores() {
    let response = toxic_app()
        .oneshot(form_post("comment=%3Cb%3Eyou%3C%2Fb%3E+are+awful"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("&lt;b&gt;you&lt;/b&gt; are awful"));
    assert!(!html.contains("<b>you</b>"));
    assert!(html.contains("90.00%"));
    assert!(html.contains("Inappropriate"));
    assert!(html.contains("Appropriate 10.00% / Inappropriate 90.00%"));
    assert!(html.contains("Threat"));
    assert!(html.contains("55.00%"));
    assert!(html.contains("Identity Attack"));
}

#[tokio::test]
async fn test_post_without_comment_rerenders_form() {
    // A failing scorer shows that nothing was scored.
    let app = build_form_app(AppState::new(Arc::new(FailingScorer)));

    for body in ["other=1", "comment=", "comment=+++"] {
        let response = app.clone().oneshot(form_post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", body);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let html = body_string(response).await;
        assert!(html.contains(r#"<p class="notice">Please enter a comment to analyze.</p>"#));
        assert!(html.contains(r#"name="comment""#));
        assert!(!html.contains("Classification:"));
    }
}

#[tokio::test]
async fn test_api_score_rejects_blank_text() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/score")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "  "}"#))
        .unwrap();
    let response = toxic_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "text must not be empty");
}

#[tokio::test]
async fn test_api_score_returns_prediction() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/score")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();
    let response = toxic_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["label"], "Inappropriate");
    assert_eq!(body["subtypes"].as_object().unwrap().len(), 6);
    assert!(body["subtypes"]["severe_toxicity"].is_number());
    assert_eq!(body["triggered"], serde_json::json!(["insult", "threat"]));
}

#[tokio::test]
async fn test_scoring_failure_maps_to_500() {
    let app = build_form_app(AppState::new(Arc::new(FailingScorer)));
    let response = app.oneshot(form_post("comment=hi")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"]["type"], "scoring_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("forward pass failed"));
}

#[tokio::test]
async fn test_health_names_scorer() {
    let response = toxic_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scorer"], "fixed");
}

#[tokio::test]
async fn test_metrics_requires_recorder() {
    let response = toxic_app()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let handle = PrometheusBuilder::new().build_recorder().handle();
    let prediction = Prediction::new(0.1, [0.0; 6]);
    let app = build_form_app(AppState::new(Arc::new(FixedScorer(prediction))).with_metrics(handle));
    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}
