// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /api/v1/web-question, GET /api/v1/questions/{id},
//! GET /health and GET /.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hotline_core::{Answer, HotlineError, NewQuestion, QuestionId, QuestionStatus};
use serde::Serialize;

use crate::server::GatewayState;
use crate::webform::{WebQuestionRequest, extract_images, store_images};

/// Response body for POST /api/v1/web-question.
#[derive(Debug, Serialize)]
pub struct WebQuestionResponse {
    pub success: bool,
    pub question_id: Option<QuestionId>,
    pub message: String,
}

/// Response body for GET /api/v1/questions/{id}.
#[derive(Debug, Serialize)]
pub struct QuestionStatusResponse {
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    pub created_at: String,
    pub answers: Vec<Answer>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Maps a [`HotlineError`] onto a status code and a JSON error body.
pub struct ApiError(HotlineError);

impl From<HotlineError> for ApiError {
    fn from(e: HotlineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HotlineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            HotlineError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
            HotlineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "gateway request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// POST /api/v1/web-question
///
/// Stores the form as a web-origin question, keeps at most the configured
/// number of inline images, and announces it to moderators.
pub async fn post_web_question(
    State(state): State<GatewayState>,
    Json(body): Json<WebQuestionRequest>,
) -> Result<Json<WebQuestionResponse>, ApiError> {
    let text = body.compose_text()?;
    let images = extract_images(&body.img_tags, state.intake.max_photos());
    let photos = store_images(&state.upload_dir, images).await?;

    let submission = state
        .intake
        .submit(NewQuestion::from_web(body.contact(), text), photos)
        .await?;

    tracing::info!(
        question_id = submission.question_id,
        photos = submission.photos,
        moderators = submission.notified.delivered,
        "web question accepted"
    );

    Ok(Json(WebQuestionResponse {
        success: true,
        question_id: Some(submission.question_id),
        message: "Question created and sent to moderators".to_string(),
    }))
}

/// GET /api/v1/questions/{id}
pub async fn get_question(
    State(state): State<GatewayState>,
    Path(id): Path<QuestionId>,
) -> Result<Json<QuestionStatusResponse>, ApiError> {
    let question = state
        .store
        .get_question(id)
        .await?
        .ok_or(HotlineError::QuestionNotFound(id))?;
    let answers = state.store.list_answers(id).await?;

    Ok(Json(QuestionStatusResponse {
        question_id: question.id,
        status: question.status,
        created_at: question.created_at,
        answers,
    }))
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /
pub async fn index(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": state.service_name,
        "status": "running",
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use hotline_config::model::GatewayConfig;
    use hotline_test_utils::TestHarness;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AuthConfig;
    use crate::server::router;
    use axum::Router;

    const PNG_TAG: &str = r#"<img src="data:image/png;base64,aGVsbG8=">"#;

    fn state(harness: &TestHarness, upload_dir: &std::path::Path) -> GatewayState {
        GatewayState {
            store: Arc::clone(&harness.store),
            intake: harness.dispatcher.intake().clone(),
            upload_dir: upload_dir.to_path_buf(),
            start_time: std::time::Instant::now(),
            service_name: "hotline".into(),
        }
    }

    fn test_router(
        harness: &TestHarness,
        upload_dir: &std::path::Path,
        auth: AuthConfig,
    ) -> Router {
        let limit = GatewayConfig::default().max_body_bytes;
        router(state(harness, upload_dir), auth, limit)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 100_000)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn web_question_is_stored_and_announced() {
        let harness = TestHarness::builder()
            .with_admins([900])
            .build()
            .await
            .unwrap();
        harness.register_moderator(900).await;
        harness.channel.clear_sent();
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app
            .oneshot(post_json(
                "/api/v1/web-question",
                serde_json::json!({
                    "Email": "ann@example.com",
                    "Description": "App crashes on login",
                    "Steps": "open<br>tap login",
                    "DeviceInfo": "Pixel 8",
                    "ImgTags": [PNG_TAG, PNG_TAG, PNG_TAG, PNG_TAG],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["success"], true);
        let id = body["question_id"].as_i64().unwrap();

        let question = harness.store.get_question(id).await.unwrap().unwrap();
        assert_eq!(question.origin, hotline_core::QuestionOrigin::Web);
        assert_eq!(question.contact.as_deref(), Some("ann@example.com"));
        assert!(question.text.contains("open\ntap login"));
        // Harness default cap is three photos.
        assert_eq!(harness.store.list_photos(id).await.unwrap().len(), 3);

        let sent = harness.channel.sent_to(900);
        assert!(!sent.is_empty());
    }

    #[tokio::test]
    async fn full_size_screenshots_fit_under_the_body_limit() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let screenshot = STANDARD.encode(vec![0x5a_u8; 600_000]);
        let tag = format!(r#"<img src="data:image/png;base64,{screenshot}">"#);
        let payload = serde_json::json!({
            "Email": "ann@example.com",
            "Description": "Layout broken on the settings page",
            "ImgTags": [tag.clone(), tag.clone(), tag],
        });
        assert!(payload.to_string().len() > 2 * 1024 * 1024);

        let resp = test_router(&harness, uploads.path(), AuthConfig::default())
            .oneshot(post_json("/api/v1/web-question", payload))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let id = json_body(resp).await["question_id"].as_i64().unwrap();
        assert_eq!(harness.store.list_photos(id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn body_over_the_configured_limit_is_refused() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let app = router(
            state(&harness, uploads.path()),
            AuthConfig::default(),
            64 * 1024,
        );
        let screenshot = STANDARD.encode(vec![1_u8; 100_000]);

        let resp = app
            .oneshot(post_json(
                "/api/v1/web-question",
                serde_json::json!({
                    "Description": "too big",
                    "ImgTags": [format!(r#"<img src="data:image/png;base64,{screenshot}">"#)],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let counts = harness.store.question_counts().await.unwrap();
        assert_eq!(counts.total_questions(), 0);
    }

    #[tokio::test]
    async fn blank_description_is_bad_request() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app
            .oneshot(post_json(
                "/api/v1/web-question",
                serde_json::json!({ "Email": "a@b.c", "Description": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Description"));

        let counts = harness.store.question_counts().await.unwrap();
        assert_eq!(counts.total_questions(), 0);
    }

    #[tokio::test]
    async fn question_status_reports_answers() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = harness.ask(10, "Where is my order?").await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app
            .oneshot(get(&format!("/api/v1/questions/{id}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["question_id"], id);
        assert_eq!(body["status"], "new");
        assert_eq!(body["answers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn answered_web_question_is_visible_through_status() {
        let harness = TestHarness::builder()
            .with_admins([900])
            .build()
            .await
            .unwrap();
        harness.register_moderator(900).await;
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/v1/web-question",
                serde_json::json!({ "Email": "bob@example.com", "Description": "No sound" }),
            ))
            .await
            .unwrap();
        let id = json_body(resp).await["question_id"].as_i64().unwrap();

        harness.send_text(900, &format!("/answer_{id}")).await;
        assert!(harness.last_reply(900).contains("bob@example.com (website)"));
        harness.send_text(900, "Check the mute switch").await;
        assert!(harness.last_reply(900).contains("came from the website"));

        let resp = app
            .oneshot(get(&format!("/api/v1/questions/{id}")))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["answers"][0]["text"], "Check the mute switch");
        assert_eq!(body["answers"][0]["moderator_id"], 900);
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app.oneshot(get("/api/v1/questions/4242")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bearer_token_guards_api_but_not_health() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };
        let app = test_router(&harness, uploads.path(), auth);

        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");

        let resp = app
            .clone()
            .oneshot(get("/api/v1/questions/1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let authed = Request::builder()
            .uri("/api/v1/questions/1")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(authed).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn index_names_the_service() {
        let harness = TestHarness::builder().build().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let app = test_router(&harness, uploads.path(), AuthConfig::default());

        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(json_body(resp).await["service"], "hotline");
    }
}
