//! End-to-end tests over the router with stubbed collaborators: the full
//! generate -> archive -> fetch flow, validation responses, and degraded runs.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use insight_report::archive::{Archive, ArchiveError, MemoryArchive};
use insight_report::llm::{ContentGenerator, LlmError};
use insight_report::models::{ReportRecord, ReportRequest};
use insight_report::pipeline::ReportPipeline;
use insight_report::render::{DocumentRenderer, RenderError};
use insight_report::routes::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct StubGenerator;

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, LlmError> {
        Ok(format!(
            "**Introduction**\nintro for {industry}\n\n**Industry Trends**\ntrends\n\n\
             **AI Solutions**\nsolutions\n\n**Analysis**\nanalysis\n\n**Conclusion**\nconclusion",
            industry = request.industry
        ))
    }
}

struct StubRenderer {
    fail: bool,
}

#[async_trait]
impl DocumentRenderer for StubRenderer {
    async fn render(&self, _html: &str) -> Result<String, RenderError> {
        if self.fail {
            Err(RenderError::Http("status=502".into()))
        } else {
            Ok("https://files.example.com/report.pdf".into())
        }
    }
}

/// Archive that hosts a document copy but stores nothing itself.
struct DocPublisher;

#[async_trait]
impl Archive for DocPublisher {
    fn name(&self) -> &'static str {
        "doc-publisher"
    }

    async fn save(&self, _record: &ReportRecord) -> Result<(), ArchiveError> {
        Ok(())
    }

    async fn get(&self, _report_id: &str) -> Result<Option<ReportRecord>, ArchiveError> {
        Ok(None)
    }

    async fn publish_document(
        &self,
        report_id: &str,
        _body: &str,
    ) -> Result<Option<String>, ArchiveError> {
        Ok(Some(format!("https://docs.example.com/d/{report_id}")))
    }
}

fn app(renderer_fails: bool) -> axum::Router {
    let pipeline = ReportPipeline::new(3)
        .with_generator(Arc::new(StubGenerator))
        .with_renderer(Arc::new(StubRenderer {
            fail: renderer_fails,
        }))
        .with_archive(Arc::new(MemoryArchive::new()))
        .with_archive(Arc::new(DocPublisher));
    router(AppState {
        pipeline: Arc::new(pipeline),
    })
}

fn valid_body() -> Value {
    json!({
        "client_name": "John Doe",
        "client_email": "john@example.com",
        "industry": "Technology",
        "question1": "a",
        "question2": "b",
        "question3": "c"
    })
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn generate_report_succeeds_end_to_end() {
    let app = app(false);
    let (status, body) = post_json(&app, "/generate_report", valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(!body["report_id"].as_str().unwrap().is_empty());
    assert_eq!(body["pdf_url"], "https://files.example.com/report.pdf");
    assert!(body["doc_url"].as_str().unwrap().starts_with("https://docs.example.com/d/"));
}

#[tokio::test]
async fn malformed_email_returns_field_details() {
    let app = app(false);
    let mut body = valid_body();
    body["client_email"] = json!("not-an-email");
    let (status, body) = post_json(&app, "/generate_report", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Validation error");
    assert!(body["details"]["client_email"].is_array());
}

#[tokio::test]
async fn missing_questions_return_field_details() {
    let app = app(false);
    let body = json!({
        "client_name": "John Doe",
        "client_email": "john@example.com",
        "industry": "Technology"
    });
    let (status, body) = post_json(&app, "/generate_report", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["question1", "question2", "question3"] {
        assert!(body["details"][field].is_array(), "no details for {field}");
    }
}

#[tokio::test]
async fn wrong_typed_field_returns_field_details() {
    let app = app(false);
    let mut body = valid_body();
    body["client_name"] = json!(5);
    let (status, body) = post_json(&app, "/generate_report", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["details"]["client_name"][0], "Not a valid string.");
}

#[tokio::test]
async fn renderer_outage_still_returns_success() {
    let app = app(true);
    let (status, body) = post_json(&app, "/generate_report", valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["pdf_url"], Value::Null);
    assert!(body["doc_url"].as_str().unwrap().starts_with("https://docs.example.com/d/"));
}

#[tokio::test]
async fn generated_report_can_be_fetched_back() {
    let app = app(false);
    let (_, body) = post_json(&app, "/generate_report", valid_body()).await;
    let report_id = body["report_id"].as_str().unwrap();

    let (status, record) = get(&app, &format!("/get_report/{report_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["report_id"], *report_id);
    assert_eq!(record["client_name"], "John Doe");
    assert_eq!(record["client_email"], "john@example.com");
    assert_eq!(record["industry"], "Technology");
    assert_eq!(record["pdf_url"], "https://files.example.com/report.pdf");
}

#[tokio::test]
async fn unknown_report_id_is_not_found() {
    let app = app(false);
    let (status, body) = get(&app, "/get_report/0").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Report not found");
}

#[tokio::test]
async fn download_redirects_to_the_pdf() {
    let app = app(false);
    let (_, body) = post_json(&app, "/generate_report", valid_body()).await;
    let report_id = body["report_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/download_report/{report_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://files.example.com/report.pdf"
    );
}

#[tokio::test]
async fn download_of_unknown_report_is_not_found() {
    let app = app(false);
    let (status, body) = get(&app, "/download_report/0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Report not found");
}

#[tokio::test]
async fn health_reports_the_service() {
    let app = app(false);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "insight_report");
}

#[tokio::test]
async fn non_json_body_is_rejected_with_an_error_envelope() {
    let app = app(false);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate_report")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "error");
}
