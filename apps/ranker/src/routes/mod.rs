pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

/// A batch carries one job description plus many resumes, each up to the per-file limit.
const MAX_FILES_PER_REQUEST: usize = 32;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST);

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/extract-criteria", post(handlers::handle_extract_criteria))
        .route("/score-resumes", post(handlers::handle_score_resumes))
        .route("/all", post(handlers::handle_full_pipeline))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{test_state, ScriptedCompletion};

    const BOUNDARY: &str = "ranker-test-boundary";

    const CRITERIA_REPLY: &str = r#"["[Required] Rust", "[Preferred] Kafka"]"#;
    const STRONG_SCORES: &str = r#"{"scores": [
        {"criterion": "[Required] Rust", "score": 5, "justification": "Five years of Rust"},
        {"criterion": "[Preferred] Kafka", "score": 3, "justification": "Some Kafka"}
    ]}"#;
    const WEAK_SCORES: &str =
        r#"{"scores": [{"criterion": "[Required] Rust", "score": 2, "justification": "Hobby"}]}"#;

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str),
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::Text(name, value) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                Part::File(name, filename, content) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn scripted() -> ScriptedCompletion {
        ScriptedCompletion::new()
            .with_criteria(CRITERIA_REPLY)
            .with_name_for(
                "alice.pdf",
                r#"{"name": "Alice Smithers", "confidence": 90, "source": "header"}"#,
            )
            .with_scores_for("strong", STRONG_SCORES)
            .with_default_scores(WEAK_SCORES)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(ScriptedCompletion::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let app = build_router(test_state(ScriptedCompletion::new()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["endpoints"]["full_pipeline"], "/all");
    }

    #[tokio::test]
    async fn test_extract_criteria() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/extract-criteria",
            &[Part::File("file", "jd.pdf", "Senior Rust engineer, Kafka a plus")],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["criteria"],
            serde_json::json!(["[Required] Rust", "[Preferred] Kafka"])
        );
    }

    #[tokio::test]
    async fn test_extract_criteria_requires_file_field() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request("/extract-criteria", &[Part::Text("other", "x")]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_multipart_request_rejected() {
        let app = build_router(test_state(scripted()));
        let request = Request::builder()
            .method("POST")
            .uri("/score-resumes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_MULTIPART");
    }

    #[tokio::test]
    async fn test_score_resumes_returns_ranked_csv() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/score-resumes",
            &[
                Part::Text("criteria", "[Required] Rust, [Preferred] Kafka"),
                Part::File("resumes", "bob_jones.pdf", "Bob Jones, java developer"),
                Part::File("resumes", "alice.pdf", "Alice Smithers, strong Rust"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=resume_scores.csv"
        );

        let csv = body_text(response).await;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Candidate Name,Rust,Kafka,Total Score",
                "Alice Smithers,5,3,8",
                "Bob Jones,2,0,2",
            ]
        );
    }

    #[tokio::test]
    async fn test_score_resumes_with_failed_resume_adds_error_column() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/score-resumes",
            &[
                Part::Text("criteria", r#"{"criteria": ["[Required] Rust"]}"#),
                Part::File("resumes", "scan.corrupt", "???"),
                Part::File("resumes", "alice.pdf", "strong"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let csv = body_text(response).await;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Candidate Name,Rust,Total Score,Error");
        assert_eq!(lines[1], "Alice Smithers,5,5,");
        assert!(lines[2].starts_with("Scan,,,"));
    }

    #[tokio::test]
    async fn test_score_resumes_requires_resumes() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request("/score-resumes", &[Part::Text("criteria", "Rust")]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "At least one resume file is required");
    }

    #[tokio::test]
    async fn test_score_resumes_rejects_bad_criteria() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/score-resumes",
            &[
                Part::Text("criteria", r#"{"skills": ["Rust"]}"#),
                Part::File("resumes", "alice.pdf", "strong"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/all",
            &[
                Part::File("job_description", "jd.docx", "We need Rust, Kafka is a plus"),
                Part::File("resumes", "carol_white.pdf", "Carol White"),
                Part::File("resumes", "alice.pdf", "strong"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let csv = body_text(response).await;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Candidate Name,Rust,Kafka,Total Score",
                "Alice Smithers,5,3,8",
                "Carol White,2,0,2",
            ]
        );
    }

    #[tokio::test]
    async fn test_full_pipeline_all_resumes_failed() {
        let app = build_router(test_state(scripted()));
        let request = multipart_request(
            "/all",
            &[
                Part::File("job_description", "jd.pdf", "We need Rust"),
                Part::File("resumes", "a.corrupt", "x"),
                Part::File("resumes", "b.corrupt", "y"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BATCH_FAILED");
    }

    #[tokio::test]
    async fn test_full_pipeline_without_criteria_is_rejected() {
        let app = build_router(test_state(scripted().with_criteria("[]")));
        let request = multipart_request(
            "/all",
            &[
                Part::File("job_description", "jd.pdf", "Free pizza"),
                Part::File("resumes", "alice.pdf", "strong"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }
}
