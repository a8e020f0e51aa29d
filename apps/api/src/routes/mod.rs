pub mod health;
pub mod resumes;
pub mod submissions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Multipart framing and the text fields ride on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.orchestrator.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Intake
        .route(
            "/submit",
            post(submissions::handle_submit).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/webhook", post(submissions::handle_webhook))
        // Operator lookups
        .route(
            "/api/v1/resumes/unprocessed",
            get(resumes::handle_list_unprocessed),
        )
        .route("/api/v1/resumes/:id", get(resumes::handle_get_resume))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::remote::RemoteFileFetcher;
    use crate::testing::{TestPipeline, CANDIDATE};

    const BOUNDARY: &str = "screening-boundary";

    fn app(pipeline: &TestPipeline) -> Router {
        build_router(AppState {
            orchestrator: Arc::new(pipeline.orchestrator()),
            repository: pipeline.repo.clone(),
            remote_files: Arc::new(RemoteFileFetcher::new(
                vec!["forms.example.com".to_string(), "127.0.0.1".to_string()],
                false,
                Duration::from_secs(5),
            )),
        })
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str)>) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        if let Some((file_name, contents)) = file {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn submit_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let pipeline = TestPipeline::new();
        let response = app(&pipeline)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "screening-api");
    }

    #[tokio::test]
    async fn test_submit_runs_the_pipeline() {
        let pipeline = TestPipeline::new();
        let body = multipart_body(
            &[
                ("name", "Ada Lovelace"),
                ("email", CANDIDATE),
                ("job_id", "42"),
            ],
            Some(("cv.txt", "5 years of Go and SQL experience")),
        );

        let response = app(&pipeline).oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["analysis"]["recommendation"], "interview");
        assert_eq!(pipeline.repo.analyses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_file_is_a_validation_error() {
        let pipeline = TestPipeline::new();
        let body = multipart_body(
            &[
                ("name", "Ada Lovelace"),
                ("email", CANDIDATE),
                ("job_id", "42"),
            ],
            None,
        );

        let response = app(&pipeline).oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(pipeline.store.len(), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_non_numeric_job_id() {
        let pipeline = TestPipeline::new();
        let body = multipart_body(
            &[
                ("name", "Ada Lovelace"),
                ("email", CANDIDATE),
                ("job_id", "platform"),
            ],
            Some(("cv.txt", "Go and SQL")),
        );

        let response = app(&pipeline).oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_unknown_events() {
        let pipeline = TestPipeline::new();
        let request = Request::post("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"event":"submission.deleted","id":7}"#))
            .unwrap();

        let response = app(&pipeline).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(pipeline.repo.events().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_rejects_non_http_file_urls() {
        let pipeline = TestPipeline::new();
        let request = Request::post("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"event":"submission.created",
                    "candidate":{"name":"Ada Lovelace","email":"ada@example.com"},
                    "job_id":42,"file_name":"cv.txt","file_url":"file:///etc/passwd"}"#,
            ))
            .unwrap();

        let response = app(&pipeline).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(pipeline.store.len(), 0);
    }

    #[tokio::test]
    async fn test_webhook_refuses_internal_file_urls() {
        let pipeline = TestPipeline::new();
        let request = Request::post("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"event":"submission.created",
                    "candidate":{"name":"Ada Lovelace","email":"ada@example.com"},
                    "job_id":42,"file_name":"cv.txt","file_url":"http://127.0.0.1:9/internal"}"#,
            ))
            .unwrap();

        let response = app(&pipeline).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("non-public"));
        assert_eq!(pipeline.store.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_resume_is_404() {
        let pipeline = TestPipeline::new();
        let uri = format!("/api/v1/resumes/{}", uuid::Uuid::new_v4());
        let response = app(&pipeline)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_processed_resume_is_not_listed_as_unprocessed() {
        let pipeline = TestPipeline::new();
        let body = multipart_body(
            &[
                ("name", "Ada Lovelace"),
                ("email", CANDIDATE),
                ("job_id", "42"),
            ],
            Some(("cv.txt", "5 years of Go and SQL experience")),
        );
        let router = app(&pipeline);
        let submitted = router.clone().oneshot(submit_request(body)).await.unwrap();
        let resume_id = json_body(submitted).await["resume_id"]
            .as_str()
            .unwrap()
            .to_string();

        let listing = router
            .clone()
            .oneshot(
                Request::get("/api/v1/resumes/unprocessed?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(listing).await, serde_json::json!([]));

        let detail = router
            .oneshot(
                Request::get(format!("/api/v1/resumes/{resume_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::OK);
        let detail = json_body(detail).await;
        assert_eq!(detail["resume"]["processed"], true);
        assert_eq!(detail["analysis"]["job_id"], 42);
    }
}
