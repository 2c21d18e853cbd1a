use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use code_exec::{
    anonymous_user_id, supported_languages, user_color, CodeExecutionService, DocumentHub,
    ExecutionRequest, ExecutionResult, LanguageInfo, DEFAULT_LANGUAGE,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Configuration(_) | ServerError::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

impl From<code_exec::Error> for ServerError {
    fn from(err: code_exec::Error) -> Self {
        match err {
            code_exec::Error::Validation(message) => ServerError::Validation(message),
            code_exec::Error::Configuration(message) => ServerError::Configuration(message),
            other => ServerError::ServerError(other.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ExecuteRequest {
    /// Validate the payload, rejecting submissions with nothing to execute
    fn to_execution_request(&self) -> Result<ExecutionRequest, ServerError> {
        match self.code.as_deref() {
            Some(code) if !code.trim().is_empty() => Ok(ExecutionRequest {
                code: code.to_string(),
                language: self
                    .language
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.id().to_string()),
            }),
            _ => Err(ServerError::Validation("Code is required".to_string())),
        }
    }
}

/// A document's result as every viewer renders it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedExecution {
    #[serde(flatten)]
    pub result: ExecutionResult,
    pub user_color: &'static str,
}

impl From<ExecutionResult> for SharedExecution {
    fn from(result: ExecutionResult) -> Self {
        let user_color = user_color(result.user_id.as_deref());
        Self { result, user_color }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LanguageSetting {
    pub language: String,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<CodeExecutionService>,
    documents: Arc<DocumentHub>,
}

impl AppState {
    pub fn new(service: CodeExecutionService) -> Self {
        Self {
            service: Arc::new(service),
            documents: Arc::new(DocumentHub::new()),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(health_check))
        .route("/languages", get(languages))
        .route("/execute", post(execute))
        .route("/api/sandbox-session", post(execute))
        .route(
            "/documents/{doc_id}/executions",
            get(list_executions)
                .post(execute_into_document)
                .delete(clear_executions),
        )
        .route(
            "/documents/{doc_id}/settings/language",
            get(get_language).put(set_language),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    info!("Starting code execution server on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(supported_languages())
}

async fn run(state: &AppState, payload: &ExecuteRequest) -> Result<ExecutionResult, ServerError> {
    let request = payload
        .to_execution_request()
        .inspect_err(|e| warn!("Rejected submission: {}", e))?;

    Ok(state
        .service
        .execute(&request.code, &request.language, payload.user_id.clone())
        .await)
}

async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, ServerError> {
    Ok(Json(run(&state, &payload).await?))
}

async fn execute_into_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Json(mut payload): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, ServerError> {
    let document = state.documents.document(&doc_id);
    payload
        .language
        .get_or_insert_with(|| document.settings().language());
    payload.user_id.get_or_insert_with(anonymous_user_id);

    let result = run(&state, &payload).await?;
    document.results().append(result.clone());
    info!(doc_id = %doc_id, execution_id = %result.id, "Result shared with document");

    Ok(Json(result))
}

// Reads never open a document; only writes do

async fn list_executions(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Json<Vec<SharedExecution>> {
    let entries = state
        .documents
        .get(&doc_id)
        .map(|document| document.results().entries())
        .unwrap_or_default();

    Json(entries.into_iter().map(SharedExecution::from).collect())
}

async fn clear_executions(State(state): State<AppState>, Path(doc_id): Path<String>) -> StatusCode {
    if let Some(document) = state.documents.get(&doc_id) {
        let removed = document.results().clear();
        info!(doc_id = %doc_id, removed, "Cleared document results");
    }
    StatusCode::NO_CONTENT
}

async fn get_language(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Json<LanguageSetting> {
    let language = match state.documents.get(&doc_id) {
        Some(document) => document.settings().language(),
        None => DEFAULT_LANGUAGE.id().to_string(),
    };

    Json(LanguageSetting { language })
}

async fn set_language(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Json(payload): Json<LanguageSetting>,
) -> Result<Json<LanguageSetting>, ServerError> {
    let language = state
        .documents
        .document(&doc_id)
        .settings()
        .set_language(&payload.language)?;

    Ok(Json(LanguageSetting {
        language: language.id().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use code_exec::{ExecutionProvider, ExecutionStatus, PollPolicy};
    use judge_client::{RuntimeId, SubmissionStatus, SubmissionToken};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Provider that accepts everything and echoes a fixed stdout
    #[derive(Default)]
    struct EchoProvider {
        submissions: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionProvider for EchoProvider {
        async fn submit(
            &self,
            _source_code: &str,
            _runtime_id: RuntimeId,
        ) -> Result<SubmissionToken, code_exec::Error> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(SubmissionToken {
                token: "echo".to_string(),
            })
        }

        async fn fetch_status(
            &self,
            _token: &SubmissionToken,
        ) -> Result<SubmissionStatus, code_exec::Error> {
            Ok(SubmissionStatus {
                stdout: Some("Hello, World!\n".to_string()),
                status_id: 3,
                language_id: Some(RuntimeId(71)),
                ..Default::default()
            })
        }
    }

    fn test_state() -> (AppState, Arc<EchoProvider>) {
        let provider = Arc::new(EchoProvider::default());
        let service = CodeExecutionService::new(
            provider.clone(),
            PollPolicy {
                interval: Duration::from_millis(5),
                max_attempts: 3,
            },
            4,
        )
        .unwrap();
        (AppState::new(service), provider)
    }

    fn test_app() -> (Router, Arc<EchoProvider>) {
        let (state, provider) = test_state();
        (create_app(state), provider)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_execute() {
        let (app, _) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/execute",
                serde_json::json!({ "code": "print(\"Hello, World!\")", "language": "python" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: ExecutionResult = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.output.trim(), "Hello, World!");
        assert_eq!(result.language, "python");
    }

    #[tokio::test]
    async fn test_missing_code_is_rejected_without_provider_call() {
        for body in [
            serde_json::json!({ "language": "python" }),
            serde_json::json!({ "code": "", "language": "python" }),
            serde_json::json!({ "code": "   \n" }),
        ] {
            let (app, provider) = test_app();

            let response = app
                .oneshot(json_request("POST", "/api/sandbox-session", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_bytes(response).await, b"Code is required".to_vec());
            assert_eq!(provider.submissions.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_document_run_append_and_clear() {
        let (app, _) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/documents/pad/executions",
                serde_json::json!({ "code": "print(1)", "userId": "alice" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/documents/pad/executions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let results: Vec<ExecutionResult> =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].user_id.as_deref(), Some("alice"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/documents/pad/executions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/documents/pad/executions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let results: Vec<ExecutionResult> =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_open_documents() {
        let (state, _) = test_state();
        let app = create_app(state.clone());

        for i in 0..20 {
            let response = app
                .clone()
                .oneshot(get_request(&format!("/documents/d{}/executions", i)))
                .await
                .unwrap();
            assert_eq!(body_bytes(response).await, b"[]".to_vec());

            let response = app
                .clone()
                .oneshot(get_request(&format!("/documents/d{}/settings/language", i)))
                .await
                .unwrap();
            let setting: LanguageSetting =
                serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert_eq!(setting.language, "javascript");

            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("DELETE")
                        .uri(format!("/documents/d{}/executions", i))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        assert!(state.documents.is_empty());
    }

    #[tokio::test]
    async fn test_document_results_carry_user_color() {
        let (app, _) = test_app();

        for user in [Some("alice"), None] {
            let mut body = serde_json::json!({ "code": "print(1)", "language": "python" });
            if let Some(user) = user {
                body["userId"] = serde_json::json!(user);
            }
            app.clone()
                .oneshot(json_request("POST", "/documents/pad/executions", body))
                .await
                .unwrap();
        }

        let response = app.oneshot(get_request("/documents/pad/executions")).await.unwrap();
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&body_bytes(response).await).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["userId"], "alice");
        assert_eq!(entries[0]["userColor"], user_color(Some("alice")));
        assert_eq!(entries[0]["status"], "completed");
        let anonymous = entries[1]["userId"].as_str().unwrap();
        assert_eq!(entries[1]["userColor"], user_color(Some(anonymous)));
    }

    #[tokio::test]
    async fn test_language_setting_round_trip() {
        let (app, _) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/documents/pad/settings/language",
                serde_json::json!({ "language": "Rust" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/documents/pad/settings/language")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let setting: LanguageSetting = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(setting.language, "rust");

        let response = app
            .oneshot(json_request(
                "PUT",
                "/documents/pad/settings/language",
                serde_json::json!({ "language": "cobol" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_languages_lists_registry() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/languages").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let languages: Vec<serde_json::Value> =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(languages.len(), 8);
        assert!(languages
            .iter()
            .any(|l| l["language"] == "python" && l["runtimeId"] == 71));
    }
}
