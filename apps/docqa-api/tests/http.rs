use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use docqa_api::{routes, state::AppState};
use docqa_config::{EmbeddingProviderConfig, LlmProviderConfig};
use docqa_providers::ChatMessage;
use docqa_service::{
	BoxFuture, ChatProvider, DocQaService, EmbeddingProvider, Error, Providers, Result,
};
use docqa_storage::VectorStore;
use docqa_testkit::{TestWorkspace, minimal_pdf, test_config};

const BOUNDARY: &str = "docqa-test-boundary";

struct ConstantEmbedding;
impl EmbeddingProvider for ConstantEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		let vector = vec![1.0; cfg.dimensions as usize];

		Box::pin(async move { Ok(vec![vector; texts.len()]) })
	}
}

/// Replies with the last message's content.
struct EchoChat;
impl ChatProvider for EchoChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>> {
		let last = messages.last().map(|message| message.content.clone()).unwrap_or_default();

		Box::pin(async move { Ok(format!("echo: {last}")) })
	}
}

struct DownChat;
impl ChatProvider for DownChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			Err(Error::Provider { message: "test returned HTTP 429: quota exceeded".to_string() })
		})
	}
}

fn app_state(workspace: &TestWorkspace, chat: Arc<dyn ChatProvider>) -> AppState {
	let cfg = test_config(workspace, "http://127.0.0.1:9");
	let providers = Providers::new(Arc::new(ConstantEmbedding), chat);

	AppState::from_service(DocQaService::with_providers(cfg, VectorStore::in_memory(), providers))
}

fn public_app(workspace: &TestWorkspace) -> Router {
	routes::router(app_state(workspace, Arc::new(EchoChat)))
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
	Request::builder()
		.method(method)
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

fn multipart_request(file_name: &str, bytes: &[u8]) -> Request<Body> {
	let mut body = Vec::new();

	body.extend_from_slice(
		format!(
			"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
		)
		.as_bytes(),
	);
	body.extend_from_slice(bytes);
	body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

	Request::builder()
		.method("POST")
		.uri("/v1/documents")
		.header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
		.body(Body::from(body))
		.expect("Failed to build request.")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let request =
		Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request.");
	let response = app.oneshot(request).await.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ask_returns_answer_and_records_history() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let payload = serde_json::json!({ "question": "Who knows Rust?", "user_id": "hr" });
	let (status, json) = send(&app, json_request("POST", "/v1/ask", payload)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["answer"], "echo: Who knows Rust?");
	assert_eq!(json["sources"], serde_json::json!([]));

	let (status, json) = send(
		&app,
		Request::builder()
			.uri("/v1/conversations/hr?mode=rag")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["turns"][0]["role"], "user");
	assert_eq!(json["turns"][1]["text"], "echo: Who knows Rust?");
}

#[tokio::test]
async fn chat_and_complete_return_answers() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let (status, json) = send(
		&app,
		json_request(
			"POST",
			"/v1/chat",
			serde_json::json!({ "user_id": "test_user_1", "prompt": "Hello, who are you?" }),
		),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["answer"], "echo: Hello, who are you?");

	let (status, json) =
		send(&app, json_request("POST", "/v1/complete", serde_json::json!({ "prompt": "Hi" }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["answer"], "echo: Hi");
}

#[tokio::test]
async fn blank_prompt_is_bad_request() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let (status, json) = send(
		&app,
		json_request("POST", "/v1/chat", serde_json::json!({ "user_id": "u1", "prompt": "  " })),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn missing_field_is_bad_request() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let (status, json) =
		send(&app, json_request("POST", "/v1/ask", serde_json::json!({ "user_id": "hr" }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert!(json["message"].as_str().is_some_and(|message| message.contains("question")));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let request = Request::builder()
		.method("POST")
		.uri("/v1/chat")
		.header("content-type", "application/json")
		.body(Body::from("{not json"))
		.expect("Failed to build request.");
	let (status, json) = send(&app, request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn non_pdf_upload_is_unsupported_media_type() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let (status, json) = send(&app, multipart_request("resume.docx", b"PK\x03\x04")).await;

	assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
	assert_eq!(json["error_code"], "UNSUPPORTED_UPLOAD");
	assert_eq!(json["fields"][0], "$.file");
}

#[tokio::test]
async fn pdf_upload_is_listed() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let pdf = minimal_pdf(&["Jane Doe", "Rust engineer in Cairo"]);
	let (status, json) = send(&app, multipart_request("jane.pdf", &pdf)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["kind"], "pdf");
	assert_eq!(json["build"]["files"][0], "jane.pdf");

	let (status, json) = send(
		&app,
		Request::builder().uri("/v1/documents").body(Body::empty()).expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["sources"][0]["source_id"], "jane.pdf");
	assert!(json["chunks"].as_u64().expect("chunks") >= 1);
}

#[tokio::test]
async fn reset_unknown_user_is_not_found() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = public_app(&workspace);
	let (status, json) = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri("/v1/conversations/nobody?mode=chat")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = routes::router(app_state(&workspace, Arc::new(DownChat)));
	let (status, json) =
		send(&app, json_request("POST", "/v1/ask", serde_json::json!({ "question": "Who?" }))).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "PROVIDER_ERROR");
}

#[tokio::test]
async fn admin_build_of_missing_archive_is_not_found() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let app = routes::admin_router(app_state(&workspace, Arc::new(EchoChat)));
	let missing = workspace.path("missing.zip");
	let (status, json) = send(
		&app,
		json_request("POST", "/v1/admin/build", serde_json::json!({ "path": missing })),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}
