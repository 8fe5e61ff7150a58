use std::{future::IntoFuture, time::Duration};

use axum::{
	Json, Router,
	extract::{Multipart, Path, Query},
	http::StatusCode,
	response::IntoResponse,
	routing,
};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use docqa_chat::client::{BotClient, Endpoint, SERVICE_ERROR_REPLY};

async fn start_backend() -> (String, Sender<()>) {
	let app = Router::new()
		.route("/v1/ask", routing::post(ask_handler))
		.route("/v1/chat", routing::post(chat_handler))
		.route("/v1/documents", routing::post(upload_handler))
		.route("/v1/conversations/{user_id}", routing::delete(reset_handler));
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub backend.");
	let addr = listener.local_addr().expect("Failed to read stub backend address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn ask_handler(Json(payload): Json<Value>) -> impl IntoResponse {
	let question = payload["question"].as_str().unwrap_or_default();

	if question == "explode" {
		return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({}))).into_response();
	}

	Json(serde_json::json!({
		"answer": format!("{} asked: {question}", payload["user_id"].as_str().unwrap_or_default()),
		"sources": [],
	}))
	.into_response()
}

async fn chat_handler(Json(payload): Json<Value>) -> impl IntoResponse {
	let prompt = payload["prompt"].as_str().unwrap_or_default();

	Json(serde_json::json!({ "answer": format!("chat: {prompt}") }))
}

async fn upload_handler(mut multipart: Multipart) -> impl IntoResponse {
	let Ok(Some(field)) = multipart.next_field().await else {
		return StatusCode::BAD_REQUEST.into_response();
	};
	let file_name = field.file_name().unwrap_or_default().to_string();

	if !file_name.ends_with(".zip") {
		return (
			StatusCode::UNSUPPORTED_MEDIA_TYPE,
			Json(serde_json::json!({
				"error_code": "UNSUPPORTED_UPLOAD",
				"message": "Only .pdf and .zip uploads are accepted.",
				"fields": ["$.file"],
			})),
		)
			.into_response();
	}

	Json(serde_json::json!({
		"file_name": file_name,
		"kind": "zip",
		"build": {
			"files": ["CVs/jane.pdf", "CVs/omar.pdf"],
			"chunks": 4,
			"unchanged": [],
			"skipped": [],
		},
	}))
	.into_response()
}

async fn reset_handler(
	Path(user_id): Path<String>,
	Query(query): Query<Value>,
) -> impl IntoResponse {
	if user_id != "hr team" || query["mode"] != "chat" {
		return StatusCode::NOT_FOUND.into_response();
	}

	Json(serde_json::json!({ "user_id": user_id, "mode": "chat", "reset": true })).into_response()
}

fn client(api_base: &str, endpoint: Endpoint, user_id: &str) -> BotClient {
	BotClient::new(api_base, endpoint, user_id, Duration::from_secs(2))
		.expect("Failed to build client.")
}

#[tokio::test]
async fn ask_endpoint_returns_answer() {
	let (api_base, shutdown) = start_backend().await;
	let reply = client(&api_base, Endpoint::Ask, "hr").send("Who knows Rust?").await;

	assert_eq!(reply, "hr asked: Who knows Rust?");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn chat_endpoint_sends_prompt() {
	let (api_base, shutdown) = start_backend().await;
	let reply = client(&api_base, Endpoint::Chat, "u1").send("Hello, who are you?").await;

	assert_eq!(reply, "chat: Hello, who are you?");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn server_error_becomes_apology() {
	let (api_base, shutdown) = start_backend().await;
	let reply = client(&api_base, Endpoint::Ask, "hr").send("explode").await;

	assert_eq!(reply, SERVICE_ERROR_REPLY);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_backend_is_reported() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to reserve port.");
	let addr = listener.local_addr().expect("Failed to read address.");

	drop(listener);

	let reply = client(&format!("http://{addr}"), Endpoint::Ask, "hr").send("hi").await;

	assert!(reply.starts_with("Error connecting to the bot service: "), "{reply}");
}

#[tokio::test]
async fn upload_summarizes_build_report() {
	let (api_base, shutdown) = start_backend().await;
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let archive = dir.path().join("CVs.zip");
	let notes = dir.path().join("notes.docx");

	std::fs::write(&archive, b"PK").expect("Failed to write archive.");
	std::fs::write(&notes, b"PK").expect("Failed to write notes.");

	let bot = client(&api_base, Endpoint::Ask, "hr");

	assert_eq!(
		bot.upload(&archive).await,
		"Indexed CVs.zip (2 files, 4 chunks, 0 unchanged, 0 skipped)."
	);
	assert_eq!(
		bot.upload(&notes).await,
		"Upload failed (415 Unsupported Media Type): Only .pdf and .zip uploads are accepted."
	);
	assert!(bot.upload(&dir.path().join("missing.zip")).await.starts_with("Cannot read "));

	let _ = shutdown.send(());
}

#[tokio::test]
async fn reset_targets_current_mode_and_encodes_user() {
	let (api_base, shutdown) = start_backend().await;

	assert_eq!(client(&api_base, Endpoint::Chat, "hr team").reset().await, "Conversation cleared.");
	assert_eq!(client(&api_base, Endpoint::Ask, "hr team").reset().await, "Nothing to clear yet.");

	let _ = shutdown.send(());
}
