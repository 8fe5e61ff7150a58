use axum::{
	Json, Router,
	extract::{
		DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State,
		multipart::MultipartError, rejection::JsonRejection,
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use docqa_service::{
	AskRequest, AskResponse, BuildReport, BuildRequest, ChatRequest, ChatResponse,
	CompleteRequest, ConversationMode, DocumentsResponse, Error as ServiceError, HistoryResponse,
	ResetResponse, UploadReport,
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1_024;

#[derive(Debug, Deserialize)]
struct ConversationQuery {
	#[serde(default)]
	mode: ConversationMode,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

/// `Json` body whose rejections render as [`ApiError`].
struct ApiJson<T>(T);
impl<T, S> FromRequest<S> for ApiJson<T>
where
	Json<T>: FromRequest<S, Rejection = JsonRejection>,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state).await?;

		Ok(Self(value))
	}
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None)
			},
			ServiceError::UnsupportedUpload { file_name } => json_error(
				StatusCode::UNSUPPORTED_MEDIA_TYPE,
				"UNSUPPORTED_UPLOAD",
				format!("Only .pdf and .zip uploads are accepted, got {file_name:?}."),
				Some(vec!["$.file".to_string()]),
			),
			ServiceError::NotFound { message } => {
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None)
			},
			ServiceError::Ingest { message } => {
				json_error(StatusCode::UNPROCESSABLE_ENTITY, "INGEST_FAILED", message, None)
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider call failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage operation failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
					None,
				)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl From<MultipartError> for ApiError {
	fn from(err: MultipartError) -> Self {
		json_error(err.status(), "INVALID_REQUEST", err.body_text(), Some(vec!["$.file".to_string()]))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	let upload_limit = state.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD_BYTES);

	Router::new()
		.route("/health", get(health))
		.route("/v1/ask", post(ask))
		.route("/v1/chat", post(chat))
		.route("/v1/complete", post(complete))
		.route(
			"/v1/documents",
			post(upload_document).get(list_documents).layer(DefaultBodyLimit::max(upload_limit)),
		)
		.route("/v1/conversations/{user_id}", get(conversation_history).delete(reset_conversation))
		.with_state(state)
}

/// Routes that act on server-side paths. Serve on a loopback address only.
pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/build", post(build_index)).with_state(state)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ask(
	State(state): State<AppState>,
	ApiJson(payload): ApiJson<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
	let response = state.service.ask(payload).await?;

	Ok(Json(response))
}

async fn chat(
	State(state): State<AppState>,
	ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(payload).await?;

	Ok(Json(response))
}

async fn complete(
	State(state): State<AppState>,
	ApiJson(payload): ApiJson<CompleteRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.complete(payload).await?;

	Ok(Json(response))
}

async fn upload_document(
	State(state): State<AppState>,
	mut multipart: Multipart,
) -> Result<Json<UploadReport>, ApiError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some("file") {
			continue;
		}

		let file_name = field.file_name().map(str::to_string).ok_or_else(|| {
			json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_REQUEST",
				"The file part must carry a file name.",
				Some(vec!["$.file".to_string()]),
			)
		})?;
		let bytes = field.bytes().await?;
		let response = state.service.upload(&file_name, &bytes).await?;

		return Ok(Json(response));
	}

	Err(json_error(
		StatusCode::BAD_REQUEST,
		"INVALID_REQUEST",
		"Missing multipart field \"file\".",
		Some(vec!["$.file".to_string()]),
	))
}

async fn list_documents(
	State(state): State<AppState>,
) -> Result<Json<DocumentsResponse>, ApiError> {
	let response = state.service.documents().await?;

	Ok(Json(response))
}

async fn conversation_history(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
	Query(query): Query<ConversationQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let response = state.service.history(&user_id, query.mode).await?;

	Ok(Json(response))
}

async fn reset_conversation(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
	Query(query): Query<ConversationQuery>,
) -> Result<Json<ResetResponse>, ApiError> {
	let response = state.service.reset(&user_id, query.mode).await?;

	Ok(Json(response))
}

async fn build_index(
	State(state): State<AppState>,
	ApiJson(payload): ApiJson<BuildRequest>,
) -> Result<Json<BuildReport>, ApiError> {
	let response = state.service.build_from_archive(payload).await?;

	Ok(Json(response))
}
