use std::{path::Path, time::Duration};

use clap::ValueEnum;
use color_eyre::eyre;
use reqwest::{
	Client, StatusCode, Url,
	multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::Value;

pub const SERVICE_ERROR_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Which backend conversation the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Endpoint {
	/// Retrieval over the indexed documents.
	#[default]
	Ask,
	/// Memory-only chat.
	Chat,
}
impl Endpoint {
	fn mode(self) -> &'static str {
		match self {
			Self::Ask => "rag",
			Self::Chat => "chat",
		}
	}
}

#[derive(Deserialize)]
struct AnswerBody {
	answer: String,
}

#[derive(Deserialize)]
struct UploadBody {
	file_name: String,
	build: BuildBody,
}

#[derive(Deserialize)]
struct BuildBody {
	files: Vec<String>,
	chunks: u64,
	unchanged: Vec<String>,
	skipped: Vec<Value>,
}

pub struct BotClient {
	http: Client,
	base: Url,
	endpoint: Endpoint,
	user_id: String,
}
impl BotClient {
	pub fn new(
		api_base: &str,
		endpoint: Endpoint,
		user_id: impl Into<String>,
		timeout: Duration,
	) -> color_eyre::Result<Self> {
		let base = Url::parse(api_base)?;

		if base.cannot_be_a_base() {
			return Err(eyre::eyre!("api_base must be an http(s) URL."));
		}

		let http = Client::builder().timeout(timeout).build()?;

		Ok(Self { http, base, endpoint, user_id: user_id.into() })
	}

	pub fn endpoint(&self) -> Endpoint {
		self.endpoint
	}

	/// Sends one message and returns the text to show in the bot bubble. Failures become replies.
	pub async fn send(&self, text: &str) -> String {
		let request = match self.endpoint {
			Endpoint::Ask => self
				.http
				.post(self.url(&["v1", "ask"]))
				.json(&serde_json::json!({ "question": text, "user_id": self.user_id })),
			Endpoint::Chat => self
				.http
				.post(self.url(&["v1", "chat"]))
				.json(&serde_json::json!({ "user_id": self.user_id, "prompt": text })),
		};

		match request.send().await {
			Ok(response) if response.status() == StatusCode::OK => {
				match response.json::<AnswerBody>().await {
					Ok(body) => body.answer,
					Err(err) => {
						tracing::warn!(error = %err, "Unreadable answer body.");

						SERVICE_ERROR_REPLY.to_string()
					},
				}
			},
			Ok(response) => {
				tracing::warn!(status = %response.status(), "Bot service returned an error.");

				SERVICE_ERROR_REPLY.to_string()
			},
			Err(err) => format!("Error connecting to the bot service: {err}"),
		}
	}

	/// Uploads a `.pdf` or `.zip` for indexing and summarizes the outcome.
	pub async fn upload(&self, path: &Path) -> String {
		let bytes = match tokio::fs::read(path).await {
			Ok(bytes) => bytes,
			Err(err) => return format!("Cannot read {}: {err}", path.display()),
		};
		let file_name = path
			.file_name()
			.and_then(|name| name.to_str())
			.unwrap_or("upload")
			.to_string();
		let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
		let response =
			match self.http.post(self.url(&["v1", "documents"])).multipart(form).send().await {
				Ok(response) => response,
				Err(err) => return format!("Error connecting to the bot service: {err}"),
			};

		if !response.status().is_success() {
			let status = response.status();
			let message = response
				.json::<Value>()
				.await
				.ok()
				.and_then(|body| body["message"].as_str().map(str::to_string))
				.unwrap_or_else(|| SERVICE_ERROR_REPLY.to_string());

			return format!("Upload failed ({status}): {message}");
		}

		match response.json::<UploadBody>().await {
			Ok(body) => format!(
				"Indexed {} ({} files, {} chunks, {} unchanged, {} skipped).",
				body.file_name,
				body.build.files.len(),
				body.build.chunks,
				body.build.unchanged.len(),
				body.build.skipped.len()
			),
			Err(_) => SERVICE_ERROR_REPLY.to_string(),
		}
	}

	/// Clears this user's server-side conversation for the current endpoint.
	pub async fn reset(&self) -> String {
		let mut url = self.url(&["v1", "conversations", &self.user_id]);

		url.query_pairs_mut().append_pair("mode", self.endpoint.mode());

		match self.http.delete(url).send().await {
			Ok(response) if response.status().is_success() => "Conversation cleared.".to_string(),
			Ok(response) if response.status() == StatusCode::NOT_FOUND => {
				"Nothing to clear yet.".to_string()
			},
			Ok(_) => SERVICE_ERROR_REPLY.to_string(),
			Err(err) => format!("Error connecting to the bot service: {err}"),
		}
	}

	fn url(&self, segments: &[&str]) -> Url {
		let mut url = self.base.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}
}
