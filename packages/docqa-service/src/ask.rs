use serde::{Deserialize, Serialize};

use crate::{DocQaService, Result, prompt};
use docqa_providers::ChatMessage;

/// Conversation used when a question arrives without a user id.
pub const DEFAULT_USER_ID: &str = "default";

#[derive(Clone, Debug, Deserialize)]
pub struct AskRequest {
	pub question: String,
	#[serde(default)]
	pub user_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AskResponse {
	pub answer: String,
	pub sources: Vec<AskSource>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AskSource {
	pub source_id: String,
	pub chunk_index: u32,
	pub score: f32,
}

impl DocQaService {
	/// Answers `question` from the indexed documents and the caller's recent exchanges.
	pub async fn ask(&self, req: AskRequest) -> Result<AskResponse> {
		let question = crate::require_text("question", &req.question)?;
		let user_id = req
			.user_id
			.as_deref()
			.map(str::trim)
			.filter(|user_id| !user_id.is_empty())
			.unwrap_or(DEFAULT_USER_ID);
		let session = self.rag_memory.session(user_id);
		// Held until the exchange is recorded so one user's turns stay in request order.
		let mut conversation = session.lock().await;
		let hits = if self.store.is_empty().await {
			Vec::new()
		} else {
			let query = self.embed_checked(&[question.to_string()]).await?;
			let top_k = self.cfg.retrieval.top_k as usize;

			match query.first() {
				Some(query) => self.store.search(query, top_k).await?,
				None => Vec::new(),
			}
		};
		let system = prompt::rag_system(&self.cfg.prompts.rag_system, &hits, conversation.history());
		let messages = [ChatMessage::system(system), ChatMessage::user(question)];
		let answer = self.providers.chat.complete(&self.cfg.providers.answer, &messages).await?;

		conversation.record_exchange(question, &answer);

		tracing::info!(
			user_id,
			retrieved = hits.len(),
			turns = conversation.turns().len(),
			"Answered question."
		);

		Ok(AskResponse {
			answer,
			sources: hits
				.into_iter()
				.map(|hit| AskSource {
					source_id: hit.source_id,
					chunk_index: hit.chunk_index,
					score: hit.score,
				})
				.collect(),
		})
	}
}
