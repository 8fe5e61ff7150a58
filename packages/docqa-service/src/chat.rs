use serde::{Deserialize, Serialize};

use crate::{DocQaService, Result, prompt};
use docqa_providers::ChatMessage;

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
	pub user_id: String,
	pub prompt: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompleteRequest {
	pub prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
	pub answer: String,
}

impl DocQaService {
	/// Memory-only chat: system prompt, the user's prior turns as messages, then `prompt`.
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let user_id = crate::require_text("user_id", &req.user_id)?;
		let text = crate::require_text("prompt", &req.prompt)?;
		let session = self.chat_memory.session(user_id);
		let mut conversation = session.lock().await;
		let mut messages = Vec::with_capacity(conversation.history().len() + 2);

		messages.push(ChatMessage::system(self.cfg.prompts.chat_system.clone()));
		messages.extend(prompt::history_messages(conversation.history()));
		messages.push(ChatMessage::user(text));

		let answer = self.providers.chat.complete(&self.cfg.providers.chat, &messages).await?;

		conversation.record_exchange(text, &answer);

		tracing::info!(user_id, messages = messages.len(), "Answered chat prompt.");

		Ok(ChatResponse { answer })
	}

	/// Stateless single-turn completion.
	pub async fn complete(&self, req: CompleteRequest) -> Result<ChatResponse> {
		let text = crate::require_text("prompt", &req.prompt)?;
		let answer =
			self.providers.chat.complete(&self.cfg.providers.chat, &[ChatMessage::user(text)]).await?;

		Ok(ChatResponse { answer })
	}
}
