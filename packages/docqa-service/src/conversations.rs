use serde::{Deserialize, Serialize};

use crate::{DocQaService, Error, Result};
use docqa_storage::Turn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
	#[default]
	Rag,
	Chat,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryResponse {
	pub user_id: String,
	pub mode: ConversationMode,
	pub turns: Vec<Turn>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetResponse {
	pub user_id: String,
	pub mode: ConversationMode,
	pub reset: bool,
}

impl DocQaService {
	/// Full turn log for `user_id`; unknown users have an empty log.
	pub async fn history(&self, user_id: &str, mode: ConversationMode) -> Result<HistoryResponse> {
		let user_id = crate::require_text("user_id", user_id)?;
		let turns = self.memory(mode).snapshot(user_id).await;

		Ok(HistoryResponse { user_id: user_id.to_string(), mode, turns })
	}

	pub async fn reset(&self, user_id: &str, mode: ConversationMode) -> Result<ResetResponse> {
		let user_id = crate::require_text("user_id", user_id)?;

		if !self.memory(mode).reset(user_id).await {
			return Err(Error::NotFound { message: format!("No conversation for user {user_id:?}.") });
		}

		tracing::info!(user_id, ?mode, "Reset conversation.");

		Ok(ResetResponse { user_id: user_id.to_string(), mode, reset: true })
	}
}
