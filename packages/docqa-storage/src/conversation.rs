use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use time::OffsetDateTime;
use tokio::sync::Mutex as AsyncMutex;

use crate::models::{Turn, TurnRole};

/// One user's append-only turn log.
#[derive(Debug)]
pub struct Conversation {
	user_id: String,
	window: Option<u32>,
	turns: Vec<Turn>,
}
impl Conversation {
	pub fn new(user_id: impl Into<String>, window: Option<u32>) -> Self {
		Self { user_id: user_id.into(), window, turns: Vec::new() }
	}

	pub fn push(&mut self, role: TurnRole, text: impl Into<String>) {
		self.turns.push(Turn {
			user_id: self.user_id.clone(),
			role,
			text: text.into(),
			at: OffsetDateTime::now_utc(),
		});
	}

	pub fn record_exchange(&mut self, question: &str, answer: &str) {
		self.push(TurnRole::User, question);
		self.push(TurnRole::Assistant, answer);
	}

	/// The turns a prompt should see: the last `window` exchanges, or everything.
	pub fn history(&self) -> &[Turn] {
		match self.window {
			Some(window) => {
				let keep = (window as usize).saturating_mul(2);

				&self.turns[self.turns.len().saturating_sub(keep)..]
			},
			None => &self.turns,
		}
	}

	pub fn turns(&self) -> &[Turn] {
		&self.turns
	}

	pub fn clear(&mut self) {
		self.turns.clear();
	}
}

/// Conversations keyed by user id. Holding a session's lock for a whole request keeps one user's
/// turns in request order.
pub struct ConversationStore {
	window: Option<u32>,
	sessions: Mutex<HashMap<String, Arc<AsyncMutex<Conversation>>>>,
}
impl ConversationStore {
	pub fn new(window: Option<u32>) -> Self {
		Self { window, sessions: Mutex::new(HashMap::new()) }
	}

	pub fn session(&self, user_id: &str) -> Arc<AsyncMutex<Conversation>> {
		let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());

		sessions
			.entry(user_id.to_string())
			.or_insert_with(|| Arc::new(AsyncMutex::new(Conversation::new(user_id, self.window))))
			.clone()
	}

	/// Full log for `user_id`; empty for unknown users.
	pub async fn snapshot(&self, user_id: &str) -> Vec<Turn> {
		let Some(session) = self.existing(user_id) else {
			return Vec::new();
		};

		session.lock().await.turns().to_vec()
	}

	/// Drops `user_id`'s log. Returns whether the user had one.
	pub async fn reset(&self, user_id: &str) -> bool {
		let Some(session) = self.existing(user_id) else {
			return false;
		};

		session.lock().await.clear();

		true
	}

	pub fn users(&self) -> Vec<String> {
		let sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
		let mut users = sessions.keys().cloned().collect::<Vec<_>>();

		users.sort();

		users
	}

	fn existing(&self, user_id: &str) -> Option<Arc<AsyncMutex<Conversation>>> {
		self.sessions.lock().unwrap_or_else(|err| err.into_inner()).get(user_id).cloned()
	}
}
