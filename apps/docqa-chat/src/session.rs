#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
	User,
	Bot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
	pub speaker: Speaker,
	pub content: String,
}

/// Client-side transcript. While `processing` is set the last message is the user's pending input.
#[derive(Debug, Default)]
pub struct Session {
	messages: Vec<Message>,
	processing: bool,
}
impl Session {
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn is_processing(&self) -> bool {
		self.processing
	}

	/// Records user input. Ignored while a reply is pending or when `text` is blank.
	pub fn submit(&mut self, text: &str) -> bool {
		let text = text.trim();

		if self.processing || text.is_empty() {
			return false;
		}

		self.messages.push(Message { speaker: Speaker::User, content: text.to_string() });
		self.processing = true;

		true
	}

	pub fn pending(&self) -> Option<&str> {
		if !self.processing {
			return None;
		}

		self.messages
			.last()
			.filter(|message| message.speaker == Speaker::User)
			.map(|message| message.content.as_str())
	}

	pub fn resolve(&mut self, reply: impl Into<String>) {
		self.messages.push(Message { speaker: Speaker::Bot, content: reply.into() });
		self.processing = false;
	}

	pub fn clear(&mut self) {
		self.messages.clear();
		self.processing = false;
	}
}
