//! System prompt rendering for the retrieval and chat flows.

use docqa_providers::ChatMessage;
use docqa_storage::{ScoredChunk, Turn, TurnRole};

/// Substitutes `{name}` placeholders in one pass, so values are never re-expanded.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut rest = template;

	'scan: while let Some(pos) = rest.find('{') {
		out.push_str(&rest[..pos]);

		let tail = &rest[pos..];

		for (name, value) in vars {
			if let Some(after) = tail
				.strip_prefix('{')
				.and_then(|t| t.strip_prefix(*name))
				.and_then(|t| t.strip_prefix('}'))
			{
				out.push_str(value);
				rest = after;

				continue 'scan;
			}
		}

		out.push('{');
		rest = &tail[1..];
	}

	out.push_str(rest);

	out
}

/// Chunk texts separated by blank lines.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
	chunks.iter().map(|chunk| chunk.text.trim()).collect::<Vec<_>>().join("\n\n")
}

pub fn format_history(turns: &[Turn]) -> String {
	turns
		.iter()
		.map(|turn| match turn.role {
			TurnRole::User => format!("User: {}", turn.text),
			TurnRole::Assistant => format!("Assistant: {}", turn.text),
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn rag_system(template: &str, chunks: &[ScoredChunk], history: &[Turn]) -> String {
	let context = format_context(chunks);
	let chat_history = format_history(history);

	render(template, &[("context", &context), ("chat_history", &chat_history)])
}

pub fn history_messages(turns: &[Turn]) -> impl Iterator<Item = ChatMessage> + '_ {
	turns.iter().map(|turn| match turn.role {
		TurnRole::User => ChatMessage::user(turn.text.clone()),
		TurnRole::Assistant => ChatMessage::assistant(turn.text.clone()),
	})
}
