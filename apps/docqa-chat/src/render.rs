//! Chat bubbles for a plain terminal: user on the right, bot on the left.

use colored::Colorize;

use crate::session::{Message, Speaker};

pub const USER_ICON: &str = "👤";
pub const BOT_ICON: &str = "🤖";
pub const THINKING: &str = "🤔 Thinking...";

/// Icons render two columns wide; the gutter is the icon plus one space.
const GUTTER: usize = 3;
/// Border and inner padding on both sides of the text.
const FRAME: usize = 4;
const MIN_TEXT_WIDTH: usize = 10;

/// Lays out one bubble for a terminal `width` columns wide. Text wraps at three quarters of it.
pub fn bubble_lines(speaker: Speaker, content: &str, width: usize) -> Vec<String> {
	let text_width = (width * 3 / 4).saturating_sub(FRAME + GUTTER).max(MIN_TEXT_WIDTH);
	let wrapped = wrap(content, text_width);
	let inner = wrapped.iter().map(|line| line.chars().count()).max().unwrap_or(0);
	let mut framed = Vec::with_capacity(wrapped.len() + 2);

	framed.push(format!("╭{}╮", "─".repeat(inner + 2)));

	for line in &wrapped {
		let pad = inner - line.chars().count();

		framed.push(format!("│ {line}{} │", " ".repeat(pad)));
	}

	framed.push(format!("╰{}╯", "─".repeat(inner + 2)));

	match speaker {
		Speaker::Bot => framed
			.into_iter()
			.enumerate()
			.map(|(idx, line)| {
				if idx == 1 {
					format!("{BOT_ICON} {line}")
				} else {
					format!("{}{line}", " ".repeat(GUTTER))
				}
			})
			.collect(),
		Speaker::User => {
			let indent = " ".repeat(width.saturating_sub(inner + FRAME + GUTTER));

			framed
				.into_iter()
				.enumerate()
				.map(|(idx, line)| {
					if idx == 1 {
						format!("{indent}{line} {USER_ICON}")
					} else {
						format!("{indent}{line}")
					}
				})
				.collect()
		},
	}
}

pub fn paint(message: &Message, width: usize) -> String {
	let lines = bubble_lines(message.speaker, &message.content, width);

	lines
		.iter()
		.map(|line| match message.speaker {
			Speaker::User => line.blue().to_string(),
			Speaker::Bot => line.yellow().to_string(),
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn thinking(width: usize) -> String {
	bubble_lines(Speaker::Bot, THINKING, width)
		.iter()
		.map(|line| line.dimmed().to_string())
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn notice(text: &str) -> String {
	text.dimmed().italic().to_string()
}

/// Greedy word wrap. Words wider than `width` are split between characters.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
	let width = width.max(1);
	let mut lines = Vec::new();

	for paragraph in text.lines() {
		let mut current = String::new();
		let mut current_len = 0;

		for word in paragraph.split_whitespace() {
			let mut word = word;

			while word.chars().count() > width {
				if current_len > 0 {
					lines.push(std::mem::take(&mut current));
					current_len = 0;
				}

				let split = word.char_indices().nth(width).map(|(idx, _)| idx).unwrap_or(word.len());

				lines.push(word[..split].to_string());
				word = &word[split..];
			}

			let word_len = word.chars().count();

			if word_len == 0 {
				continue;
			}
			if current_len > 0 && current_len + 1 + word_len > width {
				lines.push(std::mem::take(&mut current));
				current_len = 0;
			}
			if current_len > 0 {
				current.push(' ');
				current_len += 1;
			}

			current.push_str(word);
			current_len += word_len;
		}

		lines.push(current);
	}

	while lines.len() > 1 && lines.last().is_some_and(String::is_empty) {
		lines.pop();
	}

	if lines.is_empty() {
		lines.push(String::new());
	}

	lines
}
