use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_chars: usize,
	pub overlap_chars: usize,
}
impl Default for ChunkingConfig {
	fn default() -> Self {
		Self { max_chars: 1_000, overlap_chars: 200 }
	}
}

/// A window of the input. `text` is always `input[start_offset..end_offset]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
	pub chunk_index: u32,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

#[derive(Clone, Copy, Debug)]
struct Piece {
	start: usize,
	end: usize,
	chars: usize,
}

/// Packs sentence pieces into windows of at most `max_chars` characters. After each window is
/// emitted, trailing pieces totalling at most `overlap_chars` characters are carried into the next.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let max_chars = cfg.max_chars.max(1);
	let overlap_chars = cfg.overlap_chars.min(max_chars - 1);
	let mut chunks = Vec::new();
	let mut window: VecDeque<Piece> = VecDeque::new();
	let mut window_chars = 0_usize;

	for piece in pieces(text, max_chars) {
		if window_chars + piece.chars > max_chars && !window.is_empty() {
			push_window(text, &window, &mut chunks);

			while let Some(front) = window.front() {
				if window_chars <= overlap_chars && window_chars + piece.chars <= max_chars {
					break;
				}

				window_chars -= front.chars;
				window.pop_front();
			}
		}

		window_chars += piece.chars;
		window.push_back(piece);
	}

	if !window.is_empty() {
		push_window(text, &window, &mut chunks);
	}

	tracing::debug!(input_bytes = text.len(), chunks = chunks.len(), "Split text into chunks.");

	chunks
}

fn push_window(text: &str, window: &VecDeque<Piece>, chunks: &mut Vec<Chunk>) {
	let (Some(first), Some(last)) = (window.front(), window.back()) else {
		return;
	};
	let raw = &text[first.start..last.end];
	let trimmed_start = raw.trim_start();
	let leading = raw.len() - trimmed_start.len();
	let trimmed = trimmed_start.trim_end();

	if trimmed.is_empty() {
		return;
	}

	let start_offset = first.start + leading;
	let end_offset = start_offset + trimmed.len();

	// A carried overlap plus trimmed filler can land inside the previous chunk.
	if chunks
		.last()
		.is_some_and(|prev| prev.start_offset <= start_offset && end_offset <= prev.end_offset)
	{
		return;
	}

	chunks.push(Chunk {
		chunk_index: chunks.len() as u32,
		start_offset,
		end_offset,
		text: trimmed.to_string(),
	});
}

// Sentences first; oversized sentences fall back to words, oversized words to characters.
fn pieces(text: &str, max_chars: usize) -> Vec<Piece> {
	let mut out = Vec::new();

	for (start, sentence) in text.split_sentence_bound_indices() {
		let chars = sentence.chars().count();

		if chars <= max_chars {
			out.push(Piece { start, end: start + sentence.len(), chars });

			continue;
		}

		for (offset, word) in sentence.split_word_bound_indices() {
			let word_start = start + offset;
			let word_chars = word.chars().count();

			if word_chars <= max_chars {
				out.push(Piece { start: word_start, end: word_start + word.len(), chars: word_chars });

				continue;
			}

			let mut piece_start = word_start;
			let mut count = 0_usize;

			for (idx, _) in word.char_indices() {
				if count == max_chars {
					out.push(Piece { start: piece_start, end: word_start + idx, chars: count });

					piece_start = word_start + idx;
					count = 0;
				}

				count += 1;
			}

			out.push(Piece { start: piece_start, end: word_start + word.len(), chars: count });
		}
	}

	out
}
