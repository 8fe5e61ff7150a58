use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_RAG_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the retrieved context and the past conversation to answer the question. \
Keep answers concise (max 3 sentences).\n\nContext:\n{context}\n\nConversation history:\n{chat_history}";
pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str =
	"You are a helpful AI assistant. Answer all questions to the best of your ability.";

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub chunking: Chunking,
	pub retrieval: Retrieval,
	pub memory: Memory,
	#[serde(default)]
	pub prompts: Prompts,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// JSON snapshot of the vector store. Omit to keep the index in memory only.
	pub index_path: Option<PathBuf>,
	pub upload_dir: PathBuf,
	pub extract_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Model used for retrieval-augmented answers.
	pub answer: LlmProviderConfig,
	/// Model used for memory-only and stateless chat.
	pub chat: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub api_key_env: Option<String>,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub api_key_env: Option<String>,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	pub max_chars: u32,
	pub overlap_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
}

#[derive(Debug, Deserialize)]
pub struct Memory {
	/// Exchanges of history fed to retrieval answers. `None` keeps everything.
	pub rag_window: Option<u32>,
	/// Exchanges of history fed to memory chat. `None` keeps everything.
	pub chat_window: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
	/// Must contain `{context}`; `{chat_history}` is optional.
	pub rag_system: String,
	pub chat_system: String,
}
impl Default for Prompts {
	fn default() -> Self {
		Self {
			rag_system: DEFAULT_RAG_SYSTEM_PROMPT.to_string(),
			chat_system: DEFAULT_CHAT_SYSTEM_PROMPT.to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub max_upload_bytes: u64,
}

fn default_batch_size() -> u32 {
	32
}
