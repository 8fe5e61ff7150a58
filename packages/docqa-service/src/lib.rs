pub mod ask;
pub mod build;
pub mod chat;
pub mod conversations;
pub mod prompt;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use ask::{AskRequest, AskResponse, AskSource, DEFAULT_USER_ID};
pub use build::{BuildReport, BuildRequest, DocumentsResponse, UploadReport};
pub use chat::{ChatRequest, ChatResponse, CompleteRequest};
pub use conversations::{ConversationMode, HistoryResponse, ResetResponse};
pub use error::{Error, Result};

use docqa_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use docqa_providers::{ChatMessage, chat as chat_api, embedding};
use docqa_storage::{ConversationStore, VectorStore};
use tokio::sync::Mutex;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}

pub struct DocQaService {
	pub cfg: Config,
	pub store: VectorStore,
	pub rag_memory: ConversationStore,
	pub chat_memory: ConversationStore,
	pub providers: Providers,
	/// Held across unzip, indexing and persist so index builds never interleave.
	build_lock: Mutex<()>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(chat_api::complete(cfg, messages).await?) })
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider }
	}
}

impl DocQaService {
	pub fn new(cfg: Config, store: VectorStore) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: VectorStore, providers: Providers) -> Self {
		let rag_memory = ConversationStore::new(cfg.memory.rag_window);
		let chat_memory = ConversationStore::new(cfg.memory.chat_window);

		Self { cfg, store, rag_memory, chat_memory, providers, build_lock: Mutex::new(()) }
	}

	pub(crate) fn memory(&self, mode: ConversationMode) -> &ConversationStore {
		match mode {
			ConversationMode::Rag => &self.rag_memory,
			ConversationMode::Chat => &self.chat_memory,
		}
	}

	/// Embeds `texts` and checks the provider returned one vector of the configured size per text.
	pub(crate) async fn embed_checked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let cfg = &self.cfg.providers.embedding;
		let vectors = self.providers.embedding.embed(cfg, texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}
		if vectors.iter().any(|vector| vector.len() != cfg.dimensions as usize) {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vectors)
	}
}

pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::invalid(format!("{field} must be non-empty.")));
	}

	Ok(trimmed)
}
