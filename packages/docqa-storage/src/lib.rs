pub mod conversation;
pub mod models;
pub mod vectors;

mod error;

pub use conversation::{Conversation, ConversationStore};
pub use error::Error;
pub use models::{ChunkRecord, ScoredChunk, SourceRecord, Turn, TurnRole, chunk_id};
pub use vectors::VectorStore;

pub type Result<T, E = Error> = std::result::Result<T, E>;
