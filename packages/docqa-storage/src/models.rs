use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

const CHUNK_NAMESPACE: Uuid = Uuid::from_u128(0x5f0c_2a4e_8d1b_4c77_9a36_e2b1_d0c4_7f18);

/// Deterministic id for the `chunk_index`-th chunk of `source_id`.
pub fn chunk_id(source_id: &str, chunk_index: u32) -> Uuid {
	Uuid::new_v5(&CHUNK_NAMESPACE, format!("{source_id}:{chunk_index}").as_bytes())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
	pub chunk_id: Uuid,
	pub source_id: String,
	pub chunk_index: u32,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
	pub embedding: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
	pub source_id: String,
	pub content_hash: String,
	pub chunk_count: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub ingested_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredChunk {
	pub chunk_id: Uuid,
	pub source_id: String,
	pub chunk_index: u32,
	pub text: String,
	pub score: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
	User,
	Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
	pub user_id: String,
	pub role: TurnRole,
	pub text: String,
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
}
