use std::{
	collections::BTreeMap,
	fs,
	io::Write,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};

use crate::{
	Error, Result,
	models::{ChunkRecord, ScoredChunk, SourceRecord},
};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
	version: u32,
	dimensions: Option<usize>,
	sources: BTreeMap<String, SourceRecord>,
	/// Sorted by `(source_id, chunk_index)`.
	chunks: Vec<ChunkRecord>,
}

/// Exhaustive cosine-similarity index over chunk embeddings, optionally backed by a JSON file.
pub struct VectorStore {
	path: Option<PathBuf>,
	index: RwLock<Index>,
	/// Orders snapshot writes so the last persist always lands last.
	persist_lock: Mutex<()>,
}
impl VectorStore {
	pub fn in_memory() -> Self {
		Self::with_index(None, Index::new())
	}

	/// Loads the snapshot at `path` if it exists; a missing file yields an empty store.
	pub fn open(path: Option<&Path>) -> Result<Self> {
		let Some(path) = path else {
			return Ok(Self::in_memory());
		};
		let index = if path.exists() {
			let raw = fs::read(path)
				.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
			let index: Index = serde_json::from_slice(&raw)
				.map_err(|source| Error::Snapshot { path: path.to_path_buf(), source })?;

			if index.version != SNAPSHOT_VERSION {
				return Err(Error::InvalidArgument(format!(
					"Unsupported index snapshot version {}.",
					index.version
				)));
			}

			tracing::info!(
				path = %path.display(),
				sources = index.sources.len(),
				chunks = index.chunks.len(),
				"Loaded vector index."
			);

			index
		} else {
			Index::new()
		};

		Ok(Self::with_index(Some(path.to_path_buf()), index))
	}

	fn with_index(path: Option<PathBuf>, index: Index) -> Self {
		Self { path, index: RwLock::new(index), persist_lock: Mutex::new(()) }
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Swaps every chunk of `source.source_id` for `chunks`.
	pub async fn replace_source(&self, source: SourceRecord, chunks: Vec<ChunkRecord>) -> Result<()> {
		if let Some(chunk) = chunks.iter().find(|chunk| chunk.source_id != source.source_id) {
			return Err(Error::InvalidArgument(format!(
				"Chunk {} belongs to {}, not {}.",
				chunk.chunk_id, chunk.source_id, source.source_id
			)));
		}

		let mut index = self.index.write().await;
		let remaining_other = index.chunks.iter().any(|chunk| chunk.source_id != source.source_id);
		let expected = if remaining_other { index.dimensions } else { None };
		let dimensions = match (expected, chunks.first()) {
			(Some(expected), _) => Some(expected),
			(None, Some(first)) => Some(first.embedding.len()),
			(None, None) => None,
		};

		if let Some(expected) = dimensions
			&& let Some(chunk) = chunks.iter().find(|chunk| chunk.embedding.len() != expected)
		{
			return Err(Error::DimensionMismatch { expected, actual: chunk.embedding.len() });
		}

		let mut indices = chunks.iter().map(|chunk| chunk.chunk_index).collect::<Vec<_>>();

		indices.sort_unstable();
		indices.dedup();

		if indices.len() != chunks.len() {
			return Err(Error::InvalidArgument(format!(
				"Duplicate chunk index for source {}.",
				source.source_id
			)));
		}

		index.chunks.retain(|chunk| chunk.source_id != source.source_id);
		index.chunks.extend(chunks);
		index.chunks.sort_by(|a, b| {
			a.source_id.cmp(&b.source_id).then_with(|| a.chunk_index.cmp(&b.chunk_index))
		});
		index.dimensions = dimensions;

		tracing::debug!(
			source_id = %source.source_id,
			chunks = source.chunk_count,
			"Replaced source chunks."
		);

		index.sources.insert(source.source_id.clone(), source);

		Ok(())
	}

	/// Top `k` chunks by cosine similarity. Ties keep `(source_id, chunk_index)` order.
	pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
		let index = self.index.read().await;

		if let Some(expected) = index.dimensions
			&& !index.chunks.is_empty()
			&& expected != query.len()
		{
			return Err(Error::DimensionMismatch { expected, actual: query.len() });
		}

		let mut scored = index
			.chunks
			.iter()
			.map(|chunk| (cosine_similarity(query, &chunk.embedding), chunk))
			.collect::<Vec<_>>();

		// Stable sort, so equal scores stay in index order.
		scored.sort_by(|a, b| b.0.total_cmp(&a.0));
		scored.truncate(k);

		Ok(scored
			.into_iter()
			.map(|(score, chunk)| ScoredChunk {
				chunk_id: chunk.chunk_id,
				source_id: chunk.source_id.clone(),
				chunk_index: chunk.chunk_index,
				text: chunk.text.clone(),
				score,
			})
			.collect())
	}

	pub async fn sources(&self) -> Vec<SourceRecord> {
		self.index.read().await.sources.values().cloned().collect()
	}

	pub async fn source_hash(&self, source_id: &str) -> Option<String> {
		self.index.read().await.sources.get(source_id).map(|source| source.content_hash.clone())
	}

	pub async fn len(&self) -> usize {
		self.index.read().await.chunks.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	pub async fn clear(&self) {
		*self.index.write().await = Index::new();
	}

	/// Writes the snapshot to a fresh temp file beside `path` and renames it into place.
	pub async fn persist(&self) -> Result<()> {
		let Some(path) = self.path.clone() else {
			return Ok(());
		};
		let _guard = self.persist_lock.lock().await;
		let payload = {
			let index = self.index.read().await;

			serde_json::to_vec(&*index)
				.map_err(|source| Error::Snapshot { path: path.clone(), source })?
		};
		let bytes = payload.len();
		let target = path.clone();

		tokio::task::spawn_blocking(move || write_snapshot(&target, &payload))
			.await
			.map_err(|source| Error::Task { source })??;

		tracing::info!(path = %path.display(), bytes, "Persisted vector index.");

		Ok(())
	}
}

fn write_snapshot(path: &Path, payload: &[u8]) -> Result<()> {
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	fs::create_dir_all(parent)
		.map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;

	let mut file = NamedTempFile::new_in(parent)
		.map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;

	file.write_all(payload)
		.and_then(|()| file.as_file().sync_all())
		.map_err(|source| Error::Io { path: file.path().to_path_buf(), source })?;
	file.persist(path)
		.map_err(|err| Error::Io { path: path.to_path_buf(), source: err.error })?;

	Ok(())
}

impl Index {
	fn new() -> Self {
		Self { version: SNAPSHOT_VERSION, ..Default::default() }
	}
}

/// Zero for empty, mismatched, or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
	let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cosine_of_parallel_vectors_is_one() {
		let a = [1.0, 2.0, 3.0];
		let b = [2.0, 4.0, 6.0];

		assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn cosine_handles_degenerate_inputs() {
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[], &[]), 0.0);
		assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
	}
}
