use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to access index file {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Index file {path:?} is not a valid snapshot.")]
	Snapshot { path: PathBuf, source: serde_json::Error },
	#[error("Embedding dimension mismatch: store holds {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Snapshot writer task failed.")]
	Task { source: tokio::task::JoinError },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
