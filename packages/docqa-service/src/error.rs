pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unsupported upload {file_name:?}; only .pdf and .zip files are accepted.")]
	UnsupportedUpload { file_name: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Ingest error: {message}")]
	Ingest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}

impl From<docqa_ingest::Error> for Error {
	fn from(err: docqa_ingest::Error) -> Self {
		match err {
			docqa_ingest::Error::UnsupportedUpload { file_name } => {
				Self::UnsupportedUpload { file_name }
			},
			docqa_ingest::Error::InvalidFileName { .. } => {
				Self::InvalidRequest { message: err.to_string() }
			},
			docqa_ingest::Error::Io { .. } => Self::Storage { message: err.to_string() },
			docqa_ingest::Error::Zip { .. } | docqa_ingest::Error::Pdf { .. } => {
				Self::Ingest { message: err.to_string() }
			},
		}
	}
}

impl From<docqa_providers::Error> for Error {
	fn from(err: docqa_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<docqa_storage::Error> for Error {
	fn from(err: docqa_storage::Error) -> Self {
		match err {
			docqa_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Ingest { message: format!("Ingest task failed: {err}") }
	}
}
