use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unsupported upload {file_name:?}; only .pdf and .zip files are accepted.")]
	UnsupportedUpload { file_name: String },
	#[error("Invalid file name {file_name:?}.")]
	InvalidFileName { file_name: String },
	#[error("Failed to access {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Malformed zip archive {path:?}.")]
	Zip { path: PathBuf, source: zip::result::ZipError },
	#[error("Failed to extract text from {path:?}: {message}")]
	Pdf { path: PathBuf, message: String },
}
impl Error {
	pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
		move |source| Self::Io { path: path.to_path_buf(), source }
	}
}
