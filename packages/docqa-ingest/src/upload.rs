use std::{
	fs,
	path::{Path, PathBuf},
};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
	Pdf,
	Zip,
}
impl UploadKind {
	pub fn from_file_name(file_name: &str) -> Option<Self> {
		let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();

		match extension.as_str() {
			"pdf" => Some(Self::Pdf),
			"zip" => Some(Self::Zip),
			_ => None,
		}
	}
}

/// Keeps only the final path component of a client-supplied name.
pub fn sanitize_file_name(file_name: &str) -> Result<String> {
	let last = file_name.rsplit(['/', '\\']).next().unwrap_or_default().trim();

	if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
		return Err(Error::InvalidFileName { file_name: file_name.to_string() });
	}

	Ok(last.to_string())
}

/// Writes an upload into `dir`, replacing any earlier file with the same name.
pub fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(UploadKind, PathBuf)> {
	let name = sanitize_file_name(file_name)?;
	let kind = UploadKind::from_file_name(&name)
		.ok_or_else(|| Error::UnsupportedUpload { file_name: name.clone() })?;

	fs::create_dir_all(dir).map_err(Error::io(dir))?;

	let path = dir.join(&name);

	fs::write(&path, bytes).map_err(Error::io(&path))?;

	tracing::info!(path = %path.display(), bytes = bytes.len(), ?kind, "Saved upload.");

	Ok((kind, path))
}
