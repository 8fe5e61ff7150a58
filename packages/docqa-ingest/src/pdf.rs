use std::{
	fs,
	panic::{self, AssertUnwindSafe},
	path::{Component, Path, PathBuf},
};

use serde::Serialize;

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Document {
	/// Path relative to the ingestion root, `/`-separated.
	pub source_id: String,
	pub path: PathBuf,
	/// blake3 of the original file bytes, hex encoded.
	pub content_hash: String,
	pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedFile {
	pub source_id: String,
	pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
	pub documents: Vec<Document>,
	pub skipped: Vec<SkippedFile>,
}

/// Lists `.pdf` files under `dir`, recursively, in path order.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
	let mut found = Vec::new();

	collect_pdfs(dir, &mut found)?;
	found.sort();

	Ok(found)
}

pub fn extract_pdf(path: &Path, root: &Path) -> Result<Document> {
	let bytes = fs::read(path).map_err(Error::io(path))?;
	let content_hash = blake3::hash(&bytes).to_hex().to_string();
	// pdf-extract panics on some malformed inputs; treat that like any other parse failure.
	let extracted =
		panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(&bytes)))
			.map_err(|_| Error::Pdf {
				path: path.to_path_buf(),
				message: "parser panicked".to_string(),
			})?
			.map_err(|err| Error::Pdf { path: path.to_path_buf(), message: err.to_string() })?;

	if extracted.trim().is_empty() {
		return Err(Error::Pdf {
			path: path.to_path_buf(),
			message: "no extractable text".to_string(),
		});
	}

	Ok(Document {
		source_id: source_id(path, root),
		path: path.to_path_buf(),
		content_hash,
		text: extracted,
	})
}

/// Extracts every PDF under `dir`. Files that fail to parse are reported, not fatal.
pub fn load_pdfs(dir: &Path, root: &Path) -> Result<LoadReport> {
	let mut report = LoadReport::default();

	for path in find_pdfs(dir)? {
		match extract_pdf(&path, root) {
			Ok(document) => {
				tracing::debug!(
					source_id = %document.source_id,
					chars = document.text.chars().count(),
					"Extracted PDF text."
				);

				report.documents.push(document);
			},
			Err(Error::Pdf { message, .. }) => {
				let source_id = source_id(&path, root);

				tracing::warn!(%source_id, reason = %message, "Skipping unreadable PDF.");

				report.skipped.push(SkippedFile { source_id, reason: message });
			},
			Err(err) => return Err(err),
		}
	}

	Ok(report)
}

pub(crate) fn source_id(path: &Path, root: &Path) -> String {
	let relative = path.strip_prefix(root).unwrap_or(path);

	relative
		.components()
		.filter_map(|component| match component {
			Component::Normal(name) => Some(name.to_string_lossy()),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("/")
}

fn collect_pdfs(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
	for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
		let entry = entry.map_err(Error::io(dir))?;
		let path = entry.path();
		let file_type = entry.file_type().map_err(Error::io(&path))?;

		if file_type.is_dir() {
			collect_pdfs(&path, found)?;
		} else if file_type.is_file() && is_pdf(&path) {
			found.push(path);
		}
	}

	Ok(())
}

fn is_pdf(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.map(|ext| ext.eq_ignore_ascii_case("pdf"))
		.unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_ids_are_slash_separated_and_relative() {
		let root = Path::new("/data/extracted");
		let path = root.join("cvs").join("jane.pdf");

		assert_eq!(source_id(&path, root), "cvs/jane.pdf");
		assert_eq!(source_id(Path::new("/elsewhere/x.pdf"), root), "elsewhere/x.pdf");
	}
}
