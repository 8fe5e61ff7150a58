use std::{
	fs::{self, File},
	io,
	path::{Component, Path, PathBuf},
};

use zip::ZipArchive;

use crate::{Error, Result};

const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Extracts every file of `archive` under `dest` and returns the written paths. Entries that
/// would land outside `dest` are skipped.
pub fn unzip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
	let file = File::open(archive).map_err(Error::io(archive))?;
	let mut zip = ZipArchive::new(file)
		.map_err(|source| Error::Zip { path: archive.to_path_buf(), source })?;

	fs::create_dir_all(dest).map_err(Error::io(dest))?;

	let mut written = Vec::new();

	for index in 0..zip.len() {
		let mut entry = zip
			.by_index(index)
			.map_err(|source| Error::Zip { path: archive.to_path_buf(), source })?;
		let Some(relative) = entry.enclosed_name() else {
			tracing::warn!(
				archive = %archive.display(),
				entry = entry.name(),
				"Skipping zip entry outside the extraction root."
			);

			continue;
		};

		if is_metadata(&relative) {
			continue;
		}

		let target = dest.join(&relative);

		if entry.is_dir() {
			fs::create_dir_all(&target).map_err(Error::io(&target))?;

			continue;
		}
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent).map_err(Error::io(parent))?;
		}

		let mut out = File::create(&target).map_err(Error::io(&target))?;

		io::copy(&mut entry, &mut out).map_err(Error::io(&target))?;

		written.push(target);
	}

	tracing::info!(
		archive = %archive.display(),
		dest = %dest.display(),
		files = written.len(),
		"Extracted archive."
	);

	Ok(written)
}

fn is_metadata(relative: &Path) -> bool {
	relative.components().any(|component| match component {
		Component::Normal(name) => {
			let name = name.to_string_lossy();

			name == MACOS_METADATA_DIR || name.starts_with("._")
		},
		_ => false,
	})
}
