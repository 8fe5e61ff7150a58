use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DocQaService, Error, Result};
use docqa_chunking::ChunkingConfig;
use docqa_ingest::{Document, LoadReport, SkippedFile, UploadKind};
use docqa_storage::{ChunkRecord, SourceRecord, chunk_id};

#[derive(Clone, Debug, Deserialize)]
pub struct BuildRequest {
	/// Zip archive on the server's filesystem.
	pub path: PathBuf,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildReport {
	/// Sources (re)indexed by this build.
	pub files: Vec<String>,
	pub chunks: u64,
	/// Sources whose content hash matched the indexed copy.
	pub unchanged: Vec<String>,
	pub skipped: Vec<SkippedFile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UploadReport {
	pub file_name: String,
	pub kind: UploadKind,
	pub build: BuildReport,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentsResponse {
	pub sources: Vec<SourceRecord>,
	pub chunks: usize,
}

impl DocQaService {
	/// Unzips `path` under the extraction root, indexes every readable PDF, and persists the index.
	pub async fn build_from_archive(&self, req: BuildRequest) -> Result<BuildReport> {
		let _build = self.build_lock.lock().await;

		self.build_archive(req.path).await
	}

	/// Saves an uploaded `.pdf` or `.zip` and indexes it.
	pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<UploadReport> {
		if UploadKind::from_file_name(file_name).is_none() {
			return Err(Error::UnsupportedUpload { file_name: file_name.to_string() });
		}
		if bytes.is_empty() {
			return Err(Error::invalid("Uploaded file is empty."));
		}
		if bytes.len() as u64 > self.cfg.security.max_upload_bytes {
			return Err(Error::invalid(format!(
				"Uploaded file exceeds {} bytes.",
				self.cfg.security.max_upload_bytes
			)));
		}

		let saved_name = docqa_ingest::sanitize_file_name(file_name)?;
		let upload_dir = self.cfg.storage.upload_dir.clone();
		let _build = self.build_lock.lock().await;
		let (kind, path) = docqa_ingest::save_upload(&upload_dir, file_name, bytes)?;

		tracing::info!(path = %path.display(), ?kind, bytes = bytes.len(), "Saved upload.");

		let build = match kind {
			UploadKind::Zip => self.build_archive(path).await?,
			UploadKind::Pdf => {
				let document = tokio::task::spawn_blocking(move || {
					docqa_ingest::extract_pdf(&path, &upload_dir)
				})
				.await??;

				self.index_documents(LoadReport { documents: vec![document], skipped: Vec::new() })
					.await?
			},
		};

		Ok(UploadReport { file_name: saved_name, kind, build })
	}

	pub async fn documents(&self) -> Result<DocumentsResponse> {
		Ok(DocumentsResponse { sources: self.store.sources().await, chunks: self.store.len().await })
	}

	/// Callers hold `build_lock`.
	async fn build_archive(&self, archive: PathBuf) -> Result<BuildReport> {
		if !archive.is_file() {
			return Err(Error::NotFound { message: format!("Archive {archive:?} does not exist.") });
		}

		let root = self.cfg.storage.extract_dir.clone();
		let dest = root.join(archive_stem(&archive)?);
		let loaded = tokio::task::spawn_blocking(move || -> docqa_ingest::Result<LoadReport> {
			docqa_ingest::unzip(&archive, &dest)?;
			docqa_ingest::load_pdfs(&dest, &root)
		})
		.await??;

		self.index_documents(loaded).await
	}

	async fn index_documents(&self, loaded: LoadReport) -> Result<BuildReport> {
		let mut report = BuildReport { skipped: loaded.skipped, ..Default::default() };
		let chunking = ChunkingConfig {
			max_chars: self.cfg.chunking.max_chars as usize,
			overlap_chars: self.cfg.chunking.overlap_chars as usize,
		};

		for document in loaded.documents {
			if self.store.source_hash(&document.source_id).await.as_deref()
				== Some(document.content_hash.as_str())
			{
				tracing::debug!(source_id = %document.source_id, "Source unchanged.");

				report.unchanged.push(document.source_id);

				continue;
			}

			let records = self.embed_document(&document, &chunking).await?;

			if records.is_empty() {
				report.skipped.push(SkippedFile {
					source_id: document.source_id,
					reason: "no text chunks".to_string(),
				});

				continue;
			}

			let source = SourceRecord {
				source_id: document.source_id.clone(),
				content_hash: document.content_hash,
				chunk_count: records.len() as u32,
				ingested_at: OffsetDateTime::now_utc(),
			};

			report.chunks += records.len() as u64;

			self.store.replace_source(source, records).await?;

			report.files.push(document.source_id);
		}

		if !report.files.is_empty() {
			self.store.persist().await?;
		}

		tracing::info!(
			files = report.files.len(),
			chunks = report.chunks,
			unchanged = report.unchanged.len(),
			skipped = report.skipped.len(),
			"Index build finished."
		);

		Ok(report)
	}

	async fn embed_document(
		&self,
		document: &Document,
		chunking: &ChunkingConfig,
	) -> Result<Vec<ChunkRecord>> {
		let chunks = docqa_chunking::split_text(&document.text, chunking);
		let batch_size = (self.cfg.providers.embedding.batch_size as usize).max(1);
		let mut records = Vec::with_capacity(chunks.len());

		for batch in chunks.chunks(batch_size) {
			let texts = batch.iter().map(|chunk| chunk.text.clone()).collect::<Vec<_>>();
			let vectors = self.embed_checked(&texts).await?;

			for (chunk, embedding) in batch.iter().zip(vectors) {
				records.push(ChunkRecord {
					chunk_id: chunk_id(&document.source_id, chunk.chunk_index),
					source_id: document.source_id.clone(),
					chunk_index: chunk.chunk_index,
					start_offset: chunk.start_offset,
					end_offset: chunk.end_offset,
					text: chunk.text.clone(),
					embedding,
				});
			}
		}

		Ok(records)
	}
}

fn archive_stem(archive: &Path) -> Result<String> {
	archive
		.file_stem()
		.and_then(|stem| stem.to_str())
		.map(str::trim)
		.filter(|stem| !stem.is_empty() && *stem != "." && *stem != "..")
		.map(str::to_string)
		.ok_or_else(|| Error::invalid(format!("Archive path {archive:?} has no usable file name.")))
}
