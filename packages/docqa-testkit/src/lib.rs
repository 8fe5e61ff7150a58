mod error;

pub use error::{Error, Result};

use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};

use serde_json::Map;
use tempfile::TempDir;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use docqa_config::{
	Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig, Memory, Prompts, Providers,
	Retrieval, Security, Service, Storage,
};

pub const TEST_VECTOR_DIM: u32 = 8;

/// Scratch directory tree removed on drop.
pub struct TestWorkspace {
	dir: TempDir,
}
impl TestWorkspace {
	pub fn new() -> Result<Self> {
		let dir = tempfile::Builder::new().prefix("docqa_test_").tempdir()?;

		Ok(Self { dir })
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	pub fn path(&self, relative: &str) -> PathBuf {
		self.dir.path().join(relative)
	}

	pub fn upload_dir(&self) -> PathBuf {
		self.path("uploads")
	}

	pub fn extract_dir(&self) -> PathBuf {
		self.path("extracted")
	}

	pub fn index_path(&self) -> PathBuf {
		self.path("index.json")
	}

	pub fn write(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
		let path = self.path(relative);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		fs::write(&path, bytes)?;

		Ok(path)
	}
}

/// Builds a stored (uncompressed) zip archive from `(name, bytes)` entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
	let mut writer = ZipWriter::new(File::create(path)?);
	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

	for (name, bytes) in entries {
		writer.start_file(*name, options)?;
		writer.write_all(bytes)?;
	}

	writer.finish()?;

	Ok(())
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
	let workspace = TestWorkspace::new()?;
	let path = workspace.path("archive.zip");

	write_zip(&path, entries)?;

	Ok(fs::read(&path)?)
}

/// A one-page PDF that draws each line with the built-in Helvetica font.
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
	let mut content = String::from("BT\n/F1 12 Tf\n14 TL\n72 720 Td\n");

	for line in lines {
		content.push_str(&format!("({}) Tj T*\n", escape_pdf_string(line)));
	}

	content.push_str("ET\n");

	let objects = [
		"<< /Type /Catalog /Pages 2 0 R >>".to_string(),
		"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
		"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
		 /Resources << /Font << /F1 5 0 R >> >> >>"
			.to_string(),
		format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
		"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
			.to_string(),
	];
	let mut out = b"%PDF-1.4\n".to_vec();
	let mut offsets = Vec::with_capacity(objects.len());

	for (idx, body) in objects.iter().enumerate() {
		offsets.push(out.len());
		out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", idx + 1).as_bytes());
	}

	let xref_offset = out.len();

	out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());

	for offset in offsets {
		out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
	}

	out.extend_from_slice(
		format!(
			"trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
			objects.len() + 1
		)
		.as_bytes(),
	);

	out
}

/// Config pointing every provider at `api_base` and every path into `workspace`.
pub fn test_config(workspace: &TestWorkspace, api_base: &str) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			index_path: Some(workspace.index_path()),
			upload_dir: workspace.upload_dir(),
			extract_dir: workspace.extract_dir(),
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: api_base.to_string(),
				api_key: "test-key".to_string(),
				api_key_env: None,
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: TEST_VECTOR_DIM,
				batch_size: 4,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			answer: llm_provider(api_base, "test-answer", 0.0),
			chat: llm_provider(api_base, "test-chat", 0.7),
		},
		chunking: Chunking { max_chars: 200, overlap_chars: 40 },
		retrieval: Retrieval { top_k: 3 },
		memory: Memory { rag_window: Some(5), chat_window: None },
		prompts: Prompts::default(),
		security: Security { bind_localhost_only: true, max_upload_bytes: 10 * 1_024 * 1_024 },
	}
}

fn llm_provider(api_base: &str, model: &str, temperature: f32) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: "test-key".to_string(),
		api_key_env: None,
		path: "/chat/completions".to_string(),
		model: model.to_string(),
		temperature,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn escape_pdf_string(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '(' | ')' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
