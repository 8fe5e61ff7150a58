mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, DEFAULT_CHAT_SYSTEM_PROMPT, DEFAULT_RAG_SYSTEM_PROMPT,
	EmbeddingProviderConfig, LlmProviderConfig, Memory, Prompts, Providers, Retrieval, Security,
	Service, Storage,
};

use std::{env, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	resolve_api_keys(&mut cfg, |name| env::var(name).ok())?;

	validate(&cfg)?;

	Ok(cfg)
}

/// Fills empty `api_key` fields from the variable named by `api_key_env`.
pub fn resolve_api_keys<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let Providers { embedding, answer, chat } = &mut cfg.providers;

	for (label, key, var) in [
		("providers.embedding.api_key_env", &mut embedding.api_key, &embedding.api_key_env),
		("providers.answer.api_key_env", &mut answer.api_key, &answer.api_key_env),
		("providers.chat.api_key_env", &mut chat.api_key, &chat.api_key_env),
	] {
		if !key.trim().is_empty() {
			continue;
		}

		let Some(var) = var.as_deref() else {
			continue;
		};
		let value = lookup(var).filter(|value| !value.trim().is_empty()).ok_or_else(|| {
			Error::MissingEnv { key: label.to_string(), var: var.to_string() }
		})?;

		*key = value;
	}

	Ok(())
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.upload_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.upload_dir must be non-empty.".to_string(),
		});
	}
	if cfg.storage.extract_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.extract_dir must be non-empty.".to_string(),
		});
	}
	if cfg.storage.upload_dir == cfg.storage.extract_dir {
		return Err(Error::Validation {
			message: "storage.upload_dir and storage.extract_dir must differ.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_size must be greater than zero.".to_string(),
		});
	}

	for (label, temperature) in [
		("providers.answer.temperature", cfg.providers.answer.temperature),
		("providers.chat.temperature", cfg.providers.chat.temperature),
	] {
		if !temperature.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=2.0).contains(&temperature) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-2.0."),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("answer", &cfg.providers.answer.api_key),
		("chat", &cfg.providers.chat.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.chunking.max_chars == 0 {
		return Err(Error::Validation {
			message: "chunking.max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_chars >= cfg.chunking.max_chars {
		return Err(Error::Validation {
			message: "chunking.overlap_chars must be less than chunking.max_chars.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}

	for (label, window) in
		[("memory.rag_window", cfg.memory.rag_window), ("memory.chat_window", cfg.memory.chat_window)]
	{
		if window == Some(0) {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero when set."),
			});
		}
	}

	if !cfg.prompts.rag_system.contains("{context}") {
		return Err(Error::Validation {
			message: "prompts.rag_system must contain the {context} placeholder.".to_string(),
		});
	}
	if cfg.prompts.chat_system.trim().is_empty() {
		return Err(Error::Validation {
			message: "prompts.chat_system must be non-empty.".to_string(),
		});
	}
	if cfg.security.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "security.max_upload_bytes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.index_path.as_ref().map(|path| path.as_os_str().is_empty()).unwrap_or(false) {
		cfg.storage.index_path = None;
	}

	for var in [
		&mut cfg.providers.embedding.api_key_env,
		&mut cfg.providers.answer.api_key_env,
		&mut cfg.providers.chat.api_key_env,
	] {
		if var.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
			*var = None;
		}
	}

	for base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.answer.api_base,
		&mut cfg.providers.chat.api_base,
	] {
		while base.ends_with('/') {
			base.pop();
		}
	}
}
