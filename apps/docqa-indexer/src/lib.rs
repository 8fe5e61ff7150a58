//! Builds the persisted vector index from a zip of PDFs without starting the HTTP server.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre;

use docqa_service::{BuildRequest, DocQaService};
use docqa_storage::VectorStore;

#[derive(Debug, Parser)]
#[command(
	version = docqa_cli::VERSION,
	rename_all = "kebab",
	styles = docqa_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Zip archive of PDF files to index.
	#[arg(long, short = 'a', value_name = "FILE")]
	pub archive: PathBuf,
	/// Drop every indexed source before building.
	#[arg(long)]
	pub fresh: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = docqa_config::load(&args.config)?;

	docqa_cli::init_tracing(&config.service.log_level);

	if config.storage.index_path.is_none() {
		return Err(eyre::eyre!("storage.index_path must be set to persist the index."));
	}

	let store = VectorStore::open(config.storage.index_path.as_deref())?;

	if args.fresh {
		store.clear().await;

		tracing::info!("Cleared existing index.");
	}

	let service = DocQaService::new(config, store);
	let report = service.build_from_archive(BuildRequest { path: args.archive }).await?;

	if args.fresh && report.files.is_empty() {
		service.store.persist().await?;
	}

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_short_flags() {
		let args = Args::try_parse_from(["docqa-indexer", "-c", "docqa.toml", "-a", "CVs.zip"])
			.expect("Failed to parse args.");

		assert_eq!(args.config, PathBuf::from("docqa.toml"));
		assert_eq!(args.archive, PathBuf::from("CVs.zip"));
		assert!(!args.fresh);
	}

	#[test]
	fn archive_is_required() {
		assert!(Args::try_parse_from(["docqa-indexer", "-c", "docqa.toml"]).is_err());
	}
}
