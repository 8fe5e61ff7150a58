use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = docqa_indexer::Args::parse();

	docqa_indexer::run(args).await
}
