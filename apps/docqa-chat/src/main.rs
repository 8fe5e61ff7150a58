use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = docqa_chat::Args::parse();

	docqa_chat::run(args).await
}
