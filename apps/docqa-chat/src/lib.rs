pub mod client;
pub mod render;
pub mod session;

use std::{
	io::{IsTerminal, Write},
	path::PathBuf,
	time::Duration,
};

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
	client::{BotClient, Endpoint},
	session::Session,
};

#[derive(Debug, Parser)]
#[command(
	version = docqa_cli::VERSION,
	rename_all = "kebab",
	styles = docqa_cli::styles(),
)]
pub struct Args {
	#[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8000")]
	pub api_base: String,
	#[arg(long, value_enum, default_value_t = Endpoint::Ask)]
	pub endpoint: Endpoint,
	#[arg(long, short = 'u', value_name = "ID", default_value = "default")]
	pub user_id: String,
	#[arg(long, value_name = "SECS", default_value_t = 10)]
	pub timeout_secs: u64,
	/// Terminal width used to lay out bubbles.
	#[arg(long, value_name = "COLUMNS", default_value_t = 80)]
	pub width: usize,
	#[arg(long, value_name = "FILTER", default_value = "warn")]
	pub log_level: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
	Empty,
	Quit,
	Reset,
	Upload(PathBuf),
	Message(String),
}
impl Command {
	pub fn parse(line: &str) -> Self {
		let line = line.trim();

		if line.is_empty() {
			return Self::Empty;
		}

		match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
			("/quit" | "/exit", _) => Self::Quit,
			("/reset", _) => Self::Reset,
			("/upload", path) if !path.trim().is_empty() => Self::Upload(PathBuf::from(path.trim())),
			_ => Self::Message(line.to_string()),
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	docqa_cli::init_tracing(&args.log_level);

	let client = BotClient::new(
		&args.api_base,
		args.endpoint,
		args.user_id.clone(),
		Duration::from_secs(args.timeout_secs),
	)?;
	let interactive = std::io::stdout().is_terminal();
	let mut session = Session::default();
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	println!(
		"{}",
		format!("{} Chatbot ({:?} as {})", render::BOT_ICON, client.endpoint(), args.user_id)
			.bold()
	);
	println!("{}", render::notice("Commands: /upload <path>, /reset, /quit"));

	loop {
		print!("{} ", ">".green().bold());
		std::io::stdout().flush()?;

		let Some(line) = lines.next_line().await? else {
			break;
		};

		match Command::parse(&line) {
			Command::Empty => continue,
			Command::Quit => break,
			Command::Reset => {
				let outcome = client.reset().await;

				session.clear();
				println!("{}", render::notice(&outcome));
			},
			Command::Upload(path) => {
				println!("{}", render::notice(&format!("Uploading {}...", path.display())));
				println!("{}", render::notice(&client.upload(&path).await));
			},
			Command::Message(text) => {
				if !session.submit(&text) {
					continue;
				}
				if let Some(last) = session.messages().last() {
					println!("{}", render::paint(last, args.width));
				}

				let thinking = render::thinking(args.width);

				println!("{thinking}");

				let reply = match session.pending() {
					Some(pending) => client.send(pending).await,
					None => continue,
				};

				if interactive {
					// Replace the thinking bubble in place.
					print!("\x1b[{}A\x1b[J", thinking.lines().count());
				}

				session.resolve(reply);

				if let Some(last) = session.messages().last() {
					println!("{}", render::paint(last, args.width));
				}
			},
		}
	}

	Ok(())
}
