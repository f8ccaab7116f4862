mod input;
mod link_dedup;
mod link_inspect;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Deduplicate scraped proxy links and print the canonical set.
  Dedup(link_dedup::Args),

  /// Print variant, identity key and canonical link for every token (stdout JSONL).
  Inspect(link_inspect::Args),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  match cli.command {
    Commands::Dedup(args) => link_dedup::run(args).await,
    Commands::Inspect(args) => link_inspect::run(args).await,
  }
}
