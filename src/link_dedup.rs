use crate::input::{read_tokens, InputArgs, PolicyArgs};
use anyhow::Result;
use clap::{Args as ClapArgs, ValueEnum};
use subdedup::run_batch;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  /// One canonical link per line.
  Text,
  /// A single JSON object with counters and links.
  Json,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct Args {
  #[command(flatten)]
  pub input: InputArgs,

  #[command(flatten)]
  pub policy: PolicyArgs,

  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,
}

pub async fn run(args: Args) -> Result<()> {
  let policy = args.policy.resolve()?;
  let tokens = read_tokens(&args.input).await?;
  let report = run_batch(&tokens, &policy);

  match args.format {
    OutputFormat::Text => {
      for link in &report.links {
        println!("{link}");
      }
    }
    OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
  }
  Ok(())
}
