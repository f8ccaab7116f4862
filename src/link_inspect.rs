use crate::input::{read_tokens, InputArgs, PolicyArgs};
use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use subdedup::{canonicalize_all, Canonical, Outcome};

#[derive(ClapArgs, Debug, Clone)]
pub struct Args {
  #[command(flatten)]
  pub input: InputArgs,

  #[command(flatten)]
  pub policy: PolicyArgs,
}

#[derive(Serialize)]
struct InspectOut<'a> {
  index: usize,
  variant: &'a str,
  key: &'a str,
  link: &'a str,
  outcome: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  reason: Option<String>,
}

fn to_out(index: usize, c: &Canonical) -> InspectOut<'_> {
  let (outcome, reason) = match &c.outcome {
    Outcome::Decoded => ("decoded", None),
    Outcome::Unrecognized => ("unrecognized", None),
    Outcome::Fallback(e) => ("fallback", Some(e.to_string())),
  };
  InspectOut {
    index,
    variant: c.variant.as_str(),
    key: c.key.as_str(),
    link: &c.link,
    outcome,
    reason,
  }
}

pub async fn run(args: Args) -> Result<()> {
  let policy = args.policy.resolve()?;
  let tokens = read_tokens(&args.input).await?;

  for (index, c) in canonicalize_all(&tokens, &policy).iter().enumerate() {
    let Some(c) = c else { continue };
    if let Ok(line) = serde_json::to_string(&to_out(index, c)) {
      println!("{line}");
    }
  }
  Ok(())
}
