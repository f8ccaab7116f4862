use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use std::path::PathBuf;
use subdedup::{extract_links, CollisionPolicy, HostPolicy, Policy, PolicyOverrides};
use tokio::io::{AsyncReadExt, BufReader};

#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
  /// Read raw text from stdin.
  #[arg(long, default_value_t = false)]
  pub stdin: bool,

  /// Raw text provided directly as an argument. Prefer --stdin for large inputs.
  #[arg(long)]
  pub text: Option<String>,

  /// Scan the text for every embedded link instead of treating each line as one token.
  #[arg(long, default_value_t = false)]
  pub extract: bool,

  /// With --extract, drop candidates shorter than this many characters.
  #[arg(long, default_value_t = 21)]
  pub min_len: usize,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PolicyArgs {
  /// YAML policy file; flags below override its values.
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Whether the server address is part of the identity key.
  #[arg(long, value_enum)]
  pub host: Option<HostPolicy>,

  /// Which link to keep when two share an identity key.
  #[arg(long, value_enum)]
  pub collision: Option<CollisionPolicy>,

  /// Drop the `add` field from rebuilt vmess links.
  #[arg(long, default_value_t = false)]
  pub strip_vmess_address: bool,

  /// Discard tokens without a recognized scheme.
  #[arg(long, default_value_t = false)]
  pub drop_unknown: bool,
}

impl PolicyArgs {
  pub fn resolve(&self) -> Result<Policy> {
    let base = match &self.config {
      Some(path) => Policy::from_yaml_file(path)
        .with_context(|| format!("load policy file {}", path.display()))?,
      None => Policy::default(),
    };
    Ok(base.overlay(&self.overrides()))
  }

  fn overrides(&self) -> PolicyOverrides {
    PolicyOverrides {
      host: self.host,
      collision: self.collision,
      strip_vmess_address: self.strip_vmess_address,
      drop_unknown: self.drop_unknown,
    }
  }
}

async fn read_text(args: &InputArgs) -> Result<String> {
  if args.stdin || args.text.is_none() {
    let mut buf = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    stdin.read_to_string(&mut buf).await.context("read stdin")?;
    Ok(buf)
  } else {
    Ok(args.text.clone().unwrap_or_default())
  }
}

/// Raw tokens in arrival order.
pub async fn read_tokens(args: &InputArgs) -> Result<Vec<String>> {
  let text = read_text(args).await?;
  if args.extract {
    return Ok(extract_links(&text, args.min_len));
  }
  Ok(text.lines().map(|l| l.to_string()).collect())
}
