use crate::error::ConfigError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether the server address takes part in identity keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HostPolicy {
  /// Same account behind several IPs collapses into one entry.
  #[default]
  Exclude,
  Include,
}

/// What the fingerprint store does when a key is seen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
  #[default]
  FirstWins,
  LastWins,
  /// Replace only when the newcomer carries strictly more fields.
  MostComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Policy {
  pub host: HostPolicy,
  pub collision: CollisionPolicy,
  /// Also drop `add` from rebuilt vmess payloads. The result no longer
  /// carries a server address, so this is off unless asked for.
  pub strip_vmess_address: bool,
  /// Keep tokens with no recognized scheme (hashed, passed through).
  pub keep_unknown: bool,
}

impl Default for Policy {
  fn default() -> Self {
    Self {
      host: HostPolicy::Exclude,
      collision: CollisionPolicy::FirstWins,
      strip_vmess_address: false,
      keep_unknown: true,
    }
  }
}

/// Command-line values layered over a file or default policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
  pub host: Option<HostPolicy>,
  pub collision: Option<CollisionPolicy>,
  pub strip_vmess_address: bool,
  pub drop_unknown: bool,
}

impl Policy {
  pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(text)?)
  }

  pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_yaml_str(&text)
  }

  /// Set overrides win; boolean flags can only switch their behaviour on.
  pub fn overlay(mut self, o: &PolicyOverrides) -> Self {
    if let Some(host) = o.host {
      self.host = host;
    }
    if let Some(collision) = o.collision {
      self.collision = collision;
    }
    if o.strip_vmess_address {
      self.strip_vmess_address = true;
    }
    if o.drop_unknown {
      self.keep_unknown = false;
    }
    self
  }

  pub fn include_host(&self) -> bool {
    self.host == HostPolicy::Include
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_exclude_host_and_keep_first() {
    let p = Policy::default();
    assert!(!p.include_host());
    assert_eq!(p.collision, CollisionPolicy::FirstWins);
    assert!(p.keep_unknown);
    assert!(!p.strip_vmess_address);
  }

  #[test]
  fn partial_yaml_keeps_other_defaults() {
    let p = Policy::from_yaml_str("host: include\ncollision: most-complete\n").unwrap();
    assert!(p.include_host());
    assert_eq!(p.collision, CollisionPolicy::MostComplete);
    assert!(p.keep_unknown);
  }

  #[test]
  fn empty_yaml_is_default() {
    assert_eq!(Policy::from_yaml_str("  \n").unwrap(), Policy::default());
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(matches!(
      Policy::from_yaml_str("hosts: include\n"),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Policy::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
  }

  #[test]
  fn empty_overrides_change_nothing() {
    let p = Policy {
      host: HostPolicy::Include,
      collision: CollisionPolicy::LastWins,
      ..Policy::default()
    };
    assert_eq!(p.clone().overlay(&PolicyOverrides::default()), p);
  }
}
