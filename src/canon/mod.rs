mod shadowsocks;
mod ssr;
mod uri;
mod vmess;

use crate::codec::escape_key_field;
use crate::config::Policy;
use crate::error::CanonError;
use crate::sanitize::sanitize;
use crate::scheme::{classify, split_scheme, ProtocolVariant};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// Fingerprint deciding whether two links are the same service account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// SHA-256 of the cleaned body, used when nothing better can be extracted.
  fn content_hash(body: &str) -> Self {
    IdentityKey(format!("{:x}", Sha256::digest(body.as_bytes())))
  }
}

impl fmt::Display for IdentityKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Which path produced a [`Canonical`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The variant strategy understood the link.
  Decoded,
  /// No known scheme; hashed and passed through.
  Unrecognized,
  /// Known scheme, but the payload could not be decoded.
  Fallback(CanonError),
}

impl Outcome {
  pub fn is_decoded(&self) -> bool {
    matches!(self, Outcome::Decoded)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
  pub variant: ProtocolVariant,
  pub key: IdentityKey,
  pub link: String,
  /// Non-empty optional fields carried by `link`.
  pub field_count: usize,
  pub outcome: Outcome,
}

pub(crate) struct Input<'a> {
  pub variant: ProtocolVariant,
  /// Cleaned link with any `#remark` removed.
  pub body: &'a str,
  pub policy: &'a Policy,
}

impl Input<'_> {
  /// Text after `scheme://`. The dispatcher has already checked it is non-empty.
  pub fn payload(&self) -> &str {
    split_scheme(self.body).map(|(_, p)| p).unwrap_or("")
  }
}

pub(crate) struct Rebuilt {
  pub key: String,
  pub link: String,
  pub field_count: usize,
}

/// Joins identity fields with `|`, escaping `|` and `%` inside each field.
pub(crate) fn join_key(fields: &[&str]) -> String {
  let escaped: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_key_field(f)).collect();
  escaped.join("|")
}

type Strategy = fn(&Input<'_>) -> Result<Rebuilt, CanonError>;

fn strategy_for(variant: ProtocolVariant) -> Option<Strategy> {
  match variant {
    ProtocolVariant::Vless
    | ProtocolVariant::Trojan
    | ProtocolVariant::Hysteria
    | ProtocolVariant::Hysteria2
    | ProtocolVariant::Tuic => Some(uri::canonicalize),
    ProtocolVariant::Vmess => Some(vmess::canonicalize),
    ProtocolVariant::Shadowsocks => Some(shadowsocks::canonicalize),
    ProtocolVariant::ShadowsocksR => Some(ssr::canonicalize),
    ProtocolVariant::Unknown => None,
  }
}

fn strip_remark(link: &str) -> &str {
  link.split('#').next().unwrap_or("").trim()
}

/// Sanitizes, classifies and canonicalizes one raw token. Total: any input,
/// including empty or garbage strings, yields a result.
pub fn canonicalize(raw: &str, policy: &Policy) -> Canonical {
  let clean = sanitize(raw);
  let variant = classify(&clean);
  canonicalize_clean(&clean, variant, policy)
}

pub fn canonicalize_clean(clean: &str, variant: ProtocolVariant, policy: &Policy) -> Canonical {
  // No scheme means no remark syntax either: a `#` is part of the text.
  let strategy = match strategy_for(variant) {
    Some(s) => s,
    None => return fallback(variant, clean.trim(), Outcome::Unrecognized),
  };
  let body = strip_remark(clean);

  let input = Input {
    variant,
    body,
    policy,
  };
  let result = if input.payload().trim().is_empty() {
    Err(CanonError::EmptyPayload)
  } else {
    strategy(&input)
  };

  match result {
    Ok(r) => Canonical {
      variant,
      key: IdentityKey(r.key),
      link: r.link,
      field_count: r.field_count,
      outcome: Outcome::Decoded,
    },
    Err(e) => {
      debug!(%variant, error = %e, "falling back to content hash");
      fallback(variant, body, Outcome::Fallback(e))
    }
  }
}

fn fallback(variant: ProtocolVariant, body: &str, outcome: Outcome) -> Canonical {
  Canonical {
    variant,
    key: IdentityKey::content_hash(body),
    link: body.to_string(),
    field_count: 0,
    outcome,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn policy() -> Policy {
    Policy::default()
  }

  #[test]
  fn unknown_scheme_is_hashed_and_passed_through() {
    let c = canonicalize("hello world", &policy());
    assert_eq!(c.variant, ProtocolVariant::Unknown);
    assert_eq!(c.outcome, Outcome::Unrecognized);
    assert_eq!(c.link, "hello world");
    assert_eq!(c.key.as_str().len(), 64);
  }

  #[test]
  fn unknown_text_keeps_hash_sign() {
    let c = canonicalize("Join #channel", &policy());
    assert_eq!(c.outcome, Outcome::Unrecognized);
    assert_eq!(c.link, "Join #channel");
    assert_ne!(c.key, canonicalize("Join", &policy()).key);
    assert_eq!(canonicalize(&c.link, &policy()), c);
  }

  #[test]
  fn separator_inside_a_field_does_not_merge_keys() {
    assert_eq!(join_key(&["ss", "a|b", "c"]), "ss|a%7Cb|c");
    assert_ne!(join_key(&["ss", "a|b", "c"]), join_key(&["ss", "a", "b|c"]));
    // Unescaped, both would read "trojan|p|*|443|sni=x|*|443|".
    let a = canonicalize("trojan://p%7C*%7C443%7Csni=x@h:443", &policy());
    let b = canonicalize("trojan://p@h:443?sni=x%7C*%7C443%7C", &policy());
    assert!(a.outcome.is_decoded());
    assert!(b.outcome.is_decoded());
    assert_ne!(a.key, b.key);
  }

  #[test]
  fn empty_payload_falls_back() {
    let c = canonicalize("vless://#remark", &policy());
    assert_eq!(c.variant, ProtocolVariant::Vless);
    assert_eq!(c.outcome, Outcome::Fallback(CanonError::EmptyPayload));
    assert_eq!(c.link, "vless://");
  }

  #[test]
  fn fallback_ignores_remark() {
    let a = canonicalize("vmess://!!!#one", &policy());
    let b = canonicalize("vmess://!!!#two", &policy());
    assert!(!a.outcome.is_decoded());
    assert_eq!(a.key, b.key);
  }

  #[test]
  fn empty_and_binary_input_never_panic() {
    for raw in ["", "   ", "\u{0}\u{1}\u{FFFD}", "://", "ss://", "ssr://###"] {
      let c = canonicalize(raw, &policy());
      assert!(!c.key.as_str().is_empty());
    }
  }
}
