use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVariant {
  Vless,
  Vmess,
  Trojan,
  Shadowsocks,
  ShadowsocksR,
  Hysteria,
  Hysteria2,
  Tuic,
  Unknown,
}

impl ProtocolVariant {
  /// Name used as the first component of identity keys.
  pub fn as_str(&self) -> &'static str {
    match self {
      ProtocolVariant::Vless => "vless",
      ProtocolVariant::Vmess => "vmess",
      ProtocolVariant::Trojan => "trojan",
      ProtocolVariant::Shadowsocks => "ss",
      ProtocolVariant::ShadowsocksR => "ssr",
      ProtocolVariant::Hysteria => "hysteria",
      ProtocolVariant::Hysteria2 => "hysteria2",
      ProtocolVariant::Tuic => "tuic",
      ProtocolVariant::Unknown => "unknown",
    }
  }

  fn from_scheme(scheme: &str) -> Self {
    match scheme {
      "vless" => ProtocolVariant::Vless,
      "vmess" => ProtocolVariant::Vmess,
      "trojan" => ProtocolVariant::Trojan,
      "ss" => ProtocolVariant::Shadowsocks,
      "ssr" => ProtocolVariant::ShadowsocksR,
      "hysteria" => ProtocolVariant::Hysteria,
      "hysteria2" | "hy2" => ProtocolVariant::Hysteria2,
      "tuic" => ProtocolVariant::Tuic,
      _ => ProtocolVariant::Unknown,
    }
  }
}

impl fmt::Display for ProtocolVariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// RFC 3986 scheme syntax: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_valid_scheme(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Splits `scheme://payload`, returning the lowercased scheme and the payload.
pub(crate) fn split_scheme(link: &str) -> Option<(String, &str)> {
  let (scheme, payload) = link.split_once("://")?;
  if !is_valid_scheme(scheme) {
    return None;
  }
  Some((scheme.to_ascii_lowercase(), payload))
}

pub fn classify(clean: &str) -> ProtocolVariant {
  match split_scheme(clean.trim()) {
    Some((scheme, _)) => ProtocolVariant::from_scheme(&scheme),
    None => ProtocolVariant::Unknown,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_known_schemes_case_insensitively() {
    assert_eq!(classify("vless://a@b:1"), ProtocolVariant::Vless);
    assert_eq!(classify("VMess://eyJ9"), ProtocolVariant::Vmess);
    assert_eq!(classify("Trojan://p@h:1"), ProtocolVariant::Trojan);
    assert_eq!(classify("ss://abc"), ProtocolVariant::Shadowsocks);
    assert_eq!(classify("ssr://abc"), ProtocolVariant::ShadowsocksR);
    assert_eq!(classify("hysteria://h:1"), ProtocolVariant::Hysteria);
    assert_eq!(classify("hysteria2://p@h:1"), ProtocolVariant::Hysteria2);
    assert_eq!(classify("hy2://p@h:1"), ProtocolVariant::Hysteria2);
    assert_eq!(classify("tuic://u:p@h:1"), ProtocolVariant::Tuic);
  }

  #[test]
  fn unknown_for_foreign_or_malformed_schemes() {
    assert_eq!(classify("https://example.com"), ProtocolVariant::Unknown);
    assert_eq!(classify("no scheme here"), ProtocolVariant::Unknown);
    assert_eq!(classify("://missing"), ProtocolVariant::Unknown);
    assert_eq!(classify("v less://x"), ProtocolVariant::Unknown);
    assert_eq!(classify(""), ProtocolVariant::Unknown);
  }
}
