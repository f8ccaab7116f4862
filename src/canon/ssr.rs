use super::{join_key, Input, Rebuilt};
use crate::codec::{decode_base64_to_utf8, encode_base64_url_nopad};
use crate::error::CanonError;

/// Cosmetic params, never part of identity or output.
const COSMETIC_PARAMS: [&str; 2] = ["remarks", "group"];

fn parse_params(raw: &str) -> Vec<(String, String)> {
  let mut out: Vec<(String, String)> = Vec::new();
  for pair in raw.split('&') {
    let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
    let (k, v) = (k.trim(), v.trim());
    if k.is_empty() || v.is_empty() || COSMETIC_PARAMS.contains(&k) {
      continue;
    }
    if out.iter().any(|(seen, _)| seen == k) {
      continue;
    }
    out.push((k.to_string(), v.to_string()));
  }
  out.sort();
  out
}

pub(crate) fn canonicalize(input: &Input<'_>) -> Result<Rebuilt, CanonError> {
  let text = decode_base64_to_utf8(input.payload().trim()).ok_or(CanonError::Base64)?;
  let text = text.trim();
  let (main, raw_params) = match text.split_once("/?") {
    Some((m, p)) => (m, p),
    None => (text.trim_end_matches('/'), ""),
  };

  // Fields are taken from the right so an IPv6 host may contain ':'.
  let fields: Vec<&str> = main.rsplitn(6, ':').collect();
  let [password_b64, obfs, method, protocol, port_raw, host] = fields[..] else {
    return Err(CanonError::Malformed("ssr"));
  };
  let host = host.trim();
  if host.is_empty() {
    return Err(CanonError::MissingField("host"));
  }
  let port = port_raw
    .trim()
    .parse::<u16>()
    .ok()
    .filter(|p| *p > 0)
    .ok_or_else(|| CanonError::InvalidPort(port_raw.to_string()))?;
  if method.trim().is_empty() {
    return Err(CanonError::MissingField("method"));
  }
  let password = decode_base64_to_utf8(password_b64).ok_or(CanonError::MissingField("password"))?;

  let host_key = if input.policy.include_host() {
    host.to_ascii_lowercase()
  } else {
    "*".to_string()
  };
  let key = join_key(&[
    "ssr",
    protocol.trim(),
    &method.trim().to_ascii_lowercase(),
    obfs.trim(),
    &password,
    &host_key,
    &port.to_string(),
  ]);

  let params = parse_params(raw_params);
  let mut body = format!(
    "{host}:{port}:{protocol}:{method}:{obfs}:{}",
    encode_base64_url_nopad(&password)
  );
  if !params.is_empty() {
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    body.push_str("/?");
    body.push_str(&query.join("&"));
  }

  Ok(Rebuilt {
    key,
    link: format!("ssr://{}", encode_base64_url_nopad(&body)),
    field_count: params.len(),
  })
}

#[cfg(test)]
mod tests {
  use crate::canon::{canonicalize, Outcome};
  use crate::codec::{decode_base64_to_utf8, encode_base64_url_nopad};
  use crate::config::Policy;
  use crate::error::CanonError;
  use crate::scheme::ProtocolVariant;

  fn ssr_link(host: &str, remarks: &str) -> String {
    let body = format!(
      "{host}:8388:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{}/?obfsparam={}&remarks={}&group={}",
      encode_base64_url_nopad("pw"),
      encode_base64_url_nopad("cdn.example.com"),
      encode_base64_url_nopad(remarks),
      encode_base64_url_nopad("free"),
    );
    format!("ssr://{}", encode_base64_url_nopad(&body))
  }

  #[test]
  fn remarks_and_host_are_not_identity() {
    let policy = Policy::default();
    let a = canonicalize(&ssr_link("1.1.1.1", "A"), &policy);
    let b = canonicalize(&ssr_link("2.2.2.2", "B"), &policy);
    assert_eq!(a.variant, ProtocolVariant::ShadowsocksR);
    assert_eq!(a.outcome, Outcome::Decoded);
    assert_eq!(a.key, b.key);
    assert_eq!(
      a.key.as_str(),
      "ssr|auth_aes128_md5|aes-256-cfb|tls1.2_ticket_auth|pw|*|8388"
    );
  }

  #[test]
  fn rebuilt_link_drops_remarks_and_group() {
    let c = canonicalize(&ssr_link("[2001:db8::1]", "A"), &Policy::default());
    let body = decode_base64_to_utf8(c.link.trim_start_matches("ssr://")).unwrap();
    assert_eq!(
      body,
      format!(
        "[2001:db8::1]:8388:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{}/?obfsparam={}",
        encode_base64_url_nopad("pw"),
        encode_base64_url_nopad("cdn.example.com"),
      )
    );
    assert_eq!(c.field_count, 1);

    let again = canonicalize(&c.link, &Policy::default());
    assert_eq!(again.link, c.link);
    assert_eq!(again.key, c.key);
  }

  #[test]
  fn too_few_fields_fall_back() {
    let link = format!("ssr://{}", encode_base64_url_nopad("host:8388:origin"));
    let c = canonicalize(&link, &Policy::default());
    assert_eq!(c.outcome, Outcome::Fallback(CanonError::Malformed("ssr")));
  }
}
