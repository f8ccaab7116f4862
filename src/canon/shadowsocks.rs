use super::{join_key, Input, Rebuilt};
use crate::codec::{decode_base64_to_utf8, encode_base64_url_nopad, percent_decode_to_string};
use crate::error::CanonError;

/// `method:password`, given either plainly (possibly percent-encoded) or as base64.
fn split_credentials(creds: &str) -> Result<(String, String), CanonError> {
  let plain = percent_decode_to_string(creds);
  let decoded = if plain.contains(':') {
    plain
  } else {
    decode_base64_to_utf8(&plain).ok_or(CanonError::Base64)?
  };
  let (method, password) = decoded
    .split_once(':')
    .ok_or(CanonError::Malformed("shadowsocks credentials"))?;
  let method = method.trim().to_string();
  if method.is_empty() {
    return Err(CanonError::MissingField("method"));
  }
  if password.is_empty() {
    return Err(CanonError::MissingField("password"));
  }
  Ok((method, password.to_string()))
}

/// `host:port`, with bracketed IPv6 hosts kept intact.
fn split_host_port(host_part: &str) -> Result<(String, u16), CanonError> {
  let (host, port_raw) = host_part
    .trim()
    .rsplit_once(':')
    .ok_or(CanonError::MissingField("port"))?;
  let host = host.trim();
  if host.is_empty() {
    return Err(CanonError::MissingField("host"));
  }
  let port: u16 = port_raw
    .trim()
    .parse()
    .map_err(|_| CanonError::InvalidPort(port_raw.to_string()))?;
  if port == 0 {
    return Err(CanonError::InvalidPort(port_raw.to_string()));
  }
  Ok((host.to_string(), port))
}

pub(crate) fn canonicalize(input: &Input<'_>) -> Result<Rebuilt, CanonError> {
  let payload = input.payload().trim();
  let (main, query) = match payload.split_once('?') {
    Some((m, q)) => (m, q.trim()),
    None => (payload, ""),
  };
  let main = main.trim().trim_end_matches('/');
  if main.is_empty() {
    return Err(CanonError::EmptyPayload);
  }

  // SIP002 puts only the credentials in base64; the legacy form encodes everything.
  let (creds_part, host_part) = match main.rsplit_once('@') {
    Some((a, b)) => (a.to_string(), b.to_string()),
    None => {
      let decoded = decode_base64_to_utf8(main).ok_or(CanonError::Base64)?;
      let (a, b) = decoded
        .trim()
        .rsplit_once('@')
        .ok_or(CanonError::Malformed("shadowsocks"))?;
      (a.to_string(), b.to_string())
    }
  };

  let (method, password) = split_credentials(&creds_part)?;
  let (host, port) = split_host_port(&host_part)?;

  let host_key = if input.policy.include_host() {
    host.to_ascii_lowercase()
  } else {
    "*".to_string()
  };
  let key = join_key(&[
    "ss",
    &method.to_ascii_lowercase(),
    &password,
    &host_key,
    &port.to_string(),
  ]);

  let userinfo = encode_base64_url_nopad(&format!("{method}:{password}"));
  let mut link = format!("ss://{userinfo}@{host}:{port}");
  if !query.is_empty() {
    link.push_str("/?");
    link.push_str(query);
  }

  Ok(Rebuilt {
    key,
    link,
    field_count: usize::from(!query.is_empty()),
  })
}
