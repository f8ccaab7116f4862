use super::{join_key, Input, Rebuilt};
use crate::codec::percent_decode_to_string;
use crate::error::CanonError;
use crate::scheme::ProtocolVariant;
use std::borrow::Cow;
use url::form_urlencoded;
use url::Url;

/// Query parameters that change which service a link reaches. Sorted.
const IDENTITY_PARAMS: [&str; 13] = [
  "alpn",
  "flow",
  "host",
  "mode",
  "obfs",
  "obfs-password",
  "path",
  "pbk",
  "security",
  "serviceName",
  "sid",
  "sni",
  "type",
];

/// Where hysteria (v1) and some hysteria2 exporters put the secret.
const CREDENTIAL_PARAMS: [&str; 3] = ["auth", "auth_str", "password"];

/// One value per name (first non-empty wins), empty values dropped, sorted by name.
fn collapse_params<'a>(
  pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
) -> Vec<(String, String)> {
  let mut out: Vec<(String, String)> = Vec::new();
  for (k, v) in pairs {
    let k = k.trim();
    let v = v.trim();
    if k.is_empty() || v.is_empty() || out.iter().any(|(seen, _)| seen == k) {
      continue;
    }
    out.push((k.to_string(), v.to_string()));
  }
  out.sort();
  out
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
  params
    .iter()
    .find(|(k, _)| k == name)
    .map(|(_, v)| v.as_str())
}

fn normalize_param(name: &str, value: &str) -> String {
  match name {
    "sni" | "host" => value.to_ascii_lowercase(),
    "alpn" => {
      let mut protos: Vec<String> = value
        .split(',')
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
      protos.sort();
      protos.dedup();
      protos.join(",")
    }
    _ => value.to_string(),
  }
}

fn identity_params(params: &[(String, String)]) -> String {
  let mut parts = Vec::new();
  for name in IDENTITY_PARAMS {
    let value = match param(params, name) {
      Some(v) => Some(v),
      None if name == "sni" => param(params, "peer"),
      None => None,
    };
    if let Some(v) = value {
      parts.push(format!("{name}={}", normalize_param(name, v)));
    }
  }
  parts.join("&")
}

fn credential(u: &Url, variant: ProtocolVariant, params: &[(String, String)]) -> String {
  let user = percent_decode_to_string(u.username()).trim().to_string();
  let password = u
    .password()
    .map(percent_decode_to_string)
    .unwrap_or_default()
    .trim()
    .to_string();

  let user = match variant {
    // uuids; clients accept either case
    ProtocolVariant::Vless | ProtocolVariant::Tuic => user.to_ascii_lowercase(),
    _ => user,
  };

  if !user.is_empty() {
    return if password.is_empty() {
      user
    } else {
      format!("{user}:{password}")
    };
  }
  CREDENTIAL_PARAMS
    .iter()
    .find_map(|name| param(params, name))
    .unwrap_or("")
    .to_string()
}

pub(crate) fn canonicalize(input: &Input<'_>) -> Result<Rebuilt, CanonError> {
  let mut u = Url::parse(input.body)?;

  let host = u
    .host_str()
    .map(|h| h.trim().to_ascii_lowercase())
    .filter(|h| !h.is_empty())
    .ok_or(CanonError::MissingField("host"))?;
  let port = u.port().ok_or(CanonError::MissingField("port"))?;
  if port == 0 {
    return Err(CanonError::InvalidPort(port.to_string()));
  }

  let params = collapse_params(u.query_pairs());
  let cred = credential(&u, input.variant, &params);

  // Without a credential the address is all that tells two servers apart.
  let host_part = if input.policy.include_host() || cred.is_empty() {
    host.as_str()
  } else {
    "*"
  };
  let key = join_key(&[
    input.variant.as_str(),
    &cred,
    host_part,
    &port.to_string(),
    &identity_params(&params),
  ]);

  u.set_fragment(None);
  if u.path() == "/" {
    u.set_path("");
  }
  if params.is_empty() {
    u.set_query(None);
  } else {
    let query = form_urlencoded::Serializer::new(String::new())
      .extend_pairs(params.iter())
      .finish();
    u.set_query(Some(&query));
  }

  Ok(Rebuilt {
    key,
    link: u.to_string(),
    field_count: params.len(),
  })
}
