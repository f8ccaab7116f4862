use super::{join_key, Input, Rebuilt};
use crate::codec::{decode_base64_to_utf8, encode_base64_standard};
use crate::error::CanonError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

fn json_get_str(obj: &JsonValue, key: &str) -> String {
  let v = obj.get(key);
  if let Some(s) = v.and_then(|x| x.as_str()) {
    return s.trim().to_string();
  }
  if let Some(n) = v.and_then(|x| x.as_i64()) {
    return n.to_string();
  }
  if let Some(b) = v.and_then(|x| x.as_bool()) {
    return if b { "true".to_string() } else { "false".to_string() };
  }
  String::new()
}

/// Port as a number or a numeric string, like clients accept it.
fn json_get_port(obj: &JsonValue, key: &'static str) -> Result<u16, CanonError> {
  let v = obj.get(key).ok_or(CanonError::MissingField(key))?;
  let port = if let Some(n) = v.as_u64() {
    u16::try_from(n).ok()
  } else if let Some(s) = v.as_str() {
    let s = s.trim();
    if s.is_empty() {
      return Err(CanonError::MissingField(key));
    }
    s.parse::<u16>().ok()
  } else {
    None
  };
  match port {
    Some(p) if p > 0 => Ok(p),
    _ => Err(CanonError::InvalidPort(v.to_string())),
  }
}

fn is_empty_value(v: &JsonValue) -> bool {
  match v {
    JsonValue::Null => true,
    JsonValue::String(s) => s.trim().is_empty(),
    _ => false,
  }
}

pub(crate) fn canonicalize(input: &Input<'_>) -> Result<Rebuilt, CanonError> {
  let json_text = decode_base64_to_utf8(input.payload().trim()).ok_or(CanonError::Base64)?;
  let obj: JsonValue = serde_json::from_str(&json_text)?;
  let fields = obj.as_object().ok_or(CanonError::NotAnObject)?;

  let id = json_get_str(&obj, "id").to_ascii_lowercase();
  if id.is_empty() {
    return Err(CanonError::MissingField("id"));
  }
  let port = json_get_port(&obj, "port")?;
  let path = json_get_str(&obj, "path");
  let ws_host = json_get_str(&obj, "host").to_ascii_lowercase();
  // A stripped `add` cannot be read back, so it never takes part in the key.
  let addr = if input.policy.include_host() && !input.policy.strip_vmess_address {
    json_get_str(&obj, "add").to_ascii_lowercase()
  } else {
    "*".to_string()
  };
  let key = join_key(&["vmess", &id, &addr, &port.to_string(), &path, &ws_host]);

  let kept: BTreeMap<&String, &JsonValue> = fields
    .iter()
    .filter(|(k, _)| k.as_str() != "ps")
    .filter(|(k, _)| !(input.policy.strip_vmess_address && k.as_str() == "add"))
    .collect();
  let field_count = kept.values().filter(|v| !is_empty_value(v)).count();
  let normalized = serde_json::to_string(&kept)?;

  Ok(Rebuilt {
    key,
    link: format!("vmess://{}", encode_base64_standard(&normalized)),
    field_count,
  })
}
