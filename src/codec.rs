use base64::engine::general_purpose;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;

/// Bytes escaped inside one identity-key field; `|` separates the fields.
const KEY_FIELD: &AsciiSet = &CONTROLS.add(b'%').add(b'|');

pub(crate) fn percent_decode_to_string(s: &str) -> String {
  match percent_decode_str(s).decode_utf8() {
    Ok(cow) => cow.to_string(),
    Err(_) => s.to_string(),
  }
}

pub(crate) fn escape_key_field(s: &str) -> Cow<'_, str> {
  utf8_percent_encode(s, KEY_FIELD).into()
}

/// Decodes base64 text as found in the wild: standard or URL-safe alphabet,
/// with missing, excess, or correct `=` padding, and stray whitespace.
pub(crate) fn decode_base64_to_utf8(s: &str) -> Option<String> {
  let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
  let unpadded = cleaned.trim_end_matches('=');
  if unpadded.is_empty() {
    return None;
  }
  let rem = unpadded.len() % 4;
  if rem == 1 {
    return None;
  }
  let padded = if rem == 0 {
    unpadded.to_string()
  } else {
    format!("{unpadded}{}", "=".repeat(4 - rem))
  };

  for engine in [&general_purpose::STANDARD, &general_purpose::URL_SAFE] {
    if let Ok(bytes) = engine.decode(&padded) {
      if let Ok(txt) = String::from_utf8(bytes) {
        if !txt.trim().is_empty() {
          return Some(txt);
        }
      }
    }
  }
  None
}

pub(crate) fn encode_base64_standard(s: &str) -> String {
  general_purpose::STANDARD.encode(s.as_bytes())
}

pub(crate) fn encode_base64_url_nopad(s: &str) -> String {
  general_purpose::URL_SAFE_NO_PAD.encode(s.as_bytes())
}
