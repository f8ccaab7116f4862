/// Scheme prefixes a link may start with, matched case-insensitively.
pub const SCHEME_PREFIXES: [&str; 9] = [
  "vless://",
  "vmess://",
  "trojan://",
  "ss://",
  "ssr://",
  "hysteria2://",
  "hysteria://",
  "tuic://",
  "hy2://",
];

fn is_invisible(c: char) -> bool {
  matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

fn is_terminator(c: char) -> bool {
  c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | ')' | ']' | '\\')
}

fn strip_invisible(s: &str) -> String {
  s.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Byte offset of the earliest known scheme prefix in `s`, if any.
///
/// `vless://` contains `ss://`; taking the smallest offset resolves that in
/// favour of the longer scheme.
fn find_scheme_start(s: &str) -> Option<usize> {
  let lower = s.to_ascii_lowercase();
  SCHEME_PREFIXES
    .iter()
    .filter_map(|p| lower.find(p))
    .min()
}

/// Cuts at the first terminator. A `]` closing an IPv6 literal opened
/// inside the link is part of the link.
fn cut_link(s: &str) -> &str {
  let mut depth = 0usize;
  let mut end = s.len();
  for (i, c) in s.char_indices() {
    match c {
      '[' => depth += 1,
      ']' if depth > 0 => depth -= 1,
      c if is_terminator(c) => {
        end = i;
        break;
      }
      _ => {}
    }
  }
  s[..end].trim_end_matches([',', ';', '.', '!'])
}

/// Reduces a raw token to the link it carries.
///
/// Tokens without any recognizable scheme come back unchanged apart from
/// invisible characters, so the classifier can tag them as unknown.
pub fn sanitize(raw: &str) -> String {
  let visible = strip_invisible(raw);
  match find_scheme_start(&visible) {
    Some(start) => strip_invisible(cut_link(&visible[start..])),
    None => visible,
  }
}

/// Returns every link embedded in `text`, in order of appearance.
///
/// Candidates shorter than `min_len` characters are dropped; a bare scheme
/// with a few characters after it is almost always a truncated paste.
pub fn extract_links(text: &str, min_len: usize) -> Vec<String> {
  let visible = strip_invisible(text);
  let mut out = Vec::new();
  let mut rest = visible.as_str();
  while let Some(start) = find_scheme_start(rest) {
    let tail = &rest[start..];
    let link = cut_link(tail);
    // Always advance past the scheme separator even when the cut is empty.
    let consumed = link.len().max(tail.find("://").map(|i| i + 3).unwrap_or(1));
    if link.chars().count() >= min_len {
      out.push(link.to_string());
    }
    rest = &tail[consumed..];
  }
  out
}
