use thiserror::Error;

/// Why a recognized link could not be canonicalized by its protocol strategy.
///
/// None of these abort a batch: the canonicalizer turns them into the
/// content-hash fallback and keeps the reason around for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonError {
  #[error("nothing after scheme")]
  EmptyPayload,

  #[error("payload is not valid base64")]
  Base64,

  #[error("invalid json: {0}")]
  Json(String),

  #[error("json payload is not an object")]
  NotAnObject,

  #[error("missing field: {0}")]
  MissingField(&'static str),

  #[error("invalid port: {0}")]
  InvalidPort(String),

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("malformed {0} payload")]
  Malformed(&'static str),
}

impl From<serde_json::Error> for CanonError {
  fn from(e: serde_json::Error) -> Self {
    CanonError::Json(e.to_string())
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("read policy file: {0}")]
  Read(#[from] std::io::Error),

  #[error("parse policy: {0}")]
  Parse(#[from] serde_yaml::Error),
}
