pub mod batch;
pub mod canon;
mod codec;
pub mod config;
pub mod error;
pub mod sanitize;
pub mod scheme;
pub mod store;

pub use batch::{canonicalize_all, run_batch, BatchReport};
pub use canon::{canonicalize, canonicalize_clean, Canonical, IdentityKey, Outcome};
pub use config::{CollisionPolicy, HostPolicy, Policy, PolicyOverrides};
pub use error::{CanonError, ConfigError};
pub use sanitize::{extract_links, sanitize};
pub use scheme::{classify, ProtocolVariant};
pub use store::{FingerprintStore, PutOutcome};
