use crate::canon::{canonicalize_clean, Canonical};
use crate::config::Policy;
use crate::sanitize::sanitize;
use crate::scheme::{classify, ProtocolVariant};
use crate::store::{FingerprintStore, PutOutcome};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  pub raw_count: usize,
  /// Blank or invisible-only tokens, plus unknown ones when the policy drops them.
  pub rejected_count: usize,
  /// Tokens that ended up with a content-hash identity.
  pub fallback_count: usize,
  pub unique_count: usize,
  pub replaced_count: usize,
  /// Deduplicated canonical links, sorted.
  pub links: Vec<String>,
}

/// Canonicalizes every token independently. Output order matches input order.
pub fn canonicalize_all<S: AsRef<str> + Sync>(
  tokens: &[S],
  policy: &Policy,
) -> Vec<Option<Canonical>> {
  tokens
    .par_iter()
    .map(|t| {
      let clean = sanitize(t.as_ref());
      if clean.trim().is_empty() {
        return None;
      }
      let c = canonicalize_clean(&clean, classify(&clean), policy);
      if c.variant == ProtocolVariant::Unknown && !policy.keep_unknown {
        return None;
      }
      Some(c)
    })
    .collect()
}

/// Deduplicates one batch of raw tokens.
///
/// Canonicalization runs in parallel; all store writes then happen here, in
/// arrival order, so collision policies see a deterministic sequence.
pub fn run_batch<S: AsRef<str> + Sync>(tokens: &[S], policy: &Policy) -> BatchReport {
  let results = canonicalize_all(tokens, policy);

  let mut store = FingerprintStore::new(policy.collision);
  let mut report = BatchReport {
    raw_count: tokens.len(),
    ..BatchReport::default()
  };

  for c in results {
    let Some(c) = c else {
      report.rejected_count += 1;
      continue;
    };
    if !c.outcome.is_decoded() {
      report.fallback_count += 1;
    }
    match store.put(c.key.clone(), c.link, c.field_count) {
      PutOutcome::Inserted => {}
      PutOutcome::Kept => debug!(key = %c.key, "duplicate kept out"),
      PutOutcome::Replaced => {
        debug!(key = %c.key, "duplicate replaced earlier link");
        report.replaced_count += 1;
      }
    }
  }

  report.unique_count = store.len();
  report.links = store.into_sorted_links();
  info!(
    raw = report.raw_count,
    rejected = report.rejected_count,
    fallback = report.fallback_count,
    unique = report.unique_count,
    "batch deduplicated"
  );
  report
}
