use crate::canon::IdentityKey;
use crate::config::CollisionPolicy;
use indexmap::map::Entry;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
  link: String,
  field_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
  Inserted,
  /// Key already present; existing link retained.
  Kept,
  /// Key already present; link overwritten per policy.
  Replaced,
}

/// One canonical link per identity key, for the duration of one batch.
///
/// Not synchronized: the batch driver is its only writer.
#[derive(Debug)]
pub struct FingerprintStore {
  records: IndexMap<IdentityKey, Record>,
  policy: CollisionPolicy,
}

impl FingerprintStore {
  pub fn new(policy: CollisionPolicy) -> Self {
    Self {
      records: IndexMap::new(),
      policy,
    }
  }

  pub fn put(&mut self, key: IdentityKey, link: String, field_count: usize) -> PutOutcome {
    match self.records.entry(key) {
      Entry::Vacant(v) => {
        v.insert(Record { link, field_count });
        PutOutcome::Inserted
      }
      Entry::Occupied(mut o) => {
        let replace = match self.policy {
          CollisionPolicy::FirstWins => false,
          CollisionPolicy::LastWins => true,
          CollisionPolicy::MostComplete => field_count > o.get().field_count,
        };
        if replace {
          o.insert(Record { link, field_count });
          PutOutcome::Replaced
        } else {
          PutOutcome::Kept
        }
      }
    }
  }

  pub fn get(&self, key: &IdentityKey) -> Option<&str> {
    self.records.get(key).map(|r| r.link.as_str())
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  /// Retained links in first-seen key order.
  pub fn links(&self) -> impl Iterator<Item = &str> {
    self.records.values().map(|r| r.link.as_str())
  }

  /// Retained links sorted lexicographically, as published.
  pub fn into_sorted_links(self) -> Vec<String> {
    let mut out: Vec<String> = self.records.into_values().map(|r| r.link).collect();
    out.sort();
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::canon::canonicalize;
  use crate::config::Policy;

  fn key(raw: &str) -> IdentityKey {
    canonicalize(raw, &Policy::default()).key
  }

  #[test]
  fn first_write_wins_by_default() {
    let mut store = FingerprintStore::new(CollisionPolicy::default());
    let k = key("trojan://pw@h:443");
    assert_eq!(store.put(k.clone(), "first".into(), 0), PutOutcome::Inserted);
    assert_eq!(store.put(k.clone(), "second".into(), 5), PutOutcome::Kept);
    assert_eq!(store.get(&k), Some("first"));
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn last_write_wins_overwrites() {
    let mut store = FingerprintStore::new(CollisionPolicy::LastWins);
    let k = key("trojan://pw@h:443");
    store.put(k.clone(), "first".into(), 3);
    assert_eq!(store.put(k.clone(), "second".into(), 0), PutOutcome::Replaced);
    assert_eq!(store.get(&k), Some("second"));
  }

  #[test]
  fn most_complete_needs_strictly_more_fields() {
    let mut store = FingerprintStore::new(CollisionPolicy::MostComplete);
    let k = key("trojan://pw@h:443");
    store.put(k.clone(), "two".into(), 2);
    assert_eq!(store.put(k.clone(), "also-two".into(), 2), PutOutcome::Kept);
    assert_eq!(store.put(k.clone(), "three".into(), 3), PutOutcome::Replaced);
    assert_eq!(store.get(&k), Some("three"));
  }

  #[test]
  fn preserves_insertion_order_and_sorts_on_output() {
    let mut store = FingerprintStore::new(CollisionPolicy::FirstWins);
    store.put(key("trojan://b@h:1"), "trojan://b@h:1".into(), 0);
    store.put(key("trojan://a@h:1"), "trojan://a@h:1".into(), 0);
    assert_eq!(
      store.links().collect::<Vec<_>>(),
      vec!["trojan://b@h:1", "trojan://a@h:1"]
    );
    assert_eq!(
      store.into_sorted_links(),
      vec!["trojan://a@h:1".to_string(), "trojan://b@h:1".to_string()]
    );
  }
}
