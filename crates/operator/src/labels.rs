//! Pure label-set operations: the merge engine and the blacklist predicate.
//!
//! Both are free of I/O so the conflict-resolution and policy rules can be
//! tested exhaustively without a cluster.

use std::collections::{BTreeMap, BTreeSet};

/// A namespace label mapping
pub type LabelSet = BTreeMap<String, String>;

/// Fold an ordered sequence of label maps into one, last-write-wins per key.
///
/// The caller is responsible for imposing a deterministic order on `maps`;
/// with an unordered input the winning value for a colliding key would be
/// arbitrary. An empty sequence yields an empty map.
pub fn merge<I>(maps: I) -> LabelSet
where
    I: IntoIterator<Item = LabelSet>,
{
    maps.into_iter().fold(LabelSet::new(), |mut acc, map| {
        acc.extend(map);
        acc
    })
}

/// Returns the first blacklisted key present in `labels`, in sorted blacklist
/// order so denial messages are reproducible.
pub fn forbidden_key<'a>(labels: &LabelSet, blacklist: &'a BTreeSet<String>) -> Option<&'a str> {
    if blacklist.is_empty() {
        return None;
    }
    blacklist
        .iter()
        .find(|key| labels.contains_key(key.as_str()))
        .map(String::as_str)
}

/// True iff any blacklisted key is present in `labels`.
pub fn is_blacklisted(labels: &LabelSet, blacklist: &BTreeSet<String>) -> bool {
    forbidden_key(labels, blacklist).is_some()
}
