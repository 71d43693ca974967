//! Run-scoped set of digests already seen.

use std::collections::HashSet;

use crate::digest::ContentDigest;

/// Insert-only set of content digests observed during one run.
///
/// `try_insert` is the whole duplicate decision: it answers "first seen?"
/// and records the digest in the same step, so callers never need a
/// separate lookup before inserting.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<ContentDigest>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `digest` if absent. Returns true when it was not seen before.
    pub fn try_insert(&mut self, digest: ContentDigest) -> bool {
        self.seen.insert(digest)
    }

    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.seen.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
