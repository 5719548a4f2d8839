//! # Outbound Ports
//!
//! Capabilities the validation core consumes: ancestor lookup owned by chain
//! storage, and a reference clock for timestamp drift checks.

use crate::domain::{Hash, HeaderRecord};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read-only "fetch header by identity hash" capability.
///
/// Implementations must present a stable snapshot for the duration of a
/// validation call; the core never mutates it.
pub trait AncestorLookup {
    /// Header whose identity hash is `hash`, if known.
    fn header_by_hash(&self, hash: &Hash) -> Option<HeaderRecord>;
}

impl<T: AncestorLookup + ?Sized> AncestorLookup for &T {
    fn header_by_hash(&self, hash: &Hash) -> Option<HeaderRecord> {
        (**self).header_by_hash(hash)
    }
}

impl<S: std::hash::BuildHasher> AncestorLookup for HashMap<Hash, HeaderRecord, S> {
    fn header_by_hash(&self, hash: &Hash) -> Option<HeaderRecord> {
        self.get(hash).cloned()
    }
}

/// Reference time source in unix seconds.
pub trait ReferenceClock {
    /// Current reference time.
    fn now(&self) -> u64;
}

impl<T: ReferenceClock + ?Sized> ReferenceClock for &T {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl ReferenceClock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Clock pinned to a fixed instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl ReferenceClock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// In-memory ancestor store for testing and embedding.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAncestors {
    headers: HashMap<Hash, HeaderRecord>,
}

impl InMemoryAncestors {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header keyed by its identity hash.
    pub fn insert(&mut self, header: HeaderRecord) {
        self.headers.insert(*header.block_hash(), header);
    }

    /// Number of stored headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl FromIterator<HeaderRecord> for InMemoryAncestors {
    fn from_iter<I: IntoIterator<Item = HeaderRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for header in iter {
            store.insert(header);
        }
        store
    }
}

impl AncestorLookup for InMemoryAncestors {
    fn header_by_hash(&self, hash: &Hash) -> Option<HeaderRecord> {
        self.headers.get(hash).cloned()
    }
}
