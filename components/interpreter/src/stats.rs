//! Lookup statistics.
//!
//! Counters describing how the realm's lookup sites behave: how often the
//! cached fast path served an access, how often the resolver ran, and how
//! sites moved between states.

/// Coarse classification of a lookup site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IcState {
    /// Never filled
    Uninitialized,
    /// One cached entry
    Monomorphic,
    /// Two cached entries
    Polymorphic,
    /// Terminal; every access re-resolves
    Generic,
}

/// Counters collected across all sites of a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupStats {
    /// Accesses served by a cached strategy
    pub hits: u64,
    /// Accesses that fell through to the slow path
    pub misses: u64,
    /// Resolver runs
    pub resolutions: u64,
    /// Moves to Monomorphic or Polymorphic
    pub upgrades: u64,
    /// Moves to Generic
    pub degradations: u64,
    /// Native descriptor handles released by sites
    pub descriptor_releases: u64,
    /// Property insertions performed by set sites, cached or not
    pub insertions: u64,
}

impl LookupStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> LookupStats {
        *self
    }

    /// Fraction of accesses served by the fast path.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_resolution(&mut self) {
        self.resolutions += 1;
    }

    pub(crate) fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    /// Records a site moving from `from` to `to`, releasing `released` handles.
    pub(crate) fn record_transition(&mut self, from: IcState, to: IcState, released: u64) {
        if to == IcState::Generic && from != IcState::Generic {
            self.degradations += 1;
        } else if to > from {
            self.upgrades += 1;
        }
        self.descriptor_releases += released;
    }
}
