//! Striped row locks for mutating operations
//!
//! Each name and each commitment hash maps onto one of a fixed set of
//! mutexes. Operations lock only the stripes of the rows they touch, always
//! in ascending stripe order, so calls on unrelated names proceed in parallel.

use crate::types::{CommitmentHash, DomainName};
use parking_lot::{Mutex, MutexGuard};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_STRIPES: usize = 64;

/// Row a mutating operation reads and writes
#[derive(Debug, Clone, Copy, Hash)]
pub enum LockKey<'a> {
    Name(&'a DomainName),
    Commitment(&'a CommitmentHash),
}

#[derive(Debug)]
pub struct LockStripes {
    stripes: Vec<Mutex<()>>,
}

/// Guards held for the duration of one operation
pub type StripeGuards<'a> = Vec<MutexGuard<'a, ()>>;

impl LockStripes {
    pub fn new(count: usize) -> Self {
        let count = count.max(1);
        Self {
            stripes: (0..count).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_of(&self, key: LockKey<'_>) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Lock the stripes of `keys`, deduplicated and in ascending order.
    pub fn lock(&self, keys: &[LockKey<'_>]) -> StripeGuards<'_> {
        let mut indexes: Vec<usize> = keys.iter().map(|k| self.stripe_of(*k)).collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes.into_iter().map(|i| self.stripes[i].lock()).collect()
    }

    /// Lock every stripe, for table-wide maintenance.
    pub fn lock_all(&self) -> StripeGuards<'_> {
        self.stripes.iter().map(|m| m.lock()).collect()
    }
}

impl Default for LockStripes {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
