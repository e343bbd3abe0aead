//! CachedOps: memoizing interceptor wrapping any ExpensiveOps

use std::convert::Infallible;
use std::path::Path;

use expensiveops::{Error, ExpensiveOps, Result, HASH_DIRECTORY, IS_PRIME};
use tracing::warn;

use crate::key::CacheKey;
use crate::stats::CacheStats;
use crate::store::MemoStore;

/// Memoizing layer combining one store per operation with the wrapped provider
///
/// Each distinct `(operation, arguments)` pair is computed at most once,
/// concurrent callers included. Failed hashes are not remembered.
pub struct CachedOps<O> {
    /// Underlying provider
    inner: O,

    /// Remembered primality answers
    primes: MemoStore<bool, Infallible>,

    /// Remembered directory digests
    hashes: MemoStore<String, Error>,
}

impl<O: ExpensiveOps> CachedOps<O> {
    /// Wrap `inner` with empty stores
    ///
    /// # Arguments
    /// * `inner` - Provider whose answers are remembered
    ///
    /// # Returns
    /// * `CachedOps<O>` - Memoizing provider, one store per operation
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            primes: MemoStore::new(),
            hashes: MemoStore::new(),
        }
    }

    /// Wrapped provider
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Statistics of the `is_prime` store
    pub fn prime_stats(&self) -> &CacheStats {
        self.primes.stats()
    }

    /// Statistics of the `hash_directory` store
    pub fn hash_stats(&self) -> &CacheStats {
        self.hashes.stats()
    }

    /// Number of remembered results across both operations
    pub fn cached_len(&self) -> usize {
        self.primes.len() + self.hashes.len()
    }

    /// Forget every remembered result and reset statistics
    pub fn clear_cache(&self) {
        self.primes.clear();
        self.hashes.clear();
    }
}

impl<O: ExpensiveOps> ExpensiveOps for CachedOps<O> {
    fn is_prime(&self, number: i64) -> bool {
        let key = match CacheKey::build(IS_PRIME, vec![number.into()]) {
            Ok(key) => key,
            Err(e) => {
                warn!("Not caching is_prime({}): {}", number, e);
                return self.inner.is_prime(number);
            }
        };

        match self
            .primes
            .get_or_compute(key, || Ok(self.inner.is_prime(number)))
        {
            Ok(prime) => prime,
            Err(never) => match never {},
        }
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        let key = CacheKey::build(HASH_DIRECTORY, vec![path.into()])?;
        self.hashes
            .get_or_compute(key, || self.inner.hash_directory(path))
    }
}
