//! Logging decorator

use std::path::Path;
use std::sync::Arc;

use expensiveops::{ExpensiveOps, Result, HASH_DIRECTORY, IS_PRIME};

use crate::facade::Scope;
use crate::report::{CallRecord, Reporter};

/// Reports call entry with arguments and call exit with the result
///
/// Purely observational: arguments and results pass through untouched.
pub struct Logged<O> {
    inner: O,
    reporter: Arc<dyn Reporter>,
    scope: Scope,
}

impl<O: ExpensiveOps> Logged<O> {
    /// Log every call to `inner`
    pub fn new(inner: O, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            inner,
            reporter,
            scope: Scope::Always,
        }
    }

    /// Only log calls made inside a facade boundary
    pub fn within_facade(mut self) -> Self {
        self.scope = Scope::WithinFacade;
        self
    }

    /// Wrapped provider
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: ExpensiveOps> ExpensiveOps for Logged<O> {
    fn is_prime(&self, number: i64) -> bool {
        if !self.scope.is_active() {
            return self.inner.is_prime(number);
        }
        let record = CallRecord::start(IS_PRIME, vec![number.into()]);
        self.reporter.report(&record.enter());
        let prime = self.inner.is_prime(number);
        self.reporter.report(&record.exit(prime.to_string()));
        prime
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        if !self.scope.is_active() {
            return self.inner.hash_directory(path);
        }
        let record = CallRecord::start(HASH_DIRECTORY, vec![path.into()]);
        self.reporter.report(&record.enter());
        let hash = self.inner.hash_directory(path);
        let rendered = match &hash {
            Ok(digest) => digest.clone(),
            Err(e) => format!("error: {}", e),
        };
        self.reporter.report(&record.exit(rendered));
        hash
    }
}
