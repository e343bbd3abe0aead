//! Timing decorator

use std::path::Path;
use std::sync::Arc;

use expensiveops::{ExpensiveOps, Result, HASH_DIRECTORY, IS_PRIME};

use crate::facade::Scope;
use crate::key::ArgValue;
use crate::report::{CallRecord, Reporter};

/// Reports the duration of the call when dropped, so unwinding is timed too
struct Stopwatch<'a> {
    record: CallRecord,
    reporter: &'a dyn Reporter,
}

impl Drop for Stopwatch<'_> {
    fn drop(&mut self) {
        self.reporter.report(&self.record.timing());
    }
}

/// Measures every delegated call and reports a timing event
///
/// Failed calls are timed as well; their error is returned unchanged.
pub struct Timed<O> {
    inner: O,
    reporter: Arc<dyn Reporter>,
    scope: Scope,
}

impl<O: ExpensiveOps> Timed<O> {
    /// Time every call to `inner`
    pub fn new(inner: O, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            inner,
            reporter,
            scope: Scope::Always,
        }
    }

    /// Only time calls made inside a facade boundary
    pub fn within_facade(mut self) -> Self {
        self.scope = Scope::WithinFacade;
        self
    }

    /// Wrapped provider
    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn stopwatch(&self, operation: &'static str, args: Vec<ArgValue>) -> Option<Stopwatch<'_>> {
        self.scope.is_active().then(|| Stopwatch {
            record: CallRecord::start(operation, args),
            reporter: self.reporter.as_ref(),
        })
    }
}

impl<O: ExpensiveOps> ExpensiveOps for Timed<O> {
    fn is_prime(&self, number: i64) -> bool {
        let _watch = self.stopwatch(IS_PRIME, vec![number.into()]);
        self.inner.is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        let _watch = self.stopwatch(HASH_DIRECTORY, vec![path.into()]);
        self.inner.hash_directory(path)
    }
}
