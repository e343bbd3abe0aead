//! # opscache
//!
//! Interception layers for [`expensiveops::ExpensiveOps`].
//!
//! ## Architecture
//! - **CacheKey**: operation name plus positional arguments, `Hash + Eq`
//! - **MemoStore**: unbounded map with single-flight computation per key
//! - **CachedOps**: memoizing interceptor, one store per operation
//! - **Timed / Logged / Facade**: decorators that compose by delegation
//! - **Reporter**: receives the decorators' structured events
//!
//! Every layer implements `ExpensiveOps`, so layers stack in any order:
//!
//! ```ignore
//! let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);
//! let ops = Timed::new(Logged::new(CachedOps::new(ReferenceOps::new()), reporter.clone()), reporter);
//! ```

#![warn(missing_docs)]

mod cache;
mod facade;
mod key;
mod logging;
mod report;
mod stats;
mod store;
mod timing;

#[cfg(test)]
mod testing;

pub use cache::CachedOps;
pub use facade::{current_boundary, Facade, Scope};
pub use key::{ArgValue, CacheKey};
pub use logging::Logged;
pub use report::{
    CallEvent, CallRecord, EventKind, JsonReporter, RecordingReporter, Reporter, TracingReporter,
};
pub use stats::CacheStats;
pub use store::MemoStore;
pub use timing::Timed;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingOps;
    use expensiveops::ExpensiveOps;
    use std::path::Path;
    use std::sync::Arc;

    fn outcomes(ops: &dyn ExpensiveOps) -> (bool, bool, String, String) {
        (
            ops.is_prime(1_000_000_005_721),
            ops.is_prime(1_000_000_005_723),
            ops.hash_directory(Path::new("")).unwrap(),
            ops.hash_directory(Path::new("src")).unwrap(),
        )
    }

    #[test]
    fn test_decorators_are_transparent() {
        let recorder = Arc::new(RecordingReporter::new());
        let r = || -> Arc<dyn Reporter> { recorder.clone() };
        let expected = outcomes(&CountingOps::new());

        let stacks: Vec<Box<dyn ExpensiveOps>> = vec![
            Box::new(Timed::new(CountingOps::new(), r())),
            Box::new(Logged::new(CountingOps::new(), r())),
            Box::new(Timed::new(Logged::new(CountingOps::new(), r()), r())),
            Box::new(Logged::new(Timed::new(CountingOps::new(), r()), r())),
            Box::new(Facade::new("F", Timed::new(CountingOps::new(), r()).within_facade())),
            Box::new(Timed::new(Logged::new(CachedOps::new(CountingOps::new()), r()), r())),
            Box::new(CachedOps::new(Timed::new(Logged::new(CountingOps::new(), r()), r()))),
            Box::new(Logged::new(Facade::new("F", CachedOps::new(CountingOps::new())), r())),
        ];

        for ops in &stacks {
            assert_eq!(outcomes(ops.as_ref()), expected);
        }
        assert!(!recorder.is_empty());
    }

    #[test]
    fn test_cache_below_logging_still_logs_every_call() {
        let recorder = Arc::new(RecordingReporter::new());
        let ops = Logged::new(CachedOps::new(CountingOps::new()), recorder.clone());

        ops.is_prime(97);
        ops.is_prime(97);

        assert_eq!(recorder.count(EventKind::Enter), 2);
        assert_eq!(ops.inner().inner().prime_calls(), 1);
    }

    #[test]
    fn test_cache_above_logging_hides_hits() {
        let recorder = Arc::new(RecordingReporter::new());
        let ops = CachedOps::new(Logged::new(CountingOps::new(), recorder.clone()));

        ops.is_prime(97);
        ops.is_prime(97);

        assert_eq!(recorder.count(EventKind::Enter), 1);
    }
}
