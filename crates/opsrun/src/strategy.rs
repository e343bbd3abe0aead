//! Interception strategies the driver can exercise

use std::sync::Arc;

use clap::ValueEnum;
use expensiveops::{ExpensiveOps, ReferenceOps};
use opscache::{CacheStats, CachedOps, Facade, Logged, Reporter, Timed};

/// Boundary name used by the facade strategy
pub const FACADE_NAME: &str = "ExpensiveOpsFacade";

/// One way of layering cross-cutting behavior over the reference provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Reference provider, nothing around it
    Plain,
    /// Facade boundary over a facade-scoped timer
    Facade,
    /// Logging over timing
    Logged,
    /// Memoizing interceptor only
    Cached,
    /// Timing over logging over the memoizing interceptor
    Layered,
}

impl Strategy {
    /// Every strategy, in run order
    pub fn all() -> Vec<Strategy> {
        vec![
            Strategy::Layered,
            Strategy::Facade,
            Strategy::Logged,
            Strategy::Cached,
            Strategy::Plain,
        ]
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Strategy::Plain => "without interception",
            Strategy::Facade => "with facade boundary",
            Strategy::Logged => "with method interceptor",
            Strategy::Cached => "with memoizing interceptor",
            Strategy::Layered => "with cache decorator",
        }
    }

    /// Assemble the layers for this strategy
    pub fn build(self, reporter: Arc<dyn Reporter>) -> Built {
        match self {
            Strategy::Plain => Built::plain(ReferenceOps::new()),
            Strategy::Facade => Built::plain(Facade::new(
                FACADE_NAME,
                Timed::new(ReferenceOps::new(), reporter).within_facade(),
            )),
            Strategy::Logged => Built::plain(Logged::new(
                Timed::new(ReferenceOps::new(), reporter.clone()),
                reporter,
            )),
            Strategy::Cached => {
                let cached = Arc::new(CachedOps::new(ReferenceOps::new()));
                Built::cached(cached.clone(), cached)
            }
            Strategy::Layered => {
                let cached = Arc::new(CachedOps::new(ReferenceOps::new()));
                let ops = Timed::new(Logged::new(cached.clone(), reporter.clone()), reporter);
                Built::cached(Arc::new(ops), cached)
            }
        }
    }
}

/// An assembled strategy
pub struct Built {
    /// Outermost layer, the one callers talk to
    pub ops: Arc<dyn ExpensiveOps>,
    /// Memoizing layer inside the stack, if any
    pub cache: Option<Arc<CachedOps<ReferenceOps>>>,
}

impl Built {
    fn plain(ops: impl ExpensiveOps + 'static) -> Self {
        Self {
            ops: Arc::new(ops),
            cache: None,
        }
    }

    fn cached(ops: Arc<dyn ExpensiveOps>, cache: Arc<CachedOps<ReferenceOps>>) -> Self {
        Self {
            ops,
            cache: Some(cache),
        }
    }

    /// `(prime stats, hash stats)` of the memoizing layer
    pub fn stats(&self) -> Option<(&CacheStats, &CacheStats)> {
        self.cache
            .as_ref()
            .map(|c| (c.prime_stats(), c.hash_stats()))
    }
}
