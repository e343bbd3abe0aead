//! Exercises one assembled strategy

use std::path::{Path, PathBuf};
use std::thread;

use expensiveops::ExpensiveOps;
use tracing::{debug, info, warn};

/// Inputs shared by every strategy run
#[derive(Debug, Clone)]
pub struct Workload {
    /// Number asked twice, then `number + 2` once
    pub number: i64,
    /// Directory hashed twice
    pub root: PathBuf,
    /// Directory hashed once
    pub other: PathBuf,
    /// Threads issuing the first `is_prime` call together
    pub concurrency: usize,
}

/// What one run observed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Answers of the three `is_prime` calls
    pub primes: Vec<bool>,
    /// Digests of the successful `hash_directory` calls
    pub hashes: Vec<String>,
    /// Calls that failed
    pub failures: usize,
}

/// Run the workload against `ops`
///
/// A failed call is logged and the run carries on with the next one.
pub fn run_ops(ops: &dyn ExpensiveOps, description: &str, work: &Workload) -> RunSummary {
    info!("=== Running {} ===", description);
    let mut summary = RunSummary::default();

    debug!("----CPU expensive");
    let next = neighbour(work.number);
    for (i, number) in [work.number, work.number, next].into_iter().enumerate() {
        info!("{} is prime ?", number);
        let prime = if i == 0 && work.concurrency > 1 {
            let (prime, panicked) = concurrent_is_prime(ops, number, work.concurrency);
            summary.failures += panicked;
            prime
        } else {
            ops.is_prime(number)
        };
        info!("Got: {}", prime);
        summary.primes.push(prime);
    }

    debug!("----IO expensive");
    for path in [&work.root, &work.root, &work.other] {
        debug!("Get files hash {}", display_abs(path));
        match ops.hash_directory(path) {
            Ok(hash) => {
                info!("MD5: {}", hash);
                summary.hashes.push(hash);
            }
            Err(e) => {
                warn!("hash_directory({}) failed: {}", path.display(), e);
                summary.failures += 1;
            }
        }
    }

    summary
}

/// The "different input" for `number`: `number + 2`, or `number - 2` at the top of the range
fn neighbour(number: i64) -> i64 {
    number.checked_add(2).unwrap_or_else(|| {
        warn!("{} + 2 overflows, asking {} instead", number, number - 2);
        number - 2
    })
}

/// Issue the same `is_prime` call from `threads` threads at once
///
/// # Returns
/// * `(bool, usize)` - The shared answer and the number of callers that panicked
fn concurrent_is_prime(ops: &dyn ExpensiveOps, number: i64, threads: usize) -> (bool, usize) {
    let joined: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(move || ops.is_prime(number)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut answers = Vec::with_capacity(joined.len());
    let mut panicked = 0;
    for (caller, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok(prime) => answers.push(prime),
            Err(_) => {
                warn!("is_prime({}) panicked in concurrent caller {}", number, caller);
                panicked += 1;
            }
        }
    }

    if answers.windows(2).any(|w| w[0] != w[1]) {
        warn!("Concurrent callers disagreed on is_prime({})", number);
    }
    debug!("{} concurrent callers answered", answers.len());
    let prime = answers.first().copied().unwrap_or_else(|| ops.is_prime(number));
    (prime, panicked)
}

fn display_abs(path: &Path) -> String {
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use expensiveops::ReferenceOps;
    use opscache::CachedOps;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Panics on its first `is_prime` call only
    #[derive(Default)]
    struct FirstCallPanics {
        calls: AtomicUsize,
    }

    impl ExpensiveOps for FirstCallPanics {
        fn is_prime(&self, number: i64) -> bool {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first caller fails");
            }
            ReferenceOps.is_prime(number)
        }

        fn hash_directory(&self, _path: &Path) -> expensiveops::Result<String> {
            Ok(String::new())
        }
    }

    fn workload(dir: &TempDir, concurrency: usize) -> Workload {
        Workload {
            number: 1_000_000_005_721,
            root: dir.path().to_path_buf(),
            other: dir.path().join("src"),
            concurrency,
        }
    }

    #[test]
    fn test_run_plain() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("a.txt"), b"hello").unwrap();

        let summary = run_ops(&ReferenceOps::new(), "plain", &workload(&dir, 1));

        assert_eq!(summary.primes, vec![true, true, false]);
        assert_eq!(summary.hashes.len(), 3);
        assert_eq!(summary.hashes[0], summary.hashes[1]);
        assert_eq!(summary.hashes[2], "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(summary.failures, 0);
    }

    #[test]
    fn test_run_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        // No src directory: the last hash fails
        let summary = run_ops(&ReferenceOps::new(), "plain", &workload(&dir, 1));

        assert_eq!(summary.hashes.len(), 2);
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn test_run_concurrent_cached() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let ops = CachedOps::new(ReferenceOps::new());

        let summary = run_ops(&ops, "cached", &workload(&dir, 4));

        assert_eq!(summary.primes, vec![true, true, false]);
        assert_eq!(ops.prime_stats().misses(), 2);
        assert_eq!(ops.hash_stats().misses(), 2);
        assert_eq!(ops.hash_stats().hits(), 1);
    }

    #[test]
    fn test_neighbour_stays_distinct() {
        assert_eq!(neighbour(1_000_000_005_721), 1_000_000_005_723);
        assert_eq!(neighbour(i64::MAX), i64::MAX - 2);
        assert_eq!(neighbour(i64::MAX - 1), i64::MAX - 3);
    }

    #[test]
    fn test_run_near_i64_max_asks_two_numbers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let ops = CachedOps::new(ReferenceOps::new());
        let work = Workload {
            number: i64::MAX - 1,
            ..workload(&dir, 1)
        };

        run_ops(&ops, "cached", &work);

        assert_eq!(ops.prime_stats().misses(), 2);
        assert_eq!(ops.prime_stats().hits(), 1);
    }

    #[test]
    fn test_panicking_concurrent_caller_is_counted() {
        let ops = FirstCallPanics::default();

        let (prime, panicked) = concurrent_is_prime(&ops, 97, 3);

        assert!(prime);
        assert_eq!(panicked, 1);
        assert_eq!(ops.calls.load(Ordering::SeqCst), 3);
    }
}
