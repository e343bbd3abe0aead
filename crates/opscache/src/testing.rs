//! Stub providers shared by the unit tests

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use expensiveops::{Error, ExpensiveOps, ReferenceOps, Result};
use parking_lot::Mutex;

use crate::facade::current_boundary;

/// Counts invocations; answers primes like the reference and hashes as `hash:<path>`
#[derive(Default)]
pub struct CountingOps {
    prime_calls: AtomicUsize,
    hash_calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `n` hash calls
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn prime_calls(&self) -> usize {
        self.prime_calls.load(Ordering::SeqCst)
    }

    pub fn hash_calls(&self) -> usize {
        self.hash_calls.load(Ordering::SeqCst)
    }
}

impl ExpensiveOps for CountingOps {
    fn is_prime(&self, number: i64) -> bool {
        self.prime_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        ReferenceOps.is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        self.hash_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Computation(format!(
                "cannot read {}",
                path.display()
            )));
        }
        Ok(format!("hash:{}", path.display()))
    }
}

/// Records the facade boundary seen by each call
#[derive(Default)]
pub struct BoundaryOps {
    seen: Mutex<Vec<Option<String>>>,
    panics: bool,
}

impl BoundaryOps {
    pub fn panicking() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            panics: true,
        }
    }

    pub fn seen(&self) -> Vec<Option<String>> {
        self.seen.lock().clone()
    }

    fn observe(&self) {
        self.seen
            .lock()
            .push(current_boundary().map(|b| b.to_string()));
        if self.panics {
            panic!("observed panic");
        }
    }
}

impl ExpensiveOps for BoundaryOps {
    fn is_prime(&self, _number: i64) -> bool {
        self.observe();
        true
    }

    fn hash_directory(&self, _path: &Path) -> Result<String> {
        self.observe();
        Ok(String::new())
    }
}
