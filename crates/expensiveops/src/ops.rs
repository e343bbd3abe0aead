//! Expensive operations
//!
//! `ExpensiveOps` is the interface every layer (reference implementation,
//! memoizing interceptor, decorators) implements, so layers can be stacked
//! in any order.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use md5::{Digest, Md5};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::render::bytes_to_hex;

/// Operation name of [`ExpensiveOps::is_prime`]
pub const IS_PRIME: &str = "is_prime";

/// Operation name of [`ExpensiveOps::hash_directory`]
pub const HASH_DIRECTORY: &str = "hash_directory";

/// Files whose name ends with this suffix are left out of directory hashes
const SKIPPED_SUFFIX: &str = "lock";

/// The two expensive operations
pub trait ExpensiveOps: Send + Sync {
    /// CPU-bound: naive trial-division primality test
    fn is_prime(&self, number: i64) -> bool;

    /// IO-bound: MD5 over the content of every file below `path`
    fn hash_directory(&self, path: &Path) -> Result<String>;
}

impl<T: ExpensiveOps + ?Sized> ExpensiveOps for &T {
    fn is_prime(&self, number: i64) -> bool {
        (**self).is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        (**self).hash_directory(path)
    }
}

impl<T: ExpensiveOps + ?Sized> ExpensiveOps for Box<T> {
    fn is_prime(&self, number: i64) -> bool {
        (**self).is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        (**self).hash_directory(path)
    }
}

impl<T: ExpensiveOps + ?Sized> ExpensiveOps for Arc<T> {
    fn is_prime(&self, number: i64) -> bool {
        (**self).is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        (**self).hash_directory(path)
    }
}

/// Reference implementation with no caching of its own
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceOps;

impl ReferenceOps {
    /// Create the reference provider
    pub fn new() -> Self {
        Self
    }
}

impl ExpensiveOps for ReferenceOps {
    /// Every `number <= 3` is reported prime, negatives included.
    ///
    /// Trial division continues while `divisor < number / divisor`, so odd
    /// squares of primes (9, 25, 49, ...) are reported prime as well.
    fn is_prime(&self, number: i64) -> bool {
        debug!("Compute is_prime({})", number);
        let before = Instant::now();
        let prime = trial_division(number);
        debug!(
            "Inner duration is_prime: {}us",
            before.elapsed().as_micros()
        );
        prime
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        debug!("Compute hash_directory({})", path.display());
        let before = Instant::now();
        let digest = md5_tree(path);
        debug!(
            "Inner duration hash_directory: {}us",
            before.elapsed().as_micros()
        );
        digest
    }
}

fn trial_division(number: i64) -> bool {
    if number <= 3 {
        debug!("leq 3");
        return true;
    }

    if number % 2 == 0 {
        debug!("divisor 2 remainder eq 0");
        return false;
    }

    // number > 3 here, so divisor and number / divisor never overflow
    let mut divisor: i64 = 3;
    while divisor < number / divisor {
        if number % divisor == 0 {
            debug!("with divisor {} remainder eq 0", divisor);
            return false;
        }
        divisor += 2;
    }

    debug!(
        "found, {} (divisor) gte {} (number by divisor)",
        divisor,
        number / divisor
    );
    true
}

fn md5_tree(root: &Path) -> Result<String> {
    let mut hasher = Md5::new();
    let mut buf = Vec::new();

    // Unsorted depth-first order, as returned by the filesystem
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();

        // Symlinks are followed when deciding what is a regular file
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            _ => continue,
        }

        if entry.file_name().to_string_lossy().ends_with(SKIPPED_SUFFIX) {
            continue;
        }

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("skipping unreadable {}", path.display());
                continue;
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        buf.clear();
        file.read_to_end(&mut buf).map_err(|e| Error::io(path, e))?;
        hasher.update(&buf);
    }

    Ok(bytes_to_hex(&hasher.finalize()))
}
