//! # expensiveops
//!
//! Two deliberately expensive operations worth caching.
//!
//! ## Operations
//! - **is_prime**: naive O(sqrt(n)) trial division over `i64` (CPU-bound)
//! - **hash_directory**: MD5 over every file below a directory (IO-bound)
//!
//! Both are pure from the caller's perspective and know nothing about caching;
//! interception layers are built on top of the [`ExpensiveOps`] trait.

#![warn(missing_docs)]

mod error;
mod ops;
mod render;

pub use error::{Error, Result};
pub use ops::{ExpensiveOps, ReferenceOps, HASH_DIRECTORY, IS_PRIME};
pub use render::bytes_to_hex;
