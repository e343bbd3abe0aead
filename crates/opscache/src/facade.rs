//! Facade boundaries
//!
//! A [`Facade`] marks every call passing through it as happening inside a
//! named boundary. It does nothing else. Decorators configured with
//! [`Scope::WithinFacade`] only report calls made inside some boundary, which
//! separates "where was this called from" policy from per-call policy.
//!
//! The active boundaries are tracked per thread, innermost last.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use expensiveops::{ExpensiveOps, Result};
use tracing::trace;

thread_local! {
    static BOUNDARIES: RefCell<Vec<Arc<str>>> = const { RefCell::new(Vec::new()) };
}

/// Name of the innermost facade boundary active on this thread
pub fn current_boundary() -> Option<Arc<str>> {
    BOUNDARIES.with(|b| b.borrow().last().cloned())
}

/// Pops the boundary on drop, unwinding included
struct BoundaryGuard;

impl BoundaryGuard {
    fn enter(name: &Arc<str>) -> Self {
        BOUNDARIES.with(|b| b.borrow_mut().push(Arc::clone(name)));
        BoundaryGuard
    }
}

impl Drop for BoundaryGuard {
    fn drop(&mut self) {
        BOUNDARIES.with(|b| {
            b.borrow_mut().pop();
        });
    }
}

/// When a decorator reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every call
    #[default]
    Always,
    /// Only calls made inside a facade boundary
    WithinFacade,
}

impl Scope {
    /// Should a call on this thread be reported right now
    pub fn is_active(self) -> bool {
        match self {
            Scope::Always => true,
            Scope::WithinFacade => current_boundary().is_some(),
        }
    }
}

/// Named interception boundary around a provider
pub struct Facade<O> {
    name: Arc<str>,
    inner: O,
}

impl<O: ExpensiveOps> Facade<O> {
    /// Wrap `inner` in a boundary called `name`
    ///
    /// # Arguments
    /// * `name` - Boundary name carried by events raised inside it
    /// * `inner` - Provider called while the boundary is active
    ///
    /// # Returns
    /// * `Facade<O>` - Provider that enters the boundary on every call
    pub fn new(name: &str, inner: O) -> Self {
        Self {
            name: Arc::from(name),
            inner,
        }
    }

    /// Boundary name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrapped provider
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: ExpensiveOps> ExpensiveOps for Facade<O> {
    fn is_prime(&self, number: i64) -> bool {
        trace!("Intercepted within {} is_prime({})", self.name, number);
        let _boundary = BoundaryGuard::enter(&self.name);
        self.inner.is_prime(number)
    }

    fn hash_directory(&self, path: &Path) -> Result<String> {
        trace!(
            "Intercepted within {} hash_directory({})",
            self.name,
            path.display()
        );
        let _boundary = BoundaryGuard::enter(&self.name);
        self.inner.hash_directory(path)
    }
}
