use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex, PoisonError};

/// A counting source of permits.
///
/// `acquire` blocks until a permit is free and returns how many permits are
/// in use once it has been taken. Every `acquire` must be paired with exactly
/// one `release`; use [`Permit`] rather than calling these directly.
pub trait PermitSource: Send + Sync {
    fn acquire(&self) -> usize;
    fn release(&self);
    fn capacity(&self) -> usize;
    fn in_use(&self) -> usize;
}

/// Scoped permit. Released on drop, including while unwinding from a panic.
pub struct Permit<'a> {
    source: &'a dyn PermitSource,
    in_use: usize,
}

impl<'a> Permit<'a> {
    pub fn acquire(source: &'a dyn PermitSource) -> Self {
        let in_use = source.acquire();
        Self { source, in_use }
    }

    /// Permits in use right after this one was granted
    pub fn in_use_at_grant(&self) -> usize {
        self.in_use
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.source.release();
    }
}

impl std::fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit")
            .field("in_use", &self.in_use)
            .finish()
    }
}

/// Counting semaphore over a mutex and condition variable
#[derive(Debug)]
pub struct PermitPool {
    capacity: usize,
    in_use: Mutex<usize>,
    freed: Condvar,
}

impl PermitPool {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            in_use: Mutex::new(0),
            freed: Condvar::new(),
        }
    }
}

// A panicking unit never holds the lock, so a poisoned mutex still guards a
// consistent count.
impl PermitSource for PermitPool {
    fn acquire(&self) -> usize {
        let guard = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        let mut in_use = self
            .freed
            .wait_while(guard, |in_use| *in_use >= self.capacity)
            .unwrap_or_else(PoisonError::into_inner);
        *in_use += 1;
        *in_use
    }

    fn release(&self) {
        let mut in_use = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        *in_use = in_use.saturating_sub(1);
        drop(in_use);
        self.freed.notify_one();
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn in_use(&self) -> usize {
        *self.in_use.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
