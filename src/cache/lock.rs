// src/cache/lock.rs

//! Locking discipline for the string caches.
//!
//! A cache is parameterised by a [`LockKind`]:
//! - [`Shared`] wraps the table in a `std::sync::Mutex`, so the cache can be
//!   shared across threads (e.g. behind an `Arc`).
//! - [`Unshared`] wraps it in a `RefCell`. The cache is then `!Sync` and the
//!   compiler keeps it on one thread; there is no locking cost.
//!
//! Every public cache operation runs inside exactly one `with` call, and no
//! operation calls back into the cache while inside it.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A cell that grants exclusive access to `T` for the duration of a closure.
pub trait CacheLock<T> {
    fn new(value: T) -> Self;

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Selects the [`CacheLock`] implementation used by a cache.
pub trait LockKind {
    type Lock<T>: CacheLock<T>;
}

/// Thread-safe caches backed by a mutex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shared;

/// Single-threaded caches with no locking overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unshared;

impl LockKind for Shared {
    type Lock<T> = MutexLock<T>;
}

impl LockKind for Unshared {
    type Lock<T> = NoLock<T>;
}

pub struct MutexLock<T>(Mutex<T>);

impl<T> CacheLock<T> for MutexLock<T> {
    fn new(value: T) -> Self {
        MutexLock(Mutex::new(value))
    }

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        // Table mutations never panic halfway through, so a poisoned guard
        // still holds a consistent table.
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<T> fmt::Debug for MutexLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MutexLock")
    }
}

pub struct NoLock<T>(RefCell<T>);

impl<T> CacheLock<T> for NoLock<T> {
    fn new(value: T) -> Self {
        NoLock(RefCell::new(value))
    }

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl<T> fmt::Debug for NoLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoLock")
    }
}
