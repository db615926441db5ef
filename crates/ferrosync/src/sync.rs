//! Lock backend shim.
//!
//! With the `parking-lot` feature the primitives are backed by
//! [`parking_lot`], which never poisons. Otherwise the std types are used and
//! a poisoned lock is recovered: every critical section in this crate leaves
//! its state consistent before any user code can run, so the data behind a
//! poisoned lock is still valid.

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::MutexGuard;
#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::MutexGuard;

#[derive(Debug, Default)]
pub(crate) struct Mutex<T> {
    #[cfg(feature = "parking-lot")]
    inner: parking_lot::Mutex<T>,
    #[cfg(not(feature = "parking-lot"))]
    inner: std::sync::Mutex<T>,
}

impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "parking-lot")]
            inner: parking_lot::Mutex::new(value),
            #[cfg(not(feature = "parking-lot"))]
            inner: std::sync::Mutex::new(value),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        #[cfg(feature = "parking-lot")]
        {
            self.inner.lock()
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Condvar {
    #[cfg(feature = "parking-lot")]
    inner: parking_lot::Condvar,
    #[cfg(not(feature = "parking-lot"))]
    inner: std::sync::Condvar,
}

impl Condvar {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(feature = "parking-lot")]
            inner: parking_lot::Condvar::new(),
            #[cfg(not(feature = "parking-lot"))]
            inner: std::sync::Condvar::new(),
        }
    }

    /// Releases the guard's lock, blocks until notified and reacquires it.
    ///
    /// Spurious wakeups are possible; callers re-check their condition.
    pub(crate) fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        #[cfg(feature = "parking-lot")]
        {
            let mut guard = guard;
            self.inner.wait(&mut guard);
            guard
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.inner
                .wait(guard)
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    pub(crate) fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.inner.notify_all();
    }
}
