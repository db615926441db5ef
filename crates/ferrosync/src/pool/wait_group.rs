use crate::sync::{Condvar, Mutex};

/// A completion barrier counting outstanding units of work.
///
/// Work is registered with [`Self::add`] before it starts and settled with
/// [`Self::done`] when it finishes; [`Self::wait`] blocks until nothing is
/// outstanding. Registration may happen while others are waiting, which is
/// what lets a task register follow-up work before it completes.
///
/// # Example
/// ```
/// use ferrosync::WaitGroup;
/// use std::sync::Arc;
///
/// let wg = Arc::new(WaitGroup::new());
/// wg.add(2);
/// for _ in 0..2 {
///     let wg = Arc::clone(&wg);
///     std::thread::spawn(move || wg.done());
/// }
/// wg.wait();
/// assert_eq!(wg.pending(), 0);
/// ```
#[derive(Debug, Default)]
pub struct WaitGroup {
    pending: Mutex<usize>,
    settled: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `n` more units of work.
    pub fn add(&self, n: usize) {
        *self.pending.lock() += n;
    }

    /// Settles one unit of work.
    pub fn done(&self) {
        self.done_n(1);
    }

    /// Settles `n` units of work, waking waiters once nothing is outstanding.
    pub fn done_n(&self, n: usize) {
        if n == 0 {
            return;
        }
        let mut pending = self.pending.lock();
        debug_assert!(*pending >= n, "settled more work than was registered");
        *pending = pending.saturating_sub(n);
        if *pending == 0 {
            drop(pending);
            self.settled.notify_all();
        }
    }

    /// Blocks until every registered unit of work is settled.
    pub fn wait(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            pending = self.settled.wait(pending);
        }
    }

    /// Units of work registered and not yet settled.
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}
