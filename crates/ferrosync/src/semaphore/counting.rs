#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, Result,
    semaphore::SemaphorePermit,
    sync::{Condvar, Mutex},
};

#[derive(Debug, Default)]
struct Permits {
    /// Permits owned by callers whose `acquire` has returned.
    held: usize,
    /// Permits set aside for a batch that is still waiting on the rest.
    reserved: usize,
    /// Whether a batch is currently accumulating into `reserved`.
    batching: bool,
}

/// A counting semaphore with batched acquire and release.
///
/// The semaphore hands out `capacity` interchangeable permits. A request for
/// `n` permits may be larger than what is currently free: the semaphore sets
/// aside whatever is free right away and waits only for the remainder. Only
/// one such partial request accumulates at a time, so two large batches can
/// never each hold half of what the other needs. Requests that can be
/// satisfied outright skip the queue; there is no fairness between waiters.
///
/// Permits set aside for an unfinished batch are not counted by
/// [`Self::len`]. A batch becomes visible only once all of its permits are
/// held.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Batch requests complete atomically
/// - ❌ FIFO between waiters
///
/// # Example
/// ```
/// use ferrosync::Semaphore;
///
/// let semaphore = Semaphore::new(4)?;
/// semaphore.acquire(3)?;
/// assert_eq!(semaphore.len(), 3);
/// assert!(!semaphore.try_acquire(2));
///
/// // Releasing more than is held is clamped.
/// assert_eq!(semaphore.release(10), 3);
/// assert_eq!(semaphore.len(), 0);
/// # Ok::<(), ferrosync::Error>(())
/// ```
#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<Permits>,
    released: Condvar,
    capacity: usize,
}

impl Semaphore {
    /// Creates a semaphore with `capacity` permits, none held.
    ///
    /// # Errors
    /// - [`Error::ZeroSize`] if `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::zero_size("semaphore capacity"));
        }
        Ok(Self {
            state: Mutex::new(Permits::default()),
            released: Condvar::new(),
            capacity,
        })
    }

    /// Blocks until `n` permits are held by the caller.
    ///
    /// Asking for zero permits returns immediately.
    ///
    /// # Errors
    /// - [`Error::ExceedsCapacity`] if `n` is greater than [`Self::cap`]; such
    ///   a request could never complete
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn acquire(&self, n: usize) -> Result<()> {
        self.check_request(n)?;
        if n == 0 {
            return Ok(());
        }

        let mut state = self.state.lock();
        loop {
            if self.free(&state) >= n {
                state.held += n;
                return Ok(());
            }
            if !state.batching {
                break;
            }
            state = self.released.wait(state);
        }

        // This caller now owns the batch slot: reserve what is free and wait
        // for releases to cover the rest.
        state.batching = true;
        let mut reserved = 0;
        loop {
            let take = self.free(&state).min(n - reserved);
            state.reserved += take;
            reserved += take;
            if reserved == n {
                break;
            }
            state = self.released.wait(state);
        }
        state.reserved -= n;
        state.held += n;
        state.batching = false;
        drop(state);

        // Wake requests that were waiting for the batch slot.
        self.released.notify_all();
        Ok(())
    }

    /// Takes `n` permits only if they are all free right now.
    ///
    /// Returns `false` without blocking otherwise, including when `n` exceeds
    /// the capacity.
    pub fn try_acquire(&self, n: usize) -> bool {
        if n > self.capacity {
            return false;
        }
        let mut state = self.state.lock();
        if self.free(&state) >= n {
            state.held += n;
            true
        } else {
            false
        }
    }

    /// Acquires `n` permits and returns a guard that releases them on drop.
    ///
    /// # Errors
    /// - [`Error::ExceedsCapacity`] if `n` is greater than [`Self::cap`]
    pub fn acquire_guard(&self, n: usize) -> Result<SemaphorePermit<'_>> {
        self.acquire(n)?;
        Ok(SemaphorePermit::new(self, n))
    }

    /// Returns up to `n` held permits to the pool.
    ///
    /// Releasing more than is held is clamped to what is held. Returns the
    /// number of permits actually released.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn release(&self, n: usize) -> usize {
        let released = {
            let mut state = self.state.lock();
            let released = n.min(state.held);
            state.held -= released;
            released
        };
        if released > 0 {
            self.released.notify_all();
        }
        released
    }

    /// Number of permits currently held.
    pub fn len(&self) -> usize {
        self.state.lock().held
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of permits.
    pub const fn cap(&self) -> usize {
        self.capacity
    }

    /// Number of permits neither held nor set aside for a waiting batch.
    pub fn available(&self) -> usize {
        self.free(&self.state.lock())
    }

    fn free(&self, state: &Permits) -> usize {
        self.capacity - state.held - state.reserved
    }

    fn check_request(&self, n: usize) -> Result<()> {
        if n > self.capacity {
            return Err(Error::ExceedsCapacity {
                requested: n,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
