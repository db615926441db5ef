#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, Result,
    queue::{BlockingQueue, PutStatus, QueueStatus, buffer::Buffer},
    sync::{Condvar, Mutex},
};

/// A blocking FIFO queue holding at most `capacity` items.
///
/// [`Self::put`] blocks while the queue is full and [`Self::get`] blocks while
/// it is empty. Draining releases both sides: blocked producers return
/// `false` and their items are dropped, blocked consumers observe
/// [`QueueStatus::Drained`]. The drained check and the enqueue happen under
/// one lock acquisition, so a put can never slip in after a drain.
///
/// ## Recommended When
/// - Producers should be slowed down to the pace of consumers
/// - Work in flight must stay bounded
///
/// ## See Also
/// - [`UnboundedQueue`]
///
/// # Example
/// ```
/// use ferrosync::{BoundedQueue, QueueStatus};
///
/// let queue = BoundedQueue::new(2)?;
/// assert!(queue.put('a'));
/// assert!(queue.put('b'));
///
/// std::thread::scope(|s| {
///     // Blocks until a slot frees up.
///     let producer = s.spawn(|| queue.put('c'));
///     assert_eq!(queue.get(), QueueStatus::Ready { item: 'a' });
///     assert!(producer.join().unwrap());
/// });
///
/// assert_eq!(queue.get(), QueueStatus::Ready { item: 'b' });
/// assert_eq!(queue.get(), QueueStatus::Ready { item: 'c' });
/// # Ok::<(), ferrosync::Error>(())
/// ```
///
/// [`UnboundedQueue`]: crate::UnboundedQueue
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<Buffer<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty, accepting queue holding at most `capacity` items.
    ///
    /// # Errors
    /// - [`Error::ZeroSize`] if `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::zero_size("queue capacity"));
        }
        Ok(Self {
            state: Mutex::new(Buffer::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    /// Appends `item`, blocking while the queue is full.
    ///
    /// Returns `false` without enqueuing if the queue is drained, including
    /// when the drain happens while this call is blocked.
    pub fn put(&self, item: T) -> bool {
        let mut state = self.state.lock();
        let epoch = state.epoch();
        loop {
            if state.is_drained() {
                return false;
            }
            if state.len() < self.capacity {
                state.push(item);
                drop(state);
                self.not_empty.notify_one();
                return true;
            }
            state = self.not_full.wait(state);
            if state.epoch() != epoch {
                return false;
            }
        }
    }

    /// Appends `item` only if a slot is free right now.
    ///
    /// The drained check and the capacity check happen under the same lock
    /// as the enqueue, so [`PutStatus::Accepted`] means the item is in the
    /// queue.
    pub fn try_put(&self, item: T) -> PutStatus<T> {
        let mut state = self.state.lock();
        if state.is_drained() {
            return PutStatus::Drained { item };
        }
        if state.len() >= self.capacity {
            return PutStatus::Full { item };
        }
        state.push(item);
        drop(state);
        self.not_empty.notify_one();
        PutStatus::Accepted
    }

    /// Takes the head item, blocking until one arrives or the queue is
    /// drained.
    pub fn get(&self) -> QueueStatus<T> {
        self.take(true)
    }

    /// Takes the head item, returning [`QueueStatus::Empty`] instead of
    /// blocking.
    pub fn try_get(&self) -> QueueStatus<T> {
        self.take(false)
    }

    fn take(&self, block: bool) -> QueueStatus<T> {
        let mut state = self.state.lock();
        let epoch = state.epoch();
        loop {
            match state.take() {
                Some(QueueStatus::Ready { item }) => {
                    drop(state);
                    self.not_full.notify_one();
                    return QueueStatus::Ready { item };
                }
                Some(status) => return status,
                None if !block => return QueueStatus::Empty,
                None => {}
            }
            state = self.not_empty.wait(state);
            if state.epoch() != epoch {
                return QueueStatus::Drained;
            }
        }
    }

    /// Discards every buffered item and releases all blocked producers and
    /// consumers.
    ///
    /// Returns how many items were discarded.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn drain(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.drain()
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        discarded.len()
    }

    /// Makes a drained queue accept items again.
    pub fn reset(&self) {
        let discarded = {
            let mut state = self.state.lock();
            state.reset()
        };
        drop(discarded);
        // A reset of a queue that was never drained frees its slots.
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn is_drained(&self) -> bool {
        self.state.lock().is_drained()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> BlockingQueue<T> for BoundedQueue<T> {
    fn put(&self, item: T) -> bool {
        self.put(item)
    }

    fn get(&self) -> QueueStatus<T> {
        self.get()
    }

    fn try_get(&self) -> QueueStatus<T> {
        self.try_get()
    }

    fn drain(&self) -> usize {
        self.drain()
    }

    fn reset(&self) {
        self.reset();
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_drained(&self) -> bool {
        self.is_drained()
    }
}
