#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    queue::{BlockingQueue, QueueStatus, buffer::Buffer},
    sync::{Condvar, Mutex},
};

/// An unbounded blocking FIFO queue.
///
/// [`Self::put`] never blocks; [`Self::get`] blocks while the queue is empty.
///
/// ## Recommended When
/// - Producers must never be slowed down by consumers
/// - Memory growth is bounded by something outside the queue
///
/// ## See Also
/// - [`BoundedQueue`]
///
/// [`BoundedQueue`]: crate::BoundedQueue
#[derive(Debug)]
pub struct UnboundedQueue<T> {
    state: Mutex<Buffer<T>>,
    not_empty: Condvar,
}

impl<T> UnboundedQueue<T> {
    /// Creates an empty, accepting queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Buffer::with_capacity(0)),
            not_empty: Condvar::new(),
        }
    }

    /// Appends `item` and wakes one blocked reader.
    ///
    /// Returns `false` without enqueuing if the queue is drained.
    pub fn put(&self, item: T) -> bool {
        {
            let mut state = self.state.lock();
            if state.is_drained() {
                return false;
            }
            state.push(item);
        }
        self.not_empty.notify_one();
        true
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
            if let Some(status) = state.take() {
                return status;
            }
            if !block {
                return QueueStatus::Empty;
            }
            state = self.not_empty.wait(state);
            if state.epoch() != epoch {
                return QueueStatus::Drained;
            }
        }
    }

    /// Discards every buffered item and releases all blocked readers.
    ///
    /// Returns how many items were discarded.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn drain(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.drain()
        };
        self.not_empty.notify_all();
        discarded.len()
    }

    /// Makes a drained queue accept items again.
    pub fn reset(&self) {
        let discarded = {
            let mut state = self.state.lock();
            state.reset()
        };
        drop(discarded);
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_drained(&self) -> bool {
        self.state.lock().is_drained()
    }
}

impl<T> Default for UnboundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> for UnboundedQueue<T> {
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
