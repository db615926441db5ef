/// The outcome of taking an item from a [`BlockingQueue`].
///
/// - [`QueueStatus::Ready`] carries the dequeued item, now owned by the
///   caller.
/// - [`QueueStatus::Empty`] is only returned by non-blocking reads when
///   nothing is buffered.
/// - [`QueueStatus::Drained`] means the queue has been drained; no item will
///   arrive until it is reset.
///
/// # Example
/// ```
/// use ferrosync::{QueueStatus, UnboundedQueue};
///
/// let queue = UnboundedQueue::new();
/// assert_eq!(queue.try_get(), QueueStatus::Empty);
///
/// queue.put("job");
/// match queue.get() {
///     QueueStatus::Ready { item } => assert_eq!(item, "job"),
///     QueueStatus::Empty | QueueStatus::Drained => unreachable!(),
/// }
///
/// queue.drain();
/// assert!(queue.get().is_drained());
/// ```
///
/// [`BlockingQueue`]: crate::BlockingQueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus<T> {
    /// An item was dequeued.
    Ready {
        /// The item taken from the head of the queue.
        item: T,
    },
    /// Nothing is buffered and the caller asked not to block.
    Empty,
    /// The queue is drained.
    Drained,
}

impl<T> QueueStatus<T> {
    /// Returns the dequeued item, if any.
    pub fn into_item(self) -> Option<T> {
        match self {
            Self::Ready { item } => Some(item),
            Self::Empty | Self::Drained => None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub const fn is_drained(&self) -> bool {
        matches!(self, Self::Drained)
    }
}

/// The outcome of a non-blocking put on a [`BoundedQueue`].
///
/// A rejected item is handed back to the caller.
///
/// # Example
/// ```
/// use ferrosync::{BoundedQueue, PutStatus};
///
/// let queue = BoundedQueue::new(1)?;
/// assert_eq!(queue.try_put("first"), PutStatus::Accepted);
/// assert_eq!(queue.try_put("second"), PutStatus::Full { item: "second" });
///
/// queue.drain();
/// assert_eq!(queue.try_put("third"), PutStatus::Drained { item: "third" });
/// # Ok::<(), ferrosync::Error>(())
/// ```
///
/// [`BoundedQueue`]: crate::BoundedQueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutStatus<T> {
    /// The item was enqueued.
    Accepted,
    /// The queue is at capacity.
    Full { item: T },
    /// The queue is drained.
    Drained { item: T },
}

impl<T> PutStatus<T> {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
