use crate::queue::QueueStatus;

/// A thread-safe FIFO queue with a drain/reset lifecycle.
///
/// Implemented by [`UnboundedQueue`] and [`BoundedQueue`]. Items come out in
/// the order they went in; no order is defined between producers racing each
/// other.
///
/// A queue starts empty and accepting. [`drain`](Self::drain) discards every
/// buffered item, rejects further puts and releases every blocked caller.
/// [`reset`](Self::reset) makes the queue usable again, empty.
///
/// [`UnboundedQueue`]: crate::UnboundedQueue
/// [`BoundedQueue`]: crate::BoundedQueue
pub trait BlockingQueue<T> {
    /// Appends `item` to the tail.
    ///
    /// Returns `false`, dropping `item`, if the queue is drained. Bounded
    /// queues block while full.
    fn put(&self, item: T) -> bool;

    /// Takes the head item, blocking while the queue is empty.
    ///
    /// Returns [`QueueStatus::Drained`] if the queue is or becomes drained.
    /// Never returns [`QueueStatus::Empty`].
    fn get(&self) -> QueueStatus<T>;

    /// Takes the head item without blocking.
    fn try_get(&self) -> QueueStatus<T>;

    /// Drains the queue, returning how many buffered items were discarded.
    fn drain(&self) -> usize;

    /// Clears the drained state. The queue is empty afterwards.
    fn reset(&self);

    /// Number of buffered items. A snapshot, stale as soon as it returns.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_drained(&self) -> bool;
}
