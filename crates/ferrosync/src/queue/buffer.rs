use std::collections::VecDeque;

use crate::queue::QueueStatus;

/// Lock-protected state shared by both queue variants.
#[derive(Debug)]
pub(crate) struct Buffer<T> {
    items: VecDeque<T>,
    drained: bool,
    /// Bumped by every drain. A waiter that sees it move knows a drain
    /// happened while it slept, even if a reset followed before it woke.
    epoch: u64,
}

impl<T> Buffer<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            drained: false,
            epoch: 0,
        }
    }

    pub(crate) fn take(&mut self) -> Option<QueueStatus<T>> {
        if self.drained {
            return Some(QueueStatus::Drained);
        }
        self.items.pop_front().map(|item| QueueStatus::Ready { item })
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Marks the buffer drained and hands back everything in it.
    ///
    /// The returned items must be dropped after the lock is released.
    pub(crate) fn drain(&mut self) -> VecDeque<T> {
        self.drained = true;
        self.epoch = self.epoch.wrapping_add(1);
        core::mem::take(&mut self.items)
    }

    pub(crate) fn reset(&mut self) -> VecDeque<T> {
        self.drained = false;
        core::mem::take(&mut self.items)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) const fn is_drained(&self) -> bool {
        self.drained
    }

    pub(crate) const fn epoch(&self) -> u64 {
        self.epoch
    }
}
