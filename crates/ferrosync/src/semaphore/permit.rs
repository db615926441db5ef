use crate::semaphore::Semaphore;

/// Permits held on a [`Semaphore`], released when dropped.
///
/// Created by [`Semaphore::acquire_guard`].
#[must_use = "permits are released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
    count: usize,
}

impl<'a> SemaphorePermit<'a> {
    pub(crate) const fn new(semaphore: &'a Semaphore, count: usize) -> Self {
        Self { semaphore, count }
    }

    /// Number of permits owned by this guard.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Keeps the permits held after the guard is dropped.
    ///
    /// They can still be returned later with [`Semaphore::release`].
    pub fn forget(mut self) {
        self.count = 0;
    }
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        if self.count > 0 {
            self.semaphore.release(self.count);
        }
    }
}
