use portable_atomic::{AtomicUsize, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, Result};

/// A lock-free cyclic index generator.
///
/// Each call to [`Self::next`] takes a distinct tick from a shared cursor and
/// maps it into `[0, limit)`. Calling `next` exactly `limit * m` times, from
/// any number of threads, yields every index exactly `m` times.
///
/// The cursor is kept small with a compare-and-swap that replaces it by a
/// value congruent to it modulo `limit`. A correction that loses the race is
/// simply dropped, and one that lands late still stores an equivalent
/// residue, so the position in the cycle is never disturbed.
///
/// ## Recommended When
/// - Spreading work across a fixed set of shards, workers or connections
/// - The hot path must not take a lock
///
/// # Example
/// ```
/// use ferrosync::RoundRobinCounter;
///
/// let counter = RoundRobinCounter::new(3)?;
/// let picks: Vec<_> = (0..7).map(|_| counter.next()).collect();
/// assert_eq!(picks, [0, 1, 2, 0, 1, 2, 0]);
/// # Ok::<(), ferrosync::Error>(())
/// ```
#[derive(Debug)]
pub struct RoundRobinCounter {
    #[cfg(feature = "cache-padded")]
    cursor: crossbeam_utils::CachePadded<AtomicUsize>,
    #[cfg(not(feature = "cache-padded"))]
    cursor: AtomicUsize,
    limit: usize,
}

impl RoundRobinCounter {
    /// Creates a counter cycling through `[0, limit)`, starting at zero.
    ///
    /// # Errors
    /// - [`Error::ZeroSize`] if `limit` is zero
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::zero_size("round-robin limit"));
        }
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            cursor: crossbeam_utils::CachePadded::new(AtomicUsize::new(0)),
            #[cfg(not(feature = "cache-padded"))]
            cursor: AtomicUsize::new(0),
            limit,
        })
    }

    /// Returns the next index in `[0, limit)`.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self) -> usize {
        let tick = self.cursor.fetch_add(1, Ordering::Relaxed);
        if tick < self.limit {
            return tick;
        }
        self.cold_wrap(tick)
    }

    #[cold]
    #[inline(never)]
    fn cold_wrap(&self, tick: usize) -> usize {
        let wrapped = tick % self.limit;
        // The cursor now holds `tick + 1` unless another caller moved it.
        // Losing this race is fine: whoever moved it owns the correction.
        let _ = self.cursor.compare_exchange(
            tick.wrapping_add(1),
            wrapped + 1,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        wrapped
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }
}
