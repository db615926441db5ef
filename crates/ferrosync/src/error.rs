/// A result type defaulting to [`Error`].
///
/// Most `ferrosync` operations cannot fail: rejected work is reported through
/// boolean returns. The fallible surface is limited to construction and to
/// semaphore requests that could never be satisfied.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `ferrosync` can produce.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A primitive was configured with a size of zero.
    ///
    /// Queue capacities, semaphore capacities, round-robin limits and worker
    /// counts must all be positive.
    #[error("{kind} must be greater than zero")]
    ZeroSize {
        /// Which size was zero (e.g. `"semaphore capacity"`).
        kind: &'static str,
    },

    /// A semaphore request asked for more permits than the semaphore will
    /// ever hold.
    ///
    /// Such a request can never complete, so it is rejected up front rather
    /// than blocking forever.
    #[error("requested {requested} permits from a semaphore with capacity {capacity}")]
    ExceedsCapacity {
        /// Permits requested.
        requested: usize,
        /// Total permits in the semaphore.
        capacity: usize,
    },

    /// The operating system refused to start a pool thread.
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    pub(crate) const fn zero_size(kind: &'static str) -> Self {
        Self::ZeroSize { kind }
    }
}
