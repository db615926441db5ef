/// Thread name prefix used when none is configured.
pub const DEFAULT_THREAD_NAME: &str = "ferrosync";

/// Construction parameters for a [`WorkerPool`].
///
/// # Example
/// ```
/// use ferrosync::PoolConfig;
///
/// let config = PoolConfig::default().workers(4).thread_name("ingest");
/// assert_eq!(config.workers, 4);
/// assert_eq!(config.thread_name, "ingest");
/// ```
///
/// [`WorkerPool`]: crate::WorkerPool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads, which is also the capacity of the work
    /// queue. Must be positive.
    pub workers: usize,
    /// Prefix for the names of the threads the pool starts.
    pub thread_name: String,
}

impl PoolConfig {
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for PoolConfig {
    /// One worker per logical CPU.
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}
