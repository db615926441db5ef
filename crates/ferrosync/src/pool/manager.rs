//! Fixed-size thread pool with backpressure-aware submission.
//!
//! This module defines [`WorkerPool`], which runs boxed closures on a fixed
//! set of worker threads fed by a [`BoundedQueue`] sized to the worker count.
//! Submissions that would find that queue full are parked in an
//! [`UnboundedQueue`] and moved across by a hand-off thread, so [`submit`]
//! never blocks its caller.
//!
//! Shutdown drains both queues. Every worker blocked on the work queue
//! observes the drain, so one call stops all of them. Dropping the last
//! handle does the same without waiting for the workers to exit.
//!
//! [`submit`]: WorkerPool::submit

use portable_atomic::{AtomicUsize, Ordering};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    AtomicFlag, BoundedQueue, Error, PutStatus, Result, UnboundedQueue,
    pool::{
        PoolConfig, TaskPanic, WaitGroup,
        worker::{handoff_loop, worker_loop},
    },
    sync::Mutex,
};

/// A unit of work accepted by a [`WorkerPool`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub(crate) type ErrorHandler = Arc<dyn Fn(TaskPanic) + Send + Sync + 'static>;

/// Lifecycle of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// Submissions are accepted.
    Accepting,
    /// Submissions are rejected; workers are finishing the tasks in hand.
    ShuttingDown,
    /// Every pool thread other than the one that called `shutdown` has
    /// exited.
    Stopped,
}

pub(crate) struct Shared {
    pub(crate) work: BoundedQueue<Task>,
    pub(crate) overflow: UnboundedQueue<Task>,
    pub(crate) completion: WaitGroup,
    pub(crate) handler: Option<ErrorHandler>,
    accepting: AtomicFlag,
    stopped: AtomicFlag,
    /// Tasks submitted and not yet picked up by a worker, including those
    /// still waiting in the overflow queue.
    queued: AtomicUsize,
    workers: usize,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    pub(crate) fn dequeued(&self) {
        self.queued.fetch_sub(1, Ordering::AcqRel);
    }

    /// Settles tasks that were registered but will never run.
    pub(crate) fn rejected(&self, count: usize) {
        if count == 0 {
            return;
        }
        self.completion.done_n(count);
        self.queued.fetch_sub(count, Ordering::AcqRel);
    }

    /// Registers a task as pending. Returns how many tasks were queued
    /// before it.
    fn register(&self) -> usize {
        self.completion.add(1);
        self.queued.fetch_add(1, Ordering::AcqRel)
    }

    /// Stops accepting work and discards everything queued.
    ///
    /// Returns `false` if the pool was already closed.
    fn close(&self) -> bool {
        if !self.accepting.compare_and_set(true, false) {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new tasks");

        let discarded = self.overflow.drain() + self.work.drain();
        self.rejected(discarded);

        #[cfg(feature = "tracing")]
        tracing::debug!("Discarded {discarded} queued tasks");

        true
    }
}

/// Shared by every [`WorkerPool`] handle, but not by the pool's own threads.
/// Dropping it closes the pool so the threads can exit.
struct Owner {
    shared: Arc<Shared>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        if self.shared.close() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Last pool handle dropped, detaching workers");
        }
    }
}

/// A fixed-size pool of worker threads.
///
/// The pool starts its workers on construction and runs every submitted task
/// exactly once. A task that panics is caught on the worker, which keeps
/// running; the panic is passed to the error handler, if one was configured,
/// and otherwise swallowed.
///
/// `WorkerPool` is a cheap handle: clones share the same workers, which lets
/// a task submit follow-up work to its own pool. Because registration happens
/// before a task is enqueued, [`Self::wait_for_all`] also waits for work that
/// running tasks submit.
///
/// Workers run until [`Self::shutdown`] is called or the last handle is
/// dropped. Dropping closes the pool like `shutdown` but does not wait for
/// the workers to finish their current tasks.
///
/// # Example
/// ```
/// use ferrosync::{PoolConfig, WorkerPool};
/// use std::sync::{
///     Arc,
///     atomic::{AtomicUsize, Ordering},
/// };
///
/// let pool = WorkerPool::new(PoolConfig::default().workers(4))?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..100 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     });
/// }
///
/// pool.wait_for_all();
/// assert_eq!(counter.load(Ordering::Relaxed), 100);
///
/// pool.shutdown();
/// assert!(!pool.submit(|| unreachable!()));
/// # Ok::<(), ferrosync::Error>(())
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    owner: Arc<Owner>,
}

impl WorkerPool {
    /// Starts a pool whose task panics are swallowed.
    ///
    /// # Errors
    /// - [`Error::ZeroSize`] if `config.workers` is zero
    /// - [`Error::Spawn`] if a thread could not be started
    pub fn new(config: PoolConfig) -> Result<Self> {
        Self::start(config, None)
    }

    /// Starts a pool that passes every task panic to `handler`.
    ///
    /// The handler runs on the worker thread that caught the panic. A panic
    /// inside the handler itself is caught and discarded.
    ///
    /// # Errors
    /// - [`Error::ZeroSize`] if `config.workers` is zero
    /// - [`Error::Spawn`] if a thread could not be started
    pub fn with_handler<H>(config: PoolConfig, handler: H) -> Result<Self>
    where
        H: Fn(TaskPanic) + Send + Sync + 'static,
    {
        Self::start(config, Some(Arc::new(handler)))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(handler)))]
    fn start(config: PoolConfig, handler: Option<ErrorHandler>) -> Result<Self> {
        let PoolConfig {
            workers,
            thread_name,
        } = config;
        if workers == 0 {
            return Err(Error::zero_size("worker count"));
        }

        let shared = Arc::new(Shared {
            work: BoundedQueue::new(workers)?,
            overflow: UnboundedQueue::new(),
            completion: WaitGroup::new(),
            handler,
            accepting: AtomicFlag::new(true),
            stopped: AtomicFlag::new(false),
            queued: AtomicUsize::new(0),
            workers,
            threads: Mutex::new(Vec::with_capacity(workers + 1)),
        });
        let pool = Self {
            owner: Arc::new(Owner { shared }),
        };

        if let Err(e) = pool.spawn_threads(&thread_name) {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to start pool threads: {e}");
            pool.shutdown();
            return Err(e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Started pool with {workers} workers");

        Ok(pool)
    }

    fn spawn_threads(&self, thread_name: &str) -> Result<()> {
        let mut threads = self.shared().threads.lock();
        for worker_id in 0..self.shared().workers {
            let shared = Arc::clone(self.shared());
            let handle = thread::Builder::new()
                .name(format!("{thread_name}-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, shared))?;
            threads.push(handle);
        }

        let shared = Arc::clone(self.shared());
        let handle = thread::Builder::new()
            .name(format!("{thread_name}-handoff"))
            .spawn(move || handoff_loop(shared))?;
        threads.push(handle);
        Ok(())
    }

    /// Submits `task` without blocking the caller.
    ///
    /// Returns `true` if the task went straight onto the work queue, and
    /// `false` if the queue was saturated and the task was handed off to be
    /// enqueued later. The task runs exactly once either way, so callers can
    /// treat `false` as a signal to throttle.
    ///
    /// Also returns `false`, without running or registering the task, if the
    /// pool is no longer accepting work.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = self.shared();
        if !shared.accepting.get() {
            return false;
        }

        let task: Task = Box::new(task);
        let task = if shared.register() < shared.workers {
            // The slot counted above may already be taken by the hand-off
            // thread, so never wait for one here.
            match shared.work.try_put(task) {
                PutStatus::Accepted => return true,
                PutStatus::Full { item } => item,
                PutStatus::Drained { .. } => {
                    shared.rejected(1);
                    return false;
                }
            }
        } else {
            task
        };

        if !shared.overflow.put(task) {
            // Lost a race with `shutdown`.
            shared.rejected(1);
        }
        false
    }

    /// Submits `task`, blocking until it is on the work queue.
    ///
    /// Tasks submitted this way from one thread reach the work queue in
    /// order. Returns `false`, without running the task, if the pool is no
    /// longer accepting work.
    ///
    /// Calling this from inside a task can deadlock when every worker is
    /// busy doing the same; use [`Self::submit`] there.
    pub fn submit_sync<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = self.shared();
        if !shared.accepting.get() {
            return false;
        }

        shared.register();
        if shared.work.put(Box::new(task)) {
            true
        } else {
            shared.rejected(1);
            false
        }
    }

    /// Blocks until every task submitted so far has finished, including
    /// tasks submitted by running tasks.
    ///
    /// Tasks discarded by [`Self::shutdown`] count as finished. Must not be
    /// called from inside a task of the same pool.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn wait_for_all(&self) {
        self.shared().completion.wait();
    }

    /// Stops the pool.
    ///
    /// - Stops accepting new submissions.
    /// - Drains the work and overflow queues, discarding tasks that have not
    ///   started. Every worker observes the drain.
    /// - Waits for each worker to finish the task in hand and exit.
    ///
    /// Calling it again, from any handle, is a no-op. It may be called from
    /// inside a task: the calling worker is not waited for and exits once
    /// its task returns.
    pub fn shutdown(&self) {
        let shared = self.shared();
        if !shared.close() {
            return;
        }

        let threads = core::mem::take(&mut *shared.threads.lock());
        let current = thread::current().id();
        for handle in threads {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("Pool thread exited with a panic");
            }
        }

        shared.stopped.set(true);

        #[cfg(feature = "tracing")]
        tracing::info!("Pool shutdown complete");
    }

    pub fn state(&self) -> PoolState {
        let shared = self.shared();
        if shared.accepting.get() {
            PoolState::Accepting
        } else if shared.stopped.get() {
            PoolState::Stopped
        } else {
            PoolState::ShuttingDown
        }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.shared().workers
    }

    /// Tasks submitted and not yet finished.
    pub fn pending(&self) -> usize {
        self.shared().completion.pending()
    }

    /// Tasks submitted and not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.shared().queued.load(Ordering::Acquire)
    }

    fn shared(&self) -> &Arc<Shared> {
        &self.owner.shared
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers())
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("queued", &self.queued())
            .finish()
    }
}
