use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::pool::{
    TaskPanic, WaitGroup,
    manager::{Shared, Task},
};

/// Settles one unit of pool work when dropped, whatever happened to the task.
struct Completion<'a>(&'a WaitGroup);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Worker thread body.
///
/// Takes tasks off the shared work queue and runs them until the queue is
/// drained. Draining is the stop signal: every worker blocked on the queue
/// observes it, and a worker busy with a task observes it on its next read.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) fn worker_loop(worker_id: usize, shared: Arc<Shared>) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Some(task) = shared.work.get().into_item() {
        shared.dequeued();
        run_task(&shared, task);
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}

/// Hand-off thread body.
///
/// Moves deferred submissions from the overflow queue into the work queue,
/// blocking while the work queue is full, until the overflow queue is
/// drained.
pub(crate) fn handoff_loop(shared: Arc<Shared>) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Hand-off started");

    while let Some(task) = shared.overflow.get().into_item() {
        if !shared.work.put(task) {
            shared.rejected(1);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Hand-off stopped");
}

fn run_task(shared: &Shared, task: Task) {
    let _completion = Completion(&shared.completion);
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        report(shared, TaskPanic::new(payload));
    }
}

fn report(shared: &Shared, failure: TaskPanic) {
    match &shared.handler {
        Some(handler) => {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(failure))).is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("Pool error handler panicked");
            }
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Swallowed {failure}");
            #[cfg(not(feature = "tracing"))]
            drop(failure);
        }
    }
}
