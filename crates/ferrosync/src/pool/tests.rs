use crate::{Error, PoolConfig, PoolState, UnboundedQueue, WorkerPool};
use core::time::Duration;
use portable_atomic::{AtomicUsize, Ordering};
use rand::Rng;
use std::sync::{Arc, Barrier, Mutex};
use std::thread::{scope, sleep};
use std::time::Instant;

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(1));
    }
}

fn config(workers: usize) -> PoolConfig {
    PoolConfig::default().workers(workers).thread_name("test")
}

/// A pool whose handler counts task panics.
fn counting_pool(workers: usize) -> (WorkerPool, Arc<AtomicUsize>) {
    let failures = Arc::new(AtomicUsize::new(0));
    let handler_failures = Arc::clone(&failures);
    let pool = WorkerPool::with_handler(config(workers), move |_| {
        handler_failures.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    (pool, failures)
}

/// A one-shot gate a task can block on.
fn gate() -> Arc<UnboundedQueue<()>> {
    Arc::new(UnboundedQueue::new())
}

#[test]
fn rejects_zero_workers() {
    assert!(matches!(
        WorkerPool::new(config(0)),
        Err(Error::ZeroSize { .. })
    ));
}

#[test]
fn runs_every_task_once() {
    const TASKS: usize = 20_000;
    let (pool, failures) = counting_pool(8);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..TASKS {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), TASKS);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending(), 0);
    assert_eq!(pool.queued(), 0);

    pool.shutdown();
    assert_eq!(pool.state(), PoolState::Stopped);

    let late = Arc::clone(&counter);
    assert!(!pool.submit(move || {
        late.fetch_add(1, Ordering::SeqCst);
    }));
    let late = Arc::clone(&counter);
    assert!(!pool.submit_sync(move || {
        late.fetch_add(1, Ordering::SeqCst);
    }));
    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), TASKS);
    assert_eq!(pool.pending(), 0);
}

#[test]
fn runs_jittered_tasks_from_many_submitters() {
    const SUBMITTERS: usize = 4;
    const PER_SUBMITTER: usize = 250;
    let (pool, failures) = counting_pool(16);
    let counter = Arc::new(AtomicUsize::new(0));

    scope(|s| {
        for _ in 0..SUBMITTERS {
            s.spawn(|| {
                for _ in 0..PER_SUBMITTER {
                    let counter = Arc::clone(&counter);
                    pool.submit(move || {
                        let micros = rand::rng().random_range(0..500);
                        sleep(Duration::from_micros(micros));
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }
    });

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), SUBMITTERS * PER_SUBMITTER);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    pool.shutdown();
}

fn submit_batch(pool: &WorkerPool, counter: &Arc<AtomicUsize>, limit: usize) {
    for _ in 0..3 {
        let inner_pool = pool.clone();
        let counter = Arc::clone(counter);
        pool.submit(move || {
            let millis = rand::rng().random_range(0..5);
            sleep(Duration::from_millis(millis));

            if counter.fetch_add(1, Ordering::SeqCst) < limit {
                let next_pool = inner_pool.clone();
                let next_counter = Arc::clone(&counter);
                inner_pool.submit(move || submit_batch(&next_pool, &next_counter, limit));
            } else {
                counter.fetch_sub(1, Ordering::SeqCst);
            }
        });
    }
}

#[test]
fn waits_for_recursively_submitted_tasks() {
    const LIMIT: usize = 100;
    let (pool, failures) = counting_pool(1);
    let counter = Arc::new(AtomicUsize::new(0));

    submit_batch(&pool, &counter, LIMIT);

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), LIMIT);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending(), 0);
    pool.shutdown();
}

#[test]
fn waits_for_recursive_tasks_racing_outside_submitters() {
    const LIMIT: usize = 500;
    const SUBMITTERS: usize = 4;
    let (pool, failures) = counting_pool(2);
    let counter = Arc::new(AtomicUsize::new(0));

    scope(|s| {
        for _ in 0..SUBMITTERS {
            s.spawn(|| {
                for _ in 0..10 {
                    submit_batch(&pool, &counter, LIMIT);
                }
            });
        }
    });

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), LIMIT);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending(), 0);
    assert_eq!(pool.queued(), 0);
    pool.shutdown();
}

#[test]
fn submit_never_waits_for_a_slot_while_the_worker_is_busy() {
    const ROUNDS: usize = 200;
    const SUBMITTERS: usize = 3;
    // Large captures slow down boxing, widening the gap between counting a
    // free slot and enqueuing into it.
    const PAYLOAD: usize = 64 << 10;

    let (pool, failures) = counting_pool(1);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..ROUNDS {
        let blocker = gate();
        let held = Arc::clone(&blocker);
        pool.submit(move || {
            held.get();
        });
        wait_until("worker pickup", || pool.queued() == 0);

        let start = Barrier::new(SUBMITTERS);
        let returned = AtomicUsize::new(0);
        let all_returned = scope(|s| {
            for _ in 0..SUBMITTERS {
                s.spawn(|| {
                    let counter = Arc::clone(&counter);
                    let payload = [1_u8; PAYLOAD];
                    start.wait();
                    pool.submit(move || {
                        let step = usize::from(payload[PAYLOAD - 1]);
                        counter.fetch_add(step, Ordering::SeqCst);
                    });
                    returned.fetch_add(1, Ordering::SeqCst);
                });
            }

            let deadline = Instant::now() + Duration::from_secs(5);
            while returned.load(Ordering::SeqCst) < SUBMITTERS
                && Instant::now() < deadline
            {
                sleep(Duration::from_millis(1));
            }
            let all_returned = returned.load(Ordering::SeqCst) == SUBMITTERS;
            // Free the worker either way so a stuck submitter can finish.
            blocker.put(());
            all_returned
        });
        assert!(all_returned, "submit blocked while the worker was busy");
        pool.wait_for_all();
    }

    assert_eq!(counter.load(Ordering::SeqCst), ROUNDS * SUBMITTERS);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    pool.shutdown();
}

#[test]
fn forwards_panics_and_keeps_workers_alive() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let handler_messages = Arc::clone(&messages);
    let pool = WorkerPool::with_handler(config(2), move |failure| {
        let message = failure.message().unwrap_or_default().to_owned();
        handler_messages.lock().unwrap().push(message);
    })
    .unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for i in 0..10 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            assert!(i % 2 == 1, "task {i} failed");
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 5);

    let mut messages = messages.lock().unwrap().clone();
    messages.sort();
    let mut expected: Vec<_> = (0..10)
        .step_by(2)
        .map(|i| format!("task {i} failed"))
        .collect();
    expected.sort();
    assert_eq!(messages, expected);

    // Both workers are still serving.
    for _ in 0..4 {
        let counter = Arc::clone(&counter);
        pool.submit_sync(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 9);
    pool.shutdown();
}

#[test]
fn swallows_panics_without_handler() {
    let pool = WorkerPool::new(config(1)).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    pool.submit(|| panic!("ignored"));
    let after = Arc::clone(&counter);
    pool.submit(move || {
        after.fetch_add(1, Ordering::SeqCst);
    });

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    pool.shutdown();
}

#[test]
fn a_panicking_handler_does_not_kill_the_worker() {
    let pool = WorkerPool::with_handler(config(1), |_| panic!("handler")).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    pool.submit(|| panic!("task"));
    let after = Arc::clone(&counter);
    pool.submit(move || {
        after.fetch_add(1, Ordering::SeqCst);
    });

    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    pool.shutdown();
}

#[test]
fn submit_reports_deferred_hand_off() {
    let (pool, _) = counting_pool(1);
    let counter = Arc::new(AtomicUsize::new(0));
    let blocker = gate();

    // Occupy the only worker.
    let held = Arc::clone(&blocker);
    let first = Arc::clone(&counter);
    assert!(pool.submit(move || {
        held.get();
        first.fetch_add(1, Ordering::SeqCst);
    }));
    wait_until("worker pickup", || pool.queued() == 0);

    // One slot in the work queue, then the hand-off takes over.
    let second = Arc::clone(&counter);
    assert!(pool.submit(move || {
        second.fetch_add(1, Ordering::SeqCst);
    }));
    for _ in 0..3 {
        let deferred = Arc::clone(&counter);
        assert!(!pool.submit(move || {
            deferred.fetch_add(1, Ordering::SeqCst);
        }));
    }
    assert_eq!(pool.queued(), 4);
    assert_eq!(pool.pending(), 5);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    blocker.put(());
    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 5);
    pool.shutdown();
}

#[test]
fn submit_sync_preserves_order_on_a_single_worker() {
    let (pool, _) = counting_pool(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let order = Arc::clone(&order);
        assert!(pool.submit_sync(move || order.lock().unwrap().push(i)));
    }

    pool.wait_for_all();
    assert_eq!(*order.lock().unwrap(), (0..100).collect::<Vec<_>>());
    pool.shutdown();
}

#[test]
fn shutdown_stops_every_worker() {
    let pool = WorkerPool::new(config(8)).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..32 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    pool.wait_for_all();

    // Joins all eight workers; a single stop signal would hang here.
    pool.shutdown();
    assert_eq!(pool.state(), PoolState::Stopped);

    // Idempotent, from any handle.
    pool.clone().shutdown();
    assert_eq!(pool.state(), PoolState::Stopped);
    assert_eq!(counter.load(Ordering::SeqCst), 32);
}

#[test]
fn shutdown_discards_queued_tasks_and_settles_them() {
    let (pool, failures) = counting_pool(1);
    let counter = Arc::new(AtomicUsize::new(0));
    let blocker = gate();

    let held = Arc::clone(&blocker);
    let first = Arc::clone(&counter);
    pool.submit(move || {
        held.get();
        first.fetch_add(1, Ordering::SeqCst);
    });
    wait_until("worker pickup", || pool.queued() == 0);

    for _ in 0..5 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(pool.pending(), 6);

    scope(|s| {
        s.spawn(|| pool.shutdown());

        // Queues are drained before the running task is allowed to finish.
        wait_until("drain", || {
            pool.state() == PoolState::ShuttingDown && pool.queued() == 0
        });
        assert_eq!(pool.pending(), 1);
        blocker.put(());
    });

    assert_eq!(pool.state(), PoolState::Stopped);
    pool.wait_for_all();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn shutdown_from_inside_a_task() {
    let pool = WorkerPool::new(config(2)).unwrap();
    let inner = pool.clone();
    assert!(pool.submit(move || inner.shutdown()));

    wait_until("shutdown", || pool.state() == PoolState::Stopped);
    pool.wait_for_all();
    assert!(!pool.submit(|| {}));
}

#[test]
fn dropping_the_last_handle_releases_the_pool() {
    // The handler lives as long as the pool's shared state.
    let alive = Arc::new(());
    let handler_alive = Arc::clone(&alive);
    let pool = WorkerPool::with_handler(config(1), move |_| {
        drop(Arc::clone(&handler_alive));
    })
    .unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let blocker = gate();

    let held = Arc::clone(&blocker);
    let first = Arc::clone(&counter);
    pool.submit(move || {
        held.get();
        first.fetch_add(1, Ordering::SeqCst);
    });
    wait_until("worker pickup", || pool.queued() == 0);

    for _ in 0..5 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(Arc::strong_count(&counter), 7);

    // Queued tasks are discarded; the running one finishes.
    drop(pool);
    wait_until("queued tasks dropped", || Arc::strong_count(&counter) == 2);

    blocker.put(());
    wait_until("pool threads exit", || Arc::strong_count(&alive) == 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
