//! Stress tests for the runner

use bounded_runner::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn runner(deadline: Duration, workers: usize) -> Runner {
    let config = Config::builder()
        .deadline(deadline)
        .num_workers(workers)
        .ignore_os_signals()
        .build()
        .unwrap();
    Runner::with_config(config).unwrap()
}

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_many_small_tasks() {
    const TASKS: usize = 100_000;

    let counter = Arc::new(AtomicUsize::new(0));
    let mut runner = runner(Duration::from_secs(60), 16);

    for _ in 0..TASKS {
        let counter = counter.clone();
        runner
            .add(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }

    runner.start().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), TASKS);
}

#[test]
#[ignore]
fn stress_test_many_runs() {
    for i in 0..200 {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut runner = runner(Duration::from_secs(10), 4);

        for _ in 0..50 {
            let counter = counter.clone();
            runner
                .add(move |_| {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }

        runner.start().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 50, "Iteration {}", i);
    }
}

#[test]
#[ignore]
fn stress_test_interrupt_under_contention() {
    for _ in 0..50 {
        let mut runner = runner(Duration::from_secs(30), 32);

        for _ in 0..10_000 {
            runner
                .add(|_| thread::sleep(Duration::from_micros(50)))
                .unwrap();
        }

        let handle = runner.interrupt_handle();
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            handle.trigger();
        });

        let result = runner.start();
        trigger.join().unwrap();
        runner.join_workers();

        assert!(matches!(result, Err(Error::Interrupt)) || result.is_ok());

        let snapshot = runner.metrics();
        assert_eq!(snapshot.tasks_in_flight(), 0);
        assert_eq!(
            snapshot.tasks_claimed + snapshot.tasks_unclaimed(),
            snapshot.tasks_added
        );
        assert_eq!(
            snapshot.workers_drained + snapshot.workers_cancelled,
            32
        );
    }
}
