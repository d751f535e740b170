//! End-to-end runs of the engine with short periods.

use attitude::config::DeadlineConfig;
use attitude::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn drain<T: Clone>(rx: &mut tokio::sync::broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Keeps grabbing the record's lock from a third thread until told to stop.
///
/// The 47 ms hold/release cycle drifts against the reader's 50 ms cadence, so
/// the reader arrives at every phase of it over a one-second run.
fn spawn_lock_hog(record: Arc<SharedAttitude>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Acquire) {
            {
                let _guard = record.lock();
                thread::sleep(Duration::from_millis(35));
            }
            thread::sleep(Duration::from_millis(12));
        }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn contended_bounded_wait_run() {
    let config = AttitudeConfig::from_toml_str(
        r#"
        [run]
        total_ms = 1000

        [writer]
        period_ms = 100

        [reader]
        period_ms = 50
        acquire = "bounded_wait"
        deadline = { secs = 0, nanos = 10000000 }
        "#,
    )
    .unwrap();
    let engine = AttitudeEngine::new(config).unwrap();
    let mut reads = engine.subscribe_read_events();

    let stop = Arc::new(AtomicBool::new(false));
    let hog = spawn_lock_hog(engine.record(), Arc::clone(&stop));
    let summary = engine.run_until(std::future::pending()).await.unwrap();
    stop.store(true, Ordering::Release);
    hog.join().unwrap();

    assert!(summary.writer.cycles >= 9, "{} writes", summary.writer.cycles);
    assert!(summary.reader.attempts >= 10, "{} reads", summary.reader.attempts);
    assert!(summary.reader.reads > 0, "no successful read");
    assert!(summary.reader.timeouts > 0, "no timeout");
    assert_eq!(summary.reader.failures, 0);
    assert_eq!(
        summary.reader.reads + summary.reader.timeouts,
        summary.reader.attempts
    );
    assert_eq!(summary.lock.max_concurrent_holders, 1);
    assert!(summary.total >= Duration::from_millis(1_000));
    assert!(summary.total < Duration::from_millis(1_300), "{:?}", summary.total);

    let events = drain(&mut reads);
    assert_eq!(events.len() as u64, summary.reader.attempts);
    let no_data = events
        .iter()
        .filter(|event| event.outcome == ReadOutcome::NoData)
        .count() as u64;
    assert_eq!(no_data, summary.reader.timeouts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_read_is_one_whole_write() {
    let mut config = AttitudeConfig::default();
    config.run.total_ms = 300;
    config.writer.period_ms = 5;
    config.reader.period_ms = 3;
    config.reader.acquire = AcquireMode::Blocking;
    let engine = AttitudeEngine::new(config).unwrap();
    let mut reads = engine.subscribe_read_events();

    let summary = engine.run_until(std::future::pending()).await.unwrap();
    let events = drain(&mut reads);
    assert!(!events.is_empty());

    let mut last_sequence = 0;
    let mut last_sample_ms = 0.0;
    for event in &events {
        let ReadOutcome::Snapshot(snapshot) = &event.outcome else {
            panic!("blocking read produced {:?}", event.outcome);
        };
        let record = snapshot.record;
        assert!(snapshot.staleness_ms >= 0.0);
        if record.sequence > 0 {
            assert_eq!(record.attitude, Attitude::from_index(record.index));
            assert_eq!(record.index, -10 + ((record.sequence - 1) % 20) as i32);
        }
        assert!(record.sequence >= last_sequence);
        assert!(snapshot.sample_ms >= last_sample_ms);
        last_sequence = record.sequence;
        last_sample_ms = snapshot.sample_ms;
    }
    assert!(last_sequence <= summary.writer.cycles);
    assert_eq!(summary.lock.max_concurrent_holders, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tasks_exit_within_one_period_of_the_signal() {
    let mut config = AttitudeConfig::default();
    config.run.total_ms = 300;
    config.writer.period_ms = 200;
    config.reader.period_ms = 500;
    config.reader.deadline = DeadlineConfig { secs: 0, nanos: 100_000_000 };
    let engine = AttitudeEngine::new(config).unwrap();

    let summary = engine.run_until(std::future::pending()).await.unwrap();

    let slack = Duration::from_millis(100);
    assert!(
        summary.writer_exit_latency <= Duration::from_millis(200) + slack,
        "writer took {:?}",
        summary.writer_exit_latency
    );
    assert!(
        summary.reader_exit_latency <= Duration::from_millis(500) + slack,
        "reader took {:?}",
        summary.reader_exit_latency
    );
    assert!(summary.total < Duration::from_millis(300 + 500) + slack);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reader_stuck_on_a_held_lock_still_exits_within_its_period() {
    let mut config = AttitudeConfig::default();
    config.run.total_ms = 250;
    config.writer.period_ms = 50;
    config.reader.period_ms = 100;
    config.reader.acquire = AcquireMode::BoundedWait;
    config.reader.deadline = DeadlineConfig { secs: 0, nanos: 100_000_000 };
    let engine = AttitudeEngine::new(config).unwrap();

    // Held past the end of the run, so every reader attempt waits out its
    // deadline and the writer stays blocked until the hold ends.
    let record = engine.record();
    let (held_tx, held_rx) = std::sync::mpsc::channel();
    let holder = thread::spawn(move || {
        let _guard = record.lock();
        held_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(400));
    });
    held_rx.recv().unwrap();

    let summary = engine.run_until(std::future::pending()).await.unwrap();
    holder.join().unwrap();

    assert!(summary.reader.timeouts > 0);
    assert_eq!(summary.reader.reads, 0);
    assert!(
        summary.reader_exit_latency <= Duration::from_millis(100 + 100),
        "reader took {:?}",
        summary.reader_exit_latency
    );
}

#[test]
fn deadline_past_the_reader_period_is_refused() {
    let mut config = AttitudeConfig::default();
    config.reader.period_ms = 100;
    config.reader.deadline = DeadlineConfig { secs: 2, nanos: 0 };
    assert!(matches!(
        AttitudeEngine::new(config),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn configured_half_second_deadline_waits_half_a_second() {
    let config = AttitudeConfig::from_toml_str(
        r#"
        [reader.deadline]
        secs = 0
        nanos = 500000000
        "#,
    )
    .unwrap();
    let policy = config.reader.policy().unwrap();
    assert_eq!(
        policy,
        AcquirePolicy::BoundedWait {
            deadline: Deadline::new(0, 500_000_000).unwrap()
        }
    );

    let record = Arc::new(SharedAttitude::new(Instant::now()));
    let guard = record.lock();
    let contender = {
        let record = Arc::clone(&record);
        thread::spawn(move || {
            let started = Instant::now();
            let result = record.read(policy);
            (result, started.elapsed())
        })
    };
    let (result, waited) = contender.join().unwrap();
    drop(guard);

    assert!(result.unwrap_err().is_timeout());
    assert!(waited >= Duration::from_millis(500), "only waited {waited:?}");
    assert!(waited < Duration::from_millis(1_500), "waited {waited:?}");
}
