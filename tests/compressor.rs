use std::sync::{Arc, Mutex};
use std::time::Duration;

use pathwatch::types::DirectoryPathId;
use pathwatch::watch::{ChangeCompressor, CompressorCallback, DEFAULT_DEBOUNCE};
use pathwatch_test_utils::fakes::ManualTimer;

type Batches = Arc<Mutex<Vec<Vec<DirectoryPathId>>>>;

fn recording_callback() -> (Batches, CompressorCallback) {
    let batches: Batches = Arc::default();
    let sink = Arc::clone(&batches);
    let callback: CompressorCallback = Box::new(move |batch| sink.lock().unwrap().push(batch));
    (batches, callback)
}

#[test]
fn repeated_directory_is_flushed_once() {
    let timer = ManualTimer::new();
    let mut compressor = ChangeCompressor::new(timer.clone());
    let (batches, callback) = recording_callback();
    compressor.set_callback(Some(callback));

    let d1 = DirectoryPathId(1);
    for _ in 0..3 {
        compressor.add_directory_path_id(d1);
    }
    assert!(batches.lock().unwrap().is_empty());

    compressor.timeout();

    assert_eq!(*batches.lock().unwrap(), vec![vec![d1]]);
    assert!(compressor.pending().is_empty());
}

#[test]
fn every_addition_restarts_the_timer_with_the_delay() {
    let timer = ManualTimer::new();
    let mut compressor = ChangeCompressor::with_delay(timer.clone(), Duration::from_millis(35));

    compressor.add_directory_path_id(DirectoryPathId(2));
    compressor.add_directory_path_id(DirectoryPathId(2));

    let log = timer.log();
    assert_eq!(
        log.lock().unwrap().starts,
        vec![Duration::from_millis(35), Duration::from_millis(35)]
    );
    assert!(timer.is_running());

    compressor.timeout();
    assert!(!timer.is_running());
}

#[test]
fn batch_is_sorted_and_unique() {
    let mut compressor = ChangeCompressor::new(ManualTimer::new());
    let (batches, callback) = recording_callback();
    compressor.set_callback(Some(callback));

    for id in [5, 1, 3, 1, 5] {
        compressor.add_directory_path_id(DirectoryPathId(id));
    }
    compressor.timeout();

    assert_eq!(
        *batches.lock().unwrap(),
        vec![vec![DirectoryPathId(1), DirectoryPathId(3), DirectoryPathId(5)]]
    );
}

#[test]
fn replaced_callback_receives_the_scheduled_flush() {
    let mut compressor = ChangeCompressor::new(ManualTimer::new());
    let (old_batches, old_callback) = recording_callback();
    let (new_batches, new_callback) = recording_callback();
    compressor.set_callback(Some(old_callback));

    compressor.add_directory_path_id(DirectoryPathId(7));
    let previous = compressor.set_callback(Some(new_callback));
    assert!(previous.is_some());
    compressor.timeout();

    assert!(old_batches.lock().unwrap().is_empty());
    assert_eq!(*new_batches.lock().unwrap(), vec![vec![DirectoryPathId(7)]]);
}

#[test]
fn cleared_callback_turns_the_flush_into_a_no_op() {
    let mut compressor = ChangeCompressor::new(ManualTimer::new());
    let (batches, callback) = recording_callback();
    compressor.set_callback(Some(callback));

    compressor.add_directory_path_id(DirectoryPathId(7));
    compressor.set_callback(None);
    compressor.timeout();

    assert!(batches.lock().unwrap().is_empty());
    assert!(compressor.pending().is_empty());
}

#[test]
fn timeout_without_pending_ids_does_not_call_back() {
    let mut compressor = ChangeCompressor::new(ManualTimer::new());
    let (batches, callback) = recording_callback();
    compressor.set_callback(Some(callback));

    compressor.timeout();

    assert!(batches.lock().unwrap().is_empty());
}

#[test]
fn batches_after_a_flush_start_fresh() {
    let mut compressor = ChangeCompressor::new(ManualTimer::new());
    let (batches, callback) = recording_callback();
    compressor.set_callback(Some(callback));

    compressor.add_directory_path_id(DirectoryPathId(1));
    compressor.timeout();
    compressor.add_directory_path_id(DirectoryPathId(2));
    compressor.timeout();

    assert_eq!(
        *batches.lock().unwrap(),
        vec![vec![DirectoryPathId(1)], vec![DirectoryPathId(2)]]
    );
}

#[test]
fn default_delay_is_short() {
    let compressor = ChangeCompressor::new(ManualTimer::new());
    assert_eq!(compressor.delay(), DEFAULT_DEBOUNCE);
    assert_eq!(DEFAULT_DEBOUNCE, Duration::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn tokio_timer_posts_a_single_timeout_event() {
    use pathwatch::engine::RuntimeEvent;
    use pathwatch::watch::{Timer, TokioTimer};
    use tokio::sync::mpsc;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut compressor =
        ChangeCompressor::with_delay(TokioTimer::new(tx), Duration::from_millis(20));

    compressor.add_directory_path_id(DirectoryPathId(1));
    tokio::time::sleep(Duration::from_millis(10)).await;
    compressor.add_directory_path_id(DirectoryPathId(2));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Only the second start survives the restart.
    assert_eq!(rx.try_recv().unwrap(), RuntimeEvent::CompressorTimeout(2));
    assert!(rx.try_recv().is_err());
    assert!(compressor.timer().is_current(2));
    assert!(!compressor.timer().is_current(1));
}
