use super::*;
use crate::Error;
use parking_lot::Mutex;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route advisory warnings to the test writer so rejected-ordinal output
/// shows up with the failing test instead of on the global stderr.
fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Fixed-count enumerator standing in for real hardware
struct FakeEnumerator {
    count: u32,
}

impl DeviceEnumerator for FakeEnumerator {
    fn device_count(&self) -> crate::Result<u32> {
        Ok(self.count)
    }
}

/// Enumerator whose underlying driver call fails
struct FailingEnumerator;

impl DeviceEnumerator for FailingEnumerator {
    fn device_count(&self) -> crate::Result<u32> {
        Err(Error::DriverCallFailed {
            call: "cuDeviceGetCount",
            code: 999,
            message: "CUDA_ERROR_UNKNOWN".to_string(),
        })
    }
}

/// Records every published device list without touching the environment
#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn published(&self) -> Vec<String> {
        self.published.lock().clone()
    }
}

impl VisibilitySink for RecordingSink {
    fn publish(&self, devices: &str) {
        self.published.lock().push(devices.to_string());
    }
}

#[test]
fn accepts_requested_subset_in_order() {
    setup_tracing();
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![1, 9, 2]).unwrap();
    assert_eq!(sink.published(), vec!["1,2".to_string()]);
}

#[test]
fn single_ordinal_normalizes_to_one_element() {
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 2 }, &sink, 1u32).unwrap();
    assert_eq!(sink.published(), vec!["1".to_string()]);
}

#[test]
fn preserves_request_order_not_sorted() {
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![3, 0, 2]).unwrap();
    assert_eq!(sink.published(), vec!["3,0,2".to_string()]);
}

#[test]
fn zero_devices_fails_regardless_of_request() {
    let sink = RecordingSink::default();
    let err = select_gpus_with(&FakeEnumerator { count: 0 }, &sink, vec![0]).unwrap_err();
    assert!(matches!(err, Error::NoDeviceAvailable));
    assert!(sink.published().is_empty());
}

#[test]
fn all_rejected_fails_and_cites_valid_range() {
    let sink = RecordingSink::default();
    let err = select_gpus_with(&FakeEnumerator { count: 2 }, &sink, 5u32).unwrap_err();
    match &err {
        Error::NoRequestedDeviceAvailable { requested, count } => {
            assert_eq!(requested, &vec![5]);
            assert_eq!(*count, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Operator guidance: the message names the valid range.
    assert!(err.to_string().contains("0..2"));
    assert!(sink.published().is_empty());
}

#[test]
fn driver_failure_propagates_unwrapped() {
    let sink = RecordingSink::default();
    let err = select_gpus_with(&FailingEnumerator, &sink, vec![0]).unwrap_err();
    assert!(matches!(
        err,
        Error::DriverCallFailed { call: "cuDeviceGetCount", code: 999, .. }
    ));
    assert!(sink.published().is_empty());
}

#[test]
fn failed_selection_leaves_prior_state_untouched() {
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![0, 1]).unwrap();
    let _ = select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![7]).unwrap_err();
    // Only the successful call published anything.
    assert_eq!(sink.published(), vec!["0,1".to_string()]);
}

#[test]
fn reselection_supersedes_previous_selection() {
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![0]).unwrap();
    select_gpus_with(&FakeEnumerator { count: 4 }, &sink, vec![2, 3]).unwrap();
    assert_eq!(sink.published(), vec!["0".to_string(), "2,3".to_string()]);
}

#[test]
fn cpu_only_publishes_sentinel() {
    let sink = RecordingSink::default();
    select_cpu_only_with(&sink);
    assert_eq!(sink.published(), vec![CPU_ONLY_SENTINEL.to_string()]);
}

#[test]
fn cpu_only_overrides_gpu_selection() {
    let sink = RecordingSink::default();
    select_gpus_with(&FakeEnumerator { count: 2 }, &sink, vec![0, 1]).unwrap();
    select_cpu_only_with(&sink);
    assert_eq!(
        sink.published(),
        vec!["0,1".to_string(), CPU_ONLY_SENTINEL.to_string()]
    );
}

#[test]
fn env_sink_round_trip() {
    // The one test that touches the real process environment; it owns both
    // variables for its duration.
    select_cpu_only_with(&EnvSink);
    assert_eq!(std::env::var(DEVICE_ORDER_VAR).unwrap(), PCI_BUS_ID);
    assert_eq!(std::env::var(VISIBLE_DEVICES_VAR).unwrap(), CPU_ONLY_SENTINEL);
}

#[test]
fn request_conversions() {
    assert_eq!(GpuRequest::from(3u32).ordinals(), &[3]);
    assert_eq!(GpuRequest::from(vec![1, 2]).ordinals(), &[1, 2]);
    assert_eq!(GpuRequest::from([0u32, 4]).ordinals(), &[0, 4]);
    assert_eq!(GpuRequest::from(&[5u32][..]).ordinals(), &[5]);
}
