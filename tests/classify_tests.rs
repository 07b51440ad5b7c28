//! Integration tests for severity classification and the default policy.

use std::time::Duration;

use herakles_healthcheck::collectors::NetCounters;
use herakles_healthcheck::delta::{load_ratio, net_rate};
use herakles_healthcheck::{classify, Severity, Threshold, ThresholdPolicy};

#[test]
fn test_exact_boundaries() {
    assert_eq!(classify(69.999, 70.0, 90.0), Severity::Ok);
    assert_eq!(classify(70.0, 70.0, 90.0), Severity::Warn);
    assert_eq!(classify(89.999, 70.0, 90.0), Severity::Warn);
    assert_eq!(classify(90.0, 70.0, 90.0), Severity::Critical);
}

#[test]
fn test_classification_is_monotonic() {
    let threshold = Threshold::new(75.0, 90.0);
    let mut previous = Severity::Ok;

    for step in 0..=2000 {
        let value = step as f64 / 10.0;
        let severity = threshold.classify(value);
        assert!(severity >= previous, "severity dropped at {}", value);
        previous = severity;
    }
    assert_eq!(previous, Severity::Critical);
}

#[test]
fn test_default_policy_table() {
    let policy = ThresholdPolicy::default();

    assert_eq!(policy.cpu, Threshold::new(70.0, 90.0));
    assert_eq!(policy.load, Threshold::new(75.0, 100.0));
    assert_eq!(policy.disk_util, Threshold::new(70.0, 90.0));
    assert_eq!(policy.filesystem, Threshold::new(75.0, 90.0));
    assert_eq!(policy.memory, Threshold::new(75.0, 90.0));
    assert_eq!(policy.swap, Threshold::new(50.0, 80.0));
    assert_eq!(policy.network.warn, 10.0 * 1024.0 * 1024.0);
    assert_eq!(policy.network.critical, 100.0 * 1024.0 * 1024.0);
}

#[test]
fn test_user_cpu_threshold() {
    let policy = ThresholdPolicy::with_cpu_critical(80.0);
    assert_eq!(policy.cpu.classify(79.0), Severity::Warn);
    assert_eq!(policy.cpu.classify(80.0), Severity::Critical);
}

#[test]
fn test_load_on_four_cores_is_ok() {
    let policy = ThresholdPolicy::default();
    let ratios = [2.5, 1.8, 1.2].map(|load| load_ratio(load, 4));

    assert_eq!(ratios[0], 62.5);
    assert!((ratios[1] - 45.0).abs() < 1e-9);
    assert!((ratios[2] - 30.0).abs() < 1e-9);
    assert_eq!(
        Severity::worst(ratios.map(|r| policy.load.classify(r))),
        Severity::Ok
    );
}

#[test]
fn test_150_mib_per_second_is_critical() {
    let policy = ThresholdPolicy::default();
    let prev = NetCounters {
        rx_bytes: 1_000,
        tx_bytes: 0,
    };
    let cur = NetCounters {
        rx_bytes: 1_000 + 150 * 1024 * 1024,
        tx_bytes: 0,
    };

    let rate = net_rate(&prev, &cur, Duration::from_secs(1));
    assert_eq!(policy.network.classify(rate.rx_bytes_per_sec), Severity::Critical);
    assert_eq!(policy.network.classify(rate.tx_bytes_per_sec), Severity::Ok);
}

#[test]
fn test_worst_severity() {
    assert_eq!(Severity::worst([]), Severity::Ok);
    assert_eq!(
        Severity::worst([Severity::Warn, Severity::Ok, Severity::Critical]),
        Severity::Critical
    );
}
