use super::*;
use std::time::Duration;

#[test]
fn system_clock_reports_recent_time() {
    let clock = SystemClock;
    let now = clock.now();
    assert!((Utc::now() - now).num_seconds().abs() < 5);
}

#[test]
fn fake_clock_advances_deterministically() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    clock.advance(Duration::from_secs(30));
    let t1 = clock.now();
    assert_eq!((t1 - t0).num_seconds(), 30);
}

#[test]
fn fake_clock_set_overrides_time() {
    let clock = FakeClock::new();
    let target = DateTime::from_timestamp(0, 0).expect("valid timestamp");
    clock.set(target);
    assert_eq!(clock.now(), target);
}
