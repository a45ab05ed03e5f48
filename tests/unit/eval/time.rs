use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn manual() -> (ManualClock, TimeAccumulator) {
    let clock = ManualClock::new();
    clock.set(ms(10_000));
    let acc = TimeAccumulator::start(Box::new(clock.clone()));
    (clock, acc)
}

#[test]
fn starts_at_zero_and_runs() {
    let (clock, acc) = manual();
    assert_eq!(acc.elapsed(), Duration::ZERO);
    assert!(acc.is_running());
    clock.advance(ms(250));
    assert!((acc.elapsed_seconds() - 0.25).abs() < 1e-12);
}

#[test]
fn pause_freezes_regardless_of_pause_length() {
    let (clock, mut acc) = manual();
    clock.advance(ms(1_500));
    acc.pause();
    let frozen = acc.elapsed();
    assert_eq!(frozen, ms(1_500));

    clock.advance(ms(60_000));
    assert_eq!(acc.elapsed(), frozen);
    clock.advance(ms(3_600_000));
    assert_eq!(acc.elapsed(), frozen);
}

#[test]
fn resume_continues_from_frozen_value() {
    let (clock, mut acc) = manual();
    clock.advance(ms(1_000));
    acc.pause();
    clock.advance(ms(5_000));
    acc.resume();
    assert_eq!(acc.elapsed(), ms(1_000));
    clock.advance(ms(500));
    assert_eq!(acc.elapsed(), ms(1_500));
}

#[test]
fn repeated_pause_and_resume_are_idempotent() {
    let (clock, mut acc) = manual();
    clock.advance(ms(700));
    acc.pause();
    clock.advance(ms(100));
    acc.pause();
    assert_eq!(acc.elapsed(), ms(700));

    acc.resume();
    clock.advance(ms(100));
    // A second resume must not move the origin forward.
    acc.resume();
    clock.advance(ms(100));
    assert_eq!(acc.elapsed(), ms(900));
}

#[test]
fn pause_then_immediate_resume_is_lossless() {
    let (clock, mut acc) = manual();
    clock.advance(ms(333));
    let before = acc.elapsed();
    acc.pause();
    acc.resume();
    assert_eq!(acc.elapsed(), before);
}

#[test]
fn elapsed_is_monotone_while_running() {
    let (clock, acc) = manual();
    let mut last = acc.elapsed();
    for step in [1, 0, 16, 17, 0, 33] {
        clock.advance(ms(step));
        let now = acc.elapsed();
        assert!(now >= last);
        last = now;
    }
}

#[test]
fn system_clock_pause_is_frozen() {
    let mut acc = TimeAccumulator::start(Box::new(SystemClock::new()));
    assert!(acc.elapsed_seconds() < 0.5);
    acc.pause();
    let frozen = acc.elapsed();
    std::thread::sleep(ms(5));
    assert_eq!(acc.elapsed(), frozen);
    acc.resume();
    assert!(acc.elapsed() >= frozen);
}

#[test]
fn manual_clock_clones_share_time() {
    let a = ManualClock::new();
    let b = a.clone();
    a.advance(ms(42));
    assert_eq!(b.now(), ms(42));
}
