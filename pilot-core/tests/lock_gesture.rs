use core::time::Duration;

use pilot_core::clock::TickInstant;
use pilot_core::keys::{Key, KeySet};
use pilot_core::lock::{LOCK_ARM_HOLD, LockState, LockTransition};
use pilot_core::motion::{MotionStateMachine, TickReport};

const TICK_MS: u64 = 50;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl MockInstant {
    fn millis(value: u64) -> Self {
        Self(value)
    }
}

impl TickInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

fn keys(pressed: &[Key]) -> KeySet {
    KeySet::from_keys(pressed)
}

fn tokens(report: &TickReport) -> Vec<String> {
    report
        .commands
        .iter()
        .map(|command| command.encode().as_str().to_owned())
        .collect()
}

/// Drives the machine at the nominal cadence over `[from, to)` with a fixed snapshot.
fn hold(
    machine: &mut MotionStateMachine<MockInstant>,
    pressed: KeySet,
    from: u64,
    to: u64,
) -> Vec<(u64, TickReport)> {
    (from..to)
        .step_by(usize::try_from(TICK_MS).expect("tick fits usize"))
        .map(|at| (at, machine.tick(pressed, MockInstant::millis(at))))
        .collect()
}

#[test]
fn holding_forward_locks_exactly_once_at_five_seconds() {
    let mut machine = MotionStateMachine::default();
    let reports = hold(&mut machine, keys(&[Key::Forward]), 0, 5_150);

    let acquired: Vec<u64> = reports
        .iter()
        .filter(|(_, report)| report.transition == Some(LockTransition::Acquired))
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(acquired, vec![5_000], "lock must engage on the first tick at 5.0s");

    for (at, report) in &reports {
        assert_eq!(report.locked, *at >= 5_000, "unexpected lock state at {at}ms");
    }
}

#[test]
fn countdown_tracks_remaining_hold_time() {
    let mut machine = MotionStateMachine::default();
    let reports = hold(&mut machine, keys(&[Key::Forward]), 0, 250);

    assert_eq!(reports[0].1.countdown, Some(LOCK_ARM_HOLD));
    assert_eq!(reports[0].1.transition, Some(LockTransition::Armed));
    assert_eq!(reports[4].1.countdown, Some(Duration::from_millis(4_800)));
    assert_eq!(reports[4].1.transition, None);
}

#[test]
fn releasing_forward_early_forfeits_progress() {
    let mut machine = MotionStateMachine::default();
    hold(&mut machine, keys(&[Key::Forward]), 0, 4_900);

    let released = machine.tick(KeySet::EMPTY, MockInstant::millis(4_900));
    assert_eq!(released.transition, Some(LockTransition::Disarmed));
    assert_eq!(released.countdown, None);
    assert_eq!(machine.lock_state(), LockState::Unlocked);

    let rearmed = machine.tick(keys(&[Key::Forward]), MockInstant::millis(4_950));
    assert_eq!(rearmed.countdown, Some(LOCK_ARM_HOLD));

    let reports = hold(&mut machine, keys(&[Key::Forward]), 5_000, 9_950);
    assert!(
        reports.iter().all(|(_, report)| !report.locked),
        "no partial credit from the first hold"
    );
    let lock = machine.tick(keys(&[Key::Forward]), MockInstant::millis(9_950));
    assert_eq!(lock.transition, Some(LockTransition::Acquired));
}

#[test]
fn locked_ticks_always_lead_with_forward() {
    let mut machine = MotionStateMachine::default();
    hold(&mut machine, keys(&[Key::Forward]), 0, 5_050);
    assert!(machine.lock_state().is_locked());

    // Forward let go at 5.1s; lateral steering at 5.2s.
    let idle = hold(&mut machine, KeySet::EMPTY, 5_100, 5_200);
    for (_, report) in &idle {
        assert_eq!(tokens(report), ["w", "x"]);
    }

    let steering = hold(&mut machine, keys(&[Key::Left]), 5_200, 7_000);
    for (at, report) in &steering {
        assert_eq!(tokens(report), ["wa"], "unexpected tokens at {at}ms");
    }
}

#[test]
fn release_is_ignored_during_cooldown() {
    let mut machine = MotionStateMachine::default();
    hold(&mut machine, keys(&[Key::Forward]), 0, 5_050);
    machine.tick(KeySet::EMPTY, MockInstant::millis(5_050));

    let early = hold(&mut machine, keys(&[Key::Back]), 5_100, 6_050);
    assert!(early.iter().all(|(_, report)| report.locked));
    assert!(
        early
            .iter()
            .all(|(_, report)| report.transition != Some(LockTransition::Released))
    );

    let release = machine.tick(keys(&[Key::Back]), MockInstant::millis(6_050));
    assert_eq!(release.transition, Some(LockTransition::Released));
    assert!(!release.locked);
    // Unlocked with the same snapshot as last tick: nothing is re-sent.
    assert!(release.commands.is_empty());
}

#[test]
fn holding_forward_through_cooldown_unlocks_and_rearms() {
    let mut machine = MotionStateMachine::default();
    hold(&mut machine, keys(&[Key::Forward]), 0, 6_000);
    assert!(machine.lock_state().is_locked());

    let release = machine.tick(keys(&[Key::Forward]), MockInstant::millis(6_050));
    assert_eq!(release.transition, Some(LockTransition::Released));

    let next = machine.tick(keys(&[Key::Forward]), MockInstant::millis(6_100));
    assert_eq!(next.transition, Some(LockTransition::Armed));
    assert_eq!(next.countdown, Some(LOCK_ARM_HOLD));
}

#[test]
fn clock_stepping_backwards_does_not_release_or_lock() {
    let mut machine = MotionStateMachine::default();
    hold(&mut machine, keys(&[Key::Forward]), 10_000, 15_050);
    assert!(machine.lock_state().is_locked());

    let report = machine.tick(keys(&[Key::Back]), MockInstant::millis(1_000));
    assert!(report.locked, "negative elapsed time must clamp to zero");
}
