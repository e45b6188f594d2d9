use core::time::Duration;

use pilot_core::clock::TickInstant;
use pilot_core::keys::{Key, KeySet};
use pilot_core::lock::LockTiming;
use pilot_core::motion::{MotionEmission, MotionStateMachine, TickReport};
use pilot_core::protocol::OutboundCommand;
use proptest::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl TickInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

fn tokens(report: &TickReport) -> Vec<String> {
    report
        .commands
        .iter()
        .map(|command| command.encode().as_str().to_owned())
        .collect()
}

fn snapshot(bits: u8) -> KeySet {
    Key::ALL
        .into_iter()
        .filter(|key| bits & (1 << key.index()) != 0)
        .collect()
}

/// Lock timing long enough that arbitrary key sequences never engage it.
fn never_locks() -> LockTiming {
    LockTiming::new(Duration::from_secs(3_600), Duration::from_secs(1))
}

#[test]
fn opposing_vertical_keys_cancel_to_both_neutrals() {
    let mut machine = MotionStateMachine::default();
    let report = machine.tick(KeySet::from_keys(&[Key::Forward, Key::Back]), MockInstant(0));

    assert_eq!(tokens(&report), ["x", "y"]);
    assert_eq!(report.emission, Some(MotionEmission::Released));
}

#[test]
fn opposing_lateral_keys_cancel_once() {
    let mut machine = MotionStateMachine::default();
    let both = KeySet::from_keys(&[Key::Left, Key::Right]);

    let first = machine.tick(both, MockInstant(0));
    assert_eq!(tokens(&first), ["x", "y"]);

    let second = machine.tick(both, MockInstant(50));
    assert!(second.commands.is_empty(), "unchanged snapshot must stay quiet");
}

#[test]
fn vertical_precedes_lateral_in_combined_tokens() {
    let mut machine = MotionStateMachine::default();
    let report = machine.tick(KeySet::from_keys(&[Key::Right, Key::Back]), MockInstant(0));
    assert_eq!(tokens(&report), ["sd"]);

    let cancelled = machine.tick(
        KeySet::from_keys(&[Key::Right, Key::Back, Key::Forward]),
        MockInstant(50),
    );
    assert_eq!(tokens(&cancelled), ["d"]);
}

#[test]
fn each_change_is_sent_exactly_once() {
    let mut machine = MotionStateMachine::default();
    let timeline = [
        (0, KeySet::from_keys(&[Key::Forward])),
        (50, KeySet::from_keys(&[Key::Forward])),
        (100, KeySet::from_keys(&[Key::Forward, Key::Left])),
        (150, KeySet::from_keys(&[Key::Forward, Key::Left])),
        (200, KeySet::EMPTY),
        (250, KeySet::EMPTY),
    ];

    let sent: Vec<String> = timeline
        .into_iter()
        .flat_map(|(at, keys)| tokens(&machine.tick(keys, MockInstant(at))))
        .collect();

    assert_eq!(sent, ["w", "wa", "x", "y"]);
}

#[test]
fn locked_machine_never_sends_vertical_neutral() {
    let timing = LockTiming::new(Duration::ZERO, Duration::from_secs(1));
    let mut machine = MotionStateMachine::new(timing);
    machine.tick(KeySet::from_keys(&[Key::Forward]), MockInstant(0));

    for at in (50..900).step_by(50) {
        let report = machine.tick(KeySet::EMPTY, MockInstant(at));
        assert!(
            !report.commands.contains(&OutboundCommand::NeutralVertical),
            "locked tick at {at}ms sent a vertical neutral"
        );
    }
}

proptest! {
    #[test]
    fn unchanged_unlocked_snapshots_emit_nothing(
        sequence in proptest::collection::vec(0u8..16, 1..40),
    ) {
        let mut machine = MotionStateMachine::new(never_locks());
        let mut previous = KeySet::EMPTY;

        for (step, bits) in sequence.into_iter().enumerate() {
            let keys = snapshot(bits);
            let at = u64::try_from(step).expect("step fits u64") * 50;
            let report = machine.tick(keys, MockInstant(at));

            prop_assert!(!report.locked);
            if keys == previous {
                prop_assert!(report.commands.is_empty());
            } else {
                prop_assert!(!report.commands.is_empty());
            }
            previous = keys;
        }
    }

    #[test]
    fn unlocked_tokens_never_mix_opposing_keys(bits in 0u8..16) {
        let mut machine = MotionStateMachine::new(never_locks());
        let report = machine.tick(snapshot(bits), MockInstant(0));

        for token in tokens(&report) {
            prop_assert!(!(token.contains('w') && token.contains('s')));
            prop_assert!(!(token.contains('a') && token.contains('d')));
        }
    }
}
