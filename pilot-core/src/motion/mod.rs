//! Tick-driven motion state machine.
//!
//! [`MotionStateMachine::tick`] is the whole decision path from one key snapshot to
//! the datagrams that should leave this tick. It owns no I/O: callers hand the
//! returned [`TickReport`] to a transport and a status surface.
//!
//! Emission rules:
//!
//! - Movement is only re-sent when the snapshot differs from the previous tick,
//!   except while locked, where it is re-sent every tick.
//! - A synthesis with nothing to drive sends `x` then `y` instead of an empty token.
//! - While locked with no lateral key held, `x` is sent every tick regardless.

use core::time::Duration;

use heapless::Vec;

use crate::clock::TickInstant;
use crate::keys::{Axis, Key, KeySet};
use crate::lock::{LockGesture, LockState, LockTiming, LockTransition};
use crate::protocol::{Heading, OutboundCommand, VerticalDrive};

/// Upper bound on datagrams produced by a single tick.
pub const MAX_TICK_COMMANDS: usize = 3;

/// Commands produced by one tick, in send order.
pub type TickCommands = Vec<OutboundCommand, MAX_TICK_COMMANDS>;

/// What the movement half of a tick sent, if anything.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MotionEmission {
    Heading(Heading),
    /// Both axes were told to hold (`x`, `y`).
    Released,
}

/// Outcome of a single tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    pub commands: TickCommands,
    /// Snapshot the tick was evaluated against.
    pub keys: KeySet,
    /// `true` when `keys` differs from the previous tick's snapshot.
    pub keys_changed: bool,
    pub locked: bool,
    pub transition: Option<LockTransition>,
    /// Time left before the lock engages; `None` unless arming.
    pub countdown: Option<Duration>,
    pub emission: Option<MotionEmission>,
}

/// Resolves a key snapshot into a movement token.
///
/// Unlocked, opposing keys on the same axis cancel each other. Locked, forward is
/// always driven and both lateral keys pass through untouched.
#[must_use]
pub fn synthesize(keys: KeySet, locked: bool) -> Option<Heading> {
    let left = keys.is_pressed(Key::Left);
    let right = keys.is_pressed(Key::Right);

    if locked {
        return Heading::new(Some(VerticalDrive::Forward), left, right);
    }

    let forward = keys.is_pressed(Key::Forward);
    let back = keys.is_pressed(Key::Back);
    let vertical = match (forward, back) {
        (true, false) => Some(VerticalDrive::Forward),
        (false, true) => Some(VerticalDrive::Back),
        _ => None,
    };
    let (left, right) = if left && right {
        (false, false)
    } else {
        (left, right)
    };

    Heading::new(vertical, left, right)
}

/// Owns the key history and lock gesture for one controller session.
#[derive(Clone, Debug)]
pub struct MotionStateMachine<I> {
    previous: KeySet,
    gesture: LockGesture<I>,
}

impl<I> MotionStateMachine<I>
where
    I: TickInstant,
{
    #[must_use]
    pub const fn new(timing: LockTiming) -> Self {
        Self {
            previous: KeySet::EMPTY,
            gesture: LockGesture::new(timing),
        }
    }

    /// Snapshot seen on the most recent tick.
    #[must_use]
    pub const fn keys(&self) -> KeySet {
        self.previous
    }

    #[must_use]
    pub const fn lock_state(&self) -> LockState<I> {
        self.gesture.state()
    }

    #[must_use]
    pub const fn timing(&self) -> LockTiming {
        self.gesture.timing()
    }

    /// Evaluates one tick for the snapshot sampled at `now`.
    pub fn tick(&mut self, keys: KeySet, now: I) -> TickReport {
        let keys_changed = keys != self.previous;
        self.previous = keys;

        let evaluation = self.gesture.evaluate(keys, now);
        let locked = self.gesture.is_locked();

        let mut commands = TickCommands::new();
        let mut emission = None;

        if keys_changed || locked {
            if let Some(heading) = synthesize(keys, locked) {
                push(&mut commands, OutboundCommand::Motion(heading));
                emission = Some(MotionEmission::Heading(heading));
            } else {
                push(&mut commands, OutboundCommand::NeutralHorizontal);
                push(&mut commands, OutboundCommand::NeutralVertical);
                emission = Some(MotionEmission::Released);
            }
        }

        if locked && !keys.any_on(Axis::Horizontal) {
            push(&mut commands, OutboundCommand::NeutralHorizontal);
        }

        TickReport {
            commands,
            keys,
            keys_changed,
            locked,
            transition: evaluation.transition,
            countdown: evaluation.countdown,
            emission,
        }
    }
}

impl<I> Default for MotionStateMachine<I>
where
    I: TickInstant,
{
    fn default() -> Self {
        Self::new(LockTiming::default())
    }
}

fn push(commands: &mut TickCommands, command: OutboundCommand) {
    let pushed = commands.push(command).is_ok();
    debug_assert!(pushed, "tick produced more than {MAX_TICK_COMMANDS} commands");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct MockInstant(u64);

    impl TickInstant for MockInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    fn tokens(report: &TickReport) -> heapless::String<16> {
        let mut line = heapless::String::new();
        for (index, command) in report.commands.iter().enumerate() {
            if index > 0 {
                line.push(' ').expect("token line capacity");
            }
            line.push_str(&command.encode()).expect("token line capacity");
        }
        line
    }

    #[test]
    fn unlocked_conflicts_cancel_per_axis() {
        let both_vertical = KeySet::from_keys(&[Key::Forward, Key::Back, Key::Left]);
        assert_eq!(
            synthesize(both_vertical, false),
            Heading::new(None, true, false)
        );

        let both_lateral = KeySet::from_keys(&[Key::Back, Key::Left, Key::Right]);
        assert_eq!(
            synthesize(both_lateral, false),
            Heading::new(Some(VerticalDrive::Back), false, false)
        );

        let everything = KeySet::from_keys(&Key::ALL);
        assert_eq!(synthesize(everything, false), None);
    }

    #[test]
    fn locked_synthesis_forces_forward_and_keeps_both_laterals() {
        let keys = KeySet::from_keys(&[Key::Back, Key::Left, Key::Right]);
        let heading = synthesize(keys, true).expect("locked always drives");
        assert_eq!(heading.vertical(), Some(VerticalDrive::Forward));
        assert!(heading.left() && heading.right());
    }

    #[test]
    fn first_tick_with_nothing_pressed_is_silent() {
        let mut machine = MotionStateMachine::default();
        let report = machine.tick(KeySet::EMPTY, MockInstant(0));

        assert!(!report.keys_changed);
        assert!(report.commands.is_empty());
        assert_eq!(report.emission, None);
    }

    #[test]
    fn releasing_all_keys_sends_both_neutrals_once() {
        let mut machine = MotionStateMachine::default();
        machine.tick(KeySet::from_keys(&[Key::Back]), MockInstant(0));

        let release = machine.tick(KeySet::EMPTY, MockInstant(50));
        assert_eq!(tokens(&release).as_str(), "x y");
        assert_eq!(release.emission, Some(MotionEmission::Released));

        let idle = machine.tick(KeySet::EMPTY, MockInstant(100));
        assert!(idle.commands.is_empty());
    }

    #[test]
    fn locked_without_lateral_sends_heading_then_neutral() {
        let timing = LockTiming::new(Duration::ZERO, Duration::from_secs(1));
        let mut machine = MotionStateMachine::new(timing);
        let report = machine.tick(KeySet::from_keys(&[Key::Forward]), MockInstant(0));

        assert!(report.locked);
        assert_eq!(report.transition, Some(LockTransition::Acquired));
        assert_eq!(tokens(&report).as_str(), "w x");
    }
}
