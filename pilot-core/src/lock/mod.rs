//! Forward-lock gesture.
//!
//! Holding the forward key for [`LOCK_ARM_HOLD`] latches forward drive so the
//! operator can let go and steer laterally. Once latched, pressing forward or back
//! releases the lock, but only after [`LOCK_RELEASE_COOLDOWN`] has passed; the
//! keypress that completed the gesture therefore never undoes it.
//!
//! All elapsed-time math saturates through [`TickInstant`], so a clock that steps
//! backwards reads as "no time has passed" rather than wrapping.

use core::fmt;
use core::time::Duration;

use crate::clock::TickInstant;
use crate::keys::{Key, KeySet};

/// Continuous forward hold required before the lock engages.
pub const LOCK_ARM_HOLD: Duration = Duration::from_secs(5);

/// Minimum time spent locked before a release press is honoured.
pub const LOCK_RELEASE_COOLDOWN: Duration = Duration::from_secs(1);

/// Timing knobs for the lock gesture.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LockTiming {
    /// Continuous forward hold required to engage.
    pub arm_hold: Duration,
    /// Time that must strictly elapse after engaging before release is allowed.
    pub release_cooldown: Duration,
}

impl LockTiming {
    #[must_use]
    pub const fn new(arm_hold: Duration, release_cooldown: Duration) -> Self {
        Self {
            arm_hold,
            release_cooldown,
        }
    }
}

impl Default for LockTiming {
    fn default() -> Self {
        Self::new(LOCK_ARM_HOLD, LOCK_RELEASE_COOLDOWN)
    }
}

/// Lock lifecycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockState<I> {
    Unlocked,
    /// Forward has been held continuously since `since`.
    Arming { since: I },
    /// Lock engaged at `since`; release eligibility is measured from here.
    Locked { since: I },
}

impl<I> LockState<I> {
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }

    #[must_use]
    pub const fn is_arming(&self) -> bool {
        matches!(self, LockState::Arming { .. })
    }
}

/// Edge reported when the lock state changes during a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockTransition {
    /// Forward pressed while unlocked; countdown started.
    Armed,
    /// Forward let go before the countdown finished.
    Disarmed,
    /// Countdown reached zero.
    Acquired,
    /// Release press accepted after the cooldown.
    Released,
}

impl fmt::Display for LockTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LockTransition::Armed => "armed",
            LockTransition::Disarmed => "disarmed",
            LockTransition::Acquired => "acquired",
            LockTransition::Released => "released",
        };
        f.write_str(label)
    }
}

/// Result of evaluating the gesture for one snapshot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LockEvaluation {
    pub transition: Option<LockTransition>,
    /// Time left before the lock engages, present only while arming.
    pub countdown: Option<Duration>,
}

/// Owns the lock state and advances it once per tick.
#[derive(Copy, Clone, Debug)]
pub struct LockGesture<I> {
    state: LockState<I>,
    timing: LockTiming,
}

impl<I> LockGesture<I>
where
    I: TickInstant,
{
    #[must_use]
    pub const fn new(timing: LockTiming) -> Self {
        Self {
            state: LockState::Unlocked,
            timing,
        }
    }

    #[must_use]
    pub const fn state(&self) -> LockState<I> {
        self.state
    }

    #[must_use]
    pub const fn timing(&self) -> LockTiming {
        self.timing
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Advances the gesture for the snapshot sampled at `now`.
    ///
    /// Arming is evaluated before release, so the tick that engages the lock can
    /// never also release it.
    pub fn evaluate(&mut self, keys: KeySet, now: I) -> LockEvaluation {
        let forward = keys.is_pressed(Key::Forward);
        let mut evaluation = LockEvaluation::default();

        match self.state {
            LockState::Locked { .. } => {}
            LockState::Unlocked | LockState::Arming { .. } if forward => {
                let since = if let LockState::Arming { since } = self.state {
                    since
                } else {
                    self.state = LockState::Arming { since: now };
                    evaluation.transition = Some(LockTransition::Armed);
                    now
                };

                let held = now.saturating_duration_since(since);
                let remaining = self.timing.arm_hold.saturating_sub(held);
                if remaining.is_zero() {
                    self.state = LockState::Locked { since: now };
                    evaluation.transition = Some(LockTransition::Acquired);
                } else {
                    evaluation.countdown = Some(remaining);
                }
            }
            LockState::Arming { .. } => {
                self.state = LockState::Unlocked;
                evaluation.transition = Some(LockTransition::Disarmed);
            }
            LockState::Unlocked => {}
        }

        if let LockState::Locked { since } = self.state {
            let release_pressed = forward || keys.is_pressed(Key::Back);
            let locked_for = now.saturating_duration_since(since);
            if release_pressed && locked_for > self.timing.release_cooldown {
                self.state = LockState::Unlocked;
                evaluation.transition = Some(LockTransition::Released);
            }
        }

        evaluation
    }
}

impl<I> Default for LockGesture<I>
where
    I: TickInstant,
{
    fn default() -> Self {
        Self::new(LockTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct MockInstant(u64);

    impl MockInstant {
        fn millis(value: u64) -> Self {
            Self(value * 1_000)
        }
    }

    impl TickInstant for MockInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_micros(self.0.saturating_sub(earlier.0))
        }
    }

    const FORWARD: KeySet = KeySet::from_keys(&[Key::Forward]);
    const BACK: KeySet = KeySet::from_keys(&[Key::Back]);

    #[test]
    fn first_forward_press_arms_with_full_countdown() {
        let mut gesture = LockGesture::default();
        let eval = gesture.evaluate(FORWARD, MockInstant::millis(0));

        assert_eq!(eval.transition, Some(LockTransition::Armed));
        assert_eq!(eval.countdown, Some(LOCK_ARM_HOLD));
        assert!(gesture.state().is_arming());
    }

    #[test]
    fn lock_engages_exactly_at_threshold() {
        let mut gesture = LockGesture::default();
        gesture.evaluate(FORWARD, MockInstant::millis(0));

        let before = gesture.evaluate(FORWARD, MockInstant::millis(4_999));
        assert_eq!(before.countdown, Some(Duration::from_millis(1)));
        assert!(!gesture.is_locked());

        let at = gesture.evaluate(FORWARD, MockInstant::millis(5_000));
        assert_eq!(at.transition, Some(LockTransition::Acquired));
        assert_eq!(at.countdown, None);
        assert_eq!(
            gesture.state(),
            LockState::Locked {
                since: MockInstant::millis(5_000)
            }
        );
    }

    #[test]
    fn release_requires_strictly_more_than_cooldown() {
        let mut gesture = LockGesture::new(LockTiming::new(Duration::ZERO, LOCK_RELEASE_COOLDOWN));
        let eval = gesture.evaluate(FORWARD, MockInstant::millis(100));
        assert_eq!(eval.transition, Some(LockTransition::Acquired));

        assert_eq!(gesture.evaluate(BACK, MockInstant::millis(1_100)).transition, None);
        assert!(gesture.is_locked());

        let released = gesture.evaluate(BACK, MockInstant::millis(1_101));
        assert_eq!(released.transition, Some(LockTransition::Released));
        assert_eq!(gesture.state(), LockState::Unlocked);
    }

    #[test]
    fn backwards_clock_never_shortens_countdown() {
        let mut gesture = LockGesture::default();
        gesture.evaluate(FORWARD, MockInstant::millis(10_000));
        let eval = gesture.evaluate(FORWARD, MockInstant::millis(2_000));

        assert_eq!(eval.countdown, Some(LOCK_ARM_HOLD));
        assert!(!gesture.is_locked());
    }

    #[test]
    fn lateral_keys_alone_never_release() {
        let mut gesture = LockGesture::new(LockTiming::new(Duration::ZERO, LOCK_RELEASE_COOLDOWN));
        gesture.evaluate(FORWARD, MockInstant::millis(0));
        let lateral = KeySet::from_keys(&[Key::Left, Key::Right]);

        assert_eq!(gesture.evaluate(lateral, MockInstant::millis(60_000)).transition, None);
        assert!(gesture.is_locked());
    }
}
