//! Operator-facing status text.
//!
//! [`MotionStatus`] folds successive [`TickReport`]s into the three lines the
//! desktop shows under the key indicator: the last movement sent, the lock banner,
//! and the lock countdown. Rendering goes through `Display` so front-ends format
//! the same text without allocating.

use core::fmt;
use core::time::Duration;

use crate::motion::{MotionEmission, TickReport};

const IDLE_PROMPT: &str = "Press W/A/S/D";
const RELEASED_TEXT: &str = "Keys Released";
const LOCK_BANNER: &str = "Lock Active: Adjust with A/D";

/// Last movement line shown to the operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SentLine(Option<MotionEmission>);

impl fmt::Display for SentLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str(IDLE_PROMPT),
            Some(MotionEmission::Released) => f.write_str(RELEASED_TEXT),
            Some(MotionEmission::Heading(heading)) => {
                f.write_str("Sent: ")?;
                for key in heading.keys().pressed() {
                    fmt::Write::write_char(f, key.token().to_ascii_uppercase())?;
                }
                Ok(())
            }
        }
    }
}

/// Lock banner; empty when unlocked.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LockLine(bool);

impl fmt::Display for LockLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 { f.write_str(LOCK_BANNER) } else { Ok(()) }
    }
}

/// Countdown line; empty unless arming.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CountdownLine(Option<Duration>);

impl fmt::Display for CountdownLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(remaining) => write!(f, "Lock in: {:.1}s", remaining.as_secs_f32()),
            None => Ok(()),
        }
    }
}

/// Display state accumulated across ticks.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MotionStatus {
    last_sent: Option<MotionEmission>,
    locked: bool,
    countdown: Option<Duration>,
}

impl MotionStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_sent: None,
            locked: false,
            countdown: None,
        }
    }

    /// Updates the lines from a tick. The sent line keeps its text on ticks that
    /// emitted nothing.
    pub fn apply(&mut self, report: &TickReport) {
        if let Some(emission) = report.emission {
            self.last_sent = Some(emission);
        }
        self.locked = report.locked;
        self.countdown = report.countdown;
    }

    #[must_use]
    pub const fn sent_line(&self) -> SentLine {
        SentLine(self.last_sent)
    }

    #[must_use]
    pub const fn lock_line(&self) -> LockLine {
        LockLine(self.locked)
    }

    #[must_use]
    pub const fn countdown_line(&self) -> CountdownLine {
        CountdownLine(self.countdown)
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }
}
