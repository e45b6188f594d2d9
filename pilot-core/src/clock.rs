//! Time source abstraction used by the lock gesture and transmit history.

use core::time::Duration;

/// Trait implemented by instant types that can drive the tick loop.
///
/// Implementations must saturate: an `earlier` value that is actually later than
/// `self` (a clock stepping backwards) yields [`Duration::ZERO`].
pub trait TickInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

#[cfg(feature = "std")]
impl TickInstant for std::time::Instant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        std::time::Instant::saturating_duration_since(self, earlier)
    }
}
