//! Transmit history shared by the desktop status surface and transcripts.
//!
//! Every datagram handed to a [`CommandSink`](crate::transport::CommandSink) is
//! recorded here with its origin and the gap since the previous one. The ring is
//! fixed-size, so long sessions keep only the most recent traffic.

use core::fmt;
use core::time::Duration;

use heapless::{HistoryBuf, OldestOrdered};

use crate::clock::TickInstant;
use crate::protocol::OutboundCommand;

/// Default number of records kept.
pub const TRANSMIT_RING_CAPACITY: usize = 32;

/// Identifier assigned to each recorded transmission.
pub type TransmitId = u32;

/// What caused a command to be sent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandOrigin {
    /// Produced by the motion state machine.
    Tick,
    /// Produced by a parameter change.
    Parameters,
}

impl fmt::Display for CommandOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOrigin::Tick => f.write_str("tick"),
            CommandOrigin::Parameters => f.write_str("params"),
        }
    }
}

/// One recorded transmission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransmitRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: TransmitId,
    pub timestamp: TInstant,
    pub command: OutboundCommand,
    pub origin: CommandOrigin,
    /// Gap since the previous transmission, if any.
    pub since_previous: Option<Duration>,
    /// `false` when the sink reported an error for this command.
    pub delivered: bool,
}

/// Records transmissions into a fixed-size ring buffer.
pub struct TransmitLog<TInstant, const CAPACITY: usize = TRANSMIT_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: HistoryBuf<TransmitRecord<TInstant>, CAPACITY>,
    last_sent_at: Option<TInstant>,
    next_id: TransmitId,
    failures: u32,
}

impl<TInstant, const CAPACITY: usize> TransmitLog<TInstant, CAPACITY>
where
    TInstant: TickInstant,
{
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_sent_at: None,
            next_id: 0,
            failures: 0,
        }
    }

    /// Returns an iterator over the recorded transmissions in chronological order.
    #[must_use]
    pub fn oldest_first(&self) -> OldestOrdered<'_, TransmitRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&TransmitRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total transmissions recorded since creation, including evicted ones.
    #[must_use]
    pub const fn total(&self) -> TransmitId {
        self.next_id
    }

    /// Transmissions the sink rejected.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Records a transmission and returns its identifier.
    pub fn record(
        &mut self,
        command: OutboundCommand,
        origin: CommandOrigin,
        delivered: bool,
        timestamp: TInstant,
    ) -> TransmitId {
        let since_previous = self
            .last_sent_at
            .map(|previous| timestamp.saturating_duration_since(previous));
        self.last_sent_at = Some(timestamp);

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if !delivered {
            self.failures = self.failures.saturating_add(1);
        }

        self.ring.write(TransmitRecord {
            id,
            timestamp,
            command,
            origin,
            since_previous,
            delivered,
        });
        id
    }
}

impl<TInstant, const CAPACITY: usize> Default for TransmitLog<TInstant, CAPACITY>
where
    TInstant: TickInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct MicrosInstant(u64);

    impl TickInstant for MicrosInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_micros(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn records_gap_between_transmissions() {
        let mut log: TransmitLog<MicrosInstant, 4> = TransmitLog::new();

        let first = log.record(
            OutboundCommand::NeutralHorizontal,
            CommandOrigin::Tick,
            true,
            MicrosInstant(100),
        );
        assert_eq!(first, 0);
        assert_eq!(log.latest().map(|record| record.since_previous), Some(None));

        log.record(
            OutboundCommand::NeutralVertical,
            CommandOrigin::Tick,
            false,
            MicrosInstant(250),
        );
        let latest = log.latest().copied().expect("second record");
        assert_eq!(latest.since_previous, Some(Duration::from_micros(150)));
        assert!(!latest.delivered);
        assert_eq!(log.failures(), 1);
    }

    #[test]
    fn ring_keeps_most_recent_records_in_order() {
        let mut log: TransmitLog<MicrosInstant, 2> = TransmitLog::new();
        for step in 0..3 {
            log.record(
                OutboundCommand::NeutralHorizontal,
                CommandOrigin::Tick,
                true,
                MicrosInstant(step),
            );
        }

        let ids: heapless::Vec<TransmitId, 2> = log.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[1, 2]);
        assert_eq!(log.total(), 3);
    }
}
