//! Outbound command sink.
//!
//! The core never touches sockets. Front-ends implement [`CommandSink`] over
//! whatever carries datagrams to the device; the sink is fire-and-forget, and
//! errors are reported back only so the caller can log them.

use crate::protocol::OutboundCommand;

/// Fire-and-forget destination for wire tokens.
pub trait CommandSink {
    /// Transport-specific failure.
    type Error;

    /// Sends one token. No acknowledgement is awaited and nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the datagram could not be handed off.
    fn send(&mut self, command: &OutboundCommand) -> Result<(), Self::Error>;
}

/// Sink that discards every command.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl NoopSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandSink for NoopSink {
    type Error = core::convert::Infallible;

    fn send(&mut self, _: &OutboundCommand) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<S> CommandSink for &mut S
where
    S: CommandSink + ?Sized,
{
    type Error = S::Error;

    fn send(&mut self, command: &OutboundCommand) -> Result<(), Self::Error> {
        (**self).send(command)
    }
}
