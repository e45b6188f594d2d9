//! Wire tokens exchanged with the servo controller.
//!
//! Every datagram is one short ASCII token with no framing:
//!
//! ```text
//!   w s a d  (and concatenations: wa, sd, wad, ...)  movement
//!   x                                                 hold horizontal axis
//!   y                                                 hold vertical axis
//!   SPD:<1..200>  RNX:<0..90>  RNY:<0..90>            tuning parameters
//! ```
//!
//! [`OutboundCommand`] renders tokens through `Display`/[`OutboundCommand::encode`]
//! and decodes them with a small `winnow` grammar, which the desktop monitor uses
//! to stand in for the device.

use core::fmt::{self, Write as _};

use heapless::String;
use winnow::ascii::dec_uint;
use winnow::combinator::{alt, opt, preceded};
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::prelude::*;

use crate::keys::{Key, KeySet};
use crate::params::ParameterKind;

/// Longest token is `SPD:200`.
pub const MAX_WIRE_LEN: usize = 8;

/// Encoded datagram payload.
pub type WireBuffer = String<MAX_WIRE_LEN>;

/// Vertical component of a movement token.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VerticalDrive {
    Forward,
    Back,
}

impl VerticalDrive {
    #[must_use]
    pub const fn key(self) -> Key {
        match self {
            VerticalDrive::Forward => Key::Forward,
            VerticalDrive::Back => Key::Back,
        }
    }
}

/// Non-empty movement token.
///
/// Written as the vertical key first, then left, then right. Unlocked synthesis
/// never sets both lateral flags; the locked form (`wad`) may.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Heading {
    vertical: Option<VerticalDrive>,
    left: bool,
    right: bool,
}

impl Heading {
    /// Returns `None` when no component is set.
    #[must_use]
    pub const fn new(vertical: Option<VerticalDrive>, left: bool, right: bool) -> Option<Self> {
        if vertical.is_none() && !left && !right {
            None
        } else {
            Some(Self {
                vertical,
                left,
                right,
            })
        }
    }

    #[must_use]
    pub const fn vertical(&self) -> Option<VerticalDrive> {
        self.vertical
    }

    #[must_use]
    pub const fn left(&self) -> bool {
        self.left
    }

    #[must_use]
    pub const fn right(&self) -> bool {
        self.right
    }

    /// Keys this heading drives.
    #[must_use]
    pub fn keys(&self) -> KeySet {
        let mut keys = KeySet::EMPTY;
        if let Some(vertical) = self.vertical {
            keys.set(vertical.key(), true);
        }
        keys.set(Key::Left, self.left);
        keys.set(Key::Right, self.right);
        keys
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(vertical) = self.vertical {
            f.write_char(vertical.key().token())?;
        }
        if self.left {
            f.write_char(Key::Left.token())?;
        }
        if self.right {
            f.write_char(Key::Right.token())?;
        }
        Ok(())
    }
}

/// One datagram's worth of instruction for the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OutboundCommand {
    Motion(Heading),
    /// `x`: stop/hold the horizontal axis.
    NeutralHorizontal,
    /// `y`: stop/hold the vertical axis.
    NeutralVertical,
    Set { kind: ParameterKind, value: u8 },
}

impl OutboundCommand {
    /// Renders the wire token into a fixed-capacity buffer.
    #[must_use]
    pub fn encode(&self) -> WireBuffer {
        let mut wire = WireBuffer::new();
        // Every variant fits in MAX_WIRE_LEN; a failed write can only truncate.
        let _ = write!(wire, "{self}");
        wire
    }

    /// Decodes a single wire token.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for empty input, unknown tokens, out-of-range
    /// parameter values, or trailing bytes.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        if input.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if input.len() > MAX_WIRE_LEN {
            return Err(ProtocolError::TooLong { len: input.len() });
        }

        wire_command.parse(input).map_err(|err| ProtocolError::Malformed {
            offset: err.offset(),
        })
    }

    /// Returns `true` for parameter tokens.
    #[must_use]
    pub const fn is_parameter(&self) -> bool {
        matches!(self, OutboundCommand::Set { .. })
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundCommand::Motion(heading) => fmt::Display::fmt(heading, f),
            OutboundCommand::NeutralHorizontal => f.write_char('x'),
            OutboundCommand::NeutralVertical => f.write_char('y'),
            OutboundCommand::Set { kind, value } => write!(f, "{}:{value}", kind.wire_prefix()),
        }
    }
}

/// Decoder failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    Empty,
    TooLong { len: usize },
    Malformed { offset: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Empty => f.write_str("empty datagram"),
            ProtocolError::TooLong { len } => {
                write!(f, "datagram of {len} bytes exceeds {MAX_WIRE_LEN}")
            }
            ProtocolError::Malformed { offset } => write!(f, "malformed token at byte {offset}"),
        }
    }
}

impl core::error::Error for ProtocolError {}

fn wire_command(input: &mut &str) -> ModalResult<OutboundCommand> {
    alt((
        parameter(ParameterKind::Speed),
        parameter(ParameterKind::OffsetX),
        parameter(ParameterKind::OffsetY),
        'x'.value(OutboundCommand::NeutralHorizontal),
        'y'.value(OutboundCommand::NeutralVertical),
        heading.map(OutboundCommand::Motion),
    ))
    .parse_next(input)
}

fn parameter<'i>(
    kind: ParameterKind,
) -> impl Parser<&'i str, OutboundCommand, ErrMode<ContextError>> {
    preceded((kind.wire_prefix(), ':'), dec_uint)
        .verify_map(move |value: u16| kind.validate(value).ok())
        .map(move |value| OutboundCommand::Set { kind, value })
}

fn heading(input: &mut &str) -> ModalResult<Heading> {
    (
        opt(alt((
            'w'.value(VerticalDrive::Forward),
            's'.value(VerticalDrive::Back),
        ))),
        opt('a').map(|hit: Option<char>| hit.is_some()),
        opt('d').map(|hit: Option<char>| hit.is_some()),
    )
        .verify_map(|(vertical, left, right)| Heading::new(vertical, left, right))
        .parse_next(input)
}
