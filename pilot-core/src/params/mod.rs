//! Bounded tuning parameters and their change dispatch.
//!
//! The desktop exposes three knobs: servo step delay and the X/Y angular offsets.
//! Values are clamped when they enter the store, so every [`Parameters`] value in
//! circulation is already in range. Every write yields a [`ParameterChange`], even
//! one that clamping leaves at its old value, and [`ParameterChange::commands`] is
//! the full `SPD`/`RNX`/`RNY` triple the device expects. Pressing `+` at the upper
//! bound therefore resynchronises the device.

use core::fmt;
use core::ops::RangeInclusive;

use crate::protocol::OutboundCommand;

/// Servo step delay bounds (milliseconds per degree).
pub const SPEED_RANGE: RangeInclusive<u8> = 1..=200;
/// Angular offset bounds (degrees), shared by both axes.
pub const OFFSET_RANGE: RangeInclusive<u8> = 0..=90;

pub const DEFAULT_SPEED: u8 = 10;
pub const DEFAULT_OFFSET: u8 = 30;

/// Identifies one of the three tunable parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParameterKind {
    Speed,
    OffsetX,
    OffsetY,
}

impl ParameterKind {
    /// Dispatch order on the wire.
    pub const ALL: [ParameterKind; 3] = [
        ParameterKind::Speed,
        ParameterKind::OffsetX,
        ParameterKind::OffsetY,
    ];

    #[must_use]
    pub const fn min(self) -> u8 {
        match self {
            ParameterKind::Speed => *SPEED_RANGE.start(),
            ParameterKind::OffsetX | ParameterKind::OffsetY => *OFFSET_RANGE.start(),
        }
    }

    #[must_use]
    pub const fn max(self) -> u8 {
        match self {
            ParameterKind::Speed => *SPEED_RANGE.end(),
            ParameterKind::OffsetX | ParameterKind::OffsetY => *OFFSET_RANGE.end(),
        }
    }

    #[must_use]
    pub const fn default_value(self) -> u8 {
        match self {
            ParameterKind::Speed => DEFAULT_SPEED,
            ParameterKind::OffsetX | ParameterKind::OffsetY => DEFAULT_OFFSET,
        }
    }

    /// Token prefix used on the wire (`SPD`, `RNX`, `RNY`).
    #[must_use]
    pub const fn wire_prefix(self) -> &'static str {
        match self {
            ParameterKind::Speed => "SPD",
            ParameterKind::OffsetX => "RNX",
            ParameterKind::OffsetY => "RNY",
        }
    }

    /// Clamps an arbitrary request into this parameter's bounds.
    #[must_use]
    pub fn clamp(self, requested: i32) -> u8 {
        let clamped = requested.clamp(i32::from(self.min()), i32::from(self.max()));
        u8::try_from(clamped).unwrap_or(self.max())
    }

    /// Accepts `value` only when it is already in range.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::OutOfRange`] when `value` falls outside the bounds.
    pub fn validate(self, value: u16) -> Result<u8, ParameterError> {
        u8::try_from(value)
            .ok()
            .filter(|value| (self.min()..=self.max()).contains(value))
            .ok_or(ParameterError::OutOfRange { kind: self, value })
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParameterKind::Speed => "speed",
            ParameterKind::OffsetX => "x-offset",
            ParameterKind::OffsetY => "y-offset",
        };
        f.write_str(label)
    }
}

/// Parameter validation errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParameterError {
    OutOfRange { kind: ParameterKind, value: u16 },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::OutOfRange { kind, value } => write!(
                f,
                "{kind} value {value} outside {}..={}",
                kind.min(),
                kind.max()
            ),
        }
    }
}

impl core::error::Error for ParameterError {}

/// Current values of all three parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Parameters {
    speed: u8,
    x_offset: u8,
    y_offset: u8,
}

impl Parameters {
    /// Builds a parameter set, clamping every value into range.
    #[must_use]
    pub fn clamped(speed: i32, x_offset: i32, y_offset: i32) -> Self {
        Self {
            speed: ParameterKind::Speed.clamp(speed),
            x_offset: ParameterKind::OffsetX.clamp(x_offset),
            y_offset: ParameterKind::OffsetY.clamp(y_offset),
        }
    }

    #[must_use]
    pub const fn speed(&self) -> u8 {
        self.speed
    }

    #[must_use]
    pub const fn x_offset(&self) -> u8 {
        self.x_offset
    }

    #[must_use]
    pub const fn y_offset(&self) -> u8 {
        self.y_offset
    }

    #[must_use]
    pub const fn get(&self, kind: ParameterKind) -> u8 {
        match kind {
            ParameterKind::Speed => self.speed,
            ParameterKind::OffsetX => self.x_offset,
            ParameterKind::OffsetY => self.y_offset,
        }
    }

    fn slot_mut(&mut self, kind: ParameterKind) -> &mut u8 {
        match kind {
            ParameterKind::Speed => &mut self.speed,
            ParameterKind::OffsetX => &mut self.x_offset,
            ParameterKind::OffsetY => &mut self.y_offset,
        }
    }

    /// Full `SPD`, `RNX`, `RNY` triple for the current values.
    #[must_use]
    pub fn commands(&self) -> [OutboundCommand; 3] {
        ParameterKind::ALL.map(|kind| OutboundCommand::Set {
            kind,
            value: self.get(kind),
        })
    }

    /// Display label for one parameter, e.g. `Speed: 10 ms/°`.
    #[must_use]
    pub const fn label(&self, kind: ParameterKind) -> ParameterLabel {
        ParameterLabel {
            kind,
            value: self.get(kind),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            x_offset: DEFAULT_OFFSET,
            y_offset: DEFAULT_OFFSET,
        }
    }
}

/// Human-readable rendering of a single parameter value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParameterLabel {
    kind: ParameterKind,
    value: u8,
}

impl fmt::Display for ParameterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::Speed => write!(f, "Speed: {} ms/°", self.value),
            ParameterKind::OffsetX => write!(f, "X Offset: {}°", self.value),
            ParameterKind::OffsetY => write!(f, "Y Offset: {}°", self.value),
        }
    }
}

/// Notification emitted synchronously after every parameter write.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParameterChange {
    pub kind: ParameterKind,
    pub previous: u8,
    /// Snapshot of all three values after the change.
    pub parameters: Parameters,
}

impl ParameterChange {
    /// Commands to hand to the transport, in dispatch order.
    #[must_use]
    pub fn commands(&self) -> [OutboundCommand; 3] {
        self.parameters.commands()
    }

    #[must_use]
    pub const fn current(&self) -> u8 {
        self.parameters.get(self.kind)
    }

    /// Whether the write moved the value, as opposed to being clamped in place.
    #[must_use]
    pub const fn is_effective(&self) -> bool {
        self.previous != self.current()
    }
}

/// Owns the parameter values and reports every write.
#[derive(Copy, Clone, Debug, Default)]
pub struct ParameterStore {
    values: Parameters,
}

impl ParameterStore {
    #[must_use]
    pub const fn new(values: Parameters) -> Self {
        Self { values }
    }

    #[must_use]
    pub const fn parameters(&self) -> Parameters {
        self.values
    }

    #[must_use]
    pub const fn get(&self, kind: ParameterKind) -> u8 {
        self.values.get(kind)
    }

    /// Nudges a parameter by `delta`, as the +/- controls do.
    pub fn step(&mut self, kind: ParameterKind, delta: i32) -> ParameterChange {
        let target = i32::from(self.get(kind)).saturating_add(delta);
        self.set(kind, target)
    }

    /// Sets a parameter to `requested`, clamped into range.
    pub fn set(&mut self, kind: ParameterKind, requested: i32) -> ParameterChange {
        let next = kind.clamp(requested);
        let previous = core::mem::replace(self.values.slot_mut(kind), next);
        ParameterChange {
            kind,
            previous,
            parameters: self.values,
        }
    }
}
