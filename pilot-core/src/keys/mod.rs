//! Directional key model.
//!
//! A [`KeySet`] is one atomic snapshot of the four driving keys. The motion state
//! machine compares consecutive snapshots to decide whether anything changed, so the
//! type is a plain bit set with value semantics.

use core::fmt;

/// One of the four driving keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
}

/// Axis a key acts on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Key {
    /// Every key in wire order.
    pub const ALL: [Key; 4] = [Key::Forward, Key::Back, Key::Left, Key::Right];

    /// Wire token emitted for this key.
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Key::Forward => 'w',
            Key::Back => 's',
            Key::Left => 'a',
            Key::Right => 'd',
        }
    }

    /// Maps a keyboard character (case-insensitive) to a driving key.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'w' => Some(Key::Forward),
            's' => Some(Key::Back),
            'a' => Some(Key::Left),
            'd' => Some(Key::Right),
            _ => None,
        }
    }

    /// Returns the axis this key drives.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Key::Forward | Key::Back => Axis::Vertical,
            Key::Left | Key::Right => Axis::Horizontal,
        }
    }

    /// Stable index in `0..4`, matching [`Key::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Key::Forward => 0,
            Key::Back => 1,
            Key::Left => 2,
            Key::Right => 3,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Key::Forward => "forward",
            Key::Back => "back",
            Key::Left => "left",
            Key::Right => "right",
        };
        f.write_str(label)
    }
}

/// Pressed/released state for all four keys.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct KeySet {
    bits: u8,
}

impl KeySet {
    /// Snapshot with every key released.
    pub const EMPTY: KeySet = KeySet { bits: 0 };

    /// Builds a snapshot from a list of pressed keys.
    #[must_use]
    pub const fn from_keys(keys: &[Key]) -> Self {
        let mut set = Self::EMPTY;
        let mut index = 0;
        while index < keys.len() {
            set = set.with(keys[index]);
            index += 1;
        }
        set
    }

    /// Returns a copy with `key` pressed.
    #[must_use]
    pub const fn with(self, key: Key) -> Self {
        Self {
            bits: self.bits | key.bit(),
        }
    }

    /// Returns a copy with `key` released.
    #[must_use]
    pub const fn without(self, key: Key) -> Self {
        Self {
            bits: self.bits & !key.bit(),
        }
    }

    /// Updates a single key in place.
    pub fn set(&mut self, key: Key, pressed: bool) {
        *self = if pressed {
            self.with(key)
        } else {
            self.without(key)
        };
    }

    #[must_use]
    pub const fn is_pressed(self, key: Key) -> bool {
        self.bits & key.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Returns `true` when either key of `axis` is held.
    #[must_use]
    pub const fn any_on(self, axis: Axis) -> bool {
        match axis {
            Axis::Vertical => self.is_pressed(Key::Forward) || self.is_pressed(Key::Back),
            Axis::Horizontal => self.is_pressed(Key::Left) || self.is_pressed(Key::Right),
        }
    }

    /// Iterates over the pressed keys in wire order.
    pub fn pressed(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |key| self.is_pressed(*key))
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<T: IntoIterator<Item = Key>>(iter: T) -> Self {
        iter.into_iter().fold(KeySet::EMPTY, KeySet::with)
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for key in self.pressed() {
            fmt::Write::write_char(f, key.token().to_ascii_uppercase())?;
        }
        Ok(())
    }
}

/// Platform hook that reports the instantaneous key state once per tick.
pub trait KeySampler<Instant> {
    /// Returns the snapshot as observed at `now`.
    fn sample(&mut self, now: Instant) -> KeySet;
}
