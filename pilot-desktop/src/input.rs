use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pilot_core::keys::{Key, KeySampler, KeySet};
use pilot_core::params::ParameterKind;

/// Something the operator asked for other than movement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputAction {
    Adjust { kind: ParameterKind, delta: i32 },
    Quit,
}

/// Turns terminal key events into per-tick [`KeySet`] snapshots.
///
/// With keyboard enhancement the terminal reports releases and a key stays held
/// until its release arrives. Without it only presses and auto-repeats are seen,
/// so a key counts as held for `hold_window` after the last of them.
#[derive(Debug)]
pub struct TerminalKeys {
    hold_window: Duration,
    release_events: bool,
    last_seen: [Option<Instant>; 4],
}

impl TerminalKeys {
    pub fn new(hold_window: Duration, release_events: bool) -> Self {
        Self {
            hold_window,
            release_events,
            last_seen: [None; 4],
        }
    }

    /// Feeds one terminal event; returns an action for non-movement keys.
    pub fn handle(&mut self, event: &Event, now: Instant) -> Option<InputAction> {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::FocusLost => {
                self.last_seen = [None; 4];
                None
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> Option<InputAction> {
        let pressed = matches!(event.kind, KeyEventKind::Press | KeyEventKind::Repeat);

        if let KeyCode::Char(ch) = event.code {
            if event.modifiers.contains(KeyModifiers::CONTROL) {
                return (pressed && ch.eq_ignore_ascii_case(&'c')).then_some(InputAction::Quit);
            }
            if let Some(key) = Key::from_char(ch) {
                self.last_seen[key.index()] = pressed.then_some(now);
                return None;
            }
        }

        if !pressed {
            return None;
        }

        let (kind, delta) = match event.code {
            KeyCode::Esc | KeyCode::Char('q' | 'Q') => return Some(InputAction::Quit),
            KeyCode::Char('-' | '_') => (ParameterKind::Speed, -1),
            KeyCode::Char('=' | '+') => (ParameterKind::Speed, 1),
            KeyCode::Char('[' | '{') => (ParameterKind::OffsetX, -1),
            KeyCode::Char(']' | '}') => (ParameterKind::OffsetX, 1),
            KeyCode::Char(',' | '<') => (ParameterKind::OffsetY, -1),
            KeyCode::Char('.' | '>') => (ParameterKind::OffsetY, 1),
            _ => return None,
        };
        Some(InputAction::Adjust { kind, delta })
    }

    fn is_held(&self, seen: Instant, now: Instant) -> bool {
        self.release_events || now.saturating_duration_since(seen) < self.hold_window
    }
}

impl KeySampler<Instant> for TerminalKeys {
    fn sample(&mut self, now: Instant) -> KeySet {
        let mut keys = KeySet::EMPTY;
        for key in Key::ALL {
            let Some(seen) = self.last_seen[key.index()] else {
                continue;
            };
            if self.is_held(seen, now) {
                keys.set(key, true);
            } else {
                self.last_seen[key.index()] = None;
            }
        }
        keys
    }
}
