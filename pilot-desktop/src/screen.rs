use std::fmt::Display;
use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::debug;
use pilot_core::connectivity::LinkHealth;
use pilot_core::keys::Key;
use pilot_core::params::ParameterKind;
use pilot_core::transport::CommandSink;

use crate::session::Session;

const HELP: &str = "W/A/S/D move | -/= speed | [/] X offset | ,/. Y offset | Esc quit";

/// One rendered row of the status block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusLine {
    pub text: String,
    pub color: Option<Color>,
}

impl StatusLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }
}

/// Builds the status block for the current session state.
pub fn status_lines<S>(session: &Session<S>) -> Vec<StatusLine>
where
    S: CommandSink,
    S::Error: Display,
{
    let resolution = session.resolution();
    let status = session.status();
    let params = session.parameters();
    let history = session.history();

    let mut keys = String::from("Keys: ");
    let held = session.keys();
    for key in Key::ALL {
        let glyph = if held.is_pressed(key) {
            key.token().to_ascii_uppercase()
        } else {
            '.'
        };
        keys.push(glyph);
        keys.push(' ');
    }

    let mut last = String::from("Last TX: ");
    match history.latest() {
        Some(record) => {
            last.push_str(&format!("{} ({})", record.command, record.origin));
            if !record.delivered {
                last.push_str(" failed");
            }
        }
        None => last.push_str("none"),
    }
    last.push_str(&format!(
        " | total {} | failed {}",
        history.total(),
        history.failures()
    ));

    vec![
        StatusLine::plain("Servo pilot"),
        StatusLine {
            text: format!("{} -> {}", resolution.route, resolution.address),
            color: Some(health_color(resolution.route.health())),
        },
        StatusLine::plain(keys.trim_end()),
        StatusLine::plain(status.sent_line().to_string()),
        StatusLine {
            text: status.lock_line().to_string(),
            color: Some(Color::Yellow),
        },
        StatusLine::plain(status.countdown_line().to_string()),
        StatusLine::plain(params.label(ParameterKind::Speed).to_string()),
        StatusLine::plain(params.label(ParameterKind::OffsetX).to_string()),
        StatusLine::plain(params.label(ParameterKind::OffsetY).to_string()),
        StatusLine::plain(last),
        StatusLine::plain(HELP),
    ]
}

fn health_color(health: LinkHealth) -> Color {
    match health {
        LinkHealth::Good => Color::Green,
        LinkHealth::Degraded => Color::Yellow,
        LinkHealth::Failed => Color::Red,
    }
}

/// Raw-mode alternate screen; restores the terminal when dropped.
pub struct TerminalScreen {
    out: Stdout,
    enhanced: bool,
    last_frame: Vec<StatusLine>,
}

impl TerminalScreen {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

        let enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!("keyboard enhancement: {enhanced}");

        Ok(Self {
            out,
            enhanced,
            last_frame: Vec::new(),
        })
    }

    /// Whether key releases are reported. Windows consoles always report them.
    pub fn release_events(&self) -> bool {
        self.enhanced || cfg!(windows)
    }

    /// Redraws rows that changed since the previous frame.
    pub fn draw(&mut self, frame: Vec<StatusLine>) -> io::Result<()> {
        for (row, line) in frame.iter().enumerate() {
            if self.last_frame.get(row) == Some(line) {
                continue;
            }
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(self.out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
            match line.color {
                Some(color) => queue!(
                    self.out,
                    SetForegroundColor(color),
                    Print(&line.text),
                    ResetColor
                )?,
                None => queue!(self.out, Print(&line.text))?,
            }
        }
        self.out.flush()?;
        self.last_frame = frame;
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(self.out, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
