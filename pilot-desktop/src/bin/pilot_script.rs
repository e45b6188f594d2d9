use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

#[allow(dead_code)]
#[path = "../transcript.rs"]
mod transcript;

use pilot_core::connectivity::{Endpoints, Resolution};
use pilot_core::keys::{Key, KeySet};
use pilot_core::params::ParameterKind;
use pilot_core::transport::NoopSink;

use session::Session;
use transcript::TranscriptLogger;

const TICK_MS: u64 = 50;

enum Action {
    Keys(&'static [Key]),
    Adjust(ParameterKind, i32),
}

struct Step {
    at_ms: u64,
    action: Action,
}

const fn keys(at_ms: u64, pressed: &'static [Key]) -> Step {
    Step {
        at_ms,
        action: Action::Keys(pressed),
    }
}

const fn adjust(at_ms: u64, kind: ParameterKind, delta: i32) -> Step {
    Step {
        at_ms,
        action: Action::Adjust(kind, delta),
    }
}

struct Scenario {
    name: &'static str,
    title: &'static str,
    until_ms: u64,
    steps: &'static [Step],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "lock-gesture",
        title: "Forward lock, lateral steering, and release",
        until_ms: 8_000,
        steps: &[
            keys(0, &[Key::Forward]),
            keys(5_100, &[]),
            keys(5_200, &[Key::Left]),
            keys(6_000, &[]),
            keys(6_500, &[Key::Back]),
            keys(6_600, &[]),
        ],
    },
    Scenario {
        name: "conflicts",
        title: "Opposing keys cancel per axis",
        until_ms: 1_000,
        steps: &[
            keys(0, &[Key::Forward, Key::Back]),
            keys(200, &[Key::Forward, Key::Back, Key::Right]),
            keys(400, &[Key::Left, Key::Right]),
            keys(600, &[Key::Back, Key::Left, Key::Right]),
            keys(800, &[]),
        ],
    },
    Scenario {
        name: "parameters",
        title: "Parameter triples on every change",
        until_ms: 600,
        steps: &[
            adjust(0, ParameterKind::Speed, 1),
            adjust(100, ParameterKind::OffsetX, 5),
            adjust(200, ParameterKind::OffsetY, -40),
            adjust(300, ParameterKind::OffsetY, -1),
            keys(400, &[Key::Right]),
            keys(500, &[]),
        ],
    },
];

fn main() -> io::Result<()> {
    let dir = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("transcripts"), PathBuf::from);

    for scenario in SCENARIOS {
        let path = dir.join(format!("{}.log", scenario.name));
        let sent = replay(scenario, &path)?;
        println!("{:<14} {sent:>3} datagrams -> {}", scenario.name, path.display());
    }
    Ok(())
}

/// Replays a scenario on a synthetic clock and returns the datagram count.
fn replay(scenario: &Scenario, path: &Path) -> io::Result<u32> {
    let origin = Instant::now();
    let at = |millis: u64| origin + Duration::from_millis(millis);

    let transcript = TranscriptLogger::create(path, scenario.title)?;
    let resolution = Resolution::assume_home(&Endpoints::default());
    let mut session =
        Session::new(NoopSink::new(), resolution, origin).with_transcript(transcript);

    let mut held = KeySet::EMPTY;
    let mut steps = scenario.steps.iter().peekable();
    let mut now_ms = 0;

    while now_ms <= scenario.until_ms {
        while let Some(step) = steps.next_if(|step| step.at_ms <= now_ms) {
            match step.action {
                Action::Keys(pressed) => held = KeySet::from_keys(pressed),
                Action::Adjust(kind, delta) => {
                    session.adjust(kind, delta, at(step.at_ms));
                }
            }
        }

        session.tick(held, at(now_ms));
        now_ms += TICK_MS;
    }

    Ok(session.history().total())
}
