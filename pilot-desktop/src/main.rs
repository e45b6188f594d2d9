mod config;
mod input;
mod monitor;
mod net;
mod screen;
mod session;
mod transcript;

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::event;
use log::{error, info, warn};
use pilot_core::connectivity::{LinkHealth, Resolution, resolve};
use pilot_core::keys::KeySampler;

use config::{Cli, Command};
use input::{InputAction, TerminalKeys};
use net::{CommandJoiner, CommandProbe, CommandTemplate, UdpTransport};
use screen::{TerminalScreen, status_lines};
use session::Session;
use transcript::TranscriptLogger;

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match &cli.command {
        Some(Command::Monitor(args)) => monitor::run(args.bind),
        None => drive(&cli),
    }
}

fn drive(cli: &Cli) -> Result<()> {
    let resolution = resolve_target(cli)?;
    let transport = UdpTransport::connect(resolution.address)
        .with_context(|| format!("failed to open UDP socket for {}", resolution.address))?;
    info!("sending to {}", transport.target());

    let started_at = Instant::now();
    let mut session = Session::new(transport, resolution, started_at);
    if let Some(path) = cli.transcript_path() {
        let transcript = TranscriptLogger::create(path, "Servo pilot transcript")
            .with_context(|| format!("failed to create transcript {}", path.display()))?;
        session = session.with_transcript(transcript);
    }

    for (kind, value) in cli.drive.initial_parameters() {
        if value != session.parameters().get(kind) {
            session.set_parameter(kind, i32::from(value), started_at);
        }
    }

    let mut screen = TerminalScreen::enter().context("failed to prepare terminal")?;
    let mut keys = TerminalKeys::new(cli.drive.hold_window(), screen.release_events());
    let outcome = run_loop(&mut session, &mut screen, &mut keys, cli.drive.tick_period());
    drop(screen);

    let history = session.history();
    info!(
        "session closed: {} datagrams, {} failed",
        history.total(),
        history.failures()
    );
    outcome.context("session aborted")
}

fn resolve_target(cli: &Cli) -> Result<Resolution> {
    let endpoints = cli.link.endpoints();
    if cli.link.skip_resolve {
        info!("skipping resolution; using {}", endpoints.home);
        return Ok(Resolution::assume_home(&endpoints));
    }

    let probe = CommandTemplate::parse(&cli.link.probe_cmd)
        .ok_or_else(|| anyhow!("probe command is empty"))?;
    let join = cli.link.join_cmd.as_deref().and_then(CommandTemplate::parse);

    let mut probe = CommandProbe::new(probe);
    let mut joiner = CommandJoiner::new(join, cli.link.settle());
    let report = resolve(&endpoints, &mut probe, &mut joiner);

    if let Some(err) = report.join_error {
        warn!("could not join device access point: {err}");
    }
    let resolution = report.resolution;
    match resolution.route.health() {
        LinkHealth::Good | LinkHealth::Degraded => {
            info!("{} ({})", resolution.route, resolution.address);
        }
        LinkHealth::Failed => {
            error!("{} Sending to {} anyway", resolution.route, resolution.address);
        }
    }
    Ok(resolution)
}

fn run_loop(
    session: &mut Session<UdpTransport>,
    screen: &mut TerminalScreen,
    keys: &mut TerminalKeys,
    period: Duration,
) -> io::Result<()> {
    screen.draw(status_lines(session))?;
    let mut next_tick = Instant::now() + period;

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            let now = Instant::now();
            match keys.handle(&event::read()?, now) {
                Some(InputAction::Quit) => return Ok(()),
                Some(InputAction::Adjust { kind, delta }) => {
                    session.adjust(kind, delta, now);
                    screen.draw(status_lines(session))?;
                }
                None => {}
            }
            continue;
        }

        let now = Instant::now();
        session.tick(keys.sample(now), now);
        screen.draw(status_lines(session))?;

        next_tick += period;
        if next_tick <= now {
            next_tick = now + period;
        }
    }
}
