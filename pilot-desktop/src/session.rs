use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use pilot_core::connectivity::Resolution;
use pilot_core::keys::KeySet;
use pilot_core::lock::{LockTiming, LockTransition};
use pilot_core::motion::{MotionStateMachine, TickReport};
use pilot_core::params::{ParameterChange, ParameterKind, ParameterStore, Parameters};
use pilot_core::protocol::OutboundCommand;
use pilot_core::status::MotionStatus;
use pilot_core::telemetry::{CommandOrigin, TransmitLog};
use pilot_core::transport::CommandSink;

use crate::transcript::{TranscriptLogger, TranscriptRole};

/// One operator session: the state machine, parameters, and the transport they feed.
///
/// Every outbound datagram passes through one dispatch path that records it in
/// the transmit history and the transcript. Neither transport nor transcript
/// failures stop the session: the first transcript write error is logged and
/// the transcript is closed for the rest of the run.
pub struct Session<S, W = BufWriter<File>>
where
    S: CommandSink,
    W: Write,
{
    machine: MotionStateMachine<Instant>,
    params: ParameterStore,
    status: MotionStatus,
    history: TransmitLog<Instant>,
    transcript: Option<TranscriptLogger<W>>,
    sink: S,
    resolution: Resolution,
    started_at: Instant,
}

impl<S> Session<S>
where
    S: CommandSink,
    S::Error: Display,
{
    pub fn new(sink: S, resolution: Resolution, started_at: Instant) -> Self {
        Self {
            machine: MotionStateMachine::default(),
            params: ParameterStore::default(),
            status: MotionStatus::new(),
            history: TransmitLog::new(),
            transcript: None,
            sink,
            resolution,
            started_at,
        }
    }
}

impl<S, W> Session<S, W>
where
    S: CommandSink,
    S::Error: Display,
    W: Write,
{
    #[must_use]
    pub fn with_timing(mut self, timing: LockTiming) -> Self {
        self.machine = MotionStateMachine::new(timing);
        self
    }

    /// Attaches a transcript and notes the resolved target as its first entry.
    pub fn with_transcript<T: Write>(self, transcript: TranscriptLogger<T>) -> Session<S, T> {
        let mut session = Session {
            machine: self.machine,
            params: self.params,
            status: self.status,
            history: self.history,
            transcript: Some(transcript),
            sink: self.sink,
            resolution: self.resolution,
            started_at: self.started_at,
        };
        let note = format!(
            "target {} ({})",
            session.resolution.address, session.resolution.route
        );
        session.record(Duration::ZERO, TranscriptRole::Network, &note);
        session
    }

    /// Runs one tick for `keys` sampled at `now` and sends whatever it produced.
    pub fn tick(&mut self, keys: KeySet, now: Instant) -> TickReport {
        let report = self.machine.tick(keys, now);
        self.status.apply(&report);

        for command in &report.commands {
            self.dispatch(*command, CommandOrigin::Tick, now);
        }
        if let Some(transition) = report.transition {
            self.note_transition(transition, now);
        }

        report
    }

    /// Nudges a parameter and sends the full triple, even when pinned at a bound.
    pub fn adjust(&mut self, kind: ParameterKind, delta: i32, now: Instant) -> ParameterChange {
        let change = self.params.step(kind, delta);
        self.apply_change(change, now)
    }

    /// Sets a parameter outright and sends the full triple.
    pub fn set_parameter(&mut self, kind: ParameterKind, value: i32, now: Instant) -> ParameterChange {
        let change = self.params.set(kind, value);
        self.apply_change(change, now)
    }

    pub fn status(&self) -> &MotionStatus {
        &self.status
    }

    pub fn parameters(&self) -> Parameters {
        self.params.parameters()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn history(&self) -> &TransmitLog<Instant> {
        &self.history
    }

    pub fn keys(&self) -> KeySet {
        self.machine.keys()
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[cfg(test)]
    pub fn has_transcript(&self) -> bool {
        self.transcript.is_some()
    }

    fn apply_change(&mut self, change: ParameterChange, now: Instant) -> ParameterChange {
        for command in change.commands() {
            self.dispatch(command, CommandOrigin::Parameters, now);
        }

        let line = format!("{} {} -> {}", change.kind, change.previous, change.current());
        if change.is_effective() {
            info!("{line}");
        } else {
            debug!("{line} (clamped, resent)");
        }
        self.record(self.elapsed(now), TranscriptRole::Parameter, &line);
        change
    }

    fn note_transition(&mut self, transition: LockTransition, now: Instant) {
        match transition {
            LockTransition::Acquired | LockTransition::Released => info!("lock {transition}"),
            LockTransition::Armed | LockTransition::Disarmed => debug!("lock {transition}"),
        }
        self.record(
            self.elapsed(now),
            TranscriptRole::Lock,
            &transition.to_string(),
        );
    }

    fn dispatch(&mut self, command: OutboundCommand, origin: CommandOrigin, now: Instant) {
        let delivered = match self.sink.send(&command) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "failed to send {command} to {}: {err}",
                    self.resolution.address
                );
                false
            }
        };
        self.history.record(command, origin, delivered, now);

        let line = if delivered {
            format!("{command} ({origin})")
        } else {
            format!("{command} ({origin}) send failed")
        };
        self.record(self.elapsed(now), TranscriptRole::Transmit, &line);
    }

    fn record(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) {
        let Some(transcript) = self.transcript.as_mut() else {
            return;
        };
        if let Err(err) = transcript.append_line(elapsed, role, line) {
            warn!("transcript write failed, closing transcript: {err}");
            self.transcript = None;
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}
