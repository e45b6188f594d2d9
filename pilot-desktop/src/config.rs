use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pilot_core::connectivity::{
    DEFAULT_FALLBACK_IP, DEFAULT_HOME_IP, DEFAULT_PORT, Endpoints,
};
use pilot_core::params::{DEFAULT_OFFSET, DEFAULT_SPEED, ParameterKind};

#[cfg(windows)]
const DEFAULT_PROBE_CMD: &str = "ping -n 1 -w 3000 {ip}";
#[cfg(not(windows))]
const DEFAULT_PROBE_CMD: &str = "ping -c 1 -W 3 {ip}";

/// Keyboard pilot for the dual-axis servo rig.
#[derive(Debug, Parser)]
#[command(name = "pilot", version)]
pub struct Cli {
    #[command(flatten)]
    pub link: LinkArgs,

    #[command(flatten)]
    pub drive: DriveArgs,

    /// Transcript file for every datagram and lock transition.
    #[arg(long, env = "PILOT_TRANSCRIPT", default_value = "pilot-transcript.log")]
    pub transcript: PathBuf,

    /// Do not write a transcript.
    #[arg(long, env = "PILOT_NO_TRANSCRIPT")]
    pub no_transcript: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Listen like the device and print every decoded datagram.
    Monitor(MonitorArgs),
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Address to bind the listener to.
    #[arg(long, env = "PILOT_MONITOR_BIND", default_value = "0.0.0.0:4210")]
    pub bind: SocketAddr,
}

/// Where the device lives and how to reach it.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Device address on the home network.
    #[arg(long, env = "PILOT_HOME", default_value_t = DEFAULT_HOME_IP)]
    pub home: IpAddr,

    /// Device address on its own access point.
    #[arg(long, env = "PILOT_FALLBACK", default_value_t = DEFAULT_FALLBACK_IP)]
    pub fallback: IpAddr,

    /// UDP port the device listens on.
    #[arg(long, env = "PILOT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Reachability check; `{ip}` is replaced by the candidate address.
    #[arg(long, env = "PILOT_PROBE_CMD", default_value = DEFAULT_PROBE_CMD)]
    pub probe_cmd: String,

    /// Command that joins the device access point,
    /// e.g. `netsh wlan connect name=ESP32_Controller`.
    #[arg(long, env = "PILOT_JOIN_CMD")]
    pub join_cmd: Option<String>,

    /// Wait after joining before probing the fallback address, in milliseconds.
    #[arg(long, env = "PILOT_SETTLE_MS", default_value_t = 5_000)]
    pub settle_ms: u64,

    /// Skip probing and send to the home address.
    #[arg(long, env = "PILOT_SKIP_RESOLVE")]
    pub skip_resolve: bool,
}

impl LinkArgs {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::on_port(self.home, self.fallback, self.port)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Tick cadence, key handling, and the initial servo parameters.
#[derive(Debug, Args)]
pub struct DriveArgs {
    /// Tick period in milliseconds.
    #[arg(long, env = "PILOT_TICK_MS", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// How long a key counts as held after its last press or repeat when the
    /// terminal does not report releases, in milliseconds.
    #[arg(long, env = "PILOT_HOLD_MS", default_value_t = 550)]
    pub hold_ms: u64,

    /// Servo step delay sent at startup when it differs from the device default.
    #[arg(long, env = "PILOT_SPEED", default_value_t = DEFAULT_SPEED,
          value_parser = clap::value_parser!(u8).range(1..=200))]
    pub speed: u8,

    /// X offset sent at startup when it differs from the device default.
    #[arg(long, env = "PILOT_X_OFFSET", default_value_t = DEFAULT_OFFSET,
          value_parser = clap::value_parser!(u8).range(0..=90))]
    pub x_offset: u8,

    /// Y offset sent at startup when it differs from the device default.
    #[arg(long, env = "PILOT_Y_OFFSET", default_value_t = DEFAULT_OFFSET,
          value_parser = clap::value_parser!(u8).range(0..=90))]
    pub y_offset: u8,
}

impl DriveArgs {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn hold_window(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Requested startup values, in dispatch order.
    pub fn initial_parameters(&self) -> [(ParameterKind, u8); 3] {
        [
            (ParameterKind::Speed, self.speed),
            (ParameterKind::OffsetX, self.x_offset),
            (ParameterKind::OffsetY, self.y_offset),
        ]
    }
}

impl Cli {
    pub fn transcript_path(&self) -> Option<&Path> {
        (!self.no_transcript).then_some(self.transcript.as_path())
    }
}
