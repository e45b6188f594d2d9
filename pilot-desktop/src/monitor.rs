use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use pilot_core::params::{ParameterKind, Parameters};
use pilot_core::protocol::{MAX_WIRE_LEN, OutboundCommand};

/// Decodes one datagram payload.
pub fn decode(payload: &[u8]) -> Result<OutboundCommand> {
    let text = std::str::from_utf8(payload).context("datagram is not UTF-8")?;
    OutboundCommand::parse(text).with_context(|| format!("unrecognised token {text:?}"))
}

/// Device-side view of the parameters, rebuilt from `SPD`/`RNX`/`RNY` tokens.
#[derive(Debug, Default)]
struct DeviceModel {
    parameters: Parameters,
}

impl DeviceModel {
    fn apply(&mut self, command: OutboundCommand) -> Option<Parameters> {
        let OutboundCommand::Set { kind, value } = command else {
            return None;
        };
        let current = self.parameters;
        self.parameters = Parameters::clamped(
            merged(current, kind, value, ParameterKind::Speed),
            merged(current, kind, value, ParameterKind::OffsetX),
            merged(current, kind, value, ParameterKind::OffsetY),
        );
        Some(self.parameters)
    }
}

fn merged(current: Parameters, kind: ParameterKind, value: u8, slot: ParameterKind) -> i32 {
    i32::from(if kind == slot { value } else { current.get(slot) })
}

/// Listens on `bind` and prints every datagram until the process is stopped.
pub fn run(bind: SocketAddr) -> Result<()> {
    let socket =
        UdpSocket::bind(bind).with_context(|| format!("failed to bind monitor to {bind}"))?;
    let local = socket.local_addr()?;
    info!("monitor listening on {local}");
    println!("Listening on {local}; Ctrl-C to stop.");

    let started_at = Instant::now();
    let mut device = DeviceModel::default();
    let mut buf = [0u8; 64];

    loop {
        let (len, from) = socket
            .recv_from(&mut buf)
            .context("monitor receive failed")?;
        let elapsed = started_at.elapsed().as_millis();
        let payload = &buf[..len];

        if len > MAX_WIRE_LEN {
            warn!("{len}-byte datagram from {from} exceeds token length");
        }

        match decode(payload) {
            Ok(command) => {
                println!("[+{elapsed:>6} ms] {from} {command}");
                if let Some(parameters) = device.apply(command) {
                    println!(
                        "             {} | {} | {}",
                        parameters.label(ParameterKind::Speed),
                        parameters.label(ParameterKind::OffsetX),
                        parameters.label(ParameterKind::OffsetY)
                    );
                }
            }
            Err(err) => warn!("{from}: {err:#}"),
        }
    }
}
