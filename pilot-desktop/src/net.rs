use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use pilot_core::connectivity::{FallbackJoiner, ReachabilityProbe};
use pilot_core::protocol::OutboundCommand;
use pilot_core::transport::CommandSink;

/// Fire-and-forget UDP transport towards the resolved device address.
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Binds an ephemeral local port in the target's address family.
    pub fn connect(target: SocketAddr) -> io::Result<Self> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local)?;
        info!(
            "UDP transport bound to {} targeting {target}",
            socket.local_addr()?
        );
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl CommandSink for UdpTransport {
    type Error = io::Error;

    fn send(&mut self, command: &OutboundCommand) -> io::Result<()> {
        let wire = command.encode();
        self.socket.send_to(wire.as_bytes(), self.target)?;
        debug!("sent {wire} to {}", self.target);
        Ok(())
    }
}

/// External command line split into program and arguments, with `{ip}` and
/// `{port}` placeholders.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Splits `line` on whitespace. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_owned);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    fn command_for(&self, address: Option<SocketAddr>) -> Command {
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            match address {
                Some(address) => command.arg(
                    arg.replace("{ip}", &address.ip().to_string())
                        .replace("{port}", &address.port().to_string()),
                ),
                None => command.arg(arg),
            };
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    fn run(&self, address: Option<SocketAddr>) -> io::Result<()> {
        let status = self.command_for(address).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("`{}` exited with {status}", self.program)))
        }
    }
}

/// Reachability check that runs an external command, `ping` by default.
#[derive(Clone, Debug)]
pub struct CommandProbe {
    template: CommandTemplate,
}

impl CommandProbe {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

impl ReachabilityProbe for CommandProbe {
    fn probe(&mut self, address: SocketAddr) -> bool {
        match self.template.run(Some(address)) {
            Ok(()) => {
                debug!("{address} answered");
                true
            }
            Err(err) => {
                debug!("{address} did not answer: {err}");
                false
            }
        }
    }
}

/// Joins the device access point with an optional external command, then waits
/// for the link to settle.
#[derive(Clone, Debug)]
pub struct CommandJoiner {
    template: Option<CommandTemplate>,
    settle: Duration,
}

impl CommandJoiner {
    pub fn new(template: Option<CommandTemplate>, settle: Duration) -> Self {
        Self { template, settle }
    }
}

impl FallbackJoiner for CommandJoiner {
    type Error = io::Error;

    fn join(&mut self) -> io::Result<()> {
        let Some(template) = &self.template else {
            debug!("no join command configured");
            return Ok(());
        };

        info!("joining device access point");
        let outcome = template.run(None);
        if let Err(err) = &outcome {
            warn!("join command failed: {err}");
        }
        thread::sleep(self.settle);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_address_placeholders() {
        let template = CommandTemplate::parse("ping -c 1 -W 3 {ip}").expect("non-empty");
        let address: SocketAddr = "192.168.4.1:4210".parse().expect("addr");
        let command = template.command_for(Some(address));

        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "ping");
        assert_eq!(args, ["-c", "1", "-W", "3", "192.168.4.1"]);
    }

    #[test]
    fn blank_template_is_rejected() {
        assert_eq!(CommandTemplate::parse("   "), None);
    }

    #[test]
    fn missing_program_reads_as_unreachable() {
        let template = CommandTemplate::parse("pilot-probe-that-does-not-exist {ip}")
            .expect("non-empty");
        let mut probe = CommandProbe::new(template);
        assert!(!probe.probe("127.0.0.1:4210".parse().expect("addr")));
    }

    #[test]
    fn udp_transport_delivers_wire_tokens() {
        let listener = UdpSocket::bind("127.0.0.1:0").expect("bind listener");
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout");
        let mut transport =
            UdpTransport::connect(listener.local_addr().expect("addr")).expect("transport");

        transport
            .send(&OutboundCommand::NeutralHorizontal)
            .expect("send");

        let mut buf = [0u8; 16];
        let (len, _) = listener.recv_from(&mut buf).expect("datagram");
        assert_eq!(&buf[..len], b"x");
    }
}
