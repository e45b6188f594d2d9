//! Target address selection.
//!
//! The device is reachable either on the operator's home network or through its
//! own access point. [`resolve`] runs once before the tick loop: try home, else ask
//! the [`FallbackJoiner`] to join the access point and try the fallback address.
//! When neither answers the fallback address is still returned so commands keep
//! flowing; the failure only shows up in [`Route::status_text`].

use core::fmt;
use core::net::{IpAddr, Ipv4Addr, SocketAddr};

/// UDP port the device listens on.
pub const DEFAULT_PORT: u16 = 4210;
/// Address the device takes when joined to the home router.
pub const DEFAULT_HOME_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 68, 113));
/// Address the device serves from its own access point.
pub const DEFAULT_FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 1));

/// The two candidate destinations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Endpoints {
    pub home: SocketAddr,
    pub fallback: SocketAddr,
}

impl Endpoints {
    #[must_use]
    pub const fn new(home: SocketAddr, fallback: SocketAddr) -> Self {
        Self { home, fallback }
    }

    /// Builds both endpoints on a shared port.
    #[must_use]
    pub const fn on_port(home: IpAddr, fallback: IpAddr, port: u16) -> Self {
        Self::new(SocketAddr::new(home, port), SocketAddr::new(fallback, port))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::on_port(DEFAULT_HOME_IP, DEFAULT_FALLBACK_IP, DEFAULT_PORT)
    }
}

/// Which path the resolver settled on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Route {
    Home,
    AccessPoint,
    /// Nothing answered; the fallback address is used anyway.
    Unreachable,
}

/// Coarse health of the chosen route, used to colour the status line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkHealth {
    Good,
    Degraded,
    Failed,
}

impl Route {
    #[must_use]
    pub const fn status_text(self) -> &'static str {
        match self {
            Route::Home => "Using home network",
            Route::AccessPoint => "Using device access point",
            Route::Unreachable => "Device not found!",
        }
    }

    #[must_use]
    pub const fn health(self) -> LinkHealth {
        match self {
            Route::Home => LinkHealth::Good,
            Route::AccessPoint => LinkHealth::Degraded,
            Route::Unreachable => LinkHealth::Failed,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Address the transport should use plus how it was chosen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Resolution {
    pub address: SocketAddr,
    pub route: Route,
}

impl Resolution {
    /// Resolution that skips probing and trusts the home address.
    #[must_use]
    pub const fn assume_home(endpoints: &Endpoints) -> Self {
        Self {
            address: endpoints.home,
            route: Route::Home,
        }
    }
}

/// Result of [`resolve`], including a join failure if one occurred.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolutionReport<E> {
    pub resolution: Resolution,
    /// `None` when the join hook was not needed or succeeded.
    pub join_error: Option<E>,
}

/// Reachability check for a single address.
pub trait ReachabilityProbe {
    /// Returns `true` when `address` answered.
    fn probe(&mut self, address: SocketAddr) -> bool;
}

/// Hook that moves the host onto the device's access point.
pub trait FallbackJoiner {
    type Error;

    /// Attempts to join; blocks until the link has had time to settle.
    ///
    /// # Errors
    ///
    /// Returns the platform error when the join attempt failed outright.
    fn join(&mut self) -> Result<(), Self::Error>;
}

/// Joiner for setups where the host is already on the right network.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopJoiner;

impl FallbackJoiner for NoopJoiner {
    type Error = core::convert::Infallible;

    fn join(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Picks the target address: home first, then the access point after a join.
pub fn resolve<P, J>(
    endpoints: &Endpoints,
    probe: &mut P,
    joiner: &mut J,
) -> ResolutionReport<J::Error>
where
    P: ReachabilityProbe + ?Sized,
    J: FallbackJoiner + ?Sized,
{
    if probe.probe(endpoints.home) {
        return ResolutionReport {
            resolution: Resolution::assume_home(endpoints),
            join_error: None,
        };
    }

    let join_error = joiner.join().err();
    let route = if probe.probe(endpoints.fallback) {
        Route::AccessPoint
    } else {
        Route::Unreachable
    };

    ResolutionReport {
        resolution: Resolution {
            address: endpoints.fallback,
            route,
        },
        join_error,
    }
}
