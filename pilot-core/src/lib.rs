#![no_std]

#[cfg(feature = "std")]
extern crate std;

// Shared logic for the keyboard pilot.
//
// Everything that decides *what* goes on the wire lives here without touching the
// standard library, so the desktop front-end and the test suites drive the exact
// same state machine.

pub mod clock;
pub mod connectivity;
pub mod keys;
pub mod lock;
pub mod motion;
pub mod params;
pub mod protocol;
pub mod status;
pub mod telemetry;
pub mod transport;
