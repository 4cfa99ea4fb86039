//! Application-level telemetry configuration.
//!
//! Holds the ports this node sends on and how often, and derives the set of
//! sensors that have to be brought up at boot.

use crate::consts::{DEFAULT_APP_INTERVAL_MS, DEFAULT_SAMPLES_PER_READING};
use crate::error::CodecError;
use crate::port::{PortSchema, get_port};
use crate::sensor::SensorKind;

/// Which ports to send on, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TelemetryConfig<'a> {
    /// Ports used by the application, in the order they are cycled through.
    pub ports: &'a [u8],
    /// Milliseconds between two uplinks.
    pub app_interval_ms: u32,
    /// ADC samples averaged into one analog reading.
    pub samples_per_reading: u16,
}

impl<'a> TelemetryConfig<'a> {
    /// A configuration for `ports` with default timing.
    pub const fn new(ports: &'a [u8]) -> Self {
        Self {
            ports,
            app_interval_ms: DEFAULT_APP_INTERVAL_MS,
            samples_per_reading: DEFAULT_SAMPLES_PER_READING,
        }
    }

    /// Checks that every configured port is registered.
    pub fn validate(&self) -> Result<(), CodecError> {
        match self.ports.iter().find(|&&port| get_port(port).is_error()) {
            Some(&port) => Err(CodecError::UnregisteredPort(port)),
            None => Ok(()),
        }
    }

    /// Union of every configured port's fields (port number 0).
    ///
    /// Unregistered ports contribute nothing.
    pub fn required_sensors(&self) -> PortSchema {
        self.ports.iter().map(|&port| get_port(port)).sum()
    }

    /// Whether any configured port needs `kind`.
    pub fn requires(&self, kind: SensorKind) -> bool {
        self.required_sensors().includes(kind)
    }

    /// The port to use for the `cycle`-th uplink, cycling through `ports`.
    pub fn port_for_cycle(&self, cycle: usize) -> Option<u8> {
        if self.ports.is_empty() {
            return None;
        }
        Some(self.ports[cycle % self.ports.len()])
    }
}
