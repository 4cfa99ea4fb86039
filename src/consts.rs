//! Constants used across the payload codec.
//!
//! This module defines the protocol-wide numbers that the port table, the
//! field codec and the payload buffer all have to agree on: the reserved
//! ERROR port number, the sentinel bytes that mark a missing reading, and the
//! capacity of the payload buffer handed to the radio stack.
//!
//! ## Key Concepts
//!
//! - **Ports**: the LoRaWAN FPort carries the payload "shape". Port `255` is
//!   never transmitted; it marks a failed lookup.
//! - **Sentinels**: an invalid reading is encoded as a run of `0x7F` (signed
//!   fields) or `0xFF` (unsigned fields) instead of a scaled value.
//! - **Buffer Sizing**: every payload must fit into the application buffer of
//!   the LoRaWAN stack.
//! - **Current Sensor**: calibration constants for the Hall-effect current
//!   transformer read through the analog front end.

/// Port number of the ERROR schema returned for unregistered ports.
pub const PORT_ERROR_NUMBER: u8 = u8::MAX;

/// Port number given to schemas produced by combining two ports.
///
/// A combined schema is never registered or transmitted.
pub const PORT_COMBINED_NUMBER: u8 = 0;

/// Capacity (in bytes) of a [`PayloadBuffer`](crate::payload::PayloadBuffer).
///
/// Matches the application data buffer of the LoRaWAN stack; the largest
/// registered port needs far less than this.
pub const PAYLOAD_BUFFER_SIZE: usize = 64;

/// Maximum number of sub-values a single field can be split into.
pub const MAX_SUB_VALUES: usize = 2;

/// Byte repeated across a signed field to mark it as invalid.
///
/// `0xFF` repeated is a valid (very negative) two's-complement value, so signed
/// fields use `0x7F` instead.
pub const SIGNED_SENTINEL: u8 = 0x7F;

/// Byte repeated across an unsigned field to mark it as invalid.
pub const UNSIGNED_SENTINEL: u8 = 0xFF;

/// Default interval (in milliseconds) between two uplinks.
pub const DEFAULT_APP_INTERVAL_MS: u32 = 30_000;

/// Default number of ADC samples averaged into one reading.
pub const DEFAULT_SAMPLES_PER_READING: u16 = 32;

/// Number of ADC samples averaged into one current reading.
pub const CURRENT_SAMPLES_PER_READING: u16 = 2_000;

/// Output of the current transformer (in mV) at zero current.
pub const CURRENT_MIDPOINT_MV: f32 = 2_500.0;

/// Sensitivity of the current transformer.
///
/// A 20 A transformer swinging ±625 mV gives 625 / 20 = 31.25 mV/A.
pub const CURRENT_MV_PER_AMP: f32 = 31.25;

/// Compensation factor of the battery voltage divider.
pub const BATTERY_COMPENSATION_FACTOR: f32 = 1.73;

/// Compensation factor of the current sensor input divider (`1 / 0.6`).
pub const CURRENT_COMPENSATION_FACTOR: f32 = 1.0 / 0.6;
