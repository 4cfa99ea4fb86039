//! # loraport
//!
//! A portable, no_std payload codec for LoRaWAN sensor nodes, packing battery,
//! climate, gas, location and current readings into compact fixed-layout
//! payloads that fit the few tens of bytes an airtime-regulated uplink allows.
//!
//! The codec is built from two layers:
//! - a **field codec** that writes one reading as a fixed number of MSB-first
//!   bytes, using an integer-scaled fixed-point encoding and an in-band
//!   sentinel for "no valid reading"
//! - a table of **port schemas** that decide, per LoRaWAN port, which fields are
//!   present and drive the field codec over them in a fixed canonical order
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Enables `std` support in `thiserror`, `log` and `critical-section` |
//! | `delay-loop`          | Blocking sampling loop paced by `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | ISR-fed sample accumulator guarded by `critical_section::Mutex` |
//! | `defmt-0-3`           | Uses `defmt` logging and derives `defmt::Format` |
//! | `log`                 | Uses `log` logging |
//!
//! ## Wire Format
//!
//! - No framing or length prefix; the LoRaWAN FPort identifies the payload shape
//! - Fields in order: battery voltage, temperature, relative humidity, air
//!   pressure, gas resistance, location, current; each one present or absent
//!   according to the port
//! - Each field MSB-first; an invalid reading is sent as `0x7F…` (signed
//!   fields) or `0xFF…` (unsigned fields)
//!
//! ## Usage
//!
//! ```rust
//! use loraport::port::get_port;
//! use loraport::sensor::{SensorData, SensorReading};
//!
//! let data = SensorData {
//!     battery_voltage: SensorReading::present(3.7),
//!     temperature: SensorReading::absent(),
//!     ..Default::default()
//! };
//!
//! let schema = get_port(3);
//! let mut buf = [0u8; 16];
//! let len = schema.encode_payload(&data, &mut buf, 0).unwrap();
//! assert_eq!(&buf[..len], &[0x0E, 0x74, 0x7F, 0x7F]);
//!
//! let decoded = schema.decode_payload(&buf, len, 0).unwrap();
//! assert!(decoded.battery_voltage.valid);
//! assert!(!decoded.temperature.valid);
//! ```
//!
//! Or, hand a whole cycle to an [`Uplink`](crate::uplink::Uplink) implementation:
//!
//! ```rust,ignore
//! loraport::uplink::transmit(&mut lorawan, 3, &data)?;
//! ```
//!
//! ## Integration Notes
//!
//! - Unknown ports look up to the ERROR schema (port 255); check
//!   [`PortSchema::is_error`](crate::port::PortSchema::is_error) before use
//! - Encode and decode are synchronous and allocation-free; run one transmit
//!   cycle at a time
//! - Values outside a field's range wrap silently; keep readings within
//!   [`SensorKind::realistic_range`](crate::sensor::SensorKind::realistic_range)
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

// This module must come first so the others see its macros.
#[macro_use]
mod fmt;

pub mod analog;
pub mod config;
pub mod consts;
pub mod error;
pub mod field;
pub mod payload;
pub mod port;
pub mod sampling;
pub mod sensor;
pub mod uplink;
