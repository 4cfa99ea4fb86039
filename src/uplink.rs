//! Hand-off of encoded payloads to the LoRaWAN stack.
//!
//! Joining, session keys, duty-cycle and retries all belong to the radio
//! stack. This module only defines the seam ([`Uplink`]) and one complete
//! transmit cycle on top of it ([`transmit`]): look the port up, encode the
//! readings, and hand the buffer over.

use nb::block;
use thiserror::Error;

use crate::error::CodecError;
use crate::payload::PayloadBuffer;
use crate::port::get_port;
use crate::sensor::SensorData;

/// A LoRaWAN stack able to send an application payload.
pub trait Uplink {
    /// Error reported by the stack when a send fails.
    type Error: core::fmt::Debug;

    /// Whether the device has joined a network.
    fn is_joined(&self) -> bool;

    /// Queues `payload` for transmission on `payload.port()`.
    ///
    /// Returns `nb::Error::WouldBlock` while the stack is busy with a
    /// previous frame.
    fn send(&mut self, payload: &PayloadBuffer) -> nb::Result<(), Self::Error>;
}

/// Failure of one transmit cycle.
#[derive(Debug, Error)]
pub enum UplinkError<E: core::fmt::Debug> {
    /// The payload could not be built.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The device has not joined a network yet.
    #[error("not joined to a network")]
    NotJoined,
    /// The stack rejected the frame.
    #[error("transport error: {0:?}")]
    Transport(E),
}

/// Encodes `data` for `port` and hands it to `uplink`, blocking while the
/// stack is busy.
///
/// # Returns
/// The number of payload bytes sent.
///
/// # Errors
/// - [`CodecError::UnregisteredPort`] if `port` has no schema
/// - [`UplinkError::NotJoined`] if the stack has not joined yet (nothing is encoded)
/// - [`UplinkError::Transport`] if the stack fails the send
pub fn transmit<U: Uplink>(
    uplink: &mut U,
    port: u8,
    data: &SensorData,
) -> Result<usize, UplinkError<U::Error>> {
    let schema = get_port(port);
    if schema.is_error() {
        warn!("refusing to send on unregistered port {}", port);
        return Err(CodecError::UnregisteredPort(port).into());
    }
    if !uplink.is_joined() {
        debug!("not joined, skipping uplink on port {}", port);
        return Err(UplinkError::NotJoined);
    }

    let mut payload = PayloadBuffer::new(port);
    let len = payload.encode(&schema, data)?;
    debug!("sending {} byte payload on port {}", len, port);
    block!(uplink.send(&payload)).map_err(UplinkError::Transport)?;
    info!("uplink queued on port {}", port);
    Ok(len)
}
