//! Error types returned by the payload codec.

use thiserror::Error;

/// Failure of a field or payload encode/decode.
///
/// The codec never panics on bad input; every failure is reported through this
/// type. An unregistered port found by [`get_port`](crate::port::get_port) is
/// *not* an error there (the ERROR schema is returned instead); it only becomes
/// [`CodecError::UnregisteredPort`] where a real port is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CodecError {
    /// Fewer bytes were available than the flagged fields require.
    #[error("payload underrun: {needed} bytes required, {available} available")]
    BufferUnderrun {
        /// Bytes the schema requires from the start position.
        needed: usize,
        /// Bytes actually available from the start position.
        available: usize,
    },
    /// The destination buffer cannot hold the encoded fields.
    #[error("payload overflow: {needed} bytes required, capacity is {capacity}")]
    BufferOverflow {
        /// Bytes the write would need.
        needed: usize,
        /// Bytes the buffer can hold.
        capacity: usize,
    },
    /// A valid reading carried a different number of sub-values than its field spec.
    #[error("expected {expected} sub-values, got {actual}")]
    SubValueCount {
        /// Sub-values declared by the field spec.
        expected: usize,
        /// Sub-values supplied by the caller.
        actual: usize,
    },
    /// The port number has no registered schema.
    #[error("port {0} is not registered")]
    UnregisteredPort(u8),
}
