//! Fixed-capacity payload buffer handed to the LoRaWAN stack.

use heapless::Vec;

use crate::consts::{PAYLOAD_BUFFER_SIZE, PORT_ERROR_NUMBER};
use crate::error::CodecError;
use crate::port::{PortSchema, get_port};
use crate::sensor::SensorData;

/// A payload ready for (or received from) the radio, with the port it travels on.
///
/// The length of the inner `heapless::Vec` is the write cursor. The buffer
/// never grows past [`PAYLOAD_BUFFER_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PayloadBuffer {
    port: u8,
    data: Vec<u8, PAYLOAD_BUFFER_SIZE>,
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::new(PORT_ERROR_NUMBER)
    }
}

impl PayloadBuffer {
    /// An empty buffer for `port`.
    pub const fn new(port: u8) -> Self {
        Self {
            port,
            data: Vec::new(),
        }
    }

    /// Wraps received bytes.
    ///
    /// Fails with [`CodecError::BufferOverflow`] if `bytes` is longer than
    /// [`PAYLOAD_BUFFER_SIZE`].
    pub fn from_slice(port: u8, bytes: &[u8]) -> Result<Self, CodecError> {
        let data = Vec::from_slice(bytes).map_err(|_| CodecError::BufferOverflow {
            needed: bytes.len(),
            capacity: PAYLOAD_BUFFER_SIZE,
        })?;
        Ok(Self { port, data })
    }

    /// Port the payload is sent on.
    pub fn port(&self) -> u8 {
        self.port
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drops every written byte, keeping the port.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Appends `data` encoded with `schema` at the cursor and takes over the
    /// schema's port number.
    ///
    /// # Returns
    /// The total payload length after encoding.
    pub fn encode(&mut self, schema: &PortSchema, data: &SensorData) -> Result<usize, CodecError> {
        let start = self.data.len();
        let needed = start + schema.payload_len();
        self.data
            .resize(needed, 0)
            .map_err(|_| CodecError::BufferOverflow {
                needed,
                capacity: PAYLOAD_BUFFER_SIZE,
            })?;
        match schema.encode_payload(data, &mut self.data, start) {
            Ok(end) => {
                self.port = schema.port_number;
                Ok(end)
            }
            Err(e) => {
                self.data.truncate(start);
                Err(e)
            }
        }
    }

    /// Decodes the payload with the schema registered for its port.
    pub fn decode(&self) -> Result<SensorData, CodecError> {
        let schema = get_port(self.port);
        if schema.is_error() {
            return Err(CodecError::UnregisteredPort(self.port));
        }
        schema.decode_payload(&self.data, self.data.len(), 0)
    }
}
