//! Port schemas: which fields each LoRaWAN port carries.
//!
//! A [`PortSchema`] is a port number plus one include-flag per
//! [`SensorKind`]. Encoding walks [`SensorKind::ALL`] in order and writes
//! every flagged field back to back; unflagged fields take no bytes at all.
//! The payload length of a port is therefore fixed by its flags alone.
//!
//! ## Registered ports
//!
//! | Port | Battery | Temp | Humidity | Pressure | Gas | Location | Current |
//! |------|---------|------|----------|----------|-----|----------|---------|
//! | 1    | x       |      |          |          |     |          |         |
//! | 2    |         | x    |          |          |     |          |         |
//! | 3    | x       | x    |          |          |     |          |         |
//! | 4    |         | x    | x        |          |     |          |         |
//! | 5    | x       | x    | x        |          |     |          |         |
//! | 6    |         | x    | x        | x        |     |          |         |
//! | 7    | x       | x    | x        | x        |     |          |         |
//! | 8    |         | x    | x        | x        | x   |          |         |
//! | 9    | x       | x    | x        | x        | x   |          |         |
//! | 10   |         |      |          |          |     |          | x       |
//! | 11   | x       |      |          |          |     |          | x       |
//! | 50   |         |      |          |          |     | x        |         |
//! | 51-59| as 1-9  |      |          |          |     | x        |         |
//!
//! Ports are part of the wire format. Adding a sensor to an existing port
//! would shift every byte after it, so new shapes always get a new port number.

use core::iter::Sum;
use core::ops::Add;

use crate::consts::{PORT_COMBINED_NUMBER, PORT_ERROR_NUMBER};
use crate::error::CodecError;
use crate::field::{decode_field, encode_field};
use crate::sensor::{SensorData, SensorKind};

/// The fields carried on one LoRaWAN port.
///
/// Two schemas are equal when their port number and every flag match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PortSchema {
    /// LoRaWAN FPort this schema is sent on.
    pub port_number: u8,
    /// Include the battery voltage.
    pub send_battery_voltage: bool,
    /// Include the temperature.
    pub send_temperature: bool,
    /// Include the relative humidity.
    pub send_relative_humidity: bool,
    /// Include the air pressure.
    pub send_air_pressure: bool,
    /// Include the gas resistance.
    pub send_gas_resistance: bool,
    /// Include the location.
    pub send_location: bool,
    /// Include the current.
    pub send_current: bool,
}

impl PortSchema {
    /// A schema for `port_number` with no fields.
    pub const fn new(port_number: u8) -> Self {
        Self {
            port_number,
            send_battery_voltage: false,
            send_temperature: false,
            send_relative_humidity: false,
            send_air_pressure: false,
            send_gas_resistance: false,
            send_location: false,
            send_current: false,
        }
    }

    /// Returns a copy with the `kind` flag set.
    pub const fn with(mut self, kind: SensorKind) -> Self {
        match kind {
            SensorKind::BatteryVoltage => self.send_battery_voltage = true,
            SensorKind::Temperature => self.send_temperature = true,
            SensorKind::RelativeHumidity => self.send_relative_humidity = true,
            SensorKind::AirPressure => self.send_air_pressure = true,
            SensorKind::GasResistance => self.send_gas_resistance = true,
            SensorKind::Location => self.send_location = true,
            SensorKind::Current => self.send_current = true,
        }
        self
    }

    /// Whether this schema carries `kind`.
    pub const fn includes(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::BatteryVoltage => self.send_battery_voltage,
            SensorKind::Temperature => self.send_temperature,
            SensorKind::RelativeHumidity => self.send_relative_humidity,
            SensorKind::AirPressure => self.send_air_pressure,
            SensorKind::GasResistance => self.send_gas_resistance,
            SensorKind::Location => self.send_location,
            SensorKind::Current => self.send_current,
        }
    }

    /// Whether this is the ERROR schema returned for unknown ports.
    pub const fn is_error(&self) -> bool {
        self.port_number == PORT_ERROR_NUMBER
    }

    /// The flagged kinds, in canonical wire order.
    pub fn fields(&self) -> impl Iterator<Item = SensorKind> + '_ {
        SensorKind::ALL
            .into_iter()
            .filter(move |&kind| self.includes(kind))
    }

    /// Number of payload bytes this schema produces.
    pub fn payload_len(&self) -> usize {
        self.fields().map(|kind| kind.spec().byte_len()).sum()
    }

    /// Encodes `data` into `buf` starting at `start_pos`.
    ///
    /// Each flagged field is written in canonical order; invalid readings are
    /// written as sentinels. The buffer is never grown.
    ///
    /// # Returns
    /// The cursor position after the last field, i.e. `start_pos + payload_len()`.
    pub fn encode_payload(
        &self,
        data: &SensorData,
        buf: &mut [u8],
        start_pos: usize,
    ) -> Result<usize, CodecError> {
        let needed = start_pos
            .checked_add(self.payload_len())
            .unwrap_or(usize::MAX);
        if needed > buf.len() {
            return Err(CodecError::BufferOverflow {
                needed,
                capacity: buf.len(),
            });
        }

        let mut pos = start_pos;
        for kind in self.fields() {
            let reading = data.scalars(kind);
            pos += encode_field(&reading.value, reading.valid, &kind.spec(), &mut buf[pos..])?;
        }
        Ok(pos)
    }

    /// Decodes the first `len` bytes of `buf`, starting at `start_pos`.
    ///
    /// Fails without a partial result when fewer bytes are available than the
    /// flagged fields need. Extra trailing bytes are ignored.
    pub fn decode_payload(
        &self,
        buf: &[u8],
        len: usize,
        start_pos: usize,
    ) -> Result<SensorData, CodecError> {
        let available = len.min(buf.len()).saturating_sub(start_pos);
        let needed = self.payload_len();
        if available < needed {
            debug!(
                "port {} needs {} bytes, only {} available",
                self.port_number,
                needed,
                available
            );
            return Err(CodecError::BufferUnderrun { needed, available });
        }

        let mut data = SensorData::default();
        let mut pos = start_pos;
        for kind in self.fields() {
            let spec = kind.spec();
            let reading = decode_field(&buf[pos..], &spec)?;
            data.set(kind, &reading);
            pos += spec.byte_len();
        }
        Ok(data)
    }
}

impl Add for PortSchema {
    type Output = PortSchema;

    /// ORs the flags of both schemas into an unregistered schema (port 0).
    ///
    /// Only meant for working out which sensors to initialise; the result is
    /// never transmitted.
    fn add(self, rhs: PortSchema) -> PortSchema {
        PortSchema {
            port_number: PORT_COMBINED_NUMBER,
            send_battery_voltage: self.send_battery_voltage || rhs.send_battery_voltage,
            send_temperature: self.send_temperature || rhs.send_temperature,
            send_relative_humidity: self.send_relative_humidity || rhs.send_relative_humidity,
            send_air_pressure: self.send_air_pressure || rhs.send_air_pressure,
            send_gas_resistance: self.send_gas_resistance || rhs.send_gas_resistance,
            send_location: self.send_location || rhs.send_location,
            send_current: self.send_current || rhs.send_current,
        }
    }
}

impl Sum for PortSchema {
    fn sum<I: Iterator<Item = PortSchema>>(iter: I) -> PortSchema {
        iter.fold(PortSchema::new(PORT_COMBINED_NUMBER), |acc, schema| acc + schema)
    }
}

/// Returned by [`get_port`] for unregistered port numbers.
pub const PORT_ERROR: PortSchema = PortSchema::new(PORT_ERROR_NUMBER);

/// Battery voltage.
pub const PORT1: PortSchema = PortSchema::new(1).with(SensorKind::BatteryVoltage);
/// Temperature.
pub const PORT2: PortSchema = PortSchema::new(2).with(SensorKind::Temperature);
/// Battery voltage and temperature.
pub const PORT3: PortSchema = PortSchema::new(3).with(SensorKind::BatteryVoltage).with(SensorKind::Temperature);
/// Temperature and humidity.
pub const PORT4: PortSchema = PortSchema::new(4).with(SensorKind::Temperature).with(SensorKind::RelativeHumidity);
/// Battery voltage, temperature and humidity.
pub const PORT5: PortSchema = PortSchema::new(5)
    .with(SensorKind::BatteryVoltage)
    .with(SensorKind::Temperature)
    .with(SensorKind::RelativeHumidity);
/// Temperature, humidity and pressure.
pub const PORT6: PortSchema = PortSchema::new(6)
    .with(SensorKind::Temperature)
    .with(SensorKind::RelativeHumidity)
    .with(SensorKind::AirPressure);
/// Battery voltage, temperature, humidity and pressure.
pub const PORT7: PortSchema = PortSchema::new(7)
    .with(SensorKind::BatteryVoltage)
    .with(SensorKind::Temperature)
    .with(SensorKind::RelativeHumidity)
    .with(SensorKind::AirPressure);
/// Temperature, humidity, pressure and gas resistance.
pub const PORT8: PortSchema = PortSchema::new(8)
    .with(SensorKind::Temperature)
    .with(SensorKind::RelativeHumidity)
    .with(SensorKind::AirPressure)
    .with(SensorKind::GasResistance);
/// Every environmental field plus battery voltage.
pub const PORT9: PortSchema = PortSchema::new(9)
    .with(SensorKind::BatteryVoltage)
    .with(SensorKind::Temperature)
    .with(SensorKind::RelativeHumidity)
    .with(SensorKind::AirPressure)
    .with(SensorKind::GasResistance);
/// Current.
pub const PORT10: PortSchema = PortSchema::new(10).with(SensorKind::Current);
/// Battery voltage and current.
pub const PORT11: PortSchema = PortSchema::new(11).with(SensorKind::BatteryVoltage).with(SensorKind::Current);

/// Location.
pub const PORT50: PortSchema = PortSchema::new(50).with(SensorKind::Location);
/// [`PORT1`] with location.
pub const PORT51: PortSchema = relocate(PORT1, 51).with(SensorKind::Location);
/// [`PORT2`] with location.
pub const PORT52: PortSchema = relocate(PORT2, 52).with(SensorKind::Location);
/// [`PORT3`] with location.
pub const PORT53: PortSchema = relocate(PORT3, 53).with(SensorKind::Location);
/// [`PORT4`] with location.
pub const PORT54: PortSchema = relocate(PORT4, 54).with(SensorKind::Location);
/// [`PORT5`] with location.
pub const PORT55: PortSchema = relocate(PORT5, 55).with(SensorKind::Location);
/// [`PORT6`] with location.
pub const PORT56: PortSchema = relocate(PORT6, 56).with(SensorKind::Location);
/// [`PORT7`] with location.
pub const PORT57: PortSchema = relocate(PORT7, 57).with(SensorKind::Location);
/// [`PORT8`] with location.
pub const PORT58: PortSchema = relocate(PORT8, 58).with(SensorKind::Location);
/// [`PORT9`] with location.
pub const PORT59: PortSchema = relocate(PORT9, 59).with(SensorKind::Location);

const fn relocate(mut schema: PortSchema, port_number: u8) -> PortSchema {
    schema.port_number = port_number;
    schema
}

/// Every registered port, in ascending port order.
pub static REGISTERED_PORTS: [PortSchema; 21] = [
    PORT1, PORT2, PORT3, PORT4, PORT5, PORT6, PORT7, PORT8, PORT9, PORT10, PORT11, PORT50, PORT51,
    PORT52, PORT53, PORT54, PORT55, PORT56, PORT57, PORT58, PORT59,
];

/// Looks up the schema registered for `port_number`.
///
/// Returns [`PORT_ERROR`] (port 255, no fields) for unknown ports rather than
/// failing; check [`PortSchema::is_error`] before using the result.
pub fn get_port(port_number: u8) -> PortSchema {
    REGISTERED_PORTS
        .iter()
        .find(|schema| schema.port_number == port_number)
        .copied()
        .unwrap_or(PORT_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Location as Position, SensorReading};

    fn sample_data() -> SensorData {
        SensorData {
            battery_voltage: SensorReading::present(3.7),
            temperature: SensorReading::present(21.5),
            relative_humidity: SensorReading::present(48.25),
            air_pressure: SensorReading::present(1013.25),
            gas_resistance: SensorReading::present(123_456),
            location: SensorReading::present(Position {
                latitude: -41.2865,
                longitude: 174.7762,
            }),
            current: SensorReading::present(-3.5),
        }
    }

    #[test]
    fn test_port3_scenario() {
        let data = SensorData {
            battery_voltage: SensorReading::present(3.7),
            temperature: SensorReading::absent(),
            ..Default::default()
        };
        let schema = get_port(3);
        let mut buf = [0u8; 8];
        let len = schema.encode_payload(&data, &mut buf, 0).unwrap();
        assert_eq!(len, 4);
        assert_eq!(&buf[..len], &[0x0E, 0x74, 0x7F, 0x7F]);

        let decoded = schema.decode_payload(&buf, len, 0).unwrap();
        assert!(decoded.battery_voltage.valid);
        assert!((decoded.battery_voltage.value - 3.70).abs() < 1e-3);
        assert!(!decoded.temperature.valid);
        assert!(!decoded.relative_humidity.valid);
    }

    #[test]
    fn test_unregistered_port_returns_error_schema() {
        let schema = get_port(200);
        assert_eq!(schema, PORT_ERROR);
        assert_eq!(schema.port_number, 255);
        assert!(schema.is_error());
        assert_eq!(schema.fields().count(), 0);
        assert_eq!(get_port(0), PORT_ERROR);
    }

    #[test]
    fn test_combine() {
        let a = PortSchema::new(7).with(SensorKind::BatteryVoltage);
        let b = PortSchema::new(9).with(SensorKind::Temperature);
        assert_eq!(
            a + b,
            PortSchema::new(0).with(SensorKind::BatteryVoltage).with(SensorKind::Temperature)
        );
    }

    #[test]
    fn test_sum_of_ports() {
        let union: PortSchema = [PORT10, PORT52].into_iter().sum();
        assert_eq!(union.port_number, 0);
        assert!(union.send_current && union.send_temperature && union.send_location);
        assert!(!union.send_battery_voltage);
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(PORT3, PortSchema::new(3).with(SensorKind::Temperature).with(SensorKind::BatteryVoltage));
        assert_ne!(PORT3, relocate(PORT3, 4));
        assert_ne!(PORT3, PORT3.with(SensorKind::Current));
    }

    #[test]
    fn test_registered_port_numbers_are_unique() {
        for (i, a) in REGISTERED_PORTS.iter().enumerate() {
            assert!(!a.is_error());
            assert_ne!(a.port_number, PORT_COMBINED_NUMBER);
            for b in &REGISTERED_PORTS[i + 1..] {
                assert_ne!(a.port_number, b.port_number);
            }
        }
    }

    #[test]
    fn test_location_ports_extend_climate_ports() {
        for n in 1..=9u8 {
            let base = get_port(n);
            let located = get_port(50 + n);
            assert_eq!(relocate(base.with(SensorKind::Location), 50 + n), located);
        }
    }

    #[test]
    fn test_payload_len_matches_flagged_fields() {
        assert_eq!(PORT1.payload_len(), 2);
        assert_eq!(PORT3.payload_len(), 4);
        assert_eq!(PORT9.payload_len(), 2 + 2 + 2 + 4 + 4);
        assert_eq!(PORT59.payload_len(), 14 + 8);
        assert_eq!(PORT11.payload_len(), 4);

        let mut buf = [0u8; 64];
        for schema in REGISTERED_PORTS.iter() {
            let len = schema
                .encode_payload(&SensorData::default(), &mut buf, 0)
                .unwrap();
            assert_eq!(len, schema.payload_len());
        }
    }

    #[test]
    fn test_round_trip_every_port() {
        let data = sample_data();
        let mut buf = [0u8; 64];
        for schema in REGISTERED_PORTS.iter() {
            let len = schema.encode_payload(&data, &mut buf, 0).unwrap();
            let decoded = schema.decode_payload(&buf, len, 0).unwrap();
            for kind in SensorKind::ALL {
                assert_eq!(decoded.is_valid(kind), schema.includes(kind), "{kind:?}");
            }
            if schema.send_battery_voltage {
                assert!((decoded.battery_voltage.value - 3.7).abs() <= 1e-3 + 1e-6);
            }
            if schema.send_temperature {
                assert!((decoded.temperature.value - 21.5).abs() <= 1e-2 + 1e-6);
            }
            if schema.send_relative_humidity {
                assert!((decoded.relative_humidity.value - 48.25).abs() <= 1e-2 + 1e-6);
            }
            if schema.send_air_pressure {
                assert!((decoded.air_pressure.value - 1013.25).abs() <= 1e-2 + 1e-4);
            }
            if schema.send_gas_resistance {
                assert_eq!(decoded.gas_resistance.value, 123_456);
            }
            if schema.send_location {
                let location = decoded.location.value;
                assert!((location.latitude - -41.2865).abs() <= 2e-7);
                assert!((location.longitude - 174.7762).abs() <= 2e-7);
            }
            if schema.send_current {
                assert!((decoded.current.value - -3.5).abs() <= 1e-2 + 1e-6);
            }
        }
    }

    fn set_valid(data: &mut SensorData, kind: SensorKind, valid: bool) {
        match kind {
            SensorKind::BatteryVoltage => data.battery_voltage.valid = valid,
            SensorKind::Temperature => data.temperature.valid = valid,
            SensorKind::RelativeHumidity => data.relative_humidity.valid = valid,
            SensorKind::AirPressure => data.air_pressure.valid = valid,
            SensorKind::GasResistance => data.gas_resistance.valid = valid,
            SensorKind::Location => data.location.valid = valid,
            SensorKind::Current => data.current.valid = valid,
        }
    }

    #[test]
    fn test_invalid_fields_round_trip_as_invalid() {
        let schema = PORT59 + PORT11;
        assert_eq!(schema.fields().count(), SensorKind::ALL.len());
        let mut buf = [0u8; 64];
        for mask in 0u8..(1u8 << SensorKind::ALL.len()) {
            let mut data = sample_data();
            for (bit, kind) in SensorKind::ALL.into_iter().enumerate() {
                set_valid(&mut data, kind, mask & (1u8 << bit) != 0);
            }
            let len = schema.encode_payload(&data, &mut buf, 0).unwrap();
            assert_eq!(len, schema.payload_len());
            let decoded = schema.decode_payload(&buf, len, 0).unwrap();
            for (bit, kind) in SensorKind::ALL.into_iter().enumerate() {
                assert_eq!(
                    decoded.is_valid(kind),
                    mask & (1u8 << bit) != 0,
                    "mask {mask:#09b} {kind:?}"
                );
            }
        }
    }

    #[test]
    fn test_start_offset() {
        let data = sample_data();
        let mut buf = [0xAAu8; 16];
        let end = PORT1.encode_payload(&data, &mut buf, 3).unwrap();
        assert_eq!(end, 5);
        assert_eq!(&buf[..5], &[0xAA, 0xAA, 0xAA, 0x0E, 0x74]);
        let decoded = PORT1.decode_payload(&buf, end, 3).unwrap();
        assert!(decoded.battery_voltage.valid);
    }

    #[test]
    fn test_decode_underrun_has_no_partial_result() {
        let buf = [0x0E, 0x74, 0x7F];
        assert_eq!(
            PORT3.decode_payload(&buf, buf.len(), 0),
            Err(CodecError::BufferUnderrun {
                needed: 4,
                available: 3
            })
        );
        // `len` shorter than the slice also limits what is readable
        let buf = [0x0E, 0x74, 0x7F, 0x7F];
        assert!(PORT3.decode_payload(&buf, 2, 0).is_err());
        assert!(PORT3.decode_payload(&buf, 4, 1).is_err());
    }

    #[test]
    fn test_encode_start_past_end_is_overflow() {
        let mut buf = [0u8; 4];
        assert_eq!(
            PORT3.encode_payload(&sample_data(), &mut buf, usize::MAX),
            Err(CodecError::BufferOverflow {
                needed: usize::MAX,
                capacity: 4
            })
        );
        assert!(PORT3.encode_payload(&sample_data(), &mut buf, 1).is_err());
    }

    #[test]
    fn test_encode_refuses_small_buffer() {
        let mut buf = [0u8; 3];
        assert_eq!(
            PORT3.encode_payload(&sample_data(), &mut buf, 0),
            Err(CodecError::BufferOverflow {
                needed: 4,
                capacity: 3
            })
        );
    }
}
