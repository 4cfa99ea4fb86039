//! Sensor kinds, their wire parameters, and the per-cycle reading bundle.
//!
//! [`SensorKind::ALL`] is the canonical field order of every payload. Fields
//! carry no length prefix, so this order is the only thing that lets a decoder
//! find field boundaries; it must never change for an existing port.

use crate::field::{Scalar, Scalars, SensorFieldSpec, SubValues};

/// Battery voltage in volts, sent as unsigned millivolts.
pub const BATTERY_VOLTAGE_SPEC: SensorFieldSpec = SensorFieldSpec::new(16, 1, false, 1_000.0);
/// Temperature in °C, sent as signed hundredths.
pub const TEMPERATURE_SPEC: SensorFieldSpec = SensorFieldSpec::new(16, 1, true, 100.0);
/// Relative humidity in %, sent as unsigned hundredths.
pub const RELATIVE_HUMIDITY_SPEC: SensorFieldSpec = SensorFieldSpec::new(16, 1, false, 100.0);
/// Air pressure in hPa, sent as unsigned pascals.
pub const AIR_PRESSURE_SPEC: SensorFieldSpec = SensorFieldSpec::new(32, 1, false, 100.0);
/// Gas resistance in Ω, sent as unsigned ohms.
pub const GAS_RESISTANCE_SPEC: SensorFieldSpec = SensorFieldSpec::new(32, 1, false, 1.0);
/// Latitude and longitude in degrees, sent as two signed 1e-7° values.
pub const LOCATION_SPEC: SensorFieldSpec = SensorFieldSpec::new(64, 2, true, 10_000_000.0);
/// Current in amps, sent as signed hundredths.
pub const CURRENT_SPEC: SensorFieldSpec = SensorFieldSpec::new(16, 1, true, 100.0);

/// Every sensor kind a port can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SensorKind {
    /// Battery voltage.
    BatteryVoltage,
    /// Ambient temperature.
    Temperature,
    /// Relative humidity.
    RelativeHumidity,
    /// Barometric air pressure.
    AirPressure,
    /// Gas sensor resistance.
    GasResistance,
    /// GNSS position.
    Location,
    /// Current through the current transformer.
    Current,
}

impl SensorKind {
    /// All kinds in canonical wire order.
    pub const ALL: [SensorKind; 7] = [
        SensorKind::BatteryVoltage,
        SensorKind::Temperature,
        SensorKind::RelativeHumidity,
        SensorKind::AirPressure,
        SensorKind::GasResistance,
        SensorKind::Location,
        SensorKind::Current,
    ];

    /// Wire parameters of this kind.
    pub const fn spec(self) -> SensorFieldSpec {
        match self {
            SensorKind::BatteryVoltage => BATTERY_VOLTAGE_SPEC,
            SensorKind::Temperature => TEMPERATURE_SPEC,
            SensorKind::RelativeHumidity => RELATIVE_HUMIDITY_SPEC,
            SensorKind::AirPressure => AIR_PRESSURE_SPEC,
            SensorKind::GasResistance => GAS_RESISTANCE_SPEC,
            SensorKind::Location => LOCATION_SPEC,
            SensorKind::Current => CURRENT_SPEC,
        }
    }

    /// Lowest and highest value a working sensor of this kind reports,
    /// in the unit the reading is taken in.
    ///
    /// Used to check that no realistic value encodes to the sentinel or
    /// overflows its field. For [`SensorKind::Location`] the range covers both
    /// latitude and longitude.
    pub const fn realistic_range(self) -> (f64, f64) {
        match self {
            SensorKind::BatteryVoltage => (0.0, 5.0),
            SensorKind::Temperature => (-40.0, 85.0),
            SensorKind::RelativeHumidity => (0.0, 100.0),
            SensorKind::AirPressure => (300.0, 1_100.0),
            SensorKind::GasResistance => (0.0, 50_000_000.0),
            SensorKind::Location => (-180.0, 180.0),
            SensorKind::Current => (-20.0, 20.0),
        }
    }
}

/// A sampled value together with its validity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SensorReading<T> {
    /// The sampled value. Meaningless when `valid` is false.
    pub value: T,
    /// Whether the sensor produced a usable value this cycle.
    pub valid: bool,
}

impl<T> SensorReading<T> {
    /// Creates a reading with explicit validity.
    pub const fn new(value: T, valid: bool) -> Self {
        Self { value, valid }
    }

    /// Creates a valid reading.
    pub const fn present(value: T) -> Self {
        Self::new(value, true)
    }

    /// Returns the value if the reading is valid.
    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }
}

impl<T: Default> SensorReading<T> {
    /// Creates an invalid reading holding `T::default()`.
    pub fn absent() -> Self {
        Self::new(T::default(), false)
    }
}

/// A GNSS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Location {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

/// One reading per sensor kind, as sampled in a single transmit cycle.
///
/// The default value has every reading invalid. A decoded payload leaves the
/// readings of fields its port does not carry invalid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SensorData {
    /// Battery voltage in V.
    pub battery_voltage: SensorReading<f32>,
    /// Temperature in °C.
    pub temperature: SensorReading<f32>,
    /// Relative humidity in %.
    pub relative_humidity: SensorReading<f32>,
    /// Air pressure in hPa.
    pub air_pressure: SensorReading<f32>,
    /// Gas resistance in Ω.
    pub gas_resistance: SensorReading<u32>,
    /// Position in degrees.
    pub location: SensorReading<Location>,
    /// Current in A.
    pub current: SensorReading<f32>,
}

impl SensorData {
    /// Whether the reading for `kind` is valid.
    pub fn is_valid(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::BatteryVoltage => self.battery_voltage.valid,
            SensorKind::Temperature => self.temperature.valid,
            SensorKind::RelativeHumidity => self.relative_humidity.valid,
            SensorKind::AirPressure => self.air_pressure.valid,
            SensorKind::GasResistance => self.gas_resistance.valid,
            SensorKind::Location => self.location.valid,
            SensorKind::Current => self.current.valid,
        }
    }

    /// The reading for `kind` as tagged scalars, one per sub-value.
    pub fn scalars(&self, kind: SensorKind) -> SensorReading<Scalars> {
        let mut values = Scalars::new();
        match kind {
            SensorKind::BatteryVoltage => push(&mut values, self.battery_voltage.value),
            SensorKind::Temperature => push(&mut values, self.temperature.value),
            SensorKind::RelativeHumidity => push(&mut values, self.relative_humidity.value),
            SensorKind::AirPressure => push(&mut values, self.air_pressure.value),
            SensorKind::GasResistance => push(&mut values, self.gas_resistance.value),
            SensorKind::Location => {
                push(&mut values, self.location.value.latitude);
                push(&mut values, self.location.value.longitude);
            }
            SensorKind::Current => push(&mut values, self.current.value),
        }
        SensorReading::new(values, self.is_valid(kind))
    }

    /// Stores a decoded field as the reading for `kind`.
    ///
    /// Missing sub-values are treated as zero.
    pub fn set(&mut self, kind: SensorKind, reading: &SensorReading<SubValues>) {
        let valid = reading.valid;
        let first = reading.value.first().copied().unwrap_or_default();
        match kind {
            SensorKind::BatteryVoltage => self.battery_voltage = SensorReading::new(first as f32, valid),
            SensorKind::Temperature => self.temperature = SensorReading::new(first as f32, valid),
            SensorKind::RelativeHumidity => {
                self.relative_humidity = SensorReading::new(first as f32, valid)
            }
            SensorKind::AirPressure => self.air_pressure = SensorReading::new(first as f32, valid),
            SensorKind::GasResistance => self.gas_resistance = SensorReading::new(first as u32, valid),
            SensorKind::Location => {
                let longitude = reading.value.get(1).copied().unwrap_or_default();
                self.location = SensorReading::new(
                    Location {
                        latitude: first,
                        longitude,
                    },
                    valid,
                );
            }
            SensorKind::Current => self.current = SensorReading::new(first as f32, valid),
        }
    }
}

fn push(values: &mut Scalars, value: impl Into<Scalar>) {
    let _ = values.push(value.into());
}
