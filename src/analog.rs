//! Calibration of the analog sensors read through the on-board ADC.
//!
//! Each analog sensor is a variant of [`AnalogSensor`] carrying its own ADC
//! settings and calibration, rather than a subtype of a shared base. The set
//! of analog sensors is closed, so a `match` replaces dynamic dispatch.
//!
//! Conversions run in two steps:
//!
//! 1. raw ADC counts to millivolts at the pin ([`AnalogSensor::raw_to_mv`]),
//!    using the reference voltage, resolution and divider compensation
//! 2. millivolts to the physical unit of the reading ([`AnalogSensor::to_physical`])
//!
//! Averaging over many samples is done by [`crate::sampling::Accumulator`].

use libm::powf;

use crate::consts::{
    BATTERY_COMPENSATION_FACTOR, CURRENT_COMPENSATION_FACTOR, CURRENT_MIDPOINT_MV,
    CURRENT_MV_PER_AMP, CURRENT_SAMPLES_PER_READING, DEFAULT_SAMPLES_PER_READING,
};
use crate::sensor::SensorKind;

/// ADC reference voltage selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AnalogReference {
    /// Board default (0.6 V × 6).
    #[default]
    Default,
    /// Internal 0.6 V × 6 = 3.6 V.
    Internal,
    /// Internal 0.6 V × 5 = 3.0 V.
    Internal3_0,
    /// Internal 0.6 V × 4 = 2.4 V.
    Internal2_4,
    /// Internal 0.6 V × 3 = 1.8 V.
    Internal1_8,
    /// Internal 0.6 V × 2, treated as 1.6 V full scale.
    Internal1_2,
    /// VDD / 4 = 0.825 V.
    Vdd4,
    /// Internal 3.3 V.
    Internal3_3,
    /// Internal 5.0 V.
    Internal5_0,
}

impl AnalogReference {
    /// Full-scale input voltage in millivolts.
    pub const fn millivolts(self) -> f32 {
        match self {
            AnalogReference::Default | AnalogReference::Internal => 3_600.0,
            AnalogReference::Internal3_0 => 3_000.0,
            AnalogReference::Internal2_4 => 2_400.0,
            AnalogReference::Internal1_8 => 1_800.0,
            AnalogReference::Internal1_2 => 1_600.0,
            AnalogReference::Vdd4 => 825.0,
            AnalogReference::Internal3_3 => 3_300.0,
            AnalogReference::Internal5_0 => 5_000.0,
        }
    }
}

/// ADC settings applied before reading a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AdcConfig {
    /// Reference voltage.
    pub reference: AnalogReference,
    /// Resolution in bits.
    pub resolution_bits: u8,
    /// Hardware oversampling factor (0 disables it).
    pub oversampling: u32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            reference: AnalogReference::Default,
            resolution_bits: 10,
            oversampling: 0,
        }
    }
}

/// An analog sensor together with its calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AnalogSensor {
    /// Battery voltage behind a resistor divider.
    Battery {
        /// ADC settings.
        adc: AdcConfig,
        /// Divider compensation factor.
        compensation: f32,
    },
    /// Hall-effect current transformer centred on [`CURRENT_MIDPOINT_MV`].
    Current {
        /// ADC settings.
        adc: AdcConfig,
        /// Input divider compensation factor.
        compensation: f32,
        /// Offset (mV) added to every sample to cancel the zero-current error.
        zero_offset_mv: f32,
        /// Transformer sensitivity in mV per amp.
        mv_per_amp: f32,
    },
}

impl AnalogSensor {
    /// Battery sensor with the board defaults: 3.0 V reference, 12-bit, no oversampling.
    pub const fn battery() -> Self {
        AnalogSensor::Battery {
            adc: AdcConfig {
                reference: AnalogReference::Internal3_0,
                resolution_bits: 12,
                oversampling: 0,
            },
            compensation: BATTERY_COMPENSATION_FACTOR,
        }
    }

    /// Current sensor with the board defaults: 3.0 V reference, 12-bit, 128× oversampling,
    /// uncalibrated.
    pub const fn current() -> Self {
        AnalogSensor::Current {
            adc: AdcConfig {
                reference: AnalogReference::Internal3_0,
                resolution_bits: 12,
                oversampling: 128,
            },
            compensation: CURRENT_COMPENSATION_FACTOR,
            zero_offset_mv: 0.0,
            mv_per_amp: CURRENT_MV_PER_AMP,
        }
    }

    /// ADC settings for this sensor.
    pub const fn adc(&self) -> AdcConfig {
        match *self {
            AnalogSensor::Battery { adc, .. } | AnalogSensor::Current { adc, .. } => adc,
        }
    }

    /// The payload field this sensor feeds.
    pub const fn field(&self) -> SensorKind {
        match self {
            AnalogSensor::Battery { .. } => SensorKind::BatteryVoltage,
            AnalogSensor::Current { .. } => SensorKind::Current,
        }
    }

    /// ADC samples averaged into one reading.
    ///
    /// The current transformer output rides on mains ripple and needs a much
    /// longer window than the battery divider.
    pub const fn samples_per_reading(&self) -> u16 {
        match self {
            AnalogSensor::Battery { .. } => DEFAULT_SAMPLES_PER_READING,
            AnalogSensor::Current { .. } => CURRENT_SAMPLES_PER_READING,
        }
    }

    /// Millivolts at the sensor per ADC count, including divider compensation.
    pub fn mv_per_lsb(&self) -> f32 {
        let compensation = match *self {
            AnalogSensor::Battery { compensation, .. }
            | AnalogSensor::Current { compensation, .. } => compensation,
        };
        let adc = self.adc();
        compensation * (adc.reference.millivolts() / powf(2.0, f32::from(adc.resolution_bits)))
    }

    /// Converts raw ADC counts to millivolts at the sensor.
    pub fn raw_to_mv(&self, raw: u16) -> f32 {
        f32::from(raw) * self.mv_per_lsb()
    }

    /// Converts a sensor voltage (mV) to the unit of its payload field.
    ///
    /// Battery: volts. Current: amps, after zero-offset correction.
    pub fn to_physical(&self, mv: f32) -> f32 {
        match *self {
            AnalogSensor::Battery { .. } => mv / 1_000.0,
            AnalogSensor::Current {
                zero_offset_mv,
                mv_per_amp,
                ..
            } => (mv + zero_offset_mv - CURRENT_MIDPOINT_MV) / mv_per_amp,
        }
    }

    /// Sets the zero-current offset from the mean voltage (mV) measured with
    /// no current flowing.
    ///
    /// Only the current sensor is calibrated this way; returns `false` for
    /// other sensors.
    pub fn calibrate_zero(&mut self, mean_mv: f32) -> bool {
        match self {
            AnalogSensor::Current { zero_offset_mv, .. } => {
                *zero_offset_mv = CURRENT_MIDPOINT_MV - mean_mv;
                debug!("current sensor zero offset set to {} mV", *zero_offset_mv);
                true
            }
            AnalogSensor::Battery { .. } => false,
        }
    }
}
