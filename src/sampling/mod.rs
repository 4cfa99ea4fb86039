//! Sample accumulation for the analog sensors.
//!
//! Readings are averaged over a window of ADC samples. The running totals live
//! in an explicit [`Accumulator`] value owned by whoever drives the window, so
//! the codec and the sampling logic can be tested independently.
//!
//! Two ways of driving a window are provided:
//! - a blocking loop paced by `embedded_hal::delay::DelayNs` (`delay-loop` feature)
//! - a timer interrupt pushing samples into a `critical_section`-guarded global
//!   accumulator (`timer-isr` feature)
//!
//! Both read the ADC through [`AnalogSource`], which keeps the crate free of
//! any particular HAL.
//!
//! Window lengths come from [`AnalogSensor::samples_per_reading`]:
//!
//! | Sensor  | Samples per reading | Statistic |
//! |---------|---------------------|-----------|
//! | Battery | `DEFAULT_SAMPLES_PER_READING` | mean |
//! | Current | `CURRENT_SAMPLES_PER_READING` | mean |

use libm::sqrtf;
use nb::block;

use crate::analog::AnalogSensor;
use crate::sensor::SensorReading;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

/// A source of raw ADC counts for one sensor.
pub trait AnalogSource {
    /// Error reported by the ADC.
    type Error;

    /// Reads one conversion.
    ///
    /// Returns `nb::Error::WouldBlock` while a conversion is still running.
    fn read_raw(&mut self) -> nb::Result<u16, Self::Error>;
}

/// Running totals of one averaging window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Accumulator {
    sum: f32,
    sum_sq: f32,
    count: u32,
}

impl Accumulator {
    /// An empty window.
    pub const fn new() -> Self {
        Self {
            sum: 0.0,
            sum_sq: 0.0,
            count: 0,
        }
    }

    /// Adds one sample.
    pub fn push(&mut self, sample: f32) {
        self.sum += sample;
        self.sum_sq += sample * sample;
        self.count += 1;
    }

    /// Number of samples in the window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Arithmetic mean, or `None` for an empty window.
    pub fn mean(&self) -> Option<f32> {
        (self.count > 0).then(|| self.sum / self.count as f32)
    }

    /// Root mean square, or `None` for an empty window.
    pub fn rms(&self) -> Option<f32> {
        (self.count > 0).then(|| sqrtf(self.sum_sq / self.count as f32))
    }

    /// Returns the window and starts a new one.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

/// Reads `samples` conversions from `source`, converts each to millivolts
/// with `sensor`'s calibration and pushes them into `acc`.
///
/// Stops at the first ADC error and returns it; samples read before the error
/// stay in `acc`.
pub fn sample_into<S: AnalogSource>(
    sensor: &AnalogSensor,
    source: &mut S,
    samples: u16,
    acc: &mut Accumulator,
) -> Result<(), S::Error> {
    for _ in 0..samples {
        let raw = block!(source.read_raw())?;
        acc.push(sensor.raw_to_mv(raw));
    }
    Ok(())
}

/// Turns a finished window of millivolt samples into a reading in the unit of
/// `sensor`'s payload field.
///
/// An empty window gives an invalid reading.
pub fn finish_reading(sensor: &AnalogSensor, acc: &Accumulator) -> SensorReading<f32> {
    match acc.mean() {
        Some(mv) => SensorReading::present(sensor.to_physical(mv)),
        None => SensorReading::absent(),
    }
}

/// Samples one full window from `source` and converts it to a reading.
///
/// An ADC error makes the reading invalid; it is logged, not returned, so a
/// faulty sensor only blanks its own field in the payload.
pub fn read_reading<S: AnalogSource>(
    sensor: &AnalogSensor,
    source: &mut S,
    samples: u16,
) -> SensorReading<f32> {
    let mut acc = Accumulator::new();
    if sample_into(sensor, source, samples, &mut acc).is_err() {
        warn!("ADC read failed after {} samples", acc.count());
        return SensorReading::absent();
    }
    finish_reading(sensor, &acc)
}

/// [`read_reading`] over the sensor's own window length.
pub fn read_default_reading<S: AnalogSource>(
    sensor: &AnalogSensor,
    source: &mut S,
) -> SensorReading<f32> {
    read_reading(sensor, source, sensor.samples_per_reading())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::consts::DEFAULT_SAMPLES_PER_READING;

    /// Replays a fixed list of raw counts, reporting `WouldBlock` before each.
    #[derive(Debug)]
    pub(crate) struct ScriptedAdc<'a> {
        pub(crate) samples: &'a [u16],
        pub(crate) pos: usize,
        pub(crate) pending: bool,
    }

    impl<'a> ScriptedAdc<'a> {
        pub(crate) fn new(samples: &'a [u16]) -> Self {
            Self {
                samples,
                pos: 0,
                pending: true,
            }
        }
    }

    impl AnalogSource for ScriptedAdc<'_> {
        type Error = ();

        fn read_raw(&mut self) -> nb::Result<u16, ()> {
            if self.pending {
                self.pending = false;
                return Err(nb::Error::WouldBlock);
            }
            self.pending = true;
            let sample = *self.samples.get(self.pos).ok_or(nb::Error::Other(()))?;
            self.pos += 1;
            Ok(sample)
        }
    }

    fn unity() -> AnalogSensor {
        AnalogSensor::Battery {
            adc: crate::analog::AdcConfig {
                reference: crate::analog::AnalogReference::Internal,
                resolution_bits: 12,
                oversampling: 0,
            },
            compensation: 4096.0 / 3600.0,
        }
    }

    #[test]
    fn test_accumulator_statistics() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.rms(), None);
        acc.push(3.0);
        acc.push(-3.0);
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.mean(), Some(0.0));
        assert_eq!(acc.rms(), Some(3.0));

        let window = acc.take();
        assert_eq!(window.count(), 2);
        assert_eq!(acc, Accumulator::new());
    }

    #[test]
    fn test_sample_into_waits_for_conversions() {
        let mut adc = ScriptedAdc::new(&[100, 200, 300]);
        let mut acc = Accumulator::new();
        assert_eq!(sample_into(&unity(), &mut adc, 3, &mut acc), Ok(()));
        assert_eq!(acc.count(), 3);
        let mean = acc.mean().unwrap();
        assert!((mean - 200.0).abs() < 1e-2);
    }

    #[test]
    fn test_read_reading_converts_units() {
        let mut adc = ScriptedAdc::new(&[3700, 3700]);
        let reading = read_reading(&unity(), &mut adc, 2);
        assert!(reading.valid);
        assert!((reading.value - 3.7).abs() < 1e-3);
    }

    #[test]
    fn test_adc_error_invalidates_reading() {
        let mut adc = ScriptedAdc::new(&[3700]);
        let reading = read_reading(&unity(), &mut adc, 4);
        assert!(!reading.valid);
    }

    #[test]
    fn test_read_default_reading_uses_sensor_window() {
        let sensor = unity();
        let samples = [3700; DEFAULT_SAMPLES_PER_READING as usize];
        let mut adc = ScriptedAdc::new(&samples);
        assert!(read_default_reading(&sensor, &mut adc).valid);
        assert_eq!(adc.pos, samples.len());

        // one short of the window fails the read
        let mut adc = ScriptedAdc::new(&samples[1..]);
        assert!(!read_default_reading(&sensor, &mut adc).valid);
    }

    #[test]
    fn test_empty_window_is_invalid() {
        let mut adc = ScriptedAdc::new(&[]);
        assert!(!read_reading(&unity(), &mut adc, 0).valid);
    }
}
