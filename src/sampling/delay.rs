use crate::analog::AnalogSensor;
use crate::sampling::{Accumulator, AnalogSource, finish_reading, sample_into};
use crate::sensor::SensorReading;
use embedded_hal::delay::DelayNs;

/// Samples one window, waiting `interval_us` between conversions.
///
/// This is the blocking counterpart to the interrupt-fed accumulator, for
/// firmware that has nothing else to do while a reading is taken. The first
/// conversion is preceded by one interval so the ADC input can settle after
/// its reference was switched.
///
/// # Arguments
/// - `sensor`: calibration used to convert each conversion to millivolts
/// - `source`: the ADC channel
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL
/// - `samples`: conversions in the window
/// - `interval_us`: pause before each conversion, in microseconds
///
/// # Example
/// ```rust,ignore
/// use loraport::analog::AnalogSensor;
/// use loraport::sampling::sample_with_delay;
///
/// let current = AnalogSensor::current();
/// // 2000 samples, one every 200 µs
/// let reading = sample_with_delay(&current, &mut adc, &mut delay, 2000, 200);
/// ```
///
/// # Notes
/// - An ADC error ends the window early and makes the reading invalid.
pub fn sample_with_delay<S, D>(
    sensor: &AnalogSensor,
    source: &mut S,
    delay: &mut D,
    samples: u16,
    interval_us: u32,
) -> SensorReading<f32>
where
    S: AnalogSource,
    D: DelayNs,
{
    let mut acc = Accumulator::new();
    for _ in 0..samples {
        delay.delay_us(interval_us);
        if sample_into(sensor, source, 1, &mut acc).is_err() {
            warn!("ADC read failed after {} samples", acc.count());
            return SensorReading::absent();
        }
    }
    finish_reading(sensor, &acc)
}

/// Measures the zero-current offset of a current sensor.
///
/// Must run with no current flowing. Averages `samples` conversions and stores
/// the offset in `sensor`. Returns `false` if the sensor is not a current
/// sensor or the ADC failed; `sensor` is left unchanged in that case.
pub fn calibrate_zero_with_delay<S, D>(
    sensor: &mut AnalogSensor,
    source: &mut S,
    delay: &mut D,
    samples: u16,
    interval_us: u32,
) -> bool
where
    S: AnalogSource,
    D: DelayNs,
{
    let mut acc = Accumulator::new();
    for _ in 0..samples {
        delay.delay_us(interval_us);
        if sample_into(sensor, source, 1, &mut acc).is_err() {
            return false;
        }
    }
    match acc.mean() {
        Some(mean_mv) => sensor.calibrate_zero(mean_mv),
        None => false,
    }
}
