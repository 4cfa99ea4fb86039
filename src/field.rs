//! Fixed-width, MSB-first encoding of a single sensor field.
//!
//! A field is described by a [`SensorFieldSpec`]: its total width in bits, how
//! many equal-width sub-values it is split into, whether those sub-values are
//! signed, and the fixed-point scale factor applied before truncation.
//!
//! ## Encoding
//!
//! A valid value is multiplied by the scale factor, truncated toward zero and
//! written most-significant byte first. Values that do not fit the field width
//! wrap; schema authors must pick scale factors that keep realistic readings
//! in range.
//!
//! An invalid value is replaced by the sentinel: every byte of the field set
//! to [`SIGNED_SENTINEL`] (`0x7F`) for signed fields or [`UNSIGNED_SENTINEL`]
//! (`0xFF`) for unsigned ones.
//!
//! ## Decoding
//!
//! A field whose bytes all equal the sentinel decodes as invalid. Anything else
//! is sign-extended (for signed fields) and divided by the scale factor.
//!
//! ## Functions
//!
//! - [`encode_field`]: writes one field into a byte slice
//! - [`decode_field`]: reads one field back out of a byte slice

use heapless::Vec;
use libm::trunc;

use crate::consts::{MAX_SUB_VALUES, SIGNED_SENTINEL, UNSIGNED_SENTINEL};
use crate::error::CodecError;
use crate::sensor::SensorReading;

/// Sub-values handed to [`encode_field`].
pub type Scalars = Vec<Scalar, MAX_SUB_VALUES>;

/// Sub-values produced by [`decode_field`], already divided by the scale factor.
pub type SubValues = Vec<f64, MAX_SUB_VALUES>;

/// Wire parameters of one sensor kind.
///
/// Construct with [`SensorFieldSpec::new`], which rejects (at compile time when
/// used in a `const`) widths that are not whole bytes per sub-value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SensorFieldSpec {
    bit_width: u16,
    sub_value_count: u8,
    is_signed: bool,
    scale_factor: f64,
}

impl SensorFieldSpec {
    /// Creates a field spec.
    ///
    /// # Panics
    /// If `sub_value_count` is zero or above [`MAX_SUB_VALUES`], if `bit_width`
    /// is not divisible by `sub_value_count`, if a sub-value is not a whole
    /// number of bytes, if a sub-value is wider than 64 bits, or if
    /// `scale_factor` is not positive.
    pub const fn new(bit_width: u16, sub_value_count: u8, is_signed: bool, scale_factor: f64) -> Self {
        assert!(sub_value_count >= 1, "a field needs at least one sub-value");
        assert!(
            sub_value_count as usize <= MAX_SUB_VALUES,
            "too many sub-values for one field"
        );
        assert!(
            bit_width % sub_value_count as u16 == 0,
            "sub-values must share the field width equally"
        );
        let sub_bits = bit_width / sub_value_count as u16;
        assert!(sub_bits % 8 == 0 && sub_bits > 0, "sub-values must be whole bytes");
        assert!(sub_bits <= 64, "sub-values are limited to 64 bits");
        assert!(scale_factor > 0.0, "scale factor must be positive");
        Self {
            bit_width,
            sub_value_count,
            is_signed,
            scale_factor,
        }
    }

    /// Total width of the field in bits, across all sub-values.
    pub const fn bit_width(&self) -> u16 {
        self.bit_width
    }

    /// Number of equal-width sub-values the field is split into.
    pub const fn sub_value_count(&self) -> usize {
        self.sub_value_count as usize
    }

    /// Whether sub-values are two's-complement signed.
    pub const fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// Multiplier applied before truncation to an integer.
    pub const fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Size of the whole field on the wire.
    pub const fn byte_len(&self) -> usize {
        (self.bit_width / 8) as usize
    }

    /// Size of one sub-value on the wire.
    pub const fn sub_value_byte_len(&self) -> usize {
        self.byte_len() / self.sub_value_count()
    }

    /// Byte repeated across the field to mark it invalid.
    pub const fn sentinel_byte(&self) -> u8 {
        if self.is_signed {
            SIGNED_SENTINEL
        } else {
            UNSIGNED_SENTINEL
        }
    }

    /// Scales `value` and truncates it toward zero.
    pub fn scale(&self, value: Scalar) -> i64 {
        trunc(value.as_f64() * self.scale_factor) as i64
    }

    /// Whether `raw` fits the sub-value width with this spec's signedness.
    pub fn fits(&self, raw: i64) -> bool {
        let bits = (self.sub_value_byte_len() * 8) as u32;
        if bits >= 64 {
            return self.is_signed || raw >= 0;
        }
        if self.is_signed {
            let limit = 1i64 << (bits - 1);
            (-limit..limit).contains(&raw)
        } else {
            (0..(1i64 << bits)).contains(&raw)
        }
    }
}

/// A numeric sensor value tagged with its native representation.
///
/// Every reading is funnelled through this enum so there is exactly one encode
/// path regardless of whether the sensor produced an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Scalar {
    /// Unsigned 8-bit reading.
    U8(u8),
    /// Unsigned 16-bit reading.
    U16(u16),
    /// Unsigned 32-bit reading.
    U32(u32),
    /// Signed 16-bit reading.
    I16(i16),
    /// Signed 32-bit reading.
    I32(i32),
    /// Single-precision reading.
    F32(f32),
    /// Double-precision reading.
    F64(f64),
}

impl Scalar {
    /// Widens the value to `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::U8(v) => f64::from(v),
            Scalar::U16(v) => f64::from(v),
            Scalar::U32(v) => f64::from(v),
            Scalar::I16(v) => f64::from(v),
            Scalar::I32(v) => f64::from(v),
            Scalar::F32(v) => f64::from(v),
            Scalar::F64(v) => v,
        }
    }
}

macro_rules! scalar_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

scalar_from!(u8 => U8, u16 => U16, u32 => U32, i16 => I16, i32 => I32, f32 => F32, f64 => F64);

/// Encodes one field into the start of `out`.
///
/// # Arguments
/// - `values`: one [`Scalar`] per sub-value; ignored when `valid` is false
/// - `valid`: whether the reading should be sent or replaced by the sentinel
/// - `spec`: wire parameters of the field
/// - `out`: destination, at least [`SensorFieldSpec::byte_len`] bytes long
///
/// # Returns
/// The number of bytes written, always `spec.byte_len()`.
///
/// # Notes
/// A negative scaled value in an unsigned field is logged as a warning and
/// still written as its two's-complement bit pattern. A NaN or infinite
/// sub-value is logged and the whole field is sent as the sentinel.
pub fn encode_field(
    values: &[Scalar],
    valid: bool,
    spec: &SensorFieldSpec,
    out: &mut [u8],
) -> Result<usize, CodecError> {
    let len = spec.byte_len();
    if out.len() < len {
        return Err(CodecError::BufferOverflow {
            needed: len,
            capacity: out.len(),
        });
    }
    if valid && values.len() != spec.sub_value_count() {
        return Err(CodecError::SubValueCount {
            expected: spec.sub_value_count(),
            actual: values.len(),
        });
    }

    let finite = values.iter().all(|value| value.as_f64().is_finite());
    if valid && !finite {
        warn!("non-finite reading sent as the invalid sentinel");
    }

    let chunks = out[..len].chunks_exact_mut(spec.sub_value_byte_len());
    if !valid || !finite {
        for chunk in chunks {
            chunk.fill(spec.sentinel_byte());
        }
        return Ok(len);
    }

    for (chunk, &value) in chunks.zip(values) {
        let scaled = spec.scale(value);
        if !spec.is_signed() && scaled < 0 {
            warn!(
                "negative value {} encoded into an unsigned field",
                scaled
            );
        }
        write_msb_first(scaled as u64, chunk);
    }
    Ok(len)
}

/// Decodes one field from the start of `bytes`.
///
/// Returns an invalid reading (all sub-values zero) when every byte of the
/// field equals the sentinel.
pub fn decode_field(bytes: &[u8], spec: &SensorFieldSpec) -> Result<SensorReading<SubValues>, CodecError> {
    let len = spec.byte_len();
    if bytes.len() < len {
        return Err(CodecError::BufferUnderrun {
            needed: len,
            available: bytes.len(),
        });
    }
    let field = &bytes[..len];

    let mut values = SubValues::new();
    if field.iter().all(|&b| b == spec.sentinel_byte()) {
        for _ in 0..spec.sub_value_count() {
            let _ = values.push(0.0);
        }
        return Ok(SensorReading::new(values, false));
    }

    for chunk in field.chunks_exact(spec.sub_value_byte_len()) {
        let raw = read_msb_first(chunk, spec.is_signed());
        let _ = values.push(raw as f64 / spec.scale_factor());
    }
    Ok(SensorReading::new(values, true))
}

fn write_msb_first(bits: u64, out: &mut [u8]) {
    let last = out.len() - 1;
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = (bits >> (8 * (last - i))) as u8;
    }
}

fn read_msb_first(bytes: &[u8], signed: bool) -> i64 {
    let bits = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    let width = bytes.len() * 8;
    if signed && width < 64 {
        let shift = (64 - width) as u32;
        ((bits << shift) as i64) >> shift
    } else {
        bits as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSIGNED_MV: SensorFieldSpec = SensorFieldSpec::new(16, 1, false, 1000.0);
    const SIGNED_CENTI: SensorFieldSpec = SensorFieldSpec::new(16, 1, true, 100.0);
    const PAIR: SensorFieldSpec = SensorFieldSpec::new(64, 2, true, 10_000_000.0);

    fn one(value: impl Into<Scalar>) -> Scalars {
        let mut v = Scalars::new();
        let _ = v.push(value.into());
        v
    }

    #[test]
    fn test_spec_sizes() {
        assert_eq!(UNSIGNED_MV.byte_len(), 2);
        assert_eq!(UNSIGNED_MV.sub_value_byte_len(), 2);
        assert_eq!(PAIR.byte_len(), 8);
        assert_eq!(PAIR.sub_value_byte_len(), 4);
        assert_eq!(SIGNED_CENTI.sentinel_byte(), 0x7F);
        assert_eq!(UNSIGNED_MV.sentinel_byte(), 0xFF);
    }

    #[test]
    fn test_encode_battery_millivolts() {
        let mut out = [0u8; 2];
        let n = encode_field(&one(3.7f32), true, &UNSIGNED_MV, &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, [0x0E, 0x74]);
    }

    #[test]
    fn test_encode_truncates_toward_zero() {
        let mut out = [0u8; 2];
        let _ = encode_field(&one(-1.239f64), true, &SIGNED_CENTI, &mut out).unwrap();
        // -123.9 truncates to -123, not -124
        assert_eq!(i16::from_be_bytes(out), -123);
        let _ = encode_field(&one(1.239f64), true, &SIGNED_CENTI, &mut out).unwrap();
        assert_eq!(i16::from_be_bytes(out), 123);
    }

    #[test]
    fn test_invalid_writes_sentinel_regardless_of_value() {
        let mut out = [0u8; 2];
        let _ = encode_field(&one(21.5f32), false, &SIGNED_CENTI, &mut out).unwrap();
        assert_eq!(out, [0x7F, 0x7F]);
        let _ = encode_field(&[], false, &UNSIGNED_MV, &mut out).unwrap();
        assert_eq!(out, [0xFF, 0xFF]);

        let mut wide = [0u8; 8];
        let _ = encode_field(&[], false, &PAIR, &mut wide).unwrap();
        assert_eq!(wide, [0x7F; 8]);
    }

    #[test]
    fn test_negative_into_unsigned_keeps_twos_complement() {
        let mut out = [0u8; 2];
        let _ = encode_field(&one(-0.001f64), true, &UNSIGNED_MV, &mut out).unwrap();
        assert_eq!(out, [0xFF, 0xFF]);
    }

    #[test]
    fn test_non_finite_reading_sent_as_sentinel() {
        let mut out = [0u8; 2];
        let _ = encode_field(&one(f32::NAN), true, &SIGNED_CENTI, &mut out).unwrap();
        assert_eq!(out, [0x7F, 0x7F]);
        assert!(!decode_field(&out, &SIGNED_CENTI).unwrap().valid);

        let mut values = Scalars::new();
        let _ = values.push(Scalar::F64(12.5));
        let _ = values.push(Scalar::F64(f64::INFINITY));
        let mut wide = [0u8; 8];
        let _ = encode_field(&values, true, &PAIR, &mut wide).unwrap();
        assert_eq!(wide, [0x7F; 8]);
    }

    #[test]
    fn test_sub_values_are_msb_first_back_to_back() {
        let mut values = Scalars::new();
        let _ = values.push(Scalar::F64(-33.8688197));
        let _ = values.push(Scalar::F64(151.2092955));
        let mut out = [0u8; 8];
        let _ = encode_field(&values, true, &PAIR, &mut out).unwrap();
        let lat = i32::from_be_bytes([out[0], out[1], out[2], out[3]]);
        let lon = i32::from_be_bytes([out[4], out[5], out[6], out[7]]);
        assert!((lat - -338_688_197).abs() <= 1);
        assert!((lon - 1_512_092_955).abs() <= 1);

        let decoded = decode_field(&out, &PAIR).unwrap();
        assert!(decoded.valid);
        assert!((decoded.value[0] - -33.8688197).abs() <= 2e-7);
        assert!((decoded.value[1] - 151.2092955).abs() <= 2e-7);
    }

    #[test]
    fn test_decode_detects_sentinel() {
        let decoded = decode_field(&[0x7F, 0x7F], &SIGNED_CENTI).unwrap();
        assert!(!decoded.valid);
        assert_eq!(decoded.value.len(), 1);

        let decoded = decode_field(&[0xFF, 0xFF], &UNSIGNED_MV).unwrap();
        assert!(!decoded.valid);

        // 0xFFFF in a signed field is -1, a real value
        let decoded = decode_field(&[0xFF, 0xFF], &SIGNED_CENTI).unwrap();
        assert!(decoded.valid);
        assert_eq!(decoded.value[0], -0.01);
    }

    #[test]
    fn test_decode_partial_sentinel_is_valid() {
        let decoded = decode_field(&[0x7F, 0x7E], &SIGNED_CENTI).unwrap();
        assert!(decoded.valid);
        assert_eq!(decoded.value[0], 326.38);
    }

    #[test]
    fn test_round_trip_within_scale_precision() {
        let mut out = [0u8; 2];
        for &v in &[-40.0f64, -12.34, 0.0, 0.01, 21.5, 85.0] {
            let _ = encode_field(&one(v), true, &SIGNED_CENTI, &mut out).unwrap();
            let decoded = decode_field(&out, &SIGNED_CENTI).unwrap();
            assert!(decoded.valid);
            assert!((decoded.value[0] - v).abs() <= 1.0 / 100.0 + 1e-9, "{v}");
        }
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let mut out = [0u8; 1];
        assert_eq!(
            encode_field(&one(1u8), true, &UNSIGNED_MV, &mut out),
            Err(CodecError::BufferOverflow {
                needed: 2,
                capacity: 1
            })
        );
        assert_eq!(
            decode_field(&[0x01], &UNSIGNED_MV),
            Err(CodecError::BufferUnderrun {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_sub_value_count_mismatch() {
        let mut out = [0u8; 8];
        assert_eq!(
            encode_field(&one(1.0f64), true, &PAIR, &mut out),
            Err(CodecError::SubValueCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_scalar_tags_widen_consistently() {
        assert_eq!(Scalar::from(200u8).as_f64(), 200.0);
        assert_eq!(Scalar::from(-5i16).as_f64(), -5.0);
        assert_eq!(Scalar::from(4_000_000_000u32).as_f64(), 4_000_000_000.0);
        assert_eq!(Scalar::from(0.5f32).as_f64(), 0.5);
    }

    #[test]
    fn test_fits() {
        assert!(SIGNED_CENTI.fits(32_767));
        assert!(!SIGNED_CENTI.fits(32_768));
        assert!(SIGNED_CENTI.fits(-32_768));
        assert!(UNSIGNED_MV.fits(65_535));
        assert!(!UNSIGNED_MV.fits(-1));
    }
}
