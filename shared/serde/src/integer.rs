use crate::{bit_buffer::BitBuffer, error::SerdeErr};

/// Fixed-width encodings wider than this fall back to the unsigned varint,
/// which stays short for the small values ranges like this usually hold.
pub const VARINT_FALLBACK_SIZE: u8 = 10;

/// Number of bits needed to represent every value in `0..=range`.
pub fn bits_for_range(range: u32) -> u8 {
    (32 - range.leading_zeros()) as u8
}

/// Range-bounded integer encoder.
///
/// Encodes `value - min` in `ceil(log2(range + 1))` bits, or as a varint
/// when that width exceeds [`VARINT_FALLBACK_SIZE`]. Decoded values outside
/// the declared range are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntCompressor {
    min: i32,
    range: u32,
    required_bits: u8,
}

impl IntCompressor {
    /// # Panics
    ///
    /// Panics if `max < min`.
    pub fn new(min: i32, max: i32) -> Self {
        assert!(max >= min, "int compressor range is inverted");
        let range = max.wrapping_sub(min) as u32;
        Self {
            min,
            range,
            required_bits: bits_for_range(range),
        }
    }

    pub fn required_bits(&self) -> u8 {
        self.required_bits
    }

    /// Encodes `value`, clamped into the declared range.
    pub fn write(&self, buffer: &mut BitBuffer, value: i32) {
        debug_assert!(
            value >= self.min && (value.wrapping_sub(self.min) as u32) <= self.range,
            "value {} outside compressor range",
            value
        );
        let offset = (value.wrapping_sub(self.min) as u32).min(self.range);
        if self.required_bits > VARINT_FALLBACK_SIZE {
            buffer.write_varint(offset);
        } else {
            buffer.write(self.required_bits, offset);
        }
    }

    pub fn read(&self, buffer: &mut BitBuffer) -> Result<i32, SerdeErr> {
        let offset = if self.required_bits > VARINT_FALLBACK_SIZE {
            buffer.read_varint()?
        } else {
            buffer.read(self.required_bits)?
        };
        if offset > self.range {
            return Err(SerdeErr::ValueOutOfRange { value: offset });
        }
        Ok(self.min.wrapping_add(offset as i32))
    }
}
