use crate::{
    bit_buffer::BitBuffer,
    error::SerdeErr,
    integer::{bits_for_range, VARINT_FALLBACK_SIZE},
};

/// Quantizing float encoder over a `[min, max]` interval at a fixed
/// resolution. Values are snapped to the nearest step and the step index is
/// carried on the wire, fixed-width or varint per the same fallback rule as
/// [`crate::IntCompressor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatCompressor {
    min: f32,
    max: f32,
    precision: f32,
    inv_precision: f32,
    max_step: u32,
    required_bits: u8,
}

impl FloatCompressor {
    /// # Panics
    ///
    /// Panics if the interval is inverted or the precision is not positive.
    pub fn new(min: f32, max: f32, precision: f32) -> Self {
        assert!(max > min, "float compressor interval is inverted");
        assert!(precision > 0.0, "float compressor precision must be positive");

        let inv_precision = 1.0 / precision;
        let max_step = ((max - min) * inv_precision).round() as u32;
        Self {
            min,
            max,
            precision,
            inv_precision,
            max_step,
            required_bits: bits_for_range(max_step),
        }
    }

    pub fn required_bits(&self) -> u8 {
        self.required_bits
    }

    /// Encodes `value`, clamped into the interval and snapped to the nearest
    /// step.
    pub fn write(&self, buffer: &mut BitBuffer, value: f32) {
        let clamped = value.clamp(self.min, self.max);
        let step = ((clamped - self.min) * self.inv_precision).round() as u32;
        let step = step.min(self.max_step);
        if self.required_bits > VARINT_FALLBACK_SIZE {
            buffer.write_varint(step);
        } else {
            buffer.write(self.required_bits, step);
        }
    }

    pub fn read(&self, buffer: &mut BitBuffer) -> Result<f32, SerdeErr> {
        let step = if self.required_bits > VARINT_FALLBACK_SIZE {
            buffer.read_varint()?
        } else {
            buffer.read(self.required_bits)?
        };
        if step > self.max_step {
            return Err(SerdeErr::ValueOutOfRange { value: step });
        }
        Ok(self.min + step as f32 * self.precision)
    }
}
