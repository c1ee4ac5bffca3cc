//! # Orrery Serde
//! Bit-level serialization primitives shared by the orrery engine crates:
//! a FIFO bit buffer with reserve/insert patching and MTU-bounded packing,
//! plus range-bounded integer and quantized float compressors.

mod bit_buffer;
mod error;
mod float;
mod integer;

pub use bit_buffer::{BitBuffer, WritePosition, PACK_MAX_ELEMENTS, STRING_LENGTH_MAX};
pub use error::SerdeErr;
pub use float::FloatCompressor;
pub use integer::{bits_for_range, IntCompressor, VARINT_FALLBACK_SIZE};
