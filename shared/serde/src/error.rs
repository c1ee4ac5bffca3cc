use thiserror::Error;

/// Errors that can occur while reading from or loading a [`crate::BitBuffer`].
///
/// Encoding never fails: writers own the buffer and grow it on demand. Every
/// decode path returns one of these instead, so a malformed payload is
/// rejected without panicking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// A read requested more bits than the producer wrote.
    #[error("read of {bits} bits overruns the {available} bits remaining in the buffer")]
    BufferOverrun { bits: u8, available: usize },

    /// A read or write specified a width outside the supported range.
    #[error("bit width {bits} is outside the supported 0..=32 range")]
    InvalidWidth { bits: u8 },

    /// A loaded payload did not end in the terminator sentinel bit.
    #[error("stored payload is missing its terminator sentinel")]
    MissingTerminator,

    /// A variable-width integer continued past its maximum encodable width.
    #[error("varint continues past the maximum 32-bit width")]
    VarintOverflow,

    /// A compressed value decoded outside its declared range.
    #[error("decoded value {value} is outside the compressor range")]
    ValueOutOfRange { value: u32 },
}
