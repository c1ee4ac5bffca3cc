use thiserror::Error;

/// Errors surfaced by a user transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport failed to send a {size} byte payload: {reason}")]
    SendFailed { size: usize, reason: String },

    /// The transport considers the remote host gone.
    #[error("transport connection is closed")]
    Closed,
}

/// The datagram channel a peer talks through. Lossy and reordering;
/// payloads are opaque byte blobs within the configured MTU.
///
/// The transport may be fed from another thread, but `receive` is polled on
/// the engine thread at the start of every update; implementations hand
/// over payloads through their own thread-safe FIFO.
pub trait Transport {
    /// Fire-and-forget datagram send. No delivery or ordering guarantee.
    fn send_payload(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Next pending received payload, if any.
    fn receive(&mut self) -> Option<Vec<u8>>;

    /// Smoothed round-trip time in seconds, when the transport measures it.
    fn ping(&self) -> Option<f32> {
        None
    }
}
