pub mod events;
pub mod peer;
pub mod remote_clock;

pub use events::{decode_event_list, EventPipeline, OutgoingEvent};
pub use peer::Peer;
pub use remote_clock::RemoteClock;
