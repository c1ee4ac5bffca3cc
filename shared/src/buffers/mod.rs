mod dejitter;
mod history;
mod queue;

pub use dejitter::{DejitterBuffer, Timestamped};
pub use history::SequenceHistory;
pub use queue::QueueBuffer;
