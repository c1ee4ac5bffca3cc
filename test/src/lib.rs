pub mod helpers;
pub mod local_socket;
pub mod test_protocol;

pub use helpers::TestPair;
pub use local_socket::{LinkController, LocalSocket};
pub use test_protocol::{protocol, ChatEvent, MoveCommand, PawnClient, PawnServer, PawnState};
