use std::fmt;

use orrery_serde::BitBuffer;

use crate::{
    packet::error::DecodeError,
    schema::{command::CommandFrame, protocol::Protocol},
    types::EntityId,
};

const COMMAND_COUNT_BITS: u8 = 8;

/// The recent commands a client sends for one controlled entity. Carrying
/// the last several commands per packet lets the server ride out lost
/// packets without starving its command dejitter.
pub struct CommandUpdate {
    pub entity_id: EntityId,
    pub commands: Vec<CommandFrame>,
}

impl CommandUpdate {
    pub fn encode(&self, buffer: &mut BitBuffer) {
        debug_assert!(self.commands.len() < 256);
        self.entity_id.encode(buffer);
        buffer.write(COMMAND_COUNT_BITS, self.commands.len() as u32);
        for frame in &self.commands {
            frame.encode(buffer);
        }
    }

    pub fn decode(protocol: &Protocol, buffer: &mut BitBuffer) -> Result<CommandUpdate, DecodeError> {
        let entity_id = EntityId::decode(buffer)?;
        let count = buffer.read(COMMAND_COUNT_BITS)? as usize;
        let mut commands = Vec::with_capacity(count);
        for _ in 0..count {
            commands.push(CommandFrame::decode(buffer, protocol.try_new_command()?)?);
        }
        Ok(CommandUpdate {
            entity_id,
            commands,
        })
    }
}

impl fmt::Debug for CommandUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandUpdate({:?}, {} commands)",
            self.entity_id,
            self.commands.len()
        )
    }
}
