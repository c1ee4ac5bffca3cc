use std::any::Any;

use orrery_serde::{BitBuffer, SerdeErr};

use crate::{buffers::Timestamped, tick::Tick};

/// A user-defined input record. One command schema exists per protocol;
/// the engine stamps each instance with the author's client tick.
pub trait Command: Default + Clone + Send + Sync + 'static {
    fn encode(&self, buffer: &mut BitBuffer);

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;
}

/// Object-safe surface over the registered [`Command`] schema.
pub trait CommandBase: Send + Sync {
    fn write(&self, buffer: &mut BitBuffer);

    fn read(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;

    /// Restores the schema default, so a recycled command carries nothing
    /// stale into its next authoring pass.
    fn reset(&mut self);

    fn boxed_clone(&self) -> Box<dyn CommandBase>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Command> CommandBase for C {
    fn write(&self, buffer: &mut BitBuffer) {
        self.encode(buffer);
    }

    fn read(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.decode(buffer)
    }

    fn reset(&mut self) {
        *self = C::default();
    }

    fn boxed_clone(&self) -> Box<dyn CommandBase> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn CommandBase> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// An authored command plus its engine bookkeeping: the author's client
/// tick and whether the command has ever been simulated.
pub struct CommandFrame {
    pub client_tick: Tick,
    pub is_new: bool,
    pub command: Box<dyn CommandBase>,
}

impl CommandFrame {
    pub fn new(client_tick: Tick, command: Box<dyn CommandBase>) -> Self {
        Self {
            client_tick,
            is_new: true,
            command,
        }
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        self.client_tick.encode(buffer);
        self.command.write(buffer);
    }

    pub fn decode(
        buffer: &mut BitBuffer,
        mut command: Box<dyn CommandBase>,
    ) -> Result<Self, SerdeErr> {
        let client_tick = Tick::decode(buffer)?;
        command.read(buffer)?;
        Ok(Self {
            client_tick,
            is_new: true,
            command,
        })
    }
}

impl Clone for CommandFrame {
    fn clone(&self) -> Self {
        Self {
            client_tick: self.client_tick,
            is_new: self.is_new,
            command: self.command.boxed_clone(),
        }
    }
}

impl Timestamped for CommandFrame {
    fn tick(&self) -> Tick {
        self.client_tick
    }
}
