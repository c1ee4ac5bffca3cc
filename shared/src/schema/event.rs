use std::any::Any;

use orrery_serde::{BitBuffer, SerdeErr};

/// A user-defined reliable message schema. Events ride ahead of state in
/// every packet and are retried until acknowledged or out of attempts.
pub trait Event: Default + Clone + Send + Sync + 'static {
    fn encode(&self, buffer: &mut BitBuffer);

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;
}

/// Object-safe surface over a registered [`Event`] schema.
pub trait EventBase: Send + Sync {
    fn write(&self, buffer: &mut BitBuffer);

    fn read(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;

    fn boxed_clone(&self) -> Box<dyn EventBase>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<V: Event> EventBase for V {
    fn write(&self, buffer: &mut BitBuffer) {
        self.encode(buffer);
    }

    fn read(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.decode(buffer)
    }

    fn boxed_clone(&self) -> Box<dyn EventBase> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn EventBase> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
