use std::any::{type_name, TypeId};
use std::collections::HashMap;

use orrery_serde::{bits_for_range, BitBuffer, SerdeErr};

use crate::{
    schema::{
        command::{Command, CommandBase},
        entity::{new_host_hooks, new_remote_hooks, ClientEntity, HostHooks, RemoteHooks, ServerEntity},
        error::RegistryError,
        event::{Event, EventBase},
        state::{State, StateBase},
    },
    types::{EventKind, FactoryType},
};

const MAX_TYPES: usize = 256;

struct EntityRegistration {
    name: &'static str,
    command_type: TypeId,
    new_state: fn() -> Box<dyn StateBase>,
    host_hooks: Option<fn() -> Box<dyn HostHooks>>,
    remote_hooks: Option<fn() -> Box<dyn RemoteHooks>>,
}

struct CommandRegistration {
    name: &'static str,
    type_id: TypeId,
    new_command: fn() -> Box<dyn CommandBase>,
}

struct EventRegistration {
    name: &'static str,
    type_id: TypeId,
    new_event: fn() -> Box<dyn EventBase>,
}

fn new_state_boxed<S: State>() -> Box<dyn StateBase> {
    Box::new(S::default())
}

fn new_command_boxed<C: Command>() -> Box<dyn CommandBase> {
    Box::new(C::default())
}

fn new_event_boxed<V: Event>() -> Box<dyn EventBase> {
    Box::new(V::default())
}

/// The locked schema registry both sides of a connection share.
///
/// Factory types and event kinds are assigned by registration order, so the
/// server and every client must register the same schemas in the same
/// order - the discriminators are the wire contract.
pub struct Protocol {
    entities: Vec<EntityRegistration>,
    state_kinds: HashMap<TypeId, FactoryType>,
    command: Option<CommandRegistration>,
    events: Vec<EventRegistration>,
    factory_bits: u8,
    event_bits: u8,
}

impl Protocol {
    pub fn builder() -> ProtocolBuilder {
        ProtocolBuilder {
            entities: Vec::new(),
            state_kinds: HashMap::new(),
            command: None,
            events: Vec::new(),
            event_kinds: HashMap::new(),
        }
    }

    pub fn entity_type_count(&self) -> usize {
        self.entities.len()
    }

    /// Factory type assigned to a state schema, if it was registered.
    pub fn factory_type_of<S: State>(&self) -> Option<FactoryType> {
        self.state_kinds.get(&TypeId::of::<S>()).copied()
    }

    pub fn event_type_count(&self) -> usize {
        self.events.len()
    }

    fn entity(&self, factory_type: FactoryType) -> Result<&EntityRegistration, RegistryError> {
        self.entities
            .get(factory_type.0 as usize)
            .ok_or(RegistryError::MissingBehavior {
                factory_type: factory_type.0,
            })
    }

    pub fn entity_name(&self, factory_type: FactoryType) -> Option<&'static str> {
        self.entities.get(factory_type.0 as usize).map(|e| e.name)
    }

    pub fn new_state(&self, factory_type: FactoryType) -> Result<Box<dyn StateBase>, RegistryError> {
        Ok((self.entity(factory_type)?.new_state)())
    }

    pub fn new_host_hooks(
        &self,
        factory_type: FactoryType,
    ) -> Result<Box<dyn HostHooks>, RegistryError> {
        let registration = self.entity(factory_type)?;
        let build = registration
            .host_hooks
            .ok_or(RegistryError::MissingBehavior {
                factory_type: factory_type.0,
            })?;
        Ok(build())
    }

    pub fn new_remote_hooks(
        &self,
        factory_type: FactoryType,
    ) -> Result<Box<dyn RemoteHooks>, RegistryError> {
        let registration = self.entity(factory_type)?;
        let build = registration
            .remote_hooks
            .ok_or(RegistryError::MissingBehavior {
                factory_type: factory_type.0,
            })?;
        Ok(build())
    }

    /// A fresh instance of the registered command schema.
    ///
    /// # Panics
    ///
    /// Panics if the protocol was built without a command type; `build`
    /// rejects that whenever entity types exist.
    pub fn new_command(&self) -> Box<dyn CommandBase> {
        self.try_new_command()
            .expect("protocol has no command type registered")
    }

    /// Fallible variant for decode paths, where a hostile payload may
    /// claim commands against a protocol that registered none.
    pub fn try_new_command(&self) -> Result<Box<dyn CommandBase>, RegistryError> {
        let registration = self
            .command
            .as_ref()
            .ok_or(RegistryError::MissingCommandType)?;
        Ok((registration.new_command)())
    }

    pub fn new_event(&self, kind: EventKind) -> Result<Box<dyn EventBase>, RegistryError> {
        let registration =
            self.events
                .get(kind.0 as usize)
                .ok_or(RegistryError::MissingBehavior {
                    factory_type: kind.0,
                })?;
        Ok((registration.new_event)())
    }

    /// Event kind of a concrete event value, resolved by its type.
    pub fn event_kind_of(&self, event: &dyn EventBase) -> Option<EventKind> {
        let type_id = event.as_any().type_id();
        self.events
            .iter()
            .position(|registration| registration.type_id == type_id)
            .map(|index| EventKind(index as u8))
    }

    // Discriminator codecs: width follows the registered type count, zero
    // bits when only one type exists.

    pub fn write_factory_type(&self, buffer: &mut BitBuffer, factory_type: FactoryType) {
        buffer.write(self.factory_bits, factory_type.0 as u32);
    }

    pub fn read_factory_type(&self, buffer: &mut BitBuffer) -> Result<FactoryType, SerdeErr> {
        Ok(FactoryType(buffer.read(self.factory_bits)? as u8))
    }

    pub fn write_event_kind(&self, buffer: &mut BitBuffer, kind: EventKind) {
        buffer.write(self.event_bits, kind.0 as u32);
    }

    pub fn read_event_kind(&self, buffer: &mut BitBuffer) -> Result<EventKind, SerdeErr> {
        Ok(EventKind(buffer.read(self.event_bits)? as u8))
    }
}

/// Accumulates schema registrations, then locks them into a [`Protocol`].
///
/// One builder can carry both sides' behaviors: registering a server and a
/// client entity type over the same state schema fills the two behavior
/// slots of a single factory type, which is how a shared test protocol is
/// assembled.
pub struct ProtocolBuilder {
    entities: Vec<EntityRegistration>,
    state_kinds: HashMap<TypeId, FactoryType>,
    command: Option<CommandRegistration>,
    events: Vec<EventRegistration>,
    event_kinds: HashMap<TypeId, EventKind>,
}

impl ProtocolBuilder {
    pub fn add_server_entity_type<E: ServerEntity>(&mut self) -> Result<&mut Self, RegistryError> {
        let slot = self.entity_slot::<E::State, E::Command>()?;
        if slot.host_hooks.is_some() {
            return Err(RegistryError::DuplicateEntityType {
                name: type_name::<E>(),
            });
        }
        slot.host_hooks = Some(new_host_hooks::<E>);
        Ok(self)
    }

    pub fn add_client_entity_type<E: ClientEntity>(&mut self) -> Result<&mut Self, RegistryError> {
        let slot = self.entity_slot::<E::State, E::Command>()?;
        if slot.remote_hooks.is_some() {
            return Err(RegistryError::DuplicateEntityType {
                name: type_name::<E>(),
            });
        }
        slot.remote_hooks = Some(new_remote_hooks::<E>);
        Ok(self)
    }

    fn entity_slot<S: State, C: Command>(
        &mut self,
    ) -> Result<&mut EntityRegistration, RegistryError> {
        let state_type = TypeId::of::<S>();
        let factory_type = match self.state_kinds.get(&state_type) {
            Some(existing) => *existing,
            None => {
                if self.entities.len() >= MAX_TYPES {
                    return Err(RegistryError::TooManyTypes {
                        count: self.entities.len() + 1,
                    });
                }
                let assigned = FactoryType(self.entities.len() as u8);
                self.state_kinds.insert(state_type, assigned);
                self.entities.push(EntityRegistration {
                    name: type_name::<S>(),
                    command_type: TypeId::of::<C>(),
                    new_state: new_state_boxed::<S>,
                    host_hooks: None,
                    remote_hooks: None,
                });
                assigned
            }
        };
        let slot = &mut self.entities[factory_type.0 as usize];
        if slot.command_type != TypeId::of::<C>() {
            return Err(RegistryError::CommandTypeMismatch { name: slot.name });
        }
        Ok(slot)
    }

    pub fn set_command_type<C: Command>(&mut self) -> Result<&mut Self, RegistryError> {
        if let Some(existing) = &self.command {
            return Err(RegistryError::DuplicateCommandType {
                name: type_name::<C>(),
                registered: existing.name,
            });
        }
        self.command = Some(CommandRegistration {
            name: type_name::<C>(),
            type_id: TypeId::of::<C>(),
            new_command: new_command_boxed::<C>,
        });
        Ok(self)
    }

    pub fn add_event_type<V: Event>(&mut self) -> Result<&mut Self, RegistryError> {
        let type_id = TypeId::of::<V>();
        if self.event_kinds.contains_key(&type_id) {
            return Err(RegistryError::DuplicateEventType {
                name: type_name::<V>(),
            });
        }
        if self.events.len() >= MAX_TYPES {
            return Err(RegistryError::TooManyTypes {
                count: self.events.len() + 1,
            });
        }
        self.event_kinds
            .insert(type_id, EventKind(self.events.len() as u8));
        self.events.push(EventRegistration {
            name: type_name::<V>(),
            type_id,
            new_event: new_event_boxed::<V>,
        });
        Ok(self)
    }

    pub fn build(self) -> Result<Protocol, RegistryError> {
        if !self.entities.is_empty() {
            let command = self.command.as_ref().ok_or(RegistryError::MissingCommandType)?;
            for registration in &self.entities {
                if registration.command_type != command.type_id {
                    return Err(RegistryError::CommandTypeMismatch {
                        name: registration.name,
                    });
                }
            }
        }

        let factory_bits = if self.entities.len() <= 1 {
            bits_for_range(0)
        } else {
            bits_for_range(self.entities.len() as u32 - 1)
        };
        let event_bits = if self.events.len() <= 1 {
            bits_for_range(0)
        } else {
            bits_for_range(self.events.len() as u32 - 1)
        };

        Ok(Protocol {
            entities: self.entities,
            state_kinds: self.state_kinds,
            command: self.command,
            events: self.events,
            factory_bits,
            event_bits,
        })
    }
}
