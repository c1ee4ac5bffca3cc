use log::warn;

use orrery_shared::{
    BitBuffer, CommandUpdate, EventBase, Protocol, ServerPacket, SyncConfig, Tick, Transport,
    EntityId,
};

use crate::{
    connection::ServerConnection,
    entity::{ControlChange, RemoteEntity},
    error::ClientError,
    events::ClientEvents,
    room::ClientRoom,
};

/// The predicting endpoint: decodes authoritative deltas into a replicated
/// room, predicts its controlled entities, and reports its view and
/// commands back to the server.
pub struct Client {
    protocol: Protocol,
    config: SyncConfig,
    connection: Option<ServerConnection>,
    room: Option<ClientRoom>,
}

impl Client {
    pub fn new(protocol: Protocol, config: SyncConfig) -> Self {
        Self {
            protocol,
            config,
            connection: None,
            room: None,
        }
    }

    /// Binds the transport that reaches the server.
    pub fn set_peer(&mut self, transport: Box<dyn Transport>) {
        self.connection = Some(ServerConnection::new(transport, &self.config));
    }

    pub fn start_room(&mut self) -> &mut ClientRoom {
        self.room.get_or_insert_with(ClientRoom::new)
    }

    pub fn room(&self) -> Option<&ClientRoom> {
        self.room.as_ref()
    }

    pub fn room_mut(&mut self) -> Option<&mut ClientRoom> {
        self.room.as_mut()
    }

    /// Queues a reliable event to the server.
    pub fn raise_event(
        &mut self,
        event: Box<dyn EventBase>,
        attempts: u16,
    ) -> Result<(), ClientError> {
        let kind = self
            .protocol
            .event_kind_of(event.as_ref())
            .ok_or(ClientError::UnknownEventType)?;
        let connection = self.connection.as_mut().ok_or(ClientError::NoPeer)?;
        connection.peer.events.queue(kind, event, attempts);
        Ok(())
    }

    /// One client tick: drain server packets, advance the estimated server
    /// tick, update every entity, and at send ticks report the view and
    /// the controlled entities' commands.
    pub fn update(&mut self) -> ClientEvents {
        let mut events = ClientEvents::new();
        let (Some(connection), Some(room)) = (self.connection.as_mut(), self.room.as_mut())
        else {
            return events;
        };

        // Receive
        while let Some(payload) = connection.transport.receive() {
            let mut buffer = BitBuffer::new();
            if let Err(error) = buffer.load(&payload) {
                warn!("dropping malformed server payload: {}", error);
                continue;
            }
            let packet = match ServerPacket::decode(&self.protocol, &mut buffer) {
                Ok(packet) => packet,
                Err(error) => {
                    warn!("dropping undecodable server packet: {}", error);
                    continue;
                }
            };
            if !connection.peer.register_received(&packet.header) {
                continue;
            }

            for (event_id, event) in packet.events {
                if let Some(delivered) = connection.peer.events.receive(event_id, event) {
                    events.events.push(delivered);
                }
            }

            let local_tick = room.tick;
            for delta in packet.deltas {
                connection
                    .view
                    .record(delta.entity_id, delta.tick, local_tick, delta.is_frozen);

                match room.entities.get_mut(&delta.entity_id) {
                    Some(entity) => {
                        entity.store_delta(delta);
                    }
                    None => {
                        // A frozen delta carries no schema; the entity is
                        // created once a live delta arrives.
                        let Some(payload) = &delta.payload else {
                            continue;
                        };
                        match RemoteEntity::new(
                            delta.entity_id,
                            payload.factory_type,
                            &self.protocol,
                            &self.config,
                        ) {
                            Ok(mut entity) => {
                                let entity_id = delta.entity_id;
                                entity.store_delta(delta);
                                room.entities.insert(entity_id, entity);
                            }
                            Err(error) => {
                                warn!(
                                    "cannot instantiate entity {:?}: {}",
                                    delta.entity_id, error
                                );
                            }
                        }
                    }
                }
            }
        }

        // Track the estimated server tick.
        connection
            .peer
            .clock
            .update(connection.transport.ping(), self.config.tick_duration);
        let estimated = connection.peer.clock.estimated_remote();
        if estimated.is_valid() {
            room.tick = estimated;
        }
        let tick = room.tick;
        room.fire_pre_update();

        // Authoritative pass, then the per-entity update dispatch.
        for (entity_id, entity) in room.entities.iter_mut() {
            match entity.update_auth_state(tick) {
                ControlChange::Gained => events.control_gained.push(*entity_id),
                ControlChange::Lost => events.control_lost.push(*entity_id),
                ControlChange::None => {}
            }
        }
        for entity in room.entities.values_mut() {
            entity.client_update(tick, &self.protocol, &self.config);
        }

        // Deferred removals.
        let due: Vec<EntityId> = room
            .entities
            .iter()
            .filter(|(_, entity)| entity.should_remove(tick))
            .map(|(entity_id, _)| *entity_id)
            .collect();
        for entity_id in due {
            let mut entity = room
                .entities
                .remove(&entity_id)
                .expect("due removal vanished - this should not happen");
            entity.shutdown();
            events.entity_removed.push(entity_id);
        }
        room.fire_post_update();

        // Send
        if tick.is_send_tick(self.config.client_send_rate) {
            send_to_server(&self.protocol, &self.config, room, connection, tick);
        }

        events
    }
}

fn send_to_server(
    protocol: &Protocol,
    config: &SyncConfig,
    room: &ClientRoom,
    connection: &mut ServerConnection,
    tick: Tick,
) {
    let mut buffer = BitBuffer::with_capacity(config.data_buffer_size);

    let header = connection.peer.make_header(tick);
    header.encode(&mut buffer);

    let event_cap = (buffer.byte_size() + config.packcap_early_events)
        .min(config.packcap_message_total);
    connection
        .peer
        .events
        .write_events(protocol, &mut buffer, event_cap, config.maxsize_event);

    // The view, newest acknowledgments first so they survive truncation.
    let view_budget = config
        .packcap_message_total
        .saturating_sub(config.packcap_commands);
    let entries = connection.view.packed_entries(config.view_ticks);
    buffer.pack_to_size(
        view_budget,
        config.maxsize_entity,
        entries,
        |buf, entry| entry.encode(buf),
        |_| {},
    );

    // One command update per controlled entity.
    let updates: Vec<CommandUpdate> = room
        .controlled_entity_ids()
        .into_iter()
        .map(|entity_id| {
            let entity = &room.entities[&entity_id];
            CommandUpdate {
                entity_id,
                commands: entity
                    .recent_commands(config.command_send_count)
                    .cloned()
                    .collect(),
            }
        })
        .collect();
    let command_cap =
        (buffer.byte_size() + config.packcap_commands).min(config.packcap_message_total);
    buffer.pack_to_size(
        command_cap,
        config.maxsize_commandupdate,
        updates,
        |buf, update| update.encode(buf),
        |_| {},
    );

    let payload = buffer.store();
    if let Err(error) = connection.transport.send_payload(&payload) {
        warn!("cannot send packet to server: {}", error);
    }
}
