use std::collections::{BTreeMap, HashMap};

use log::{info, warn};

use orrery_shared::{
    create_frozen_delta, BitBuffer, ClientPacket, EventBase, Protocol, ServerEntity, StateDelta,
    SyncConfig, Tick, Transport, EntityId, PeerId, UpdateOrder,
};

use crate::{
    connection::ClientConnection,
    entity::HostEntity,
    error::ServerError,
    events::ServerEvents,
    room::ServerRoom,
    scope::ScopeEvaluator,
};

/// The authoritative endpoint: owns the room, the connected clients, and
/// the update pump that simulates, scopes and broadcasts.
pub struct Server {
    protocol: Protocol,
    config: SyncConfig,
    room: Option<ServerRoom>,
    clients: BTreeMap<PeerId, ClientConnection>,
    next_peer_id: PeerId,
    pending_joined: Vec<PeerId>,
}

impl Server {
    pub fn new(protocol: Protocol, config: SyncConfig) -> Self {
        Self {
            protocol,
            config,
            room: None,
            clients: BTreeMap::new(),
            next_peer_id: PeerId::first(),
            pending_joined: Vec::new(),
        }
    }

    // Clients

    pub fn add_client(&mut self, transport: Box<dyn Transport>, identifier: &str) -> PeerId {
        let peer_id = self.next_peer_id;
        self.next_peer_id = self.next_peer_id.next();
        self.clients.insert(
            peer_id,
            ClientConnection::new(transport, identifier, &self.config),
        );
        self.pending_joined.push(peer_id);
        info!("client {} joined as {:?}", identifier, peer_id);
        peer_id
    }

    pub fn remove_client(&mut self, peer_id: PeerId) -> bool {
        match self.clients.remove(&peer_id) {
            Some(connection) => {
                info!("client {} ({:?}) left", connection.identifier(), peer_id);
                if let Some(room) = self.room.as_mut() {
                    revoke_all_control(room, peer_id);
                }
                true
            }
            None => false,
        }
    }

    pub fn client_identifier(&self, peer_id: PeerId) -> Option<&str> {
        self.clients
            .get(&peer_id)
            .map(ClientConnection::identifier)
    }

    pub fn client_ids(&self) -> Vec<PeerId> {
        self.clients.keys().copied().collect()
    }

    pub fn set_scope_evaluator(
        &mut self,
        peer_id: PeerId,
        evaluator: Box<dyn ScopeEvaluator>,
    ) -> Result<(), ServerError> {
        let connection = self
            .clients
            .get_mut(&peer_id)
            .ok_or(ServerError::UnknownPeer(peer_id))?;
        connection.evaluator = evaluator;
        Ok(())
    }

    // Room & entities

    pub fn start_room(&mut self) -> &mut ServerRoom {
        self.room.get_or_insert_with(ServerRoom::new)
    }

    pub fn room(&self) -> Option<&ServerRoom> {
        self.room.as_ref()
    }

    pub fn room_mut(&mut self) -> Option<&mut ServerRoom> {
        self.room.as_mut()
    }

    /// Spawns an entity of a registered server type; it starts on the next
    /// update tick.
    pub fn add_new_entity<E: ServerEntity>(&mut self) -> Result<EntityId, ServerError> {
        let room = self.room.as_mut().ok_or(ServerError::NoRoom)?;
        let factory_type = self
            .protocol
            .factory_type_of::<E::State>()
            .ok_or(ServerError::UnregisteredEntityType)?;
        let state = self.protocol.new_state(factory_type)?;
        let hooks = self.protocol.new_host_hooks(factory_type)?;

        let id = room.allocate_entity_id();
        room.insert_entity(HostEntity::new(id, factory_type, state, hooks, &self.config));
        Ok(id)
    }

    /// Schedules an entity's removal for the tick after the current one.
    pub fn mark_for_removal(&mut self, entity_id: EntityId) -> Result<(), ServerError> {
        let room = self.room.as_mut().ok_or(ServerError::NoRoom)?;
        let tick = room.tick();
        let entity = room
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity(entity_id))?;
        entity.mark_for_removal(tick);
        Ok(())
    }

    pub fn assign_control(
        &mut self,
        entity_id: EntityId,
        peer_id: PeerId,
    ) -> Result<(), ServerError> {
        if !self.clients.contains_key(&peer_id) {
            return Err(ServerError::UnknownPeer(peer_id));
        }
        let room = self.room.as_mut().ok_or(ServerError::NoRoom)?;
        let entity = room
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity(entity_id))?;
        entity.assign_control(peer_id);
        Ok(())
    }

    pub fn revoke_control(&mut self, entity_id: EntityId) -> Result<(), ServerError> {
        let room = self.room.as_mut().ok_or(ServerError::NoRoom)?;
        let entity = room
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity(entity_id))?;
        entity.revoke_control();
        Ok(())
    }

    /// Queues a reliable event to every connected client.
    pub fn broadcast_event(
        &mut self,
        event: Box<dyn EventBase>,
        attempts: u16,
    ) -> Result<(), ServerError> {
        let kind = self
            .protocol
            .event_kind_of(event.as_ref())
            .ok_or(ServerError::UnknownEventType)?;
        for connection in self.clients.values_mut() {
            connection
                .peer
                .events
                .queue(kind, event.boxed_clone(), attempts);
        }
        Ok(())
    }

    // The tick pump

    /// One server tick: drain client packets, simulate, and at send ticks
    /// snapshot + broadcast per-client deltas.
    pub fn update(&mut self) -> ServerEvents {
        let mut events = ServerEvents::new();
        events.joined.append(&mut self.pending_joined);

        let Some(room) = self.room.as_mut() else {
            return events;
        };

        // Receive
        for (peer_id, connection) in self.clients.iter_mut() {
            receive_from_client(&self.protocol, room, *peer_id, connection, &mut events);
        }

        // Drop timed-out connections.
        let timed_out: Vec<PeerId> = self
            .clients
            .iter()
            .filter(|(_, connection)| connection.peer.should_drop())
            .map(|(peer_id, _)| *peer_id)
            .collect();
        for peer_id in timed_out {
            warn!("client {:?} timed out", peer_id);
            self.clients.remove(&peer_id);
            revoke_all_control(room, peer_id);
            events.left.push(peer_id);
        }

        // Simulate
        room.advance_tick();
        room.fire_pre_update();
        let tick = room.tick();

        let estimates: HashMap<PeerId, Tick> = self
            .clients
            .iter()
            .map(|(peer_id, connection)| (*peer_id, connection.peer.clock.estimated_remote()))
            .collect();

        for order in UpdateOrder::ALL {
            for entity in room
                .entities
                .values_mut()
                .filter(|entity| entity.update_order() == order)
            {
                let controller_estimate = entity
                    .controller()
                    .and_then(|peer_id| estimates.get(&peer_id))
                    .copied()
                    .unwrap_or(Tick::INVALID);
                entity.server_update(tick, controller_estimate);
            }
        }

        // Apply due removals.
        for entity_id in room.due_removals(tick) {
            let mut entity = room
                .entities
                .remove(&entity_id)
                .expect("due removal vanished - this should not happen");
            entity.shutdown();
            events.entity_removed.push(entity_id);
            room.removed_entities.insert(entity_id, entity);
        }
        room.fire_post_update();

        // Send
        if tick.is_send_tick(self.config.server_send_rate) {
            room.store_states(tick);
            for (peer_id, connection) in self.clients.iter_mut() {
                send_to_client(&self.protocol, &self.config, &*room, *peer_id, connection, tick);
            }

            // Retention: drop removed entities every client has resolved.
            clean_removed_entities(room, &mut self.clients);
        }

        events
    }
}

fn revoke_all_control(room: &mut ServerRoom, peer_id: PeerId) {
    for entity in room.entities.values_mut() {
        if entity.controller() == Some(peer_id) {
            entity.revoke_control();
        }
    }
}

fn clean_removed_entities(room: &mut ServerRoom, clients: &mut BTreeMap<PeerId, ClientConnection>) {
    let resolved: Vec<EntityId> = room
        .removed_entities
        .iter()
        .filter(|(entity_id, entity)| {
            clients.values().all(|connection| {
                connection
                    .scope
                    .has_acked_removal(**entity_id, entity.removed_tick())
            })
        })
        .map(|(entity_id, _)| *entity_id)
        .collect();

    for entity_id in resolved {
        room.removed_entities.remove(&entity_id);
        for connection in clients.values_mut() {
            connection.scope.forget(entity_id);
        }
    }
}

fn receive_from_client(
    protocol: &Protocol,
    room: &mut ServerRoom,
    peer_id: PeerId,
    connection: &mut ClientConnection,
    events: &mut ServerEvents,
) {
    while let Some(payload) = connection.transport.receive() {
        let mut buffer = BitBuffer::new();
        if let Err(error) = buffer.load(&payload) {
            warn!("dropping malformed payload from {:?}: {}", peer_id, error);
            continue;
        }
        let packet = match ClientPacket::decode(protocol, &mut buffer) {
            Ok(packet) => packet,
            Err(error) => {
                warn!("dropping undecodable packet from {:?}: {}", peer_id, error);
                continue;
            }
        };
        if !connection.peer.register_received(&packet.header) {
            continue;
        }

        connection.scope.integrate_acked(&packet.view);

        for update in packet.command_updates {
            let Some(entity) = room.entities.get_mut(&update.entity_id) else {
                continue;
            };
            if entity.controller() != Some(peer_id) {
                // Commands for an entity this client no longer controls.
                continue;
            }
            for frame in update.commands {
                entity.store_command(frame);
            }
        }

        for (event_id, event) in packet.events {
            if let Some(delivered) = connection.peer.events.receive(event_id, event) {
                events.events.push((peer_id, delivered));
            }
        }
    }
}

fn send_to_client(
    protocol: &Protocol,
    config: &SyncConfig,
    room: &ServerRoom,
    peer_id: PeerId,
    connection: &mut ClientConnection,
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

    // Delta candidates, in starvation-safe order: removal notifications
    // first, then freeze markers, then live updates by send priority.
    let mut deltas: Vec<StateDelta> = Vec::new();

    for (entity_id, entity) in room.removed_entities.iter() {
        if connection
            .scope
            .has_acked_removal(*entity_id, entity.removed_tick())
        {
            continue;
        }
        let basis_tick = connection.scope.last_acked_tick(*entity_id);
        if let Some(delta) = entity.produce_delta(tick, peer_id, basis_tick, false) {
            deltas.push(delta);
        }
    }

    let mut frozen_ids: Vec<EntityId> = Vec::new();
    let mut active_ids: Vec<EntityId> = Vec::new();
    for (entity_id, entity) in room.entities.iter() {
        if connection
            .evaluator
            .is_in_scope(*entity_id, entity.factory_type())
        {
            active_ids.push(*entity_id);
        } else if !connection.scope.acked_frozen(*entity_id) {
            frozen_ids.push(*entity_id);
        }
    }
    // Unsent entities first, then the longest-unsent.
    active_ids.sort_by_key(|entity_id| {
        let last_sent = connection.scope.last_sent_tick(*entity_id);
        (last_sent.is_valid(), last_sent, *entity_id)
    });

    for entity_id in frozen_ids {
        let entity = &room.entities[&entity_id];
        deltas.push(create_frozen_delta(tick, entity_id, entity.command_ack()));
    }
    for entity_id in active_ids {
        let entity = &room.entities[&entity_id];
        let basis_tick = connection.scope.last_acked_tick(entity_id);
        // Coming back from frozen must produce a delta even for an
        // unchanged state, or the client would never unfreeze.
        let force_all_mutable = connection
            .scope
            .entry(entity_id)
            .map_or(false, |entry| entry.is_frozen);
        if let Some(delta) = entity.produce_delta(tick, peer_id, basis_tick, force_all_mutable) {
            deltas.push(delta);
        }
    }

    let scope = &mut connection.scope;
    buffer.pack_to_size(
        config.packcap_message_total,
        config.maxsize_entity,
        deltas,
        |buf, delta| delta.encode(protocol, buf),
        |delta| scope.mark_sent(delta.entity_id, tick, delta.is_frozen),
    );

    let payload = buffer.store();
    if let Err(error) = connection.transport.send_payload(&payload) {
        warn!("cannot send packet to {:?}: {}", peer_id, error);
    }
}
