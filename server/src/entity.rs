use orrery_shared::{
    create_delta, CommandFrame, DejitterBuffer, HostHooks, QueueBuffer, State, StateBase,
    StateDelta, StateRecord, SyncConfig, Tick, EntityId, FactoryType, PeerId, UpdateOrder,
};

/// One entity as the authoritative server sees it: the live state, the
/// user's behavior hooks, the controller binding, the incoming command
/// dejitter and the outgoing record history that serves delta bases.
pub struct HostEntity {
    id: EntityId,
    factory_type: FactoryType,
    state: Box<dyn StateBase>,
    hooks: Box<dyn HostHooks>,
    controller: Option<PeerId>,
    prior_controller: Option<PeerId>,
    update_order: UpdateOrder,
    has_started: bool,
    removed_tick: Tick,
    command_ack: Tick,
    incoming_commands: DejitterBuffer<CommandFrame>,
    outgoing_states: QueueBuffer<StateRecord>,
}

impl HostEntity {
    pub(crate) fn new(
        id: EntityId,
        factory_type: FactoryType,
        state: Box<dyn StateBase>,
        hooks: Box<dyn HostHooks>,
        config: &SyncConfig,
    ) -> Self {
        let update_order = hooks.update_order();
        Self {
            id,
            factory_type,
            state,
            hooks,
            controller: None,
            prior_controller: None,
            update_order,
            has_started: false,
            removed_tick: Tick::INVALID,
            command_ack: Tick::INVALID,
            // Commands are authored every client tick: one slot per tick.
            incoming_commands: DejitterBuffer::new(config.dejitter_buffer_length, 1),
            outgoing_states: QueueBuffer::new(config.dejitter_buffer_length),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn factory_type(&self) -> FactoryType {
        self.factory_type
    }

    pub fn controller(&self) -> Option<PeerId> {
        self.controller
    }

    pub fn update_order(&self) -> UpdateOrder {
        self.update_order
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.removed_tick.is_valid()
    }

    pub fn removed_tick(&self) -> Tick {
        self.removed_tick
    }

    /// Latest author command tick this entity has simulated.
    pub fn command_ack(&self) -> Tick {
        self.command_ack
    }

    /// Typed read access to the live state.
    pub fn state<S: State>(&self) -> Option<&S> {
        self.state.as_any().downcast_ref::<S>()
    }

    /// Typed write access to the live state.
    pub fn state_mut<S: State>(&mut self) -> Option<&mut S> {
        self.state.as_any_mut().downcast_mut::<S>()
    }

    pub(crate) fn assign_control(&mut self, peer: PeerId) {
        if self.controller != Some(peer) {
            self.prior_controller = self.controller.take();
            self.controller = Some(peer);
        }
    }

    pub(crate) fn revoke_control(&mut self) {
        if let Some(previous) = self.controller.take() {
            self.prior_controller = Some(previous);
        }
    }

    /// Buffers a received command. The caller has already verified the
    /// sender controls this entity.
    pub(crate) fn store_command(&mut self, frame: CommandFrame) -> bool {
        self.incoming_commands.store(frame)
    }

    /// One authoritative simulation step: apply the newest usable command,
    /// then the user's update hook.
    pub(crate) fn server_update(&mut self, tick: Tick, controller_estimated_tick: Tick) {
        if !self.has_started {
            self.hooks.on_start(self.state.as_ref());
            self.has_started = true;
        }

        if self.controller.is_some() {
            let applied = if controller_estimated_tick.is_valid() {
                match self.incoming_commands.latest_at_mut(controller_estimated_tick) {
                    Some(frame) => {
                        self.hooks
                            .apply_control(self.state.as_mut(), frame.command.as_ref());
                        frame.is_new = false;
                        if frame.client_tick > self.command_ack {
                            self.command_ack = frame.client_tick;
                        }
                        true
                    }
                    None => false,
                }
            } else {
                false
            };
            if !applied {
                self.hooks.command_missing(tick, self.state.as_mut());
            }
        }

        self.hooks.update_auth(tick, self.state.as_mut());
    }

    /// Snapshots the current state into the record history, skipped when
    /// nothing changed since the last record.
    pub(crate) fn store_record(&mut self, tick: Tick) {
        let changed = match self.outgoing_states.latest() {
            Some(record) => self.state.diff(record.state.as_ref()) != 0,
            None => true,
        };
        if changed {
            self.outgoing_states
                .store(StateRecord::new(tick, self.state.boxed_clone()));
        }
    }

    /// Builds the delta taking `destination` from its acked basis to the
    /// current state. Controller data goes to the current and the most
    /// recent prior controller; immutable data goes out whenever no basis
    /// record survives (never acked, or aged out of the history window).
    pub(crate) fn produce_delta(
        &self,
        tick: Tick,
        destination: PeerId,
        basis_tick: Tick,
        force_all_mutable: bool,
    ) -> Option<StateDelta> {
        let include_controller =
            self.controller == Some(destination) || self.prior_controller == Some(destination);
        let basis = self
            .outgoing_states
            .latest_at(basis_tick)
            .map(|record| record.state.as_ref());
        let include_immutable = basis.is_none();

        create_delta(
            tick,
            self.id,
            self.factory_type,
            basis,
            self.state.as_ref(),
            include_controller,
            include_immutable,
            self.command_ack,
            self.removed_tick,
            force_all_mutable,
        )
    }

    /// Schedules removal for the tick after `tick`, so marking an entity
    /// mid-update never alters the current tick.
    pub(crate) fn mark_for_removal(&mut self, tick: Tick) {
        if !self.removed_tick.is_valid() {
            self.removed_tick = tick.next();
            self.hooks.on_sunset(self.state.as_ref());
        }
    }

    pub(crate) fn should_remove(&self, tick: Tick) -> bool {
        self.removed_tick.is_valid() && tick >= self.removed_tick
    }

    pub(crate) fn shutdown(&mut self) {
        self.revoke_control();
        self.hooks.on_shutdown();
    }
}
