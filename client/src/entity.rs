use std::collections::VecDeque;

use orrery_shared::{
    CommandFrame, DejitterBuffer, Pool, Protocol, RegistryError, RemoteHooks, State, StateBase,
    StateDelta, SyncConfig, Tick, EntityId, FactoryType,
};

/// How the latest authoritative pass changed local control of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControlChange {
    None,
    Gained,
    Lost,
}

/// One entity as the client sees it: the last authoritative snapshot, the
/// staged next snapshot for interpolation, the predicted working state,
/// the incoming delta dejitter and the outgoing command queue.
///
/// Lifecycle: an entity is pending until its first delta with immutable
/// data lands; after that exactly one of the frozen/proxy/controlled paths
/// runs per client tick.
pub struct RemoteEntity {
    id: EntityId,
    factory_type: FactoryType,
    hooks: Box<dyn RemoteHooks>,
    /// Working state: predicted for controlled entities, display-ready
    /// otherwise.
    state: Box<dyn StateBase>,
    auth_state: Box<dyn StateBase>,
    next_state: Box<dyn StateBase>,
    auth_tick: Tick,
    next_tick: Tick,
    has_immutable: bool,
    has_started: bool,
    is_frozen: bool,
    should_be_frozen: bool,
    is_controlled: bool,
    removed_tick: Tick,
    last_command_ack: Tick,
    incoming_states: DejitterBuffer<StateDelta>,
    outgoing_commands: VecDeque<CommandFrame>,
    command_pool: Pool<CommandFrame>,
}

impl RemoteEntity {
    pub(crate) fn new(
        id: EntityId,
        factory_type: FactoryType,
        protocol: &Protocol,
        config: &SyncConfig,
    ) -> Result<Self, RegistryError> {
        let state = protocol.new_state(factory_type)?;
        let hooks = protocol.new_remote_hooks(factory_type)?;
        Ok(Self {
            id,
            factory_type,
            hooks,
            auth_state: state.boxed_clone(),
            next_state: state.boxed_clone(),
            state,
            auth_tick: Tick::INVALID,
            next_tick: Tick::INVALID,
            has_immutable: false,
            has_started: false,
            is_frozen: false,
            should_be_frozen: false,
            is_controlled: false,
            removed_tick: Tick::INVALID,
            last_command_ack: Tick::INVALID,
            // One slot per server send tick.
            incoming_states: DejitterBuffer::new(
                config.dejitter_buffer_length,
                config.server_send_rate,
            ),
            outgoing_commands: VecDeque::with_capacity(config.command_buffer_count),
            command_pool: Pool::new(config.command_buffer_count),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn factory_type(&self) -> FactoryType {
        self.factory_type
    }

    pub fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    pub fn is_controlled(&self) -> bool {
        self.is_controlled
    }

    pub fn is_pending(&self) -> bool {
        !self.has_immutable
    }

    pub fn auth_tick(&self) -> Tick {
        self.auth_tick
    }

    /// Typed read access to the working (predicted/display) state.
    pub fn state<S: State>(&self) -> Option<&S> {
        self.state.as_any().downcast_ref::<S>()
    }

    /// Typed read access to the last authoritative snapshot.
    pub fn auth_state<S: State>(&self) -> Option<&S> {
        self.auth_state.as_any().downcast_ref::<S>()
    }

    pub fn outgoing_command_count(&self) -> usize {
        self.outgoing_commands.len()
    }

    /// Client ticks of the queued, not-yet-acknowledged commands.
    pub fn outgoing_command_ticks(&self) -> Vec<Tick> {
        self.outgoing_commands
            .iter()
            .map(|frame| frame.client_tick)
            .collect()
    }

    /// Latest author command tick the server has confirmed simulating.
    pub fn last_command_ack(&self) -> Tick {
        self.last_command_ack
    }

    pub(crate) fn recent_commands(&self, count: usize) -> impl Iterator<Item = &CommandFrame> {
        let skip = self.outgoing_commands.len().saturating_sub(count);
        self.outgoing_commands.iter().skip(skip)
    }

    pub(crate) fn store_delta(&mut self, delta: StateDelta) -> bool {
        self.incoming_states.store(delta)
    }

    /// Walks freshly dejittered deltas into the authoritative state and
    /// stages the following one for interpolation. Returns how local
    /// control changed, so the room can relay it.
    pub(crate) fn update_auth_state(&mut self, room_tick: Tick) -> ControlChange {
        if !room_tick.is_valid() {
            return ControlChange::None;
        }

        let Self {
            incoming_states,
            auth_state,
            next_state,
            auth_tick,
            next_tick,
            should_be_frozen,
            has_immutable,
            removed_tick,
            last_command_ack,
            is_controlled,
            ..
        } = self;

        let (range, next) = incoming_states.range_and_next(*auth_tick, room_tick);

        let mut last: Option<&StateDelta> = None;
        for delta in range {
            if !delta.is_frozen {
                delta.apply(auth_state.as_mut());
                if delta.has_immutable_data() {
                    *has_immutable = true;
                }
            }
            *should_be_frozen = delta.is_frozen;
            *auth_tick = delta.tick;
            if delta.removed_tick.is_valid() {
                *removed_tick = delta.removed_tick;
            }
            last = Some(delta);
        }

        let mut change = ControlChange::None;
        if let Some(last) = last {
            if last.command_ack > *last_command_ack {
                *last_command_ack = last.command_ack;
            }
            let controlled_now = last.has_controller_data();
            if controlled_now != *is_controlled {
                *is_controlled = controlled_now;
                change = if controlled_now {
                    ControlChange::Gained
                } else {
                    ControlChange::Lost
                };
            }
        }

        match next {
            Some(next_delta) if !*should_be_frozen && !next_delta.is_frozen => {
                next_state.assign(auth_state.as_ref());
                next_delta.apply(next_state.as_mut());
                *next_tick = next_delta.tick;
            }
            _ => *next_tick = Tick::INVALID,
        }

        change
    }

    /// One client tick: freeze transitions, then exactly one of the
    /// frozen/proxy/controlled update paths.
    pub(crate) fn client_update(&mut self, tick: Tick, protocol: &Protocol, config: &SyncConfig) {
        if self.is_pending() {
            return;
        }
        if !self.has_started {
            self.state.assign(self.auth_state.as_ref());
            self.hooks.on_start(self.auth_state.as_ref());
            self.has_started = true;
        }

        self.set_freeze(self.should_be_frozen);
        if self.is_frozen {
            self.hooks.update_frozen(tick);
        } else if !self.is_controlled {
            let next = self
                .next_tick
                .is_valid()
                .then(|| (self.next_state.as_ref(), self.next_tick));
            self.hooks
                .update_proxy(self.auth_state.as_ref(), self.auth_tick, next);
        } else {
            self.next_tick = Tick::INVALID;
            self.update_controlled(tick, protocol, config);
            self.update_predicted();
        }
    }

    fn set_freeze(&mut self, frozen: bool) {
        if frozen == self.is_frozen {
            return;
        }
        self.is_frozen = frozen;
        if frozen {
            self.hooks.on_frozen();
        } else {
            self.hooks.on_unfrozen();
        }
    }

    /// Authors one new command for this tick, reusing a recycled frame
    /// when one is available.
    fn update_controlled(&mut self, tick: Tick, protocol: &Protocol, config: &SyncConfig) {
        if self.outgoing_commands.len() >= config.command_buffer_count {
            return;
        }

        let mut frame = match self.command_pool.allocate() {
            Some(mut recycled) => {
                recycled.client_tick = tick;
                recycled.is_new = true;
                recycled.command.reset();
                recycled
            }
            None => CommandFrame::new(tick, protocol.new_command()),
        };
        self.hooks
            .update_control(tick, self.state.as_ref(), frame.command.as_mut());
        self.outgoing_commands.push_back(frame);
    }

    /// Rollback and replay: reset the working state to the authoritative
    /// snapshot, re-apply any controller-carrying deltas past it, then
    /// replay every unacked command.
    fn update_predicted(&mut self) {
        let ack = self.last_command_ack;
        self.clean_commands(ack);

        let Self {
            incoming_states,
            state,
            auth_state,
            auth_tick,
            hooks,
            outgoing_commands,
            ..
        } = self;

        state.assign(auth_state.as_ref());
        for delta in incoming_states.range_after(*auth_tick) {
            // A delta without controller data means control was lost
            // server-side; nothing past it is ours to predict from.
            if delta.is_frozen || !delta.has_controller_data() {
                break;
            }
            delta.apply(state.as_mut());
        }

        for frame in outgoing_commands.iter_mut() {
            hooks.apply_control(state.as_mut(), frame.command.as_ref());
            frame.is_new = false;
        }
    }

    fn clean_commands(&mut self, ack: Tick) {
        if !ack.is_valid() {
            return;
        }
        while let Some(front) = self.outgoing_commands.front() {
            if front.client_tick > ack {
                break;
            }
            let frame = self
                .outgoing_commands
                .pop_front()
                .expect("non-empty queue has a front - this should not happen");
            self.command_pool.release(frame);
        }
    }

    pub(crate) fn should_remove(&self, room_tick: Tick) -> bool {
        self.removed_tick.is_valid() && room_tick.is_valid() && room_tick >= self.removed_tick
    }

    pub(crate) fn shutdown(&mut self) {
        self.hooks.on_shutdown();
    }
}
