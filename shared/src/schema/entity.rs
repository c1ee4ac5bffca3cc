use crate::{
    schema::{
        command::{Command, CommandBase},
        state::{State, StateBase},
    },
    tick::Tick,
    types::UpdateOrder,
};

/// Server-side behavior for one entity schema. The engine owns the state
/// record; hooks receive it typed.
///
/// `apply_control` must be deterministic given `(state, command)` - the
/// client replays it during prediction and the two sides must agree.
pub trait ServerEntity: Send + Sync + 'static {
    type State: State;
    type Command: Command;

    fn new() -> Self
    where
        Self: Sized;

    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::Normal
    }

    /// First server tick after creation.
    fn on_start(&mut self, _state: &Self::State) {}

    /// The entity was marked for removal this tick.
    fn on_sunset(&mut self, _state: &Self::State) {}

    /// The removal took effect; control has been revoked.
    fn on_shutdown(&mut self) {}

    /// Authoritative per-tick simulation, after command application.
    fn update_auth(&mut self, _tick: Tick, _state: &mut Self::State) {}

    /// Applies one authored command to the state.
    fn apply_control(&mut self, _state: &mut Self::State, _command: &Self::Command) {}

    /// Controlled but no command available for this tick (loss or jitter).
    fn command_missing(&mut self, _tick: Tick, _state: &mut Self::State) {}
}

/// Client-side behavior for one entity schema.
pub trait ClientEntity: Send + Sync + 'static {
    type State: State;
    type Command: Command;

    fn new() -> Self
    where
        Self: Sized;

    /// First client tick after the entity left the pending phase.
    fn on_start(&mut self, _state: &Self::State) {}

    fn on_shutdown(&mut self) {}

    fn on_frozen(&mut self) {}

    fn on_unfrozen(&mut self) {}

    fn update_frozen(&mut self, _tick: Tick) {}

    /// Render an uncontrolled entity from the latest authoritative state,
    /// optionally blending toward the staged next snapshot. The blend
    /// factor, if any, comes from the caller's frame clock.
    fn update_proxy(
        &mut self,
        _auth: &Self::State,
        _auth_tick: Tick,
        _next: Option<(&Self::State, Tick)>,
    ) {
    }

    /// Populate one new command for this tick.
    fn update_control(&mut self, _tick: Tick, _state: &Self::State, _command: &mut Self::Command) {}

    /// Predictive replay of one command; must match the server's
    /// [`ServerEntity::apply_control`].
    fn apply_control(&mut self, _state: &mut Self::State, _command: &Self::Command) {}
}

// Object-safe adapters. The registry instantiates one adapter per entity,
// downcasting state and command exactly once at the hook boundary.

pub trait HostHooks: Send + Sync {
    fn update_order(&self) -> UpdateOrder;
    fn on_start(&mut self, state: &dyn StateBase);
    fn on_sunset(&mut self, state: &dyn StateBase);
    fn on_shutdown(&mut self);
    fn update_auth(&mut self, tick: Tick, state: &mut dyn StateBase);
    fn apply_control(&mut self, state: &mut dyn StateBase, command: &dyn CommandBase);
    fn command_missing(&mut self, tick: Tick, state: &mut dyn StateBase);
}

pub trait RemoteHooks: Send + Sync {
    fn on_start(&mut self, state: &dyn StateBase);
    fn on_shutdown(&mut self);
    fn on_frozen(&mut self);
    fn on_unfrozen(&mut self);
    fn update_frozen(&mut self, tick: Tick);
    fn update_proxy(
        &mut self,
        auth: &dyn StateBase,
        auth_tick: Tick,
        next: Option<(&dyn StateBase, Tick)>,
    );
    fn update_control(&mut self, tick: Tick, state: &dyn StateBase, command: &mut dyn CommandBase);
    fn apply_control(&mut self, state: &mut dyn StateBase, command: &dyn CommandBase);
}

const MISMATCH: &str = "schema mismatch across one factory type - this should not happen";

fn state_ref<S: State>(state: &dyn StateBase) -> &S {
    state.as_any().downcast_ref::<S>().expect(MISMATCH)
}

fn state_mut<S: State>(state: &mut dyn StateBase) -> &mut S {
    state.as_any_mut().downcast_mut::<S>().expect(MISMATCH)
}

fn command_ref<C: Command>(command: &dyn CommandBase) -> &C {
    command.as_any().downcast_ref::<C>().expect(MISMATCH)
}

fn command_mut<C: Command>(command: &mut dyn CommandBase) -> &mut C {
    command.as_any_mut().downcast_mut::<C>().expect(MISMATCH)
}

struct HostAdapter<E: ServerEntity> {
    logic: E,
}

impl<E: ServerEntity> HostHooks for HostAdapter<E> {
    fn update_order(&self) -> UpdateOrder {
        self.logic.update_order()
    }

    fn on_start(&mut self, state: &dyn StateBase) {
        self.logic.on_start(state_ref::<E::State>(state));
    }

    fn on_sunset(&mut self, state: &dyn StateBase) {
        self.logic.on_sunset(state_ref::<E::State>(state));
    }

    fn on_shutdown(&mut self) {
        self.logic.on_shutdown();
    }

    fn update_auth(&mut self, tick: Tick, state: &mut dyn StateBase) {
        self.logic.update_auth(tick, state_mut::<E::State>(state));
    }

    fn apply_control(&mut self, state: &mut dyn StateBase, command: &dyn CommandBase) {
        self.logic
            .apply_control(state_mut::<E::State>(state), command_ref::<E::Command>(command));
    }

    fn command_missing(&mut self, tick: Tick, state: &mut dyn StateBase) {
        self.logic.command_missing(tick, state_mut::<E::State>(state));
    }
}

struct RemoteAdapter<E: ClientEntity> {
    logic: E,
}

impl<E: ClientEntity> RemoteHooks for RemoteAdapter<E> {
    fn on_start(&mut self, state: &dyn StateBase) {
        self.logic.on_start(state_ref::<E::State>(state));
    }

    fn on_shutdown(&mut self) {
        self.logic.on_shutdown();
    }

    fn on_frozen(&mut self) {
        self.logic.on_frozen();
    }

    fn on_unfrozen(&mut self) {
        self.logic.on_unfrozen();
    }

    fn update_frozen(&mut self, tick: Tick) {
        self.logic.update_frozen(tick);
    }

    fn update_proxy(
        &mut self,
        auth: &dyn StateBase,
        auth_tick: Tick,
        next: Option<(&dyn StateBase, Tick)>,
    ) {
        let next = next.map(|(state, tick)| (state_ref::<E::State>(state), tick));
        self.logic
            .update_proxy(state_ref::<E::State>(auth), auth_tick, next);
    }

    fn update_control(&mut self, tick: Tick, state: &dyn StateBase, command: &mut dyn CommandBase) {
        self.logic.update_control(
            tick,
            state_ref::<E::State>(state),
            command_mut::<E::Command>(command),
        );
    }

    fn apply_control(&mut self, state: &mut dyn StateBase, command: &dyn CommandBase) {
        self.logic
            .apply_control(state_mut::<E::State>(state), command_ref::<E::Command>(command));
    }
}

pub(crate) fn new_host_hooks<E: ServerEntity>() -> Box<dyn HostHooks> {
    Box::new(HostAdapter { logic: E::new() })
}

pub(crate) fn new_remote_hooks<E: ClientEntity>() -> Box<dyn RemoteHooks> {
    Box::new(RemoteAdapter { logic: E::new() })
}
