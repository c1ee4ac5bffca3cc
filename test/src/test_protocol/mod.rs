/// Minimal test protocol shared by the end-to-end suites: one pawn entity
/// with a position (mutable), an energy reserve (controller-only) and a
/// label (immutable), driven by a movement command.
use orrery_serde::{BitBuffer, FloatCompressor, IntCompressor, SerdeErr};
use orrery_shared::{
    ClientEntity, Command, Event, FlagField, Protocol, ServerEntity, State, Tick,
};

pub const FLAG_POS_X: FlagField = 0b001;
pub const FLAG_POS_Y: FlagField = 0b010;
pub const FLAG_HEADING: FlagField = 0b100;

fn position_compressor() -> IntCompressor {
    IntCompressor::new(-100_000, 100_000)
}

fn energy_compressor() -> IntCompressor {
    IntCompressor::new(0, 100)
}

fn heading_compressor() -> FloatCompressor {
    FloatCompressor::new(0.0, 6.283, 0.001)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PawnState {
    pub pos_x: i32,
    pub pos_y: i32,
    /// Radians, quantized to a milliradian on the wire.
    pub heading: f32,
    /// Controller-only: never replicated to spectating clients.
    pub energy: i32,
    /// Immutable: fixed at spawn.
    pub label: String,
}

impl State for PawnState {
    const MUTABLE_FIELD_COUNT: u8 = 3;

    fn compare_mutable(&self, basis: &Self) -> FlagField {
        let mut flags = 0;
        if self.pos_x != basis.pos_x {
            flags |= FLAG_POS_X;
        }
        if self.pos_y != basis.pos_y {
            flags |= FLAG_POS_Y;
        }
        if self.heading != basis.heading {
            flags |= FLAG_HEADING;
        }
        flags
    }

    fn apply_mutable(&mut self, source: &Self, flags: FlagField) {
        if flags & FLAG_POS_X != 0 {
            self.pos_x = source.pos_x;
        }
        if flags & FLAG_POS_Y != 0 {
            self.pos_y = source.pos_y;
        }
        if flags & FLAG_HEADING != 0 {
            self.heading = source.heading;
        }
    }

    fn encode_mutable(&self, flags: FlagField, buffer: &mut BitBuffer) {
        if flags & FLAG_POS_X != 0 {
            position_compressor().write(buffer, self.pos_x);
        }
        if flags & FLAG_POS_Y != 0 {
            position_compressor().write(buffer, self.pos_y);
        }
        if flags & FLAG_HEADING != 0 {
            heading_compressor().write(buffer, self.heading);
        }
    }

    fn decode_mutable(&mut self, flags: FlagField, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        if flags & FLAG_POS_X != 0 {
            self.pos_x = position_compressor().read(buffer)?;
        }
        if flags & FLAG_POS_Y != 0 {
            self.pos_y = position_compressor().read(buffer)?;
        }
        if flags & FLAG_HEADING != 0 {
            self.heading = heading_compressor().read(buffer)?;
        }
        Ok(())
    }

    fn apply_controller(&mut self, source: &Self) {
        self.energy = source.energy;
    }

    fn encode_controller(&self, buffer: &mut BitBuffer) {
        energy_compressor().write(buffer, self.energy);
    }

    fn decode_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.energy = energy_compressor().read(buffer)?;
        Ok(())
    }

    fn apply_immutable(&mut self, source: &Self) {
        self.label = source.label.clone();
    }

    fn encode_immutable(&self, buffer: &mut BitBuffer) {
        buffer.write_string(&self.label);
    }

    fn decode_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.label = buffer.read_string()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveCommand {
    pub dx: i32,
    pub dy: i32,
}

impl Command for MoveCommand {
    fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_varint_signed(self.dx);
        buffer.write_varint_signed(self.dy);
    }

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.dx = buffer.read_varint_signed()?;
        self.dy = buffer.read_varint_signed()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatEvent {
    pub message: String,
}

impl Event for ChatEvent {
    fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_string(&self.message);
    }

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.message = buffer.read_string()?;
        Ok(())
    }
}

/// Authoritative pawn behavior: integrates movement commands.
pub struct PawnServer;

impl ServerEntity for PawnServer {
    type State = PawnState;
    type Command = MoveCommand;

    fn new() -> Self {
        Self
    }

    fn apply_control(&mut self, state: &mut PawnState, command: &MoveCommand) {
        state.pos_x += command.dx;
        state.pos_y += command.dy;
    }
}

/// Predicting pawn behavior: authors a constant one-step move per tick and
/// replays it identically to the server.
pub struct PawnClient;

impl ClientEntity for PawnClient {
    type State = PawnState;
    type Command = MoveCommand;

    fn new() -> Self {
        Self
    }

    fn update_control(&mut self, _tick: Tick, _state: &PawnState, command: &mut MoveCommand) {
        command.dx = 1;
        command.dy = 1;
    }

    fn apply_control(&mut self, state: &mut PawnState, command: &MoveCommand) {
        state.pos_x += command.dx;
        state.pos_y += command.dy;
    }
}

/// Builds the full two-sided protocol used by most suites.
pub fn protocol() -> Protocol {
    let mut builder = Protocol::builder();
    builder
        .add_server_entity_type::<PawnServer>()
        .expect("register server pawn");
    builder
        .add_client_entity_type::<PawnClient>()
        .expect("register client pawn");
    builder
        .set_command_type::<MoveCommand>()
        .expect("register command");
    builder.add_event_type::<ChatEvent>().expect("register event");
    builder.build().expect("build protocol")
}
