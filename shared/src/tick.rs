use std::fmt;

use orrery_serde::{BitBuffer, SerdeErr};

/// A logical simulation time: a monotonic non-negative counter with a
/// distinguished invalid value. Raw `0` is the invalid sentinel; the first
/// simulated tick is [`Tick::START`].
///
/// Ticks compare by plain integer order. Session lengths stay far below the
/// 32-bit ceiling, so no wrap handling is needed here (packet sequence ids
/// are the wrapping space, see [`crate::sequence`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    pub const INVALID: Tick = Tick(0);
    pub const START: Tick = Tick(1);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw counter value; only meaningful for valid ticks.
    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Tick {
        debug_assert!(self.is_valid());
        Tick(self.0 + 1)
    }

    /// True when this tick is a send tick for the given rate
    /// (`tick mod rate == 0`). Invalid ticks are never send ticks.
    pub fn is_send_tick(&self, rate: u32) -> bool {
        debug_assert!(rate > 0);
        self.is_valid() && self.0 % rate == 0
    }

    /// Ticks elapsed from `earlier` to `self`; `None` if `earlier` is ahead.
    pub fn since(&self, earlier: Tick) -> Option<u32> {
        debug_assert!(self.is_valid() && earlier.is_valid());
        self.0.checked_sub(earlier.0)
    }

    pub fn add(&self, ticks: u32) -> Tick {
        debug_assert!(self.is_valid());
        Tick(self.0 + ticks)
    }

    /// Subtracts, saturating at [`Tick::START`].
    pub fn sub(&self, ticks: u32) -> Tick {
        debug_assert!(self.is_valid());
        Tick(self.0.saturating_sub(ticks).max(Self::START.0))
    }

    // Wire codec: varint of the raw value, so the invalid sentinel and
    // early-session ticks stay in one byte.

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_varint(self.0);
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<Tick, SerdeErr> {
        Ok(Tick(buffer.read_varint()?))
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Tick({})", self.0)
        } else {
            write!(f, "Tick(invalid)")
        }
    }
}
