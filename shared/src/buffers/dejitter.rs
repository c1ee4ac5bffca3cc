use crate::tick::Tick;

/// Anything stored by arrival tick in a [`DejitterBuffer`].
pub trait Timestamped {
    fn tick(&self) -> Tick;
}

/// Tick-indexed ring storage tolerating reordering and loss.
///
/// Values land in slot `(tick / divisor) mod capacity`; the divisor is the
/// producer's send rate, so every producer send tick owns one slot. A newer
/// value evicts an older occupant; an older or duplicate arrival is
/// discarded. Lookups never assume contiguity: any subset of ticks may be
/// present at any time.
pub struct DejitterBuffer<T: Timestamped> {
    slots: Vec<Option<T>>,
    divisor: u32,
}

impl<T: Timestamped> DejitterBuffer<T> {
    pub fn new(capacity: usize, divisor: u32) -> Self {
        debug_assert!(capacity > 0);
        debug_assert!(divisor > 0);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, divisor }
    }

    fn slot_of(&self, tick: Tick) -> usize {
        ((tick.raw() / self.divisor) as usize) % self.slots.len()
    }

    /// Stores `value`, returning `true` iff its slot was empty or held an
    /// older tick. Older duplicates are discarded and `false` is returned.
    pub fn store(&mut self, value: T) -> bool {
        let tick = value.tick();
        debug_assert!(tick.is_valid(), "cannot store an invalid tick");

        let slot = self.slot_of(tick);
        match &self.slots[slot] {
            Some(existing) if existing.tick() >= tick => false,
            _ => {
                self.slots[slot] = Some(value);
                true
            }
        }
    }

    /// The stored value with the largest tick at or before `tick`.
    pub fn latest_at(&self, tick: Tick) -> Option<&T> {
        self.slots
            .iter()
            .flatten()
            .filter(|value| value.tick() <= tick)
            .max_by_key(|value| value.tick())
    }

    /// Mutable variant of [`latest_at`](Self::latest_at).
    pub fn latest_at_mut(&mut self, tick: Tick) -> Option<&mut T> {
        let found = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value.tick())))
            .filter(|(_, stored)| *stored <= tick)
            .max_by_key(|(_, stored)| *stored)
            .map(|(index, _)| index)?;
        self.slots[found].as_mut()
    }

    /// All stored values with tick strictly after `tick`, ascending.
    pub fn range_after(&self, tick: Tick) -> Vec<&T> {
        let mut out: Vec<&T> = self
            .slots
            .iter()
            .flatten()
            .filter(|value| !tick.is_valid() || value.tick() > tick)
            .collect();
        out.sort_by_key(|value| value.tick());
        out
    }

    /// Values with tick in `(from, current]`, ascending, plus the single
    /// "next" value with the smallest tick after `current`.
    pub fn range_and_next(&self, from: Tick, current: Tick) -> (Vec<&T>, Option<&T>) {
        let mut range = Vec::new();
        let mut next: Option<&T> = None;

        for value in self.slots.iter().flatten() {
            let tick = value.tick();
            if from.is_valid() && tick <= from {
                continue;
            }
            if tick <= current {
                range.push(value);
            } else if next.map_or(true, |candidate| tick < candidate.tick()) {
                next = Some(value);
            }
        }

        range.sort_by_key(|value| value.tick());
        (range, next)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}
