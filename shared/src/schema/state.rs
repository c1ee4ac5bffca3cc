use std::any::Any;

use orrery_serde::{BitBuffer, SerdeErr};

use crate::types::FlagField;

/// A user-defined entity state schema.
///
/// The schema is partitioned into three sections:
/// - *mutable* fields, each owning one bit of the flag word (at most 32),
///   delta-encoded against a basis snapshot;
/// - *controller-only* fields, always sent in full but only to the
///   controlling client;
/// - *immutable* fields, sent once at entity creation.
///
/// The four mutable-section methods must agree on field order and flag
/// assignment; `compare_mutable` reports exactly the fields `apply_mutable`
/// would need to copy to make `self` equal `basis` again.
pub trait State: Default + Clone + Send + Sync + 'static {
    /// Number of delta-encodable mutable fields (≤ 32).
    const MUTABLE_FIELD_COUNT: u8;

    /// Flag word of mutable fields on which `self` differs from `basis`.
    fn compare_mutable(&self, basis: &Self) -> FlagField;

    /// Copies the flagged mutable fields from `source` into `self`.
    fn apply_mutable(&mut self, source: &Self, flags: FlagField);

    fn encode_mutable(&self, flags: FlagField, buffer: &mut BitBuffer);

    fn decode_mutable(&mut self, flags: FlagField, buffer: &mut BitBuffer)
        -> Result<(), SerdeErr>;

    fn apply_controller(&mut self, _source: &Self) {}

    fn encode_controller(&self, _buffer: &mut BitBuffer) {}

    fn decode_controller(&mut self, _buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn apply_immutable(&mut self, _source: &Self) {}

    fn encode_immutable(&self, _buffer: &mut BitBuffer) {}

    fn decode_immutable(&mut self, _buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        Ok(())
    }
}

/// Object-safe surface the engine drives states through; implemented for
/// every [`State`] via the blanket impl below. Cross-state operations
/// (`diff`, the `merge_*` family, `assign`) require both sides to be the
/// same concrete schema, which the registry guarantees by factory type.
pub trait StateBase: Send + Sync {
    fn field_count(&self) -> u8;

    fn diff(&self, basis: &dyn StateBase) -> FlagField;

    fn merge(&mut self, source: &dyn StateBase, flags: FlagField);

    fn merge_controller(&mut self, source: &dyn StateBase);

    fn merge_immutable(&mut self, source: &dyn StateBase);

    fn write_mutable(&self, flags: FlagField, buffer: &mut BitBuffer);

    fn read_mutable(&mut self, flags: FlagField, buffer: &mut BitBuffer)
        -> Result<(), SerdeErr>;

    fn write_controller(&self, buffer: &mut BitBuffer);

    fn read_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;

    fn write_immutable(&self, buffer: &mut BitBuffer);

    fn read_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;

    /// Full overwrite of `self` with `source`.
    fn assign(&mut self, source: &dyn StateBase);

    fn boxed_clone(&self) -> Box<dyn StateBase>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

fn downcast<S: State>(state: &dyn StateBase) -> &S {
    state
        .as_any()
        .downcast_ref::<S>()
        .expect("state schema mismatch across one factory type - this should not happen")
}

impl<S: State> StateBase for S {
    fn field_count(&self) -> u8 {
        S::MUTABLE_FIELD_COUNT
    }

    fn diff(&self, basis: &dyn StateBase) -> FlagField {
        self.compare_mutable(downcast::<S>(basis))
    }

    fn merge(&mut self, source: &dyn StateBase, flags: FlagField) {
        self.apply_mutable(downcast::<S>(source), flags);
    }

    fn merge_controller(&mut self, source: &dyn StateBase) {
        self.apply_controller(downcast::<S>(source));
    }

    fn merge_immutable(&mut self, source: &dyn StateBase) {
        self.apply_immutable(downcast::<S>(source));
    }

    fn write_mutable(&self, flags: FlagField, buffer: &mut BitBuffer) {
        self.encode_mutable(flags, buffer);
    }

    fn read_mutable(&mut self, flags: FlagField, buffer: &mut BitBuffer)
        -> Result<(), SerdeErr> {
        self.decode_mutable(flags, buffer)
    }

    fn write_controller(&self, buffer: &mut BitBuffer) {
        self.encode_controller(buffer);
    }

    fn read_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.decode_controller(buffer)
    }

    fn write_immutable(&self, buffer: &mut BitBuffer) {
        self.encode_immutable(buffer);
    }

    fn read_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.decode_immutable(buffer)
    }

    fn assign(&mut self, source: &dyn StateBase) {
        self.clone_from(downcast::<S>(source));
    }

    fn boxed_clone(&self) -> Box<dyn StateBase> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn StateBase> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
