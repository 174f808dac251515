mod slot_registry;

pub use slot_registry::{Slot, SlotPosition, SlotRegistry};
