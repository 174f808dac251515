use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::{DefaultUnits, SlotLimits};
use crate::domain::UnitCode;

#[cfg(debug_assertions)]
use crate::config::DF;

pub type SlotPosition = u32;

/// One side-unit comparison row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub position: SlotPosition,
    pub code: Option<UnitCode>,
}

/// Bounded, position-indexed set of side units.
///
/// The registry guarantees `limits.min <= len() <= limits.max` after construction.
/// It does NOT refuse removal of an interior position: avoiding gaps is the caller's
/// policy (see [`SlotRegistry::can_remove`]), the floor and ceiling are the registry's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRegistry {
    limits: SlotLimits,
    slots: HashMap<SlotPosition, Option<UnitCode>>,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new(SlotLimits::default())
    }
}

impl SlotRegistry {
    /// `limits.min` empty slots at positions `1..=limits.min`.
    pub fn new(limits: SlotLimits) -> Self {
        let slots = (1..=limits.min as SlotPosition).map(|p| (p, None)).collect();
        Self { limits, slots }
    }

    /// `limits.min` slots at positions `1..=limits.min`, each holding its configured default.
    pub fn initialize(limits: SlotLimits, defaults: &DefaultUnits) -> Self {
        let mut registry = Self::new(limits);
        registry.apply_defaults(defaults);
        registry
    }

    pub fn limits(&self) -> SlotLimits {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, position: SlotPosition) -> bool {
        self.slots.contains_key(&position)
    }

    /// Unit at `position`; `None` for an empty or absent slot.
    pub fn code(&self, position: SlotPosition) -> Option<&UnitCode> {
        self.slots.get(&position).and_then(Option::as_ref)
    }

    /// Assigns `code` to an existing position. Returns `false` (no-op) if the position is absent.
    /// Duplicate units across slots are allowed here.
    pub fn set_slot(&mut self, position: SlotPosition, code: Option<UnitCode>) -> bool {
        let Some(slot) = self.slots.get_mut(&position) else {
            #[cfg(debug_assertions)]
            if DF.log_slots {
                log::debug!("SLOTS: ignoring set on absent position {}", position);
            }
            return false;
        };
        *slot = code;
        true
    }

    pub fn can_add(&self) -> bool {
        self.slots.len() < self.limits.max
    }

    /// Appends an empty slot at `max(position) + 1`. `None` when already at the ceiling.
    pub fn add_slot(&mut self) -> Option<SlotPosition> {
        if !self.can_add() {
            return None;
        }
        let next = self.trailing_position().map_or(1, |p| p + 1);
        self.slots.insert(next, None);

        #[cfg(debug_assertions)]
        if DF.log_slots {
            log::info!("SLOTS: added position {} ({} total)", next, self.slots.len());
        }
        Some(next)
    }

    /// Deletes `position` while above the floor. Returns whether anything was removed.
    pub fn remove_slot(&mut self, position: SlotPosition) -> bool {
        if self.slots.len() <= self.limits.min {
            return false;
        }
        let removed = self.slots.remove(&position).is_some();

        #[cfg(debug_assertions)]
        if removed && DF.log_slots {
            log::info!("SLOTS: removed position {} ({} left)", position, self.slots.len());
        }
        removed
    }

    pub fn trailing_position(&self) -> Option<SlotPosition> {
        self.slots.keys().max().copied()
    }

    /// Removal affordance offered to presentation: only the trailing slot, only above the floor.
    pub fn can_remove(&self, position: SlotPosition) -> bool {
        self.slots.len() > self.limits.min && self.trailing_position() == Some(position)
    }

    /// Slots in ascending position order.
    pub fn slots(&self) -> Vec<Slot> {
        self.slots
            .iter()
            .sorted_by_key(|(position, _)| **position)
            .map(|(position, code)| Slot {
                position: *position,
                code: code.clone(),
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<SlotPosition> {
        self.slots.keys().copied().sorted().collect()
    }

    /// Codes currently assigned, in position order.
    pub fn assigned_codes(&self) -> Vec<UnitCode> {
        self.slots().into_iter().filter_map(|s| s.code).collect()
    }

    /// True when no slot holds a unit yet.
    pub fn is_unassigned(&self) -> bool {
        self.slots.values().all(Option::is_none)
    }

    /// Fills every present slot that has a configured default. Returns how many were set.
    pub fn apply_defaults(&mut self, defaults: &DefaultUnits) -> usize {
        let mut applied = 0;
        for position in self.positions() {
            if let Some(code) = defaults.slot_unit(position).and_then(|c| UnitCode::new(c).ok()) {
                self.slots.insert(position, Some(code));
                applied += 1;
            }
        }
        applied
    }
}
