//! Edge-triggered collision event tracking across ticks.
//!
//! Each unordered collider pair runs through `∅ → Entered → Stayed* → Exited → ∅`. An `Exited`
//! record is visible for exactly one tick and dropped on the next update.

use std::collections::BTreeMap;

use super::contact::{CollisionEvent, CollisionPair, CollisionState, PairKey};

/// Persistent per-pair event store, iterated in ascending pair order.
#[derive(Debug, Default, Clone)]
pub struct CollisionEvents {
    records: BTreeMap<PairKey, CollisionEvent>,
}

impl CollisionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every record to `tick` given the pairs observed overlapping this tick.
    pub fn update(&mut self, tick: u64, observed: &[CollisionPair]) {
        // Exited records have had their tick.
        self.records
            .retain(|_, event| event.state != CollisionState::Exited);

        // Anything not seen again this tick exits.
        for event in self.records.values_mut() {
            event.state = CollisionState::Exited;
        }

        for pair in observed {
            self.records
                .entry(pair.key())
                .and_modify(|event| {
                    event.state = CollisionState::Stayed;
                    event.contact = *pair;
                })
                .or_insert(CollisionEvent {
                    state: CollisionState::Entered,
                    entered_tick: tick,
                    contact: *pair,
                });
        }
    }

    /// All live records in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.records.values()
    }

    pub fn get(&self, a: hecs::Entity, b: hecs::Entity) -> Option<&CollisionEvent> {
        self.records.get(&PairKey::new(a, b))
    }

    pub fn involving(&self, entity: hecs::Entity) -> impl Iterator<Item = &CollisionEvent> {
        self.records.values().filter(move |event| event.involves(entity))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
