//! Contact data structures for collision response and event queries.

use glam::DVec2;

/// Result of an exact overlap test between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Unit separation direction, pointing from shape A toward shape B.
    pub direction: DVec2,
    /// Overlap depth along `direction` (always greater than the narrowphase epsilon).
    pub penetration: f64,
    /// Deepest point of shape A inside shape B.
    pub deepest_a: DVec2,
    /// Deepest point of shape B inside shape A.
    pub deepest_b: DVec2,
}

/// An overlapping collider pair found this tick.
///
/// `entity_a` always has the lower identifier, and `direction` points from A toward B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub entity_a: hecs::Entity,
    pub entity_b: hecs::Entity,
    pub penetration: f64,
    pub direction: DVec2,
    /// Deepest vertex of the body being pushed: A's when A is the only dynamic body, B's
    /// otherwise.
    pub contact_vertex: DVec2,
    /// At least one collider is trigger-only; no correction is applied.
    pub trigger: bool,
}

impl CollisionPair {
    /// Pair whose `contact_vertex` lies on B.
    pub fn new(entity_a: hecs::Entity, entity_b: hecs::Entity, info: ContactInfo, trigger: bool) -> Self {
        Self {
            entity_a,
            entity_b,
            penetration: info.penetration,
            direction: info.direction,
            contact_vertex: info.deepest_b,
            trigger,
        }
    }

    /// Pair whose `contact_vertex` lies on the body the resolver moves.
    pub fn with_motion(
        entity_a: hecs::Entity,
        entity_b: hecs::Entity,
        info: ContactInfo,
        trigger: bool,
        a_dynamic: bool,
        b_dynamic: bool,
    ) -> Self {
        let mut pair = Self::new(entity_a, entity_b, info, trigger);
        if a_dynamic && !b_dynamic {
            pair.contact_vertex = info.deepest_a;
        }
        pair
    }

    #[inline]
    pub fn involves(&self, entity: hecs::Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }

    /// The other participant, if `entity` is one of the two.
    pub fn other(&self, entity: hecs::Entity) -> Option<hecs::Entity> {
        if self.entity_a == entity {
            Some(self.entity_b)
        } else if self.entity_b == entity {
            Some(self.entity_a)
        } else {
            None
        }
    }

    /// Separation direction as seen from `entity` (pointing away from it, toward the other).
    pub fn direction_from(&self, entity: hecs::Entity) -> Option<DVec2> {
        if self.entity_a == entity {
            Some(self.direction)
        } else if self.entity_b == entity {
            Some(-self.direction)
        } else {
            None
        }
    }

    #[inline]
    pub fn key(&self) -> PairKey {
        PairKey::new(self.entity_a, self.entity_b)
    }
}

/// Unordered collider pair, stored with the lower identifier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub a: hecs::Entity,
    pub b: hecs::Entity,
}

impl PairKey {
    pub fn new(x: hecs::Entity, y: hecs::Entity) -> Self {
        if x.to_bits() <= y.to_bits() {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    #[inline]
    fn bits(&self) -> (u64, u64) {
        (self.a.to_bits().get(), self.b.to_bits().get())
    }
}

impl PartialOrd for PairKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bits().cmp(&other.bits())
    }
}

/// Edge-triggered collision state of a collider pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionState {
    /// First tick of overlap.
    Entered,
    /// Overlap continues from the previous tick.
    Stayed,
    /// Overlap ended this tick. Reported once, then the record is removed.
    Exited,
}

/// Persistent per-pair collision record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub state: CollisionState,
    /// Tick on which the current overlap began.
    pub entered_tick: u64,
    /// Latest observed contact. For `Exited` this is the last contact before separation.
    pub contact: CollisionPair,
}

impl CollisionEvent {
    #[inline]
    pub fn entities(&self) -> (hecs::Entity, hecs::Entity) {
        (self.contact.entity_a, self.contact.entity_b)
    }

    #[inline]
    pub fn involves(&self, entity: hecs::Entity) -> bool {
        self.contact.involves(entity)
    }

    pub fn other(&self, entity: hecs::Entity) -> Option<hecs::Entity> {
        self.contact.other(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());

        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        let key = PairKey::new(b, a);
        assert!(key.a.to_bits() < key.b.to_bits());
    }

    #[test]
    fn test_pair_perspective_helpers() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());

        let pair = CollisionPair::new(
            a,
            b,
            ContactInfo {
                direction: DVec2::X,
                penetration: 1.0,
                deepest_a: DVec2::ZERO,
                deepest_b: DVec2::ZERO,
            },
            false,
        );
        assert_eq!(pair.other(a), Some(b));
        assert_eq!(pair.other(c), None);
        assert_eq!(pair.direction_from(b), Some(-DVec2::X));
        assert!(pair.involves(b));
        assert!(!pair.involves(c));
    }

    #[test]
    fn test_contact_vertex_follows_pushed_body() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let info = ContactInfo {
            direction: DVec2::Y,
            penetration: 0.5,
            deepest_a: DVec2::new(0.0, 1.0),
            deepest_b: DVec2::new(0.0, 0.5),
        };

        assert_eq!(CollisionPair::with_motion(a, b, info, false, true, false).contact_vertex, info.deepest_a);
        assert_eq!(CollisionPair::with_motion(a, b, info, false, false, true).contact_vertex, info.deepest_b);
        assert_eq!(CollisionPair::with_motion(a, b, info, false, true, true).contact_vertex, info.deepest_b);
        assert_eq!(CollisionPair::new(a, b, info, false).contact_vertex, info.deepest_b);
    }
}
