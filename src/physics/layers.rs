//! Collision layer matrix: which named layers may interact.
//!
//! Layer names are interned to [`LayerId`]s when the matrix is built, and interaction is stored as
//! a dense symmetric table, so the per-pair check is two hash-free index lookups.

use rustc_hash::FxHashMap;

use crate::ecs::components::physics::Collider;

/// Most layers a matrix can hold. Declarations past this are refused.
pub const MAX_LAYERS: usize = 1024;

/// Interned layer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u16);

/// Symmetric layer interaction table.
///
/// Registering `a` ↔ `b` always registers `b` ↔ `a`. A pair of layers with no rule never
/// interacts.
///
/// Builders never fail. A name refused because the matrix already holds [`MAX_LAYERS`] layers is
/// remembered and reported by [`PhysicsWorld::new`](crate::physics::PhysicsWorld::new).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionLayerMatrix {
    names: Vec<String>,
    ids: FxHashMap<String, LayerId>,
    /// Row-major `stride²` table; rows and columns past `names.len()` are unused.
    table: Vec<bool>,
    stride: usize,
    overflow: Option<String>,
}

impl CollisionLayerMatrix {
    /// Empty matrix: no layers, nothing interacts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `layer -> [layers it may hit]` rules, e.g. a map loaded from scene config.
    pub fn from_rules<I, L, T, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matrix = Self::new();
        for (layer, targets) in rules {
            matrix.declare(layer.as_ref());
            for target in targets {
                matrix.set(layer.as_ref(), target.as_ref());
            }
        }
        matrix
    }

    /// Builder-style rule registration.
    pub fn allow(mut self, a: &str, b: &str) -> Self {
        self.set(a, b);
        self
    }

    /// Register `a` ↔ `b`. Returns `false` if either layer could not be declared.
    pub fn set(&mut self, a: &str, b: &str) -> bool {
        let (Some(a), Some(b)) = (self.declare(a), self.declare(b)) else {
            return false;
        };
        let stride = self.stride;
        self.table[a.0 as usize * stride + b.0 as usize] = true;
        self.table[b.0 as usize * stride + a.0 as usize] = true;
        true
    }

    /// Make a layer known without letting it interact with anything.
    ///
    /// Returns `None` once the matrix holds [`MAX_LAYERS`] layers.
    pub fn declare(&mut self, name: &str) -> Option<LayerId> {
        if let Some(id) = self.ids.get(name) {
            return Some(*id);
        }
        let index = self.names.len();
        let id = match u16::try_from(index) {
            Ok(raw) if index < MAX_LAYERS => LayerId(raw),
            _ => {
                tracing::warn!(layer = name, max = MAX_LAYERS, "collision layer limit reached");
                self.overflow.get_or_insert_with(|| name.to_owned());
                return None;
            }
        };
        if index == self.stride {
            self.grow();
        }
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        Some(id)
    }

    /// Double the table stride, keeping every rule.
    fn grow(&mut self) {
        let old = self.stride;
        let stride = (old * 2).clamp(8, MAX_LAYERS);
        let mut table = vec![false; stride * stride];
        for row in 0..old {
            table[row * stride..row * stride + old].copy_from_slice(&self.table[row * old..(row + 1) * old]);
        }
        self.table = table;
        self.stride = stride;
    }

    /// First layer name refused because the matrix was full.
    pub fn overflow(&self) -> Option<&str> {
        self.overflow.as_deref()
    }

    #[inline]
    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub fn contains_layer(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn layer_name(&self, id: LayerId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn layer_count(&self) -> usize {
        self.names.len()
    }

    /// Whether two interned layers may interact.
    #[inline]
    pub fn may_collide_ids(&self, a: LayerId, b: LayerId) -> bool {
        let (a, b) = (a.0 as usize, b.0 as usize);
        let n = self.names.len();
        a < n && b < n && self.table[a * self.stride + b]
    }

    /// Whether two named layers may interact. Unknown layers never interact.
    pub fn may_collide(&self, a: &str, b: &str) -> bool {
        match (self.layer_id(a), self.layer_id(b)) {
            (Some(a), Some(b)) => self.may_collide_ids(a, b),
            _ => false,
        }
    }

    /// Matrix check plus both colliders' `ignore_layers` overrides.
    pub fn allows(&self, a: &Collider, b: &Collider) -> bool {
        self.may_collide(&a.layer, &b.layer)
            && !a.ignore_layers.iter().any(|l| *l == b.layer)
            && !b.ignore_layers.iter().any(|l| *l == a.layer)
    }
}

/// A collider's layer settings resolved against the matrix for one tick.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayerMask {
    pub layer: LayerId,
    pub ignore: smallvec::SmallVec<[LayerId; 4]>,
}

impl LayerMask {
    /// `None` when the collider's own layer is unknown. Unknown ignore entries cannot match
    /// anything and are dropped.
    pub fn resolve(matrix: &CollisionLayerMatrix, collider: &Collider) -> Option<Self> {
        let layer = matrix.layer_id(&collider.layer)?;
        let ignore = collider
            .ignore_layers
            .iter()
            .filter_map(|name| matrix.layer_id(name))
            .collect();
        Some(Self { layer, ignore })
    }

    #[inline]
    pub fn allows(&self, other: &LayerMask, matrix: &CollisionLayerMatrix) -> bool {
        matrix.may_collide_ids(self.layer, other.layer)
            && !self.ignore.contains(&other.layer)
            && !other.ignore.contains(&self.layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::physics::ColliderShape;
    use std::collections::BTreeMap;

    #[test]
    fn test_rules_are_symmetric() {
        let matrix = CollisionLayerMatrix::from_rules([("player", vec!["enemy", "wall"])]);

        assert!(matrix.may_collide("player", "enemy"));
        assert!(matrix.may_collide("enemy", "player"));
        assert!(matrix.may_collide("wall", "player"));
        assert!(!matrix.may_collide("enemy", "wall"));
        assert!(!matrix.may_collide("player", "player"));
    }

    #[test]
    fn test_unknown_layers_never_collide() {
        let matrix = CollisionLayerMatrix::new().allow("a", "a");
        assert!(matrix.may_collide("a", "a"));
        assert!(!matrix.may_collide("a", "b"));
        assert!(!matrix.may_collide("b", "b"));
    }

    #[test]
    fn test_declared_layer_without_rules() {
        let matrix = CollisionLayerMatrix::from_rules([("ui", Vec::<&str>::new())]);
        assert!(matrix.contains_layer("ui"));
        assert!(!matrix.may_collide("ui", "ui"));
    }

    #[test]
    fn test_growing_keeps_existing_rules() {
        let mut matrix = CollisionLayerMatrix::new().allow("a", "b");
        for name in ["c", "d", "e"] {
            matrix.declare(name);
        }
        matrix.set("e", "a");
        assert!(matrix.may_collide("a", "b"));
        assert!(matrix.may_collide("b", "a"));
        assert!(matrix.may_collide("a", "e"));
        assert!(!matrix.may_collide("b", "e"));
        assert_eq!(matrix.layer_count(), 5);
        assert_eq!(matrix.layer_name(LayerId(2)), Some("c"));
    }

    #[test]
    fn test_growing_past_initial_stride() {
        let mut matrix = CollisionLayerMatrix::new().allow("l0", "l1");
        for i in 2..40 {
            let name = format!("l{i}");
            matrix.set(&name, "l0");
        }
        assert_eq!(matrix.layer_count(), 40);
        assert!(matrix.may_collide("l0", "l1"));
        assert!(matrix.may_collide("l39", "l0"));
        assert!(!matrix.may_collide("l39", "l1"));
        assert!(!matrix.may_collide_ids(LayerId(0), LayerId(40)));
    }

    #[test]
    fn test_layer_limit_is_reported() {
        let mut matrix = CollisionLayerMatrix::new();
        for i in 0..MAX_LAYERS {
            assert_eq!(matrix.declare(&format!("l{i}")), Some(LayerId(i as u16)));
        }
        assert_eq!(matrix.declare("l0"), Some(LayerId(0)));
        assert_eq!(matrix.declare("extra"), None);
        assert!(!matrix.set("extra", "l0"));
        assert!(!matrix.contains_layer("extra"));
        assert_eq!(matrix.layer_count(), MAX_LAYERS);
        assert_eq!(matrix.overflow(), Some("extra"));
    }

    #[test]
    fn test_from_map_config() {
        let mut config: BTreeMap<String, Vec<String>> = BTreeMap::new();
        config.insert("terrain".into(), vec!["player".into()]);
        let matrix = CollisionLayerMatrix::from_rules(config);
        assert!(matrix.may_collide("player", "terrain"));
    }

    #[test]
    fn test_ignore_layers_override_matrix() {
        let matrix = CollisionLayerMatrix::new()
            .allow("player", "enemy")
            .allow("player", "player");
        let player = Collider::new(ColliderShape::circle(1.0)).with_layer("player");
        let ghost = Collider::new(ColliderShape::circle(1.0))
            .with_layer("enemy")
            .ignoring("player");
        let enemy = Collider::new(ColliderShape::circle(1.0)).with_layer("enemy");

        assert!(matrix.allows(&player, &enemy));
        assert!(!matrix.allows(&player, &ghost));
        assert!(!matrix.allows(&ghost, &player));

        let a = LayerMask::resolve(&matrix, &player).unwrap();
        let b = LayerMask::resolve(&matrix, &ghost).unwrap();
        let c = LayerMask::resolve(&matrix, &enemy).unwrap();
        assert!(a.allows(&c, &matrix));
        assert!(!a.allows(&b, &matrix));
        assert!(!b.allows(&a, &matrix));
    }

    #[test]
    fn test_mask_unknown_layer() {
        let matrix = CollisionLayerMatrix::new().allow("a", "a");
        let c = Collider::new(ColliderShape::circle(1.0)).with_layer("nope");
        assert!(LayerMask::resolve(&matrix, &c).is_none());
    }
}
