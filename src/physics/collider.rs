//! Collider shape geometry: validation, world-space shapes, projections and bounding boxes.

use std::f64::consts::TAU;

use glam::{DAffine2, DVec2};
use smallvec::SmallVec;

use crate::ecs::components::physics::{ColliderPart, ColliderShape};
use crate::ecs::components::transform::GlobalTransform;

use super::error::ShapeError;

/// Inline vertex storage; typical polygons fit without a heap allocation.
pub type Vertices = SmallVec<[DVec2; 8]>;

/// Area and cross-product magnitudes below this are treated as zero.
const GEOMETRY_EPSILON: f64 = 1e-12;

/// Axis-aligned bounding box for broadphase collision detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Empty input yields a degenerate box at the origin.
    pub fn from_points(points: &[DVec2]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::new(DVec2::ZERO, DVec2::ZERO);
        };
        rest.iter().fold(Self::new(*first, *first), |aabb, p| Self {
            min: aabb.min.min(*p),
            max: aabb.max.max(*p),
        })
    }

    /// Test whether two AABBs overlap. Touching boxes count as overlapping.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn contains_point(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }
}

/// Projection of a shape onto an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Length of the shared sub-interval; zero or negative when disjoint.
    #[inline]
    pub fn overlap(&self, other: &Interval) -> f64 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) * 0.5
    }
}

/// Discriminant of [`ColliderShape`] and [`WorldShape`], used by the narrowphase dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
}

/// A collider part resolved into world space for the current tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldShape {
    /// Corners in counter-clockwise local order. A parallelogram when the transform shears.
    Rectangle { vertices: [DVec2; 4] },
    Circle { center: DVec2, radius: f64 },
    Polygon { vertices: Vertices, centroid: DVec2 },
}

impl ColliderShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Rectangle { .. } => ShapeKind::Rectangle,
            ColliderShape::Circle { .. } => ShapeKind::Circle,
            ColliderShape::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Check dimensions and, for polygons, vertex count, area and convexity.
    pub fn validate(&self) -> Result<(), ShapeError> {
        match self {
            ColliderShape::Rectangle { width, height } => {
                positive("rectangle width", *width)?;
                positive("rectangle height", *height)
            }
            ColliderShape::Circle { radius } => positive("circle radius", *radius),
            ColliderShape::Polygon { vertices } => validate_polygon(vertices),
        }
    }

    /// Resolve the shape into world space.
    pub fn to_world(&self, to_world: &DAffine2) -> WorldShape {
        match self {
            ColliderShape::Rectangle { width, height } => {
                let h = DVec2::new(width * 0.5, height * 0.5);
                WorldShape::Rectangle {
                    vertices: [
                        to_world.transform_point2(DVec2::new(-h.x, -h.y)),
                        to_world.transform_point2(DVec2::new(h.x, -h.y)),
                        to_world.transform_point2(DVec2::new(h.x, h.y)),
                        to_world.transform_point2(DVec2::new(-h.x, h.y)),
                    ],
                }
            }
            ColliderShape::Circle { radius } => {
                let scale_x = to_world.matrix2.x_axis.length();
                let scale_y = to_world.matrix2.y_axis.length();
                WorldShape::Circle {
                    center: to_world.translation,
                    radius: *radius * scale_x.max(scale_y),
                }
            }
            ColliderShape::Polygon { vertices } => {
                let vertices: Vertices = vertices
                    .iter()
                    .map(|v| to_world.transform_point2(*v))
                    .collect();
                let centroid = polygon_centroid(&vertices);
                WorldShape::Polygon { vertices, centroid }
            }
        }
    }
}

impl ColliderPart {
    /// World transform of this part given the owning entity's world transform.
    #[inline]
    pub fn world_affine(&self, global: &GlobalTransform) -> DAffine2 {
        global.0 * DAffine2::from_angle_translation(self.rotation, self.offset)
    }

    pub fn to_world(&self, global: &GlobalTransform) -> WorldShape {
        self.shape.to_world(&self.world_affine(global))
    }
}

impl WorldShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            WorldShape::Rectangle { .. } => ShapeKind::Rectangle,
            WorldShape::Circle { .. } => ShapeKind::Circle,
            WorldShape::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Polygonal vertices; empty for circles.
    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        match self {
            WorldShape::Rectangle { vertices } => vertices,
            WorldShape::Circle { .. } => &[],
            WorldShape::Polygon { vertices, .. } => vertices,
        }
    }

    pub fn center(&self) -> DVec2 {
        match self {
            WorldShape::Rectangle { vertices } => (vertices[0] + vertices[2]) * 0.5,
            WorldShape::Circle { center, .. } => *center,
            WorldShape::Polygon { centroid, .. } => *centroid,
        }
    }

    pub fn aabb(&self) -> Aabb {
        match self {
            WorldShape::Circle { center, radius } => Aabb {
                min: *center - DVec2::splat(*radius),
                max: *center + DVec2::splat(*radius),
            },
            _ => Aabb::from_points(self.vertices()),
        }
    }

    /// Project onto a unit axis.
    #[inline]
    pub fn project(&self, axis: DVec2) -> Interval {
        match self {
            WorldShape::Circle { center, radius } => {
                let c = center.dot(axis);
                Interval {
                    min: c - radius,
                    max: c + radius,
                }
            }
            _ => {
                let mut interval = Interval {
                    min: f64::INFINITY,
                    max: f64::NEG_INFINITY,
                };
                for v in self.vertices() {
                    let d = v.dot(axis);
                    interval.min = interval.min.min(d);
                    interval.max = interval.max.max(d);
                }
                interval
            }
        }
    }

    /// Farthest point in the given direction. Ties resolve to the earliest vertex.
    pub fn support(&self, direction: DVec2) -> DVec2 {
        match self {
            WorldShape::Circle { center, radius } => {
                *center + direction.normalize_or_zero() * *radius
            }
            _ => {
                let Some((first, rest)) = self.vertices().split_first() else {
                    return DVec2::ZERO;
                };
                let mut best = *first;
                let mut best_dot = best.dot(direction);
                for v in rest {
                    let d = v.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = *v;
                    }
                }
                best
            }
        }
    }

    /// Append this shape's candidate separating axes (unit edge normals).
    ///
    /// A rectangle contributes its two distinct face normals, a polygon one per edge, a circle none.
    pub fn push_edge_normals(&self, axes: &mut SmallVec<[DVec2; 16]>) {
        match self {
            WorldShape::Rectangle { vertices } => {
                for i in 0..2 {
                    push_normal(axes, vertices[i + 1] - vertices[i]);
                }
            }
            WorldShape::Circle { .. } => {}
            WorldShape::Polygon { vertices, .. } => {
                for (i, v) in vertices.iter().enumerate() {
                    let next = vertices[(i + 1) % vertices.len()];
                    push_normal(axes, next - *v);
                }
            }
        }
    }

    /// Vertex closest to `point`. Ties resolve to the earliest vertex.
    pub fn nearest_vertex(&self, point: DVec2) -> Option<DVec2> {
        let mut best: Option<(DVec2, f64)> = None;
        for v in self.vertices() {
            let d = v.distance_squared(point);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((*v, d));
            }
        }
        best.map(|(v, _)| v)
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        match self {
            WorldShape::Circle { center, radius } => center.distance_squared(point) <= radius * radius,
            _ => {
                let vertices = self.vertices();
                let mut sign = 0.0f64;
                for (i, v) in vertices.iter().enumerate() {
                    let next = vertices[(i + 1) % vertices.len()];
                    let cross = (next - *v).perp_dot(point - *v);
                    if cross.abs() <= GEOMETRY_EPSILON {
                        continue;
                    }
                    if sign == 0.0 {
                        sign = cross.signum();
                    } else if cross.signum() != sign {
                        return false;
                    }
                }
                true
            }
        }
    }
}

fn push_normal(axes: &mut SmallVec<[DVec2; 16]>, edge: DVec2) {
    let normal = DVec2::new(edge.y, -edge.x).normalize_or_zero();
    if normal != DVec2::ZERO {
        axes.push(normal);
    }
}

fn positive(what: &'static str, value: f64) -> Result<(), ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidDimension { what, value })
    }
}

/// Shoelace signed area. Positive for counter-clockwise winding.
pub fn signed_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    let twice: f64 = (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum();
    twice * 0.5
}

fn polygon_centroid(vertices: &[DVec2]) -> DVec2 {
    let n = vertices.len();
    if n == 0 {
        return DVec2::ZERO;
    }
    let area = signed_area(vertices);
    if area.abs() <= GEOMETRY_EPSILON {
        return vertices.iter().copied().sum::<DVec2>() / n as f64;
    }
    let mut acc = DVec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        acc += (a + b) * a.perp_dot(b);
    }
    acc / (6.0 * area)
}

fn validate_polygon(vertices: &[DVec2]) -> Result<(), ShapeError> {
    let n = vertices.len();
    if n < 3 {
        return Err(ShapeError::TooFewVertices { count: n });
    }
    for v in vertices {
        if !v.is_finite() {
            return Err(ShapeError::InvalidDimension {
                what: "polygon vertex",
                value: if v.x.is_finite() { v.y } else { v.x },
            });
        }
    }
    let area = signed_area(vertices);
    if area.abs() <= GEOMETRY_EPSILON {
        return Err(ShapeError::DegeneratePolygon);
    }

    // Every turn must agree with the winding, and the turns must add up to one full revolution
    // (rules out self-intersecting stars).
    let winding = area.signum();
    let mut turning = 0.0;
    for i in 0..n {
        let e0 = vertices[(i + 1) % n] - vertices[i];
        let e1 = vertices[(i + 2) % n] - vertices[(i + 1) % n];
        let cross = e0.perp_dot(e1);
        if cross.abs() > GEOMETRY_EPSILON && cross.signum() != winding {
            return Err(ShapeError::NonConvexPolygon);
        }
        turning += cross.atan2(e0.dot(e1));
    }
    if (turning.abs() - TAU).abs() > 1e-6 {
        return Err(ShapeError::NonConvexPolygon);
    }

    Ok(())
}
