//! Narrowphase collision detection: separating axis theorem over rectangles, circles and polygons.
//!
//! Every shape-kind combination maps to one entry of the dispatch table in [`detect_collision`],
//! which only decides the candidate axes. The projection and MTV logic is shared by all pairs in
//! [`separating_axis_test`].
//!
//! Candidate axes are folded into one half-plane and sorted before projection, so `(a, b)` and
//! `(b, a)` test the same axes in the same order and return exactly negated directions.

use glam::DVec2;
use smallvec::SmallVec;

use super::collider::{ShapeKind, WorldShape};
use super::contact::ContactInfo;

/// Recommended overlap tolerance in world units.
pub const DEFAULT_EPSILON: f64 = 1e-4;

type Axes = SmallVec<[DVec2; 16]>;

/// Detect collision between two shapes, dispatching on the shape-kind pair.
///
/// Returns `None` when the shapes are disjoint or overlap by no more than `epsilon` on some axis.
/// The returned direction points from `a` toward `b`.
pub fn detect_collision(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    match (a.kind(), b.kind()) {
        (ShapeKind::Rectangle, ShapeKind::Rectangle) => rectangle_rectangle(a, b, epsilon),
        (ShapeKind::Rectangle, ShapeKind::Circle) => polygonal_circle(a, b, epsilon),
        (ShapeKind::Rectangle, ShapeKind::Polygon) => polygonal_polygonal(a, b, epsilon),
        (ShapeKind::Circle, ShapeKind::Rectangle) => circle_polygonal(a, b, epsilon),
        (ShapeKind::Circle, ShapeKind::Circle) => circle_circle(a, b, epsilon),
        (ShapeKind::Circle, ShapeKind::Polygon) => circle_polygonal(a, b, epsilon),
        (ShapeKind::Polygon, ShapeKind::Rectangle) => polygonal_polygonal(a, b, epsilon),
        (ShapeKind::Polygon, ShapeKind::Circle) => polygonal_circle(a, b, epsilon),
        (ShapeKind::Polygon, ShapeKind::Polygon) => polygonal_polygonal(a, b, epsilon),
    }
}

/// Test every part of one collider against every part of another.
///
/// A compound collider reports a single contact per other collider: the part pair with the
/// smallest penetration (earliest pair on ties).
pub fn detect_compound(a: &[WorldShape], b: &[WorldShape], epsilon: f64) -> Option<ContactInfo> {
    let mut best: Option<ContactInfo> = None;
    for shape_a in a {
        for shape_b in b {
            if let Some(info) = detect_collision(shape_a, shape_b, epsilon) {
                if best.map_or(true, |current| info.penetration < current.penetration) {
                    best = Some(info);
                }
            }
        }
    }
    best
}

/// Two face normals per rectangle.
pub fn rectangle_rectangle(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    polygonal_polygonal(a, b, epsilon)
}

/// Edge normals of both shapes (rectangles contribute two, polygons one per edge).
pub fn polygonal_polygonal(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    let mut axes = Axes::new();
    a.push_edge_normals(&mut axes);
    b.push_edge_normals(&mut axes);
    separating_axis_test(a, b, &axes, epsilon)
}

/// Polygon edge normals, then the axis from the circle center to the nearest polygon vertex.
pub fn polygonal_circle(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    let mut axes = Axes::new();
    a.push_edge_normals(&mut axes);
    push_vertex_axis(a, b.center(), &mut axes);
    separating_axis_test(a, b, &axes, epsilon)
}

/// Same axis set as [`polygonal_circle`].
pub fn circle_polygonal(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    let mut axes = Axes::new();
    b.push_edge_normals(&mut axes);
    push_vertex_axis(b, a.center(), &mut axes);
    separating_axis_test(a, b, &axes, epsilon)
}

/// Single axis through both centers. Coincident centers separate along +Y.
pub fn circle_circle(a: &WorldShape, b: &WorldShape, epsilon: f64) -> Option<ContactInfo> {
    let diff = b.center() - a.center();
    let axis = if diff.length_squared() > 1e-20 {
        diff.normalize()
    } else {
        DVec2::Y
    };
    separating_axis_test(a, b, &[axis], epsilon)
}

fn push_vertex_axis(polygonal: &WorldShape, circle_center: DVec2, axes: &mut Axes) {
    if let Some(vertex) = polygonal.nearest_vertex(circle_center) {
        let axis = (vertex - circle_center).normalize_or_zero();
        if axis != DVec2::ZERO {
            axes.push(axis);
        }
    }
}

/// Fold an axis into the half-plane `x > 0` (or `x == 0`, `y > 0`), with `-0.0` mapped to `0.0`.
#[inline]
fn canonical_axis(axis: DVec2) -> DVec2 {
    let folded = if axis.x < 0.0 || (axis.x == 0.0 && axis.y < 0.0) {
        -axis
    } else {
        axis
    };
    folded + DVec2::ZERO
}

/// Canonical, sorted and deduplicated copy of `axes`.
fn canonical_axes(axes: &[DVec2]) -> Axes {
    let mut canonical: Axes = axes.iter().map(|&axis| canonical_axis(axis)).collect();
    canonical.sort_unstable_by(|l, r| l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y)));
    canonical.dedup();
    canonical
}

/// Project both shapes on every axis and keep the smallest separating translation.
///
/// Axes are tested in canonical order (see the module docs). On each axis the push direction
/// points toward `b`'s projection midpoint, or along the canonical axis when the midpoints
/// coincide. Equal depths keep the earlier axis.
pub fn separating_axis_test(
    a: &WorldShape,
    b: &WorldShape,
    axes: &[DVec2],
    epsilon: f64,
) -> Option<ContactInfo> {
    let mut best: Option<(f64, DVec2)> = None;

    for axis in canonical_axes(axes) {
        let proj_a = a.project(axis);
        let proj_b = b.project(axis);

        if proj_a.overlap(&proj_b) <= epsilon {
            return None;
        }

        let (depth, direction) = if proj_b.midpoint() >= proj_a.midpoint() {
            (proj_a.max - proj_b.min, axis)
        } else {
            (proj_b.max - proj_a.min, -axis)
        };

        if best.map_or(true, |(best_depth, _)| depth < best_depth) {
            best = Some((depth, direction));
        }
    }

    let (penetration, direction) = best?;
    Some(ContactInfo {
        direction,
        penetration,
        deepest_a: a.support(direction),
        deepest_b: b.support(-direction),
    })
}
