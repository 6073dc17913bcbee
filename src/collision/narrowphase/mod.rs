mod collide_circle;
mod collide_edge;
mod collide_polygon;
mod manifold;

pub use collide_circle::*;
pub use collide_edge::*;
pub use collide_polygon::collide_polygons;
pub use manifold::*;

use crate::{
    collision::shapes::{Shape, ShapeType},
    math::Transform,
};

/// The manifold routine a canonically ordered shape pair runs through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactType {
    Circle,
    PolygonAndCircle,
    Polygon,
    EdgeAndCircle,
    EdgeAndPolygon,
}

impl ContactType {
    /// `None` for pairs that are not in canonical order or have no routine.
    #[must_use]
    pub const fn from_types(type_a: ShapeType, type_b: ShapeType) -> Option<Self> {
        match (type_a, type_b) {
            (ShapeType::Circle, ShapeType::Circle) => Some(Self::Circle),
            (ShapeType::Polygon, ShapeType::Circle) => Some(Self::PolygonAndCircle),
            (ShapeType::Polygon, ShapeType::Polygon) => Some(Self::Polygon),
            (ShapeType::Edge, ShapeType::Circle) => Some(Self::EdgeAndCircle),
            (ShapeType::Edge, ShapeType::Polygon) => Some(Self::EdgeAndPolygon),
            _ => None,
        }
    }

    /// Whether `(type_a, type_b)` must be swapped before evaluation.
    ///
    /// Shapes are ordered by type with the higher type on side A, except that an
    /// edge always comes before a polygon.
    #[must_use]
    pub fn needs_swap(type_a: ShapeType, type_b: ShapeType) -> bool {
        let keep = (type_a >= type_b
            || (type_a == ShapeType::Edge && type_b == ShapeType::Polygon))
            && !(type_b == ShapeType::Edge && type_a == ShapeType::Polygon);
        !keep
    }
}

/// Computes the manifold for a canonically ordered shape pair.
///
/// # Panics
///
/// If the pair is not canonical (see [`ContactType::needs_swap`]) or is edge-edge.
pub fn evaluate(
    manifold: &mut Manifold,
    shape_a: &Shape,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) {
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(manifold, a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Circle(b)) => {
            collide_polygon_and_circle(manifold, a, xf_a, b, xf_b);
        }
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(manifold, a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(manifold, a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Polygon(b)) => {
            collide_edge_and_polygon(manifold, a, xf_a, b, xf_b);
        }
        (a, b) => panic!(
            "no manifold routine for {:?} against {:?}",
            a.shape_type(),
            b.shape_type()
        ),
    }
}

/// Like [`evaluate`], but accepts the pair in any order. The manifold is always
/// expressed with `shape_a` on side A.
///
/// Returns `true` when the pair had to be swapped internally; the manifold's
/// feature tags and manifold type are already flipped back in that case.
pub fn evaluate_any(
    manifold: &mut Manifold,
    shape_a: &Shape,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) -> bool {
    if !ContactType::needs_swap(shape_a.shape_type(), shape_b.shape_type()) {
        evaluate(manifold, shape_a, xf_a, shape_b, xf_b);
        return false;
    }

    evaluate(manifold, shape_b, xf_b, shape_a, xf_a);
    manifold.manifold_type = match manifold.manifold_type {
        ManifoldType::Circles => {
            // Circles keeps the A point in local_point and the B point per contact.
            if let Some(mp) = manifold.points.first_mut() {
                std::mem::swap(&mut mp.local_point, &mut manifold.local_point);
            }
            ManifoldType::Circles
        }
        ManifoldType::FaceA => ManifoldType::FaceB,
        ManifoldType::FaceB => ManifoldType::FaceA,
    };
    for mp in &mut manifold.points {
        mp.id = mp.id.features().swapped().into();
    }

    true
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::collision::shapes::{CircleShape, EdgeShape, PolygonShape};

    #[test]
    fn canonical_order() {
        use ShapeType::*;

        assert!(!ContactType::needs_swap(Circle, Circle));
        assert!(!ContactType::needs_swap(Polygon, Circle));
        assert!(ContactType::needs_swap(Circle, Polygon));
        assert!(!ContactType::needs_swap(Edge, Polygon));
        assert!(ContactType::needs_swap(Polygon, Edge));
        assert!(!ContactType::needs_swap(Edge, Circle));
        assert!(ContactType::needs_swap(Circle, Edge));

        for a in [Circle, Edge, Polygon] {
            for b in [Circle, Edge, Polygon] {
                let (a, b) = if ContactType::needs_swap(a, b) { (b, a) } else { (a, b) };
                assert_eq!(
                    ContactType::from_types(a, b).is_none(),
                    a == Edge && b == Edge
                );
            }
        }
    }

    #[test]
    fn evaluate_any_swaps_back() {
        let circle = Shape::from(CircleShape::new(0.5));
        let poly = Shape::from(PolygonShape::new_box(1.0, 1.0));
        let xf_c = Transform::from_position(Vec2::new(0.0, 1.4));

        let mut direct = Manifold::default();
        evaluate(&mut direct, &poly, &Transform::IDENTITY, &circle, &xf_c);

        let mut swapped = Manifold::default();
        assert!(evaluate_any(&mut swapped, &circle, &xf_c, &poly, &Transform::IDENTITY));
        assert_eq!(swapped.manifold_type, ManifoldType::FaceB);
        assert_eq!(swapped.local_normal, direct.local_normal);
        assert_eq!(swapped.point_count(), direct.point_count());
    }

    #[test]
    #[should_panic(expected = "no manifold routine")]
    fn edge_edge_is_unsupported() {
        let edge = Shape::from(EdgeShape::new(Vec2::ZERO, Vec2::X));
        let mut m = Manifold::default();
        evaluate(&mut m, &edge, &Transform::IDENTITY, &edge, &Transform::IDENTITY);
    }
}
