use glam::Vec2;

use super::manifold::{ContactId, Manifold, ManifoldPoint, ManifoldType};
use crate::{
    collision::shapes::{CircleShape, PolygonShape},
    math::Transform,
    settings::EPSILON,
};

pub fn collide_circles(
    manifold: &mut Manifold,
    circle_a: &CircleShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) {
    manifold.clear();

    let p_a = xf_a.mul(circle_a.position);
    let p_b = xf_b.mul(circle_b.position);

    let dist_sqr = (p_b - p_a).length_squared();
    let radius = circle_a.radius + circle_b.radius;
    manifold.dist_sqr = dist_sqr;
    if dist_sqr > radius * radius {
        return;
    }

    manifold.set_single(
        ManifoldType::Circles,
        Vec2::ZERO,
        circle_a.position,
        ManifoldPoint::new(circle_b.position, ContactId::ZERO),
    );
}

pub fn collide_polygon_and_circle(
    manifold: &mut Manifold,
    polygon_a: &PolygonShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) {
    manifold.clear();

    // Circle center in the polygon's frame.
    let c_local = xf_a.mul_t(xf_b.mul(circle_b.position));

    // Edge of minimum penetration.
    let mut normal_index = 0;
    let mut separation = -f32::MAX;
    let radius = polygon_a.radius + circle_b.radius;
    let vertex_count = polygon_a.count();

    for (i, (&v, n)) in polygon_a.vertices.iter().zip(&polygon_a.normals).enumerate() {
        let s = n.dot(c_local - v);
        if s > radius {
            return;
        }

        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let vert_index1 = normal_index;
    let vert_index2 = if vert_index1 + 1 < vertex_count {
        vert_index1 + 1
    } else {
        0
    };
    let v1 = polygon_a.vertices[vert_index1];
    let v2 = polygon_a.vertices[vert_index2];
    let point = ManifoldPoint::new(circle_b.position, ContactId::ZERO);

    // Center inside the polygon.
    if separation < EPSILON {
        manifold.set_single(
            ManifoldType::FaceA,
            polygon_a.normals[normal_index],
            0.5 * (v1 + v2),
            point,
        );
        return;
    }

    // Voronoi regions of the face.
    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);

    if u1 <= 0.0 {
        if c_local.distance_squared(v1) > radius * radius {
            return;
        }

        manifold.set_single(
            ManifoldType::FaceA,
            (c_local - v1).normalize(),
            v1,
            point,
        );
    } else if u2 <= 0.0 {
        if c_local.distance_squared(v2) > radius * radius {
            return;
        }

        manifold.set_single(
            ManifoldType::FaceA,
            (c_local - v2).normalize(),
            v2,
            point,
        );
    } else {
        let face_center = 0.5 * (v1 + v2);
        let separation = (c_local - face_center).dot(polygon_a.normals[vert_index1]);
        if separation > radius {
            return;
        }

        manifold.set_single(
            ManifoldType::FaceA,
            polygon_a.normals[vert_index1],
            face_center,
            point,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::narrowphase::manifold::WorldManifold;

    #[test]
    fn circles_touch_within_radii() {
        let circle = CircleShape::new(1.0);
        let mut m = Manifold::default();

        collide_circles(
            &mut m,
            &circle,
            &Transform::IDENTITY,
            &circle,
            &Transform::from_position(Vec2::new(1.5, 0.0)),
        );
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::Circles);
        assert!((m.dist_sqr - 2.25).abs() < 1e-6);

        collide_circles(
            &mut m,
            &circle,
            &Transform::IDENTITY,
            &circle,
            &Transform::from_position(Vec2::new(3.0, 0.0)),
        );
        assert_eq!(m.point_count(), 0);
    }

    #[test]
    fn circle_on_box_face() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let circle = CircleShape::new(0.5);
        let mut m = Manifold::default();
        let xf_b = Transform::from_position(Vec2::new(0.0, 1.4));

        collide_polygon_and_circle(&mut m, &b, &Transform::IDENTITY, &circle, &xf_b);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::FaceA);
        assert_eq!(m.local_normal, Vec2::Y);
        assert_eq!(m.local_point, Vec2::new(0.0, 1.0));

        let wm = WorldManifold::new(&m, &Transform::IDENTITY, b.radius, &xf_b, circle.radius);
        assert!((wm.normal - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn circle_near_box_corner() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let circle = CircleShape::new(0.5);
        let mut m = Manifold::default();

        let near = Transform::from_position(Vec2::new(1.3, 1.3));
        collide_polygon_and_circle(&mut m, &b, &Transform::IDENTITY, &circle, &near);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.local_point, Vec2::new(1.0, 1.0));
        let diag = Vec2::splat(std::f32::consts::FRAC_1_SQRT_2);
        assert!((m.local_normal - diag).length() < 1e-5);

        let far = Transform::from_position(Vec2::new(1.45, 1.45));
        collide_polygon_and_circle(&mut m, &b, &Transform::IDENTITY, &circle, &far);
        assert_eq!(m.point_count(), 0);
    }

    #[test]
    fn circle_center_inside_box() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let circle = CircleShape::new(0.1);
        let mut m = Manifold::default();

        let inside = Transform::from_position(Vec2::new(0.9, 0.0));
        collide_polygon_and_circle(&mut m, &b, &Transform::IDENTITY, &circle, &inside);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.local_normal, Vec2::X);
    }
}
