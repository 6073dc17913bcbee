use approx::{assert_abs_diff_eq, assert_relative_eq};
use collide2d::{
    CircleShape, DistanceInput, EdgeShape, PolygonShape, Shape, SimplexCache, Transform, Vec2,
    collision::distance::test_overlap, compute_distance,
};

fn circle(radius: f32) -> Shape {
    CircleShape::new(radius).into()
}

#[test]
fn unit_circles_without_radii() {
    let input = DistanceInput::new(
        &circle(1.0),
        Transform::IDENTITY,
        &circle(1.0),
        Transform::from_position(Vec2::new(5.0, 0.0)),
        false,
    );

    let output = compute_distance(&input, &mut SimplexCache::default());
    assert_relative_eq!(output.distance, 5.0, epsilon = f32::EPSILON);
    assert!(output.iterations >= 1);
}

#[test]
fn warm_start_along_a_path() {
    let square: Shape = PolygonShape::new_box(1.0, 1.0).into();
    let diamond: Shape = PolygonShape::new_box(0.5, 0.5).into();
    let mut cache = SimplexCache::default();

    for step in 0..20 {
        let t = step as f32 * 0.05;
        let xf_b = Transform::new(Vec2::new(4.0 - t, 0.5 * t), 0.785 + t);
        let input = DistanceInput::new(&square, Transform::IDENTITY, &diamond, xf_b, true);

        let cold = compute_distance(&input, &mut SimplexCache::default());
        let warm = compute_distance(&input, &mut cache);

        assert_abs_diff_eq!(cold.distance, warm.distance, epsilon = 1e-4);

        // Same configuration again: the cache is already exact.
        let mut replay = cache;
        let again = compute_distance(&input, &mut replay);
        assert!(again.iterations <= cold.iterations);
        assert_abs_diff_eq!(again.distance, cold.distance, epsilon = 1e-4);
    }
}

#[test]
fn box_above_edge() {
    let edge: Shape = EdgeShape::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0)).into();
    let square: Shape = PolygonShape::new_box(0.5, 0.5).into();
    let xf_b = Transform::from_position(Vec2::new(1.0, 2.5));

    let input = DistanceInput::new(&edge, Transform::IDENTITY, &square, xf_b, false);
    let output = compute_distance(&input, &mut SimplexCache::default());

    assert_abs_diff_eq!(output.distance, 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(output.point_a.y, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(output.point_b.y, 2.0, epsilon = 1e-5);

    assert!(!test_overlap(&edge, &Transform::IDENTITY, &square, &xf_b));
    assert!(test_overlap(
        &edge,
        &Transform::IDENTITY,
        &square,
        &Transform::from_position(Vec2::new(1.0, 0.4)),
    ));
}
