use approx::assert_abs_diff_eq;
use collide2d::{
    CircleShape, EdgeShape, Manifold, ManifoldType, PolygonShape, Shape, Transform, Vec2,
    WorldManifold,
    collision::narrowphase::{collide_circles, evaluate_any},
};

const TOL: f32 = 1e-4;

fn world_manifold(
    shape_a: &Shape,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) -> (Manifold, WorldManifold) {
    let mut manifold = Manifold::default();
    evaluate_any(&mut manifold, shape_a, xf_a, shape_b, xf_b);
    let world = WorldManifold::new(&manifold, xf_a, shape_a.radius(), xf_b, shape_b.radius());
    (manifold, world)
}

fn sorted_points(world: &WorldManifold) -> Vec<Vec2> {
    let mut points = world.points[..world.point_count].to_vec();
    points.sort_by(|p, q| p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y)));
    points
}

/// Evaluates the pair both ways round and checks that the results mirror each
/// other. Feature ids are compared when both orders pick the same reference face.
fn assert_symmetric(
    shape_a: Shape,
    xf_a: Transform,
    shape_b: Shape,
    xf_b: Transform,
    same_reference: bool,
) {
    let (m1, w1) = world_manifold(&shape_a, &xf_a, &shape_b, &xf_b);
    let (m2, w2) = world_manifold(&shape_b, &xf_b, &shape_a, &xf_a);

    assert!(m1.point_count() > 0, "pair should touch");
    assert_eq!(m1.point_count(), m2.point_count());

    assert_abs_diff_eq!(w1.normal.x, -w2.normal.x, epsilon = TOL);
    assert_abs_diff_eq!(w1.normal.y, -w2.normal.y, epsilon = TOL);

    for (p1, p2) in sorted_points(&w1).iter().zip(&sorted_points(&w2)) {
        assert_abs_diff_eq!(p1.x, p2.x, epsilon = TOL);
        assert_abs_diff_eq!(p1.y, p2.y, epsilon = TOL);
    }

    if same_reference {
        let flipped = match m1.manifold_type {
            ManifoldType::Circles => ManifoldType::Circles,
            ManifoldType::FaceA => ManifoldType::FaceB,
            ManifoldType::FaceB => ManifoldType::FaceA,
        };
        assert_eq!(m2.manifold_type, flipped);

        let mut ids1: Vec<_> = m1.points.iter().map(|mp| mp.id.features().swapped()).collect();
        let mut ids2: Vec<_> = m2.points.iter().map(|mp| mp.id.features()).collect();
        ids1.sort_by_key(|cf| (cf.index_a, cf.index_b));
        ids2.sort_by_key(|cf| (cf.index_a, cf.index_b));
        assert_eq!(ids1, ids2);
    }
}

#[test]
fn circle_pair_is_symmetric() {
    assert_symmetric(
        CircleShape::new(1.0).into(),
        Transform::IDENTITY,
        CircleShape::new(1.0).into(),
        Transform::from_position(Vec2::new(1.5, 0.2)),
        true,
    );
}

#[test]
fn polygon_and_circle_are_symmetric() {
    assert_symmetric(
        PolygonShape::new_box(1.0, 1.0).into(),
        Transform::IDENTITY,
        CircleShape::new(0.5).into(),
        Transform::from_position(Vec2::new(1.3, 0.2)),
        true,
    );
}

#[test]
fn stacked_boxes_are_symmetric() {
    // Equal separations, so each order picks its own A face as reference.
    assert_symmetric(
        PolygonShape::new_box(1.0, 1.0).into(),
        Transform::IDENTITY,
        PolygonShape::new_box(0.5, 0.5).into(),
        Transform::from_position(Vec2::new(0.3, 1.4)),
        false,
    );
}

#[test]
fn tilted_box_corner_is_symmetric() {
    assert_symmetric(
        PolygonShape::new_box(1.0, 1.0).into(),
        Transform::IDENTITY,
        PolygonShape::new_box(0.5, 0.5).into(),
        Transform::new(Vec2::new(0.2, 1.45), 0.3),
        true,
    );
}

#[test]
fn edge_pairs_are_symmetric() {
    let edge: Shape = EdgeShape::new(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0)).into();

    assert_symmetric(
        edge.clone(),
        Transform::IDENTITY,
        CircleShape::new(1.0).into(),
        Transform::from_position(Vec2::new(0.5, 0.8)),
        true,
    );
    assert_symmetric(
        edge,
        Transform::IDENTITY,
        PolygonShape::new_box(0.5, 0.5).into(),
        Transform::from_position(Vec2::new(0.3, 0.45)),
        true,
    );
}

#[test]
fn circle_round_trip() {
    let circle = CircleShape::new(1.0);
    let mut manifold = Manifold::default();

    collide_circles(
        &mut manifold,
        &circle,
        &Transform::IDENTITY,
        &circle,
        &Transform::from_position(Vec2::new(1.5, 0.0)),
    );
    assert_eq!(manifold.point_count(), 1);
    assert_eq!(manifold.manifold_type, ManifoldType::Circles);

    collide_circles(
        &mut manifold,
        &circle,
        &Transform::IDENTITY,
        &circle,
        &Transform::from_position(Vec2::new(3.0, 0.0)),
    );
    assert_eq!(manifold.point_count(), 0);
}

#[test]
fn world_points_sit_between_surfaces() {
    let (_, world) = world_manifold(
        &CircleShape::new(1.0).into(),
        &Transform::IDENTITY,
        &CircleShape::new(1.0).into(),
        &Transform::from_position(Vec2::new(1.5, 0.0)),
    );

    assert_eq!(world.point_count, 1);
    assert_abs_diff_eq!(world.normal.x, 1.0, epsilon = TOL);
    assert_abs_diff_eq!(world.points[0].x, 0.75, epsilon = TOL);
    assert_abs_diff_eq!(world.points[0].y, 0.0, epsilon = TOL);
}
