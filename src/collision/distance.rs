//! GJK closest-point queries between convex proxies.

use arrayvec::ArrayVec;
use glam::Vec2;

use super::shapes::Shape;
use crate::{
    math::Transform,
    settings::{EPSILON, MAX_GJK_ITERATIONS, MAX_POLYGON_VERTICES},
};

/// A convex vertex cloud plus a rounding radius, as seen by GJK.
#[derive(Clone, Debug, Default)]
pub struct DistanceProxy {
    pub vertices: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
    pub radius: f32,
}

impl DistanceProxy {
    #[must_use]
    pub fn new(shape: &Shape) -> Self {
        let mut vertices = ArrayVec::new();
        let radius = match shape {
            Shape::Circle(circle) => {
                vertices.push(circle.position);
                circle.radius
            }
            Shape::Polygon(polygon) => {
                vertices.extend(polygon.vertices.iter().copied());
                polygon.radius
            }
            Shape::Edge(edge) => {
                vertices.push(edge.vertex1);
                vertices.push(edge.vertex2);
                edge.radius
            }
        };

        Self { vertices, radius }
    }

    /// Index of the vertex furthest along `direction`.
    #[must_use]
    pub fn support(&self, direction: Vec2) -> usize {
        let mut best_index = 0;
        let mut best_value = self.vertices[0].dot(direction);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let value = v.dot(direction);
            if value > best_value {
                best_index = i;
                best_value = value;
            }
        }

        best_index
    }

    #[must_use]
    pub fn support_vertex(&self, direction: Vec2) -> Vec2 {
        self.vertices[self.support(direction)]
    }
}

/// Warm-start data carried between calls for the same pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimplexCache {
    /// Simplex length or area at the time it was cached.
    pub metric: f32,
    pub count: usize,
    pub index_a: [u8; 3],
    pub index_b: [u8; 3],
}

#[derive(Clone, Debug)]
pub struct DistanceInput {
    pub proxy_a: DistanceProxy,
    pub proxy_b: DistanceProxy,
    pub transform_a: Transform,
    pub transform_b: Transform,
    pub use_radii: bool,
}

impl DistanceInput {
    #[must_use]
    pub fn new(
        shape_a: &Shape,
        transform_a: Transform,
        shape_b: &Shape,
        transform_b: Transform,
        use_radii: bool,
    ) -> Self {
        Self {
            proxy_a: DistanceProxy::new(shape_a),
            proxy_b: DistanceProxy::new(shape_b),
            transform_a,
            transform_b,
            use_radii,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistanceOutput {
    /// Closest point on shape A.
    pub point_a: Vec2,
    /// Closest point on shape B.
    pub point_b: Vec2,
    pub distance: f32,
    /// Number of support-point evaluations.
    pub iterations: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct SimplexVertex {
    /// Support point in A, world space.
    wa: Vec2,
    /// Support point in B, world space.
    wb: Vec2,
    /// `wb - wa`
    w: Vec2,
    /// Barycentric coordinate of the closest point.
    a: f32,
    index_a: usize,
    index_b: usize,
}

impl SimplexVertex {
    fn new(input: &DistanceInput, index_a: usize, index_b: usize) -> Self {
        let wa = input.transform_a.mul(input.proxy_a.vertices[index_a]);
        let wb = input.transform_b.mul(input.proxy_b.vertices[index_b]);
        Self {
            wa,
            wb,
            w: wb - wa,
            a: 0.0,
            index_a,
            index_b,
        }
    }
}

#[derive(Default)]
struct Simplex {
    v: [SimplexVertex; 3],
    count: usize,
}

impl Simplex {
    fn read_cache(cache: &SimplexCache, input: &DistanceInput) -> Self {
        debug_assert!(cache.count <= 3);

        let mut simplex = Self::default();
        simplex.count = cache.count;
        for i in 0..simplex.count {
            simplex.v[i] = SimplexVertex::new(
                input,
                usize::from(cache.index_a[i]),
                usize::from(cache.index_b[i]),
            );
        }

        // Flush the simplex if its metric moved too far from the cached one.
        if simplex.count > 1 {
            let metric1 = cache.metric;
            let metric2 = simplex.metric();
            if metric2 < 0.5 * metric1 || 2.0 * metric1 < metric2 || metric2 < EPSILON {
                simplex.count = 0;
            }
        }

        if simplex.count == 0 {
            simplex.v[0] = SimplexVertex::new(input, 0, 0);
            simplex.count = 1;
        }

        simplex
    }

    fn write_cache(&self, cache: &mut SimplexCache) {
        cache.metric = self.metric();
        cache.count = self.count;
        for (i, v) in self.v[..self.count].iter().enumerate() {
            cache.index_a[i] = v.index_a as u8;
            cache.index_b[i] = v.index_b as u8;
        }
    }

    fn search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.v[0].w,
            2 => {
                let e12 = self.v[1].w - self.v[0].w;
                let sgn = e12.perp_dot(-self.v[0].w);
                if sgn > 0.0 {
                    // Origin is left of e12.
                    Vec2::new(-e12.y, e12.x)
                } else {
                    Vec2::new(e12.y, -e12.x)
                }
            }
            _ => {
                debug_assert!(false, "no search direction for a {}-simplex", self.count);
                Vec2::ZERO
            }
        }
    }

    fn closest_point(&self) -> Vec2 {
        match self.count {
            1 => self.v[0].w,
            2 => self.v[0].a * self.v[0].w + self.v[1].a * self.v[1].w,
            _ => Vec2::ZERO,
        }
    }

    fn witness_points(&self) -> (Vec2, Vec2) {
        let [v0, v1, v2] = &self.v;
        match self.count {
            1 => (v0.wa, v0.wb),
            2 => (
                v0.a * v0.wa + v1.a * v1.wa,
                v0.a * v0.wb + v1.a * v1.wb,
            ),
            3 => {
                let p = v0.a * v0.wa + v1.a * v1.wa + v2.a * v2.wa;
                (p, p)
            }
            _ => {
                debug_assert!(false, "empty simplex");
                (Vec2::ZERO, Vec2::ZERO)
            }
        }
    }

    fn metric(&self) -> f32 {
        match self.count {
            2 => (self.v[0].w - self.v[1].w).length(),
            3 => (self.v[1].w - self.v[0].w).perp_dot(self.v[2].w - self.v[0].w),
            _ => 0.0,
        }
    }

    /// Closest feature of a segment to the origin:
    /// `a1 = dot(w2, e12) / d12`, `a2 = -dot(w1, e12) / d12`.
    fn solve2(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let e12 = w2 - w1;

        // w1 region
        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // w2 region
        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.v[1].a = 1.0;
            self.v[0] = self.v[1];
            self.count = 1;
            return;
        }

        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.v[0].a = d12_1 * inv_d12;
        self.v[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    /// Vertex, edge and interior regions of a triangle.
    fn solve3(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let w3 = self.v[2].w;

        let e12 = w2 - w1;
        let d12_1 = w2.dot(e12);
        let d12_2 = -w1.dot(e12);

        let e13 = w3 - w1;
        let d13_1 = w3.dot(e13);
        let d13_2 = -w1.dot(e13);

        let e23 = w3 - w2;
        let d23_1 = w3.dot(e23);
        let d23_2 = -w2.dot(e23);

        let n123 = e12.perp_dot(e13);

        let d123_1 = n123 * w2.perp_dot(w3);
        let d123_2 = n123 * w3.perp_dot(w1);
        let d123_3 = n123 * w1.perp_dot(w2);

        // w1 region
        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // e12
        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv_d12 = 1.0 / (d12_1 + d12_2);
            self.v[0].a = d12_1 * inv_d12;
            self.v[1].a = d12_2 * inv_d12;
            self.count = 2;
            return;
        }

        // e13
        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv_d13 = 1.0 / (d13_1 + d13_2);
            self.v[0].a = d13_1 * inv_d13;
            self.v[2].a = d13_2 * inv_d13;
            self.v[1] = self.v[2];
            self.count = 2;
            return;
        }

        // w2 region
        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.v[1].a = 1.0;
            self.v[0] = self.v[1];
            self.count = 1;
            return;
        }

        // w3 region
        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.v[2].a = 1.0;
            self.v[0] = self.v[2];
            self.count = 1;
            return;
        }

        // e23
        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv_d23 = 1.0 / (d23_1 + d23_2);
            self.v[1].a = d23_1 * inv_d23;
            self.v[2].a = d23_2 * inv_d23;
            self.v[0] = self.v[2];
            self.count = 2;
            return;
        }

        let inv_d123 = 1.0 / (d123_1 + d123_2 + d123_3);
        self.v[0].a = d123_1 * inv_d123;
        self.v[1].a = d123_2 * inv_d123;
        self.v[2].a = d123_3 * inv_d123;
        self.count = 3;
    }
}

/// Closest points between two convex proxies.
///
/// `cache` is read to warm-start the simplex and overwritten with the final one,
/// so passing the same cache each step for a slowly moving pair converges in fewer
/// iterations. Pass `SimplexCache::default()` for a cold query.
pub fn compute_distance(input: &DistanceInput, cache: &mut SimplexCache) -> DistanceOutput {
    let mut simplex = Simplex::read_cache(cache, input);

    // Last simplex indices, to detect cycling.
    let mut save_a = [0; 3];
    let mut save_b = [0; 3];

    let mut iter = 0;
    while iter < MAX_GJK_ITERATIONS {
        let save_count = simplex.count;
        for i in 0..save_count {
            save_a[i] = simplex.v[i].index_a;
            save_b[i] = simplex.v[i].index_b;
        }

        match simplex.count {
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => {}
        }

        // The origin is inside the triangle.
        if simplex.count == 3 {
            break;
        }

        let d = simplex.search_direction();

        // The origin is probably on the segment or very close to it.
        if d.length_squared() < EPSILON * EPSILON {
            break;
        }

        let index_a = input.proxy_a.support(input.transform_a.q.mul_t(-d));
        let index_b = input.proxy_b.support(input.transform_b.q.mul_t(d));
        let vertex = SimplexVertex::new(input, index_a, index_b);
        simplex.v[simplex.count] = vertex;

        iter += 1;

        // A repeated support pair means no further progress is possible.
        let duplicate = (0..save_count)
            .any(|i| vertex.index_a == save_a[i] && vertex.index_b == save_b[i]);
        if duplicate {
            break;
        }

        simplex.count += 1;
    }

    if iter == MAX_GJK_ITERATIONS {
        log::trace!("GJK hit the iteration cap ({MAX_GJK_ITERATIONS})");
    }

    let (point_a, point_b) = simplex.witness_points();
    let mut output = DistanceOutput {
        point_a,
        point_b,
        distance: (point_a - point_b).length(),
        iterations: iter,
    };

    simplex.write_cache(cache);

    if input.use_radii {
        let r_a = input.proxy_a.radius;
        let r_b = input.proxy_b.radius;

        if output.distance > r_a + r_b && output.distance > EPSILON {
            // Still apart: move the witness points onto the rounded surfaces.
            output.distance -= r_a + r_b;
            let normal = (output.point_b - output.point_a).normalize_or_zero();
            output.point_a += r_a * normal;
            output.point_b -= r_b * normal;
        } else {
            let p = 0.5 * (output.point_a + output.point_b);
            output.point_a = p;
            output.point_b = p;
            output.distance = 0.0;
        }
    }

    output
}

/// Exact overlap test between two shapes, skins included.
#[must_use]
pub fn test_overlap(shape_a: &Shape, xf_a: &Transform, shape_b: &Shape, xf_b: &Transform) -> bool {
    let input = DistanceInput::new(shape_a, *xf_a, shape_b, *xf_b, true);
    let output = compute_distance(&input, &mut SimplexCache::default());
    output.distance < 10.0 * EPSILON
}
