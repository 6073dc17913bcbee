use arrayvec::ArrayVec;
use glam::Vec2;

use crate::{math::Transform, settings::MAX_MANIFOLD_POINTS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ContactFeatureType {
    #[default]
    Vertex = 0,
    Face = 1,
}

/// The features that intersect to form a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ContactFeature {
    /// Feature index on shape A.
    pub index_a: u8,
    /// Feature index on shape B.
    pub index_b: u8,
    pub type_a: ContactFeatureType,
    pub type_b: ContactFeatureType,
}

impl ContactFeature {
    #[must_use]
    pub const fn new(
        index_a: u8,
        index_b: u8,
        type_a: ContactFeatureType,
        type_b: ContactFeatureType,
    ) -> Self {
        Self {
            index_a,
            index_b,
            type_a,
            type_b,
        }
    }

    /// Exchanges the A and B halves, used when the reference shape was B.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// Packed feature key used to match contact points across steps.
///
/// Bit layout: byte 0 = `index_a`, byte 1 = `index_b`, byte 2 = `type_a`,
/// byte 3 = `type_b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ContactId(pub u32);

impl ContactId {
    pub const ZERO: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn key(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn features(self) -> ContactFeature {
        let [index_a, index_b, type_a, type_b] = self.0.to_le_bytes();
        ContactFeature {
            index_a,
            index_b,
            type_a: feature_type(type_a),
            type_b: feature_type(type_b),
        }
    }
}

const fn feature_type(byte: u8) -> ContactFeatureType {
    if byte == ContactFeatureType::Face as u8 {
        ContactFeatureType::Face
    } else {
        ContactFeatureType::Vertex
    }
}

impl From<ContactFeature> for ContactId {
    fn from(cf: ContactFeature) -> Self {
        Self(u32::from_le_bytes([
            cf.index_a,
            cf.index_b,
            cf.type_a as u8,
            cf.type_b as u8,
        ]))
    }
}

impl From<ContactId> for ContactFeature {
    fn from(id: ContactId) -> Self {
        id.features()
    }
}

/// A contact point belonging to a contact manifold.
///
/// `local_point` depends on the manifold type: for `Circles` it is the local center of
/// circle B, for `FaceA` the local center of circle B or the clip point on polygon B,
/// for `FaceB` the clip point on polygon A. The impulses are stored for warm starting
/// an external solver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManifoldPoint {
    pub id: ContactId,
    pub local_point: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

impl ManifoldPoint {
    #[must_use]
    pub const fn new(local_point: Vec2, id: ContactId) -> Self {
        Self {
            id,
            local_point,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ManifoldType {
    #[default]
    Circles,
    FaceA,
    FaceB,
}

/// Contact points for two touching convex shapes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifold {
    pub points: ArrayVec<ManifoldPoint, MAX_MANIFOLD_POINTS>,
    /// Unused for `Circles`.
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub manifold_type: ManifoldType,
    /// Squared center distance, only set by the circle-circle routine.
    pub dist_sqr: f32,
}

impl Manifold {
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Sets up a single-point manifold.
    pub(crate) fn set_single(
        &mut self,
        manifold_type: ManifoldType,
        local_normal: Vec2,
        local_point: Vec2,
        point: ManifoldPoint,
    ) {
        self.manifold_type = manifold_type;
        self.local_normal = local_normal;
        self.local_point = local_point;
        self.points.clear();
        self.points.push(point);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointState {
    /// Point does not exist.
    #[default]
    Null,
    /// Point was added in the update.
    Add,
    /// Point persisted across the update.
    Persist,
    /// Point was removed in the update.
    Remove,
}

/// Classifies the points of two consecutive manifolds by feature id.
///
/// `state1` describes `manifold1` (old) points as persisting or removed, `state2`
/// describes `manifold2` (new) points as persisting or added.
#[must_use]
pub fn get_point_states(
    manifold1: &Manifold,
    manifold2: &Manifold,
) -> (
    [PointState; MAX_MANIFOLD_POINTS],
    [PointState; MAX_MANIFOLD_POINTS],
) {
    let mut state1 = [PointState::Null; MAX_MANIFOLD_POINTS];
    let mut state2 = [PointState::Null; MAX_MANIFOLD_POINTS];

    for (state, point) in state1.iter_mut().zip(&manifold1.points) {
        *state = if manifold2.points.iter().any(|p| p.id == point.id) {
            PointState::Persist
        } else {
            PointState::Remove
        };
    }

    for (state, point) in state2.iter_mut().zip(&manifold2.points) {
        *state = if manifold1.points.iter().any(|p| p.id == point.id) {
            PointState::Persist
        } else {
            PointState::Add
        };
    }

    (state1, state2)
}

/// World-space view of a manifold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldManifold {
    /// Points from A to B.
    pub normal: Vec2,
    /// Midway between the two surfaces.
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl WorldManifold {
    #[must_use]
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut world = Self {
            point_count: manifold.point_count(),
            ..Self::default()
        };

        if manifold.points.is_empty() {
            return world;
        }

        match manifold.manifold_type {
            ManifoldType::Circles => {
                let point_a = xf_a.mul(manifold.local_point);
                let point_b = xf_b.mul(manifold.points[0].local_point);
                world.normal = (point_b - point_a).try_normalize().unwrap_or(Vec2::X);

                let c_a = point_a + radius_a * world.normal;
                let c_b = point_b - radius_b * world.normal;
                world.points[0] = 0.5 * (c_a + c_b);
            }
            ManifoldType::FaceA => {
                world.normal = xf_a.q.mul(manifold.local_normal);
                let plane_point = xf_a.mul(manifold.local_point);

                for (out, mp) in world.points.iter_mut().zip(&manifold.points) {
                    let clip_point = xf_b.mul(mp.local_point);
                    let c_a = clip_point
                        + (radius_a - (clip_point - plane_point).dot(world.normal)) * world.normal;
                    let c_b = clip_point - radius_b * world.normal;
                    *out = 0.5 * (c_a + c_b);
                }
            }
            ManifoldType::FaceB => {
                let normal = xf_b.q.mul(manifold.local_normal);
                let plane_point = xf_b.mul(manifold.local_point);

                for (out, mp) in world.points.iter_mut().zip(&manifold.points) {
                    let clip_point = xf_a.mul(mp.local_point);
                    let c_b = clip_point
                        + (radius_b - (clip_point - plane_point).dot(normal)) * normal;
                    let c_a = clip_point - radius_a * normal;
                    *out = 0.5 * (c_a + c_b);
                }

                // Keep the normal pointing from A to B.
                world.normal = -normal;
            }
        }

        world
    }
}

/// Used for computing contact manifolds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipVertex {
    pub v: Vec2,
    pub id: ContactId,
}

/// Clips a segment against the half-plane `dot(normal, x) <= offset`.
///
/// Points created by the clip are tagged as vertex `vertex_index_a` of the reference
/// shape hitting the face of the incident one.
#[must_use]
pub fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: u8,
) -> ArrayVec<ClipVertex, 2> {
    let mut v_out = ArrayVec::new();
    let [v0, v1] = *v_in;

    let distance0 = normal.dot(v0.v) - offset;
    let distance1 = normal.dot(v1.v) - offset;

    // Points behind the plane.
    if distance0 <= 0.0 {
        v_out.push(v0);
    }
    if distance1 <= 0.0 {
        v_out.push(v1);
    }

    // Points on different sides of the plane.
    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        let features = ContactFeature::new(
            vertex_index_a,
            v0.id.features().index_b,
            ContactFeatureType::Vertex,
            ContactFeatureType::Face,
        );
        v_out.push(ClipVertex {
            v: v0.v + interp * (v1.v - v0.v),
            id: features.into(),
        });
    }

    v_out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_id_packing() {
        let cf = ContactFeature::new(3, 7, ContactFeatureType::Face, ContactFeatureType::Vertex);
        let id = ContactId::from(cf);
        assert_eq!(id.key(), 3 | (7 << 8) | (1 << 16));
        assert_eq!(id.features(), cf);
        assert_eq!(ContactId::from(cf.swapped()).key(), 7 | (3 << 8) | (1 << 24));
    }

    #[test]
    fn point_states() {
        let id = |a: u8| {
            ContactId::from(ContactFeature::new(
                a,
                0,
                ContactFeatureType::Vertex,
                ContactFeatureType::Face,
            ))
        };

        let mut old = Manifold::default();
        old.points.push(ManifoldPoint::new(Vec2::ZERO, id(0)));
        old.points.push(ManifoldPoint::new(Vec2::ZERO, id(1)));

        let mut new = Manifold::default();
        new.points.push(ManifoldPoint::new(Vec2::ZERO, id(1)));
        new.points.push(ManifoldPoint::new(Vec2::ZERO, id(2)));

        let (s1, s2) = get_point_states(&old, &new);
        assert_eq!(s1, [PointState::Remove, PointState::Persist]);
        assert_eq!(s2, [PointState::Persist, PointState::Add]);

        let (s1, s2) = get_point_states(&Manifold::default(), &new);
        assert_eq!(s1, [PointState::Null; 2]);
        assert_eq!(s2, [PointState::Add; 2]);
    }

    #[test]
    fn clipping_keeps_inner_side() {
        let v_in = [
            ClipVertex {
                v: Vec2::new(-1.0, 0.0),
                id: ContactId::from(ContactFeature::new(
                    0,
                    4,
                    ContactFeatureType::Face,
                    ContactFeatureType::Vertex,
                )),
            },
            ClipVertex {
                v: Vec2::new(1.0, 0.0),
                id: ContactId::from(ContactFeature::new(
                    0,
                    5,
                    ContactFeatureType::Face,
                    ContactFeatureType::Vertex,
                )),
            },
        ];

        let out = clip_segment_to_line(&v_in, Vec2::X, 0.5, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], v_in[0]);
        assert!((out[1].v - Vec2::new(0.5, 0.0)).length() < 1e-6);
        let f = out[1].id.features();
        assert_eq!((f.index_a, f.index_b), (2, 4));
        assert_eq!((f.type_a, f.type_b), (ContactFeatureType::Vertex, ContactFeatureType::Face));

        let none = clip_segment_to_line(&v_in, Vec2::X, -2.0, 0);
        assert!(none.is_empty());
    }
}
