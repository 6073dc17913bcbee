mod circle_shape;
mod edge_shape;
mod polygon_shape;

pub use circle_shape::*;
pub use edge_shape::*;
pub use polygon_shape::*;

use glam::Vec2;

use crate::{
    collision::aabb::{Aabb, RayCastInput, RayCastOutput},
    math::Transform,
};

/// Discriminant order matters: contacts are canonicalised by comparing these values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeType {
    Circle = 0,
    Edge = 1,
    Polygon = 2,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle(CircleShape),
    Edge(EdgeShape),
    Polygon(PolygonShape),
}

impl Shape {
    #[must_use]
    pub const fn shape_type(&self) -> ShapeType {
        match self {
            Self::Circle(_) => ShapeType::Circle,
            Self::Edge(_) => ShapeType::Edge,
            Self::Polygon(_) => ShapeType::Polygon,
        }
    }

    #[must_use]
    pub const fn radius(&self) -> f32 {
        match self {
            Self::Circle(shape) => shape.radius,
            Self::Edge(shape) => shape.radius,
            Self::Polygon(shape) => shape.radius,
        }
    }

    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        match self {
            Self::Circle(shape) => shape.compute_aabb(xf),
            Self::Edge(shape) => shape.compute_aabb(xf),
            Self::Polygon(shape) => shape.compute_aabb(xf),
        }
    }

    #[must_use]
    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        match self {
            Self::Circle(shape) => shape.test_point(xf, point),
            Self::Edge(shape) => shape.test_point(xf, point),
            Self::Polygon(shape) => shape.test_point(xf, point),
        }
    }

    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        match self {
            Self::Circle(shape) => shape.ray_cast(input, xf),
            Self::Edge(shape) => shape.ray_cast(input, xf),
            Self::Polygon(shape) => shape.ray_cast(input, xf),
        }
    }

    /// Returns `(area, centroid)` of the part below `dot(normal, x) = offset`.
    #[must_use]
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f32, xf: &Transform) -> (f32, Vec2) {
        match self {
            Self::Circle(shape) => shape.compute_submerged_area(normal, offset, xf),
            Self::Edge(shape) => shape.compute_submerged_area(normal, offset, xf),
            Self::Polygon(shape) => shape.compute_submerged_area(normal, offset, xf),
        }
    }
}

impl From<CircleShape> for Shape {
    fn from(shape: CircleShape) -> Self {
        Self::Circle(shape)
    }
}

impl From<EdgeShape> for Shape {
    fn from(shape: EdgeShape) -> Self {
        Self::Edge(shape)
    }
}

impl From<PolygonShape> for Shape {
    fn from(shape: PolygonShape) -> Self {
        Self::Polygon(shape)
    }
}
