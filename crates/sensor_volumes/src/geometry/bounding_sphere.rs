//! Bounding spheres for sensor meshes
//!
//! The local sphere is derived once per mesh rebuild; the world sphere is the
//! local sphere pushed through the model matrix and gates visibility culling
//! in the renderer, so it must never under-enclose the mesh.

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Relative padding absorbing rounding in the enclosing-radius computations
const RADIUS_PADDING: f64 = 1e-9;

/// A bounding sphere for culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f64,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 0.0)
    }
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Smallest of two candidate spheres enclosing every point
    ///
    /// Computes both Ritter's sphere and the sphere centered on the
    /// axis-aligned bounds of the points and keeps the tighter one.
    /// An empty input yields a zero sphere at the origin.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let mut x_min = *first;
        let mut x_max = *first;
        let mut y_min = *first;
        let mut y_max = *first;
        let mut z_min = *first;
        let mut z_max = *first;
        let mut lower = *first;
        let mut upper = *first;

        for p in points {
            if p.x < x_min.x { x_min = *p; }
            if p.x > x_max.x { x_max = *p; }
            if p.y < y_min.y { y_min = *p; }
            if p.y > y_max.y { y_max = *p; }
            if p.z < z_min.z { z_min = *p; }
            if p.z > z_max.z { z_max = *p; }
            lower = lower.inf(p);
            upper = upper.sup(p);
        }

        // Ritter: start from the widest axis-extreme pair, then grow
        let x_span = (x_max - x_min).norm_squared();
        let y_span = (y_max - y_min).norm_squared();
        let z_span = (z_max - z_min).norm_squared();

        let (mut diameter_a, mut diameter_b) = (x_min, x_max);
        let mut max_span = x_span;
        if y_span > max_span {
            max_span = y_span;
            diameter_a = y_min;
            diameter_b = y_max;
        }
        if z_span > max_span {
            diameter_a = z_min;
            diameter_b = z_max;
        }

        let mut ritter_center = (diameter_a + diameter_b) * 0.5;
        let mut ritter_radius = (diameter_b - ritter_center).norm();

        for p in points {
            let distance = (p - ritter_center).norm();
            if distance > ritter_radius {
                let new_radius = (ritter_radius + distance) * 0.5;
                ritter_center += (p - ritter_center) * ((new_radius - ritter_radius) / distance);
                ritter_radius = new_radius;
            }
        }

        // Naive: center of the bounds, radius to the farthest point
        let naive_center = (lower + upper) * 0.5;
        let mut naive_radius: f64 = 0.0;
        let mut ritter_check: f64 = 0.0;
        for p in points {
            naive_radius = naive_radius.max((p - naive_center).norm());
            ritter_check = ritter_check.max((p - ritter_center).norm());
        }
        // The incremental update can leave the radius a rounding step short
        ritter_radius = ritter_radius.max(ritter_check);

        let sphere = if ritter_radius < naive_radius {
            Self::new(ritter_center, ritter_radius)
        } else {
            Self::new(naive_center, naive_radius)
        };
        sphere.padded()
    }

    /// Transform this sphere by a model matrix
    ///
    /// The radius is scaled by the largest axis scale so non-uniform scaling
    /// never shrinks the sphere below the transformed geometry.
    pub fn transform(&self, model: &Mat4) -> Self {
        let center = model.transform_point(&Point3::from(self.center)).coords;
        let radius = self.radius * utils::maximum_scale(model);
        Self::new(center, radius).padded()
    }

    /// Check if a point lies inside or on the sphere
    pub fn contains_point(&self, point: &Vec3) -> bool {
        (point - self.center).norm() <= self.radius
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (self.center - other.center).norm_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Smallest sphere enclosing both spheres
    pub fn union(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance = offset.norm();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }
        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius).padded()
    }

    fn padded(self) -> Self {
        let scale = self.radius.max(self.center.amax());
        Self::new(self.center, self.radius + scale * RADIUS_PADDING)
    }
}
