//! Mesh synthesis for sensor volumes
//!
//! Converts a direction list into a flat-shaded, non-indexed triangle mesh.
//! Every triangle carries its own face normal on all three vertices, so
//! vertices are never shared between triangles.
//!
//! # Topologies
//!
//! - **Fan**: the apex sits at the sensor origin and each consecutive pair of
//!   directions (wrapping around) forms one lateral triangle. Directions are
//!   pushed past `radius` so that the flat facets circumscribe the sphere
//!   of that radius rather than cutting inside it.
//! - **Triangles**: every three directions are one triangle, scaled to
//!   `radius`.
//!
//! # Memory Layout
//!
//! [`SensorVertex`] is `#[repr(C)]` and `Pod`, so the vertex list uploads to
//! the backend as a byte slice with no conversion pass.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Vec3};
use super::bounding_sphere::BoundingSphere;
use super::directions::Topology;

/// Length substituted for an infinite sensor radius
pub const FAR_DISTANCE: f64 = 5_906_376_272_000.0;

/// Smallest half-angle cosine used when extending fan directions
const MIN_HALF_ANGLE_COS: f64 = 1e-6;

/// Vertex attribute location of the position
pub const POSITION_LOCATION: u32 = 0;

/// Vertex attribute location of the normal
pub const NORMAL_LOCATION: u32 = 1;

/// Sensor mesh vertex: position and face normal
///
/// Stored in single precision; geometry is built in `f64` and narrowed here.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SensorVertex {
    /// Position in sensor-local space
    pub position: [f32; 3],
    /// Unit face normal, zero for a degenerate triangle
    pub normal: [f32; 3],
}

impl SensorVertex {
    /// Create a vertex from double precision vectors
    pub fn new(position: &Vec3, normal: &Vec3) -> Self {
        Self {
            position: [position.x as f32, position.y as f32, position.z as f32],
            normal: [normal.x as f32, normal.y as f32, normal.z as f32],
        }
    }

    /// Position widened back to double precision
    pub fn position_f64(&self) -> Vec3 {
        Vec3::new(
            f64::from(self.position[0]),
            f64::from(self.position[1]),
            f64::from(self.position[2]),
        )
    }

    /// Normal widened back to double precision
    pub fn normal_f64(&self) -> Vec3 {
        Vec3::new(
            f64::from(self.normal[0]),
            f64::from(self.normal[1]),
            f64::from(self.normal[2]),
        )
    }

    /// Backend-agnostic description of this vertex format
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Self>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: POSITION_LOCATION,
                    components: 3,
                    offset: 0,
                },
                VertexAttribute {
                    location: NORMAL_LOCATION,
                    components: 3,
                    offset: std::mem::size_of::<[f32; 3]>() as u32,
                },
            ],
        }
    }
}

/// Single float vector attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of `f32` components
    pub components: u32,
    /// Byte offset inside the vertex
    pub offset: u32,
}

/// Interleaved vertex buffer layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes
    pub stride: u32,
    /// Attributes in location order
    pub attributes: Vec<VertexAttribute>,
}

/// Synthesized sensor geometry with its local bounding sphere
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMesh {
    vertices: Vec<SensorVertex>,
    topology: Topology,
    bounding_sphere: BoundingSphere,
}

impl SensorMesh {
    /// Build a mesh from directions
    ///
    /// Returns `None` when fewer than two directions are given. An infinite
    /// `radius` is replaced by [`FAR_DISTANCE`]. In triangle mode trailing
    /// directions that do not complete a triangle are ignored.
    pub fn synthesize(directions: &[Vec3], topology: Topology, radius: f64) -> Option<Self> {
        if directions.len() < 2 {
            return None;
        }

        let radius = effective_radius(radius);
        let vertices = match topology {
            Topology::Fan => Self::fan(directions, radius),
            Topology::Triangles => Self::triangles(directions, radius),
        };

        let points: Vec<Vec3> = vertices.iter().map(SensorVertex::position_f64).collect();
        let bounding_sphere = BoundingSphere::from_points(&points);

        Some(Self {
            vertices,
            topology,
            bounding_sphere,
        })
    }

    fn fan(directions: &[Vec3], radius: f64) -> Vec<SensorVertex> {
        let n = directions.len();

        // Each direction is extended by the wider of its two neighbour gaps
        let positions: Vec<Vec3> = (0..n)
            .map(|j| {
                let previous = &directions[(j + n - 1) % n];
                let current = &directions[j];
                let next = &directions[(j + 1) % n];
                let theta = utils::angle_between(previous, current)
                    .max(utils::angle_between(current, next));
                let distance = radius / (theta * 0.5).cos().max(MIN_HALF_ANGLE_COS);
                current * distance
            })
            .collect();

        let apex = Vec3::zeros();
        let mut vertices = Vec::with_capacity(n * 3);
        for j in 0..n {
            let previous = positions[(j + n - 1) % n];
            let next = positions[j];
            let normal = utils::normalize_or_zero(&next.cross(&previous));

            vertices.push(SensorVertex::new(&apex, &normal));
            vertices.push(SensorVertex::new(&next, &normal));
            vertices.push(SensorVertex::new(&previous, &normal));
        }
        vertices
    }

    fn triangles(directions: &[Vec3], radius: f64) -> Vec<SensorVertex> {
        let mut vertices = Vec::with_capacity(directions.len());
        for triangle in directions.chunks_exact(3) {
            let p0 = triangle[0] * radius;
            let p1 = triangle[1] * radius;
            let p2 = triangle[2] * radius;
            let normal = utils::normalize_or_zero(&(p0 - p1).cross(&(p0 - p2)));

            vertices.push(SensorVertex::new(&p0, &normal));
            vertices.push(SensorVertex::new(&p1, &normal));
            vertices.push(SensorVertex::new(&p2, &normal));
        }
        vertices
    }

    /// All vertices, three per triangle
    pub fn vertices(&self) -> &[SensorVertex] {
        &self.vertices
    }

    /// Vertex data as raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Topology the mesh was built with
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Sphere enclosing every vertex in sensor-local space
    pub const fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }
}

/// Radius actually used for geometry
pub fn effective_radius(radius: f64) -> f64 {
    if radius.is_finite() {
        radius
    } else {
        FAR_DISTANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use crate::geometry::directions::{ConicShape, PyramidShape, TorusShape, DEFAULT_ANGULAR_RESOLUTION};
    use approx::assert_relative_eq;

    fn square_directions() -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, 1.0, 1.0).normalize(),
            Vec3::new(-1.0, 1.0, 1.0).normalize(),
            Vec3::new(-1.0, -1.0, 1.0).normalize(),
            Vec3::new(1.0, -1.0, 1.0).normalize(),
        ]
    }

    #[test]
    fn test_too_few_directions() {
        assert!(SensorMesh::synthesize(&[], Topology::Fan, 1.0).is_none());
        assert!(SensorMesh::synthesize(&[Vec3::z()], Topology::Fan, 1.0).is_none());
    }

    #[test]
    fn test_vertex_layout_matches_struct() {
        let layout = SensorVertex::layout();
        assert_eq!(layout.stride, 24);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(std::mem::size_of::<SensorVertex>(), 24);
    }

    #[test]
    fn test_fan_vertex_count_and_apex() {
        let mesh = SensorMesh::synthesize(&square_directions(), Topology::Fan, 10.0).unwrap();
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.as_bytes().len(), 12 * 24);

        for triangle in mesh.vertices().chunks(3) {
            assert_eq!(triangle[0].position, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_fan_facets_reach_radius() {
        let mesh = SensorMesh::synthesize(&square_directions(), Topology::Fan, 10.0).unwrap();

        // Facet midpoints along the boundary edge lie on or beyond the radius
        for triangle in mesh.vertices().chunks(3) {
            let midpoint = (triangle[1].position_f64() + triangle[2].position_f64()) * 0.5;
            assert!(midpoint.norm() >= 10.0 - 1e-4);
        }
    }

    #[test]
    fn test_fan_normals_are_unit_and_flat() {
        let mesh = SensorMesh::synthesize(&square_directions(), Topology::Fan, 1.0).unwrap();
        for triangle in mesh.vertices().chunks(3) {
            let normal = triangle[0].normal_f64();
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-6);
            assert_eq!(triangle[0].normal, triangle[1].normal);
            assert_eq!(triangle[1].normal, triangle[2].normal);

            let edge = triangle[1].position_f64() - triangle[0].position_f64();
            assert_relative_eq!(normal.dot(&edge), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_fan_normals_point_outward() {
        let mesh = SensorMesh::synthesize(&square_directions(), Topology::Fan, 1.0).unwrap();
        for triangle in mesh.vertices().chunks(3) {
            let centroid = (triangle[1].position_f64() + triangle[2].position_f64()) / 3.0;
            let radial = Vec3::new(centroid.x, centroid.y, 0.0);
            assert!(triangle[0].normal_f64().dot(&radial) > 0.0);
        }
    }

    #[test]
    fn test_two_direction_fan() {
        let directions = [Vec3::x(), Vec3::y()];
        let mesh = SensorMesh::synthesize(&directions, Topology::Fan, 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_triangles_mode() {
        let directions = [Vec3::x(), Vec3::y(), Vec3::z(), Vec3::x()];
        let mesh = SensorMesh::synthesize(&directions, Topology::Triangles, 2.0).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[0].position, [2.0, 0.0, 0.0]);

        let expected = (Vec3::x() - Vec3::y()).cross(&(Vec3::x() - Vec3::z())).normalize();
        assert_relative_eq!(mesh.vertices()[0].normal_f64(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_gets_zero_normal() {
        let directions = [Vec3::x(), Vec3::x(), Vec3::x()];
        let mesh = SensorMesh::synthesize(&directions, Topology::Triangles, 1.0).unwrap();
        assert_eq!(mesh.vertices()[0].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_infinite_radius_uses_far_distance() {
        let mesh = SensorMesh::synthesize(&[Vec3::x(), Vec3::y(), Vec3::z()], Topology::Triangles, f64::INFINITY)
            .unwrap();
        assert_relative_eq!(mesh.vertices()[0].position_f64().x, FAR_DISTANCE, max_relative = 1e-6);
        assert!(mesh.bounding_sphere().radius.is_finite());
    }

    #[test]
    fn test_bounding_sphere_encloses_builtin_shapes() {
        let sets = [
            PyramidShape::new(0.3, 0.7).directions(),
            ConicShape::new(0.1, 0.9, 0.0, constants::PI).directions(DEFAULT_ANGULAR_RESOLUTION),
            ConicShape::default().directions(DEFAULT_ANGULAR_RESOLUTION),
            TorusShape::default().directions(DEFAULT_ANGULAR_RESOLUTION),
        ];

        for set in &sets {
            let mesh = SensorMesh::synthesize(&set.directions, set.topology, 1000.0).unwrap();
            let sphere = mesh.bounding_sphere();
            for vertex in mesh.vertices() {
                assert!(sphere.contains_point(&vertex.position_f64()));
            }
        }
    }
}
