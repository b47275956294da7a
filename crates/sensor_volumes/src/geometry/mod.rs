//! Sensor geometry synthesis
//!
//! Turns angular shape parameters into renderable triangle meshes:
//!
//! ```text
//! shape parameters ──► directions ──► mesh ──► bounding sphere
//!  (pyramid/conic/     (unit vectors,  (flat     (local, then world
//!   torus/custom)       fan or tris)    shaded)   via model matrix)
//! ```

pub mod directions;
pub mod mesh;
pub mod bounding_sphere;

pub use bounding_sphere::BoundingSphere;
pub use directions::{
    ConicShape, DirectionSet, PyramidShape, Topology, TorusLattice, TorusShape,
    DEFAULT_ANGULAR_RESOLUTION, MIN_SPAN,
};
pub use mesh::{SensorMesh, SensorVertex, FAR_DISTANCE};
