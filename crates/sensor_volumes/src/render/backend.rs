//! Rendering backend abstraction
//!
//! Sensor primitives never talk to a graphics API directly. They allocate
//! vertex buffers, shader programs and pick ids through [`RenderBackend`] and
//! refer to them afterwards by opaque handles.
//!
//! Shader source text is owned by the backend. A program is requested by
//! listing the [`ShaderFragment`]s it is assembled from; two requests with
//! equal [`ProgramDesc`] describe the same source.

use std::any::Any;

use thiserror::Error;

use crate::entity::EntityId;
use crate::geometry::mesh::VertexLayout;
use crate::primitive::PrimitiveId;
use super::material::{Color, MaterialKind};

/// Backend specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A vertex buffer could not be created
    #[error("Buffer allocation failed: {0}")]
    BufferAllocation(String),

    /// A shader program failed to link
    #[error("Program link failed: {0}")]
    ProgramLink(String),

    /// No pick id could be allocated
    #[error("Pick id allocation failed: {0}")]
    PickIdAllocation(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque handle for vertex buffer resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Opaque handle for linked shader programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// Picking identifier, rendered as a unique color in the pick pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(pub u32);

impl PickId {
    /// Color encoding this id, least significant byte in red
    pub fn color(self) -> Color {
        let [r, g, b, a] = self.0.to_le_bytes();
        Color::from_bytes(r, g, b, a)
    }

    /// Decode an id from a color read back from the pick framebuffer
    pub fn from_color(color: Color) -> Self {
        let byte = |c: f32| (c * 255.0).round() as u8;
        Self(u32::from_le_bytes([byte(color.r), byte(color.g), byte(color.b), byte(color.a)]))
    }
}

/// Object returned when a pick id is hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOwner {
    /// Primitive that drew the picked fragment
    pub primitive: PrimitiveId,
    /// User id attached to the primitive
    pub id: Option<EntityId>,
}

/// Fragment shader building blocks, concatenated in list order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFragment {
    /// Globe intersection helpers shared by all sensor shaders
    Intersection,
    /// Lateral surface material variant
    Material(MaterialKind),
    /// Sensor volume surface main function
    SensorVolume,
}

/// Description of a shader program to link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDesc {
    /// Fragment shader sources in concatenation order
    pub fragments: Vec<ShaderFragment>,
    /// Whether the pick color is declared as a uniform output
    pub pick: bool,
}

impl ProgramDesc {
    /// Color pass program for a material
    pub fn color(material: MaterialKind) -> Self {
        Self {
            fragments: Self::sensor_fragments(material),
            pick: false,
        }
    }

    /// Pick pass program for a material
    pub fn pick(material: MaterialKind) -> Self {
        Self {
            fragments: Self::sensor_fragments(material),
            pick: true,
        }
    }

    fn sensor_fragments(material: MaterialKind) -> Vec<ShaderFragment> {
        vec![
            ShaderFragment::Intersection,
            ShaderFragment::Material(material),
            ShaderFragment::SensorVolume,
        ]
    }
}

/// Resource allocation interface of a rendering backend
///
/// Release calls take handles by value; a handle must not be used after it
/// has been released.
pub trait RenderBackend {
    /// Upload interleaved vertex data
    fn create_vertex_buffer(&mut self, data: &[u8], layout: &VertexLayout) -> BackendResult<BufferHandle>;

    /// Free a vertex buffer
    fn release_buffer(&mut self, handle: BufferHandle);

    /// Link a shader program
    fn link_program(&mut self, desc: &ProgramDesc) -> BackendResult<ProgramHandle>;

    /// Free a shader program
    fn release_program(&mut self, handle: ProgramHandle);

    /// Allocate a pick id for an owner
    fn create_pick_id(&mut self, owner: PickOwner) -> BackendResult<PickId>;

    /// Free a pick id
    fn release_pick_id(&mut self, id: PickId);

    /// Downcasting support for backend-specific access
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support for backend-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_color_round_trip() {
        let id = PickId(0x00_12_34_56);
        assert_eq!(PickId::from_color(id.color()), id);
    }

    #[test]
    fn test_program_desc_equality_follows_material_kind() {
        assert_eq!(ProgramDesc::color(MaterialKind::Color), ProgramDesc::color(MaterialKind::Color));
        assert_ne!(ProgramDesc::color(MaterialKind::Color), ProgramDesc::color(MaterialKind::Stripe));
        assert_ne!(ProgramDesc::color(MaterialKind::Grid), ProgramDesc::pick(MaterialKind::Grid));
    }
}
