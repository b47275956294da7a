//! Draw commands emitted by sensor primitives

use crate::foundation::math::Mat4;
use crate::geometry::BoundingSphere;
use crate::primitive::PrimitiveId;
use super::backend::{BufferHandle, ProgramHandle};
use super::render_state::{Pass, RenderState};
use super::uniforms::UniformMap;

/// Role of a command within its primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Outward-facing surface
    FrontFace,
    /// Inward-facing surface, drawn before the front face when translucent
    BackFace,
    /// Pick pass surface
    Pick,
}

/// A draw command for one sensor surface
///
/// Commands are rebuilt in place by their owning primitive and copied into
/// the frame command list each time they are emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Primitive that owns the command
    pub owner: PrimitiveId,
    /// Surface drawn by the command
    pub kind: CommandKind,
    /// Vertex buffer, shared by all commands of one primitive
    pub buffer: Option<BufferHandle>,
    /// Number of vertices to draw
    pub vertex_count: usize,
    /// Linked shader program
    pub program: Option<ProgramHandle>,
    /// Depth, blending and culling state
    pub render_state: Option<RenderState>,
    /// Uniform bindings
    pub uniforms: UniformMap,
    /// Pass the command belongs to
    pub pass: Pass,
    /// Sensor-to-world transform
    pub model_matrix: Mat4,
    /// World-space bounding sphere for culling
    pub bounding_volume: BoundingSphere,
}

impl DrawCommand {
    /// Create an empty command
    pub fn new(owner: PrimitiveId, kind: CommandKind) -> Self {
        Self {
            owner,
            kind,
            buffer: None,
            vertex_count: 0,
            program: None,
            render_state: None,
            uniforms: UniformMap::new(),
            pass: Pass::Opaque,
            model_matrix: Mat4::identity(),
            bounding_volume: BoundingSphere::default(),
        }
    }

    /// Whether the command has everything needed to draw
    pub const fn is_complete(&self) -> bool {
        self.buffer.is_some() && self.program.is_some() && self.render_state.is_some()
    }
}
