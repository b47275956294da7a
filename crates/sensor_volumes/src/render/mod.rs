//! Rendering abstraction for sensor volumes
//!
//! Primitives describe what to draw with [`DrawCommand`]s and allocate GPU
//! resources through the [`RenderBackend`] trait. The crate ships only the
//! [`HeadlessBackend`]; a GPU backend implements the same trait.

pub mod backend;
pub mod command;
pub mod headless;
pub mod material;
pub mod render_state;
pub mod uniforms;

pub use backend::{
    BackendError, BackendResult, BufferHandle, PickId, PickOwner, ProgramDesc, ProgramHandle,
    RenderBackend, ShaderFragment,
};
pub use command::{CommandKind, DrawCommand};
pub use headless::{BackendStats, HeadlessBackend};
pub use material::{Color, GridParams, Material, MaterialKind, MaterialType, StripeParams};
pub use render_state::{BlendMode, CullMode, Pass, RenderState};
pub use uniforms::{UniformMap, UniformValue};
