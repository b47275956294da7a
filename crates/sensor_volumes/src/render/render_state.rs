//! Fixed-function render state descriptors
//!
//! Backend-agnostic description of depth, blending and culling for one draw
//! command. Backends translate these into their own pipeline objects.

/// Blending modes for different rendering effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha blending
    Alpha,
}

/// Face culling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling
    #[default]
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Render pass a command is submitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pass {
    /// Solid geometry, depth written
    #[default]
    Opaque,
    /// Blended geometry, drawn after the opaque pass
    Translucent,
}

/// Depth, blending and culling configuration of a draw command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// Enable depth testing
    pub depth_test: bool,
    /// Enable depth writing
    pub depth_write: bool,
    /// Blending, `None` when disabled
    pub blend_mode: Option<BlendMode>,
    /// Cull mode for face culling
    pub cull_mode: CullMode,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::opaque()
    }
}

impl RenderState {
    /// Depth-tested, depth-writing, unblended state
    pub const fn opaque() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            blend_mode: None,
            cull_mode: CullMode::None,
        }
    }

    /// Alpha-blended state that leaves the depth buffer untouched
    ///
    /// Depth testing is disabled when the volume should show through the
    /// globe.
    pub const fn translucent(cull_mode: CullMode, show_through_ellipsoid: bool) -> Self {
        Self {
            depth_test: !show_through_ellipsoid,
            depth_write: false,
            blend_mode: Some(BlendMode::Alpha),
            cull_mode,
        }
    }

    /// Whether blending is enabled
    pub const fn is_blended(&self) -> bool {
        self.blend_mode.is_some()
    }
}
