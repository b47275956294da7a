//! Per-frame state handed to primitives

use serde::{Deserialize, Serialize};

use crate::render::DrawCommand;

/// Projection mode of the scene
///
/// Sensor volumes are only drawn in the 3D view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SceneMode {
    /// Full 3D globe
    #[default]
    Scene3D,
    /// Flat 2D map
    Scene2D,
    /// 2.5D columbus view
    ColumbusView,
    /// Transition between modes
    Morphing,
}

/// Which passes are requested this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Passes {
    /// Color rendering
    pub render: bool,
    /// Picking
    pub pick: bool,
}

impl Passes {
    /// Color pass only
    pub const fn render_only() -> Self {
        Self { render: true, pick: false }
    }

    /// Pick pass only
    pub const fn pick_only() -> Self {
        Self { render: false, pick: true }
    }

    /// Both passes
    pub const fn render_and_pick() -> Self {
        Self { render: true, pick: true }
    }
}

/// State of the frame being built
#[derive(Debug, Clone, Default)]
pub struct FrameState {
    /// Scene projection mode
    pub mode: SceneMode,
    /// Requested passes
    pub passes: Passes,
    /// Commands emitted so far, in submission order
    pub commands: Vec<DrawCommand>,
}

impl FrameState {
    /// Create a frame with an empty command list
    pub fn new(mode: SceneMode, passes: Passes) -> Self {
        Self {
            mode,
            passes,
            commands: Vec::new(),
        }
    }
}
