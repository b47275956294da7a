//! Scene: primitive ownership and frame rendering
//!
//! The scene owns every sensor primitive and the backend they allocate from.
//! Each call to [`Scene::render_frame`] updates all primitives in insertion
//! order and returns the draw commands they emitted.

pub mod frame_state;
pub mod primitive_collection;

pub use frame_state::{FrameState, Passes, SceneMode};
pub use primitive_collection::{PrimitiveCollection, PrimitiveKey};

use log::{debug, trace};

use crate::primitive::SensorVolume;
use crate::render::{DrawCommand, RenderBackend};
use crate::SensorResult;

/// Globe scene holding sensor primitives
pub struct Scene {
    mode: SceneMode,
    primitives: PrimitiveCollection,
    backend: Box<dyn RenderBackend>,
    frame_number: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("mode", &self.mode)
            .field("primitives", &self.primitives.len())
            .field("frame_number", &self.frame_number)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create a 3D scene drawing through the given backend
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            mode: SceneMode::Scene3D,
            primitives: PrimitiveCollection::new(),
            backend,
            frame_number: 0,
        }
    }

    /// Current projection mode
    pub const fn mode(&self) -> SceneMode {
        self.mode
    }

    /// Switch projection mode
    pub fn set_mode(&mut self, mode: SceneMode) {
        self.mode = mode;
    }

    /// Number of frames rendered so far
    pub const fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Take ownership of a primitive
    pub fn add_primitive(&mut self, primitive: SensorVolume) -> PrimitiveKey {
        let key = self.primitives.add(primitive);
        debug!("Added sensor primitive {key:?}");
        key
    }

    /// Remove and destroy a primitive; returns whether it was present
    pub fn remove_primitive(&mut self, key: PrimitiveKey) -> bool {
        match self.primitives.remove(key) {
            Some(mut primitive) => {
                primitive.destroy(self.backend.as_mut());
                debug!("Removed sensor primitive {key:?}");
                true
            }
            None => false,
        }
    }

    /// Remove and destroy every primitive
    pub fn remove_all_primitives(&mut self) {
        for mut primitive in self.primitives.drain() {
            primitive.destroy(self.backend.as_mut());
        }
    }

    /// Get a primitive
    pub fn primitive(&self, key: PrimitiveKey) -> Option<&SensorVolume> {
        self.primitives.get(key)
    }

    /// Get a primitive mutably
    pub fn primitive_mut(&mut self, key: PrimitiveKey) -> Option<&mut SensorVolume> {
        self.primitives.get_mut(key)
    }

    /// Whether the scene holds the primitive
    pub fn contains_primitive(&self, key: PrimitiveKey) -> bool {
        self.primitives.contains(key)
    }

    /// All primitives
    pub const fn primitives(&self) -> &PrimitiveCollection {
        &self.primitives
    }

    /// Number of primitives
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Rendering backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Update every primitive and collect the frame's draw commands
    ///
    /// A primitive in an invalid state fails the whole frame.
    pub fn render_frame(&mut self, passes: Passes) -> SensorResult<Vec<DrawCommand>> {
        let mut frame = FrameState::new(self.mode, passes);
        self.primitives.update_all(&mut frame, self.backend.as_mut())?;
        self.frame_number += 1;
        trace!(
            "Frame {} emitted {} commands from {} primitives",
            self.frame_number,
            frame.commands.len(),
            self.primitives.len()
        );
        Ok(frame.commands)
    }
}
