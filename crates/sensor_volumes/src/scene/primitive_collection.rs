//! Ordered primitive storage with stable keys

use slotmap::{new_key_type, SlotMap};

use crate::primitive::SensorVolume;
use crate::render::RenderBackend;
use crate::SensorResult;
use super::frame_state::FrameState;

new_key_type! {
    /// Stable key of a primitive inside a [`PrimitiveCollection`]
    pub struct PrimitiveKey;
}

/// Primitives owned by a scene, updated in insertion order
#[derive(Debug, Default)]
pub struct PrimitiveCollection {
    primitives: SlotMap<PrimitiveKey, SensorVolume>,
    order: Vec<PrimitiveKey>,
}

impl PrimitiveCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a primitive at the end of the update order
    pub fn add(&mut self, primitive: SensorVolume) -> PrimitiveKey {
        let key = self.primitives.insert(primitive);
        self.order.push(key);
        key
    }

    /// Take a primitive out of the collection
    pub fn remove(&mut self, key: PrimitiveKey) -> Option<SensorVolume> {
        let primitive = self.primitives.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(primitive)
    }

    /// Get a primitive
    pub fn get(&self, key: PrimitiveKey) -> Option<&SensorVolume> {
        self.primitives.get(key)
    }

    /// Get a primitive mutably
    pub fn get_mut(&mut self, key: PrimitiveKey) -> Option<&mut SensorVolume> {
        self.primitives.get_mut(key)
    }

    /// Whether the key refers to a primitive in this collection
    pub fn contains(&self, key: PrimitiveKey) -> bool {
        self.primitives.contains_key(key)
    }

    /// Number of primitives
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveKey, &SensorVolume)> {
        self.order
            .iter()
            .filter_map(|key| self.primitives.get(*key).map(|primitive| (*key, primitive)))
    }

    /// Update every primitive in insertion order, stopping at the first error
    pub fn update_all(&mut self, frame: &mut FrameState, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        for key in &self.order {
            if let Some(primitive) = self.primitives.get_mut(*key) {
                primitive.update(frame, backend)?;
            }
        }
        Ok(())
    }

    /// Remove every primitive, returning them in insertion order
    pub fn drain(&mut self) -> Vec<SensorVolume> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|key| self.primitives.remove(key))
            .collect()
    }
}
