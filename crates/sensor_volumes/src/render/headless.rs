//! Headless recording backend
//!
//! Implements [`RenderBackend`] without a GPU. Every allocation is tracked so
//! callers can assert on how many resources were created, which ones are
//! still live, and that nothing was released twice.

use std::any::Any;
use std::collections::HashMap;

use log::warn;

use crate::geometry::mesh::VertexLayout;
use super::backend::{
    BackendError, BackendResult, BufferHandle, PickId, PickOwner, ProgramDesc, ProgramHandle,
    RenderBackend,
};

/// Allocation counters of a [`HeadlessBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Vertex buffers created
    pub buffers_created: usize,
    /// Vertex buffers released
    pub buffers_released: usize,
    /// Programs linked
    pub programs_linked: usize,
    /// Programs released
    pub programs_released: usize,
    /// Pick ids allocated
    pub pick_ids_created: usize,
    /// Pick ids released
    pub pick_ids_released: usize,
    /// Release calls for handles that were not live
    pub invalid_releases: usize,
}

impl BackendStats {
    /// Total resources allocated
    pub const fn total_allocations(&self) -> usize {
        self.buffers_created + self.programs_linked + self.pick_ids_created
    }
}

/// Vertex buffer contents kept by the headless backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferRecord {
    /// Size of the uploaded data in bytes
    pub byte_len: usize,
    /// Number of vertices, derived from the layout stride
    pub vertex_count: usize,
}

/// Backend that records allocations instead of touching a GPU
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    next_pick_id: u32,
    buffers: HashMap<BufferHandle, BufferRecord>,
    programs: HashMap<ProgramHandle, ProgramDesc>,
    pick_ids: HashMap<PickId, PickOwner>,
    stats: BackendStats,
    fail_allocations: bool,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following allocation fail until reset
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Allocation counters
    pub const fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Whether a buffer handle is live
    pub fn is_buffer_live(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    /// Whether a program handle is live
    pub fn is_program_live(&self, handle: ProgramHandle) -> bool {
        self.programs.contains_key(&handle)
    }

    /// Whether a pick id is live
    pub fn is_pick_id_live(&self, id: PickId) -> bool {
        self.pick_ids.contains_key(&id)
    }

    /// Record of a live buffer
    pub fn buffer(&self, handle: BufferHandle) -> Option<&BufferRecord> {
        self.buffers.get(&handle)
    }

    /// Description a live program was linked from
    pub fn program(&self, handle: ProgramHandle) -> Option<&ProgramDesc> {
        self.programs.get(&handle)
    }

    /// Owner registered for a live pick id
    pub fn pick_owner(&self, id: PickId) -> Option<&PickOwner> {
        self.pick_ids.get(&id)
    }

    /// Number of live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live programs
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of live pick ids
    pub fn live_pick_id_count(&self) -> usize {
        self.pick_ids.len()
    }

    fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_failure(&self, what: &str) -> Result<(), String> {
        if self.fail_allocations {
            Err(format!("{what} allocation disabled"))
        } else {
            Ok(())
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_vertex_buffer(&mut self, data: &[u8], layout: &VertexLayout) -> BackendResult<BufferHandle> {
        self.check_failure("buffer").map_err(BackendError::BufferAllocation)?;
        if layout.stride == 0 || data.len() % layout.stride as usize != 0 {
            return Err(BackendError::BufferAllocation(format!(
                "{} bytes is not a multiple of stride {}",
                data.len(),
                layout.stride
            )));
        }

        let handle = BufferHandle(self.allocate_handle());
        self.buffers.insert(
            handle,
            BufferRecord {
                byte_len: data.len(),
                vertex_count: data.len() / layout.stride as usize,
            },
        );
        self.stats.buffers_created += 1;
        Ok(handle)
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_some() {
            self.stats.buffers_released += 1;
        } else {
            warn!("Release of unknown buffer {handle:?}");
            self.stats.invalid_releases += 1;
        }
    }

    fn link_program(&mut self, desc: &ProgramDesc) -> BackendResult<ProgramHandle> {
        self.check_failure("program").map_err(BackendError::ProgramLink)?;
        if desc.fragments.is_empty() {
            return Err(BackendError::ProgramLink("no fragment sources".to_string()));
        }

        let handle = ProgramHandle(self.allocate_handle());
        self.programs.insert(handle, desc.clone());
        self.stats.programs_linked += 1;
        Ok(handle)
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        if self.programs.remove(&handle).is_some() {
            self.stats.programs_released += 1;
        } else {
            warn!("Release of unknown program {handle:?}");
            self.stats.invalid_releases += 1;
        }
    }

    fn create_pick_id(&mut self, owner: PickOwner) -> BackendResult<PickId> {
        self.check_failure("pick id").map_err(BackendError::PickIdAllocation)?;

        // Zero is reserved for "nothing picked"
        self.next_pick_id = self
            .next_pick_id
            .checked_add(1)
            .ok_or_else(|| BackendError::PickIdAllocation("pick ids exhausted".to_string()))?;
        let id = PickId(self.next_pick_id);
        self.pick_ids.insert(id, owner);
        self.stats.pick_ids_created += 1;
        Ok(id)
    }

    fn release_pick_id(&mut self, id: PickId) {
        if self.pick_ids.remove(&id).is_some() {
            self.stats.pick_ids_released += 1;
        } else {
            warn!("Release of unknown pick id {id:?}");
            self.stats.invalid_releases += 1;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::SensorVertex;
    use crate::primitive::PrimitiveId;
    use crate::render::material::MaterialKind;

    #[test]
    fn test_buffer_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let vertices = [SensorVertex::default(); 6];
        let handle = backend
            .create_vertex_buffer(bytemuck::cast_slice(&vertices), &SensorVertex::layout())
            .unwrap();

        assert!(backend.is_buffer_live(handle));
        assert_eq!(backend.buffer(handle).map(|b| b.vertex_count), Some(6));

        backend.release_buffer(handle);
        assert!(!backend.is_buffer_live(handle));
        backend.release_buffer(handle);
        assert_eq!(backend.stats().buffers_released, 1);
        assert_eq!(backend.stats().invalid_releases, 1);
    }

    #[test]
    fn test_pick_ids_are_unique_and_non_zero() {
        let mut backend = HeadlessBackend::new();
        let owner = PickOwner { primitive: PrimitiveId::next(), id: None };
        let a = backend.create_pick_id(owner.clone()).unwrap();
        let b = backend.create_pick_id(owner.clone()).unwrap();

        assert_ne!(a, b);
        assert_ne!(a.0, 0);
        assert_eq!(backend.pick_owner(a), Some(&owner));
        assert_eq!(backend.live_pick_id_count(), 2);
    }

    #[test]
    fn test_failing_allocations() {
        let mut backend = HeadlessBackend::new();
        backend.set_fail_allocations(true);

        let result = backend.link_program(&ProgramDesc::color(MaterialKind::Color));
        assert!(matches!(result, Err(BackendError::ProgramLink(_))));
        assert_eq!(backend.stats().total_allocations(), 0);
    }
}
