//! Sensor primitive: per-frame resource cache
//!
//! A [`SensorPrimitive`] turns a direction list, radius, material and model
//! matrix into up to three draw commands (front face, back face, pick). GPU
//! resources are expensive, so every mutator records what it invalidated in
//! [`DirtyFlags`] and [`SensorPrimitive::update`] rebuilds only that:
//!
//! | Change | Rebuilt on next update |
//! |---|---|
//! | directions, topology, radius | vertex buffer, local + world bounding sphere |
//! | model matrix | world bounding sphere |
//! | material | color and pick programs (when the shader variant differs), material uniforms |
//! | translucency, show-through-ellipsoid | render states |
//! | user id | pick id |
//!
//! Cheap uniforms (radius, intersection style, show flags) are refreshed on
//! every emitted command.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use log::debug;

use crate::entity::EntityId;
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::mesh::{effective_radius, SensorMesh, SensorVertex};
use crate::geometry::{BoundingSphere, Topology};
use crate::render::uniforms::names;
use crate::render::{
    BufferHandle, Color, CommandKind, CullMode, DrawCommand, Material, Pass, PickId, PickOwner,
    ProgramDesc, ProgramHandle, RenderBackend, RenderState, UniformMap, UniformValue,
};
use crate::scene::{FrameState, SceneMode};
use crate::{SensorError, SensorResult};

/// Default width of the globe intersection line
pub const DEFAULT_INTERSECTION_WIDTH: f64 = 5.0;

static NEXT_PRIMITIVE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(u64);

impl PrimitiveId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_PRIMITIVE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor#{}", self.0)
    }
}

bitflags! {
    /// State invalidated since the last update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        /// Direction list or radius changed
        const DIRECTIONS = 1 << 0;
        /// Triangle assembly mode changed
        const TOPOLOGY = 1 << 1;
        /// Model matrix changed
        const TRANSFORM = 1 << 2;
        /// Material changed, color program may need relinking
        const COLOR_PROGRAM = 1 << 3;
        /// Material changed, pick program may need relinking
        const PICK_PROGRAM = 1 << 4;
        /// Show-through-ellipsoid changed
        const RENDER_STATE = 1 << 5;
        /// User id changed
        const PICK_ID = 1 << 6;

        /// Anything that requires a new vertex buffer
        const GEOMETRY = Self::DIRECTIONS.bits() | Self::TOPOLOGY.bits();
    }
}

/// A linked program together with the description it was linked from
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkedProgram {
    handle: ProgramHandle,
    desc: ProgramDesc,
}

/// Render resources and draw commands for one sensor volume
#[derive(Debug)]
pub struct SensorPrimitive {
    id: PrimitiveId,

    show: bool,
    directions: Vec<Vec3>,
    topology: Topology,
    radius: f64,
    model_matrix: Mat4,
    material: Option<Material>,
    show_intersection: bool,
    show_through_ellipsoid: bool,
    intersection_color: Color,
    intersection_width: f64,
    user_id: Option<EntityId>,

    dirty: DirtyFlags,

    mesh: Option<SensorMesh>,
    buffer: Option<BufferHandle>,
    bounding_sphere_wc: BoundingSphere,
    translucent: Option<bool>,
    material_uniforms: UniformMap,
    color_program: Option<LinkedProgram>,
    pick_program: Option<LinkedProgram>,
    pick_id: Option<PickId>,

    front_command: DrawCommand,
    back_command: DrawCommand,
    pick_command: DrawCommand,

    destroyed: bool,
}

impl Default for SensorPrimitive {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPrimitive {
    /// Create a shown primitive with no directions, infinite radius and the
    /// default color material
    pub fn new() -> Self {
        let id = PrimitiveId::next();
        Self {
            id,
            show: true,
            directions: Vec::new(),
            topology: Topology::Fan,
            radius: f64::INFINITY,
            model_matrix: Mat4::identity(),
            material: Some(Material::default()),
            show_intersection: true,
            show_through_ellipsoid: false,
            intersection_color: Color::WHITE,
            intersection_width: DEFAULT_INTERSECTION_WIDTH,
            user_id: None,
            dirty: DirtyFlags::all(),
            mesh: None,
            buffer: None,
            bounding_sphere_wc: BoundingSphere::default(),
            translucent: None,
            material_uniforms: UniformMap::new(),
            color_program: None,
            pick_program: None,
            pick_id: None,
            front_command: DrawCommand::new(id, CommandKind::FrontFace),
            back_command: DrawCommand::new(id, CommandKind::BackFace),
            pick_command: DrawCommand::new(id, CommandKind::Pick),
            destroyed: false,
        }
    }

    /// Process-unique identity
    pub const fn id(&self) -> PrimitiveId {
        self.id
    }

    /// Whether the primitive is drawn
    pub const fn show(&self) -> bool {
        self.show
    }

    /// Show or hide the primitive; hiding keeps every resource
    pub fn set_show(&mut self, show: bool) {
        self.show = show;
    }

    /// Unit directions in sensor-local space
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Replace the direction list
    pub fn set_directions(&mut self, directions: Vec<Vec3>) {
        if self.directions != directions {
            self.directions = directions;
            self.dirty |= DirtyFlags::DIRECTIONS;
        }
    }

    /// Triangle assembly mode
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Set the triangle assembly mode
    pub fn set_topology(&mut self, topology: Topology) {
        if self.topology != topology {
            self.topology = topology;
            self.dirty |= DirtyFlags::TOPOLOGY;
        }
    }

    /// Sensor range, `f64::INFINITY` when unbounded
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Set the sensor range
    ///
    /// A negative radius is stored as given and rejected by the next update.
    pub fn set_radius(&mut self, radius: f64) {
        if self.radius != radius {
            self.radius = radius;
            self.dirty |= DirtyFlags::DIRECTIONS;
        }
    }

    /// Sensor-to-world transform
    pub const fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    /// Set the sensor-to-world transform
    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        if self.model_matrix != model_matrix {
            self.model_matrix = model_matrix;
            self.dirty |= DirtyFlags::TRANSFORM;
        }
    }

    /// Lateral surface material
    pub const fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Set or clear the lateral surface material
    ///
    /// A primitive without material fails its next update.
    pub fn set_material(&mut self, material: Option<Material>) {
        if self.material != material {
            self.material = material;
            self.dirty |= DirtyFlags::COLOR_PROGRAM | DirtyFlags::PICK_PROGRAM;
        }
    }

    /// Whether the globe intersection line is drawn
    pub const fn show_intersection(&self) -> bool {
        self.show_intersection
    }

    /// Show or hide the globe intersection line
    pub fn set_show_intersection(&mut self, show_intersection: bool) {
        self.show_intersection = show_intersection;
    }

    /// Whether the volume is drawn through the globe
    pub const fn show_through_ellipsoid(&self) -> bool {
        self.show_through_ellipsoid
    }

    /// Draw the volume through the globe; changes the render state
    pub fn set_show_through_ellipsoid(&mut self, show_through_ellipsoid: bool) {
        if self.show_through_ellipsoid != show_through_ellipsoid {
            self.show_through_ellipsoid = show_through_ellipsoid;
            self.dirty |= DirtyFlags::RENDER_STATE;
        }
    }

    /// Color of the globe intersection line
    pub const fn intersection_color(&self) -> Color {
        self.intersection_color
    }

    /// Set the color of the globe intersection line
    pub fn set_intersection_color(&mut self, color: Color) {
        self.intersection_color = color;
    }

    /// Width of the globe intersection line
    pub const fn intersection_width(&self) -> f64 {
        self.intersection_width
    }

    /// Set the width of the globe intersection line
    pub fn set_intersection_width(&mut self, width: f64) {
        self.intersection_width = width;
    }

    /// User id returned when the primitive is picked
    pub const fn user_id(&self) -> Option<&EntityId> {
        self.user_id.as_ref()
    }

    /// Set the user id; a different id reallocates the pick id
    pub fn set_id(&mut self, id: Option<EntityId>) {
        if self.user_id != id {
            self.user_id = id;
            self.dirty |= DirtyFlags::PICK_ID;
        }
    }

    /// Pending invalidations
    pub const fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    /// Current mesh, `None` until at least two directions were built
    pub const fn mesh(&self) -> Option<&SensorMesh> {
        self.mesh.as_ref()
    }

    /// Local bounding sphere of the current mesh
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.mesh.as_ref().map(SensorMesh::bounding_sphere)
    }

    /// World bounding sphere as of the last update
    pub const fn bounding_sphere_wc(&self) -> &BoundingSphere {
        &self.bounding_sphere_wc
    }

    /// Vertex buffer shared by all commands
    pub const fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Current pick id
    pub const fn pick_id(&self) -> Option<PickId> {
        self.pick_id
    }

    /// Front face command as last built
    pub const fn front_command(&self) -> &DrawCommand {
        &self.front_command
    }

    /// Back face command as last built
    pub const fn back_command(&self) -> &DrawCommand {
        &self.back_command
    }

    /// Pick command as last built
    pub const fn pick_command(&self) -> &DrawCommand {
        &self.pick_command
    }

    /// Whether [`destroy`](Self::destroy) was called
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Rebuild what changed and emit this frame's commands
    ///
    /// Emits nothing while hidden, outside the 3D view, or before a mesh
    /// exists.
    ///
    /// # Errors
    ///
    /// [`SensorError::Destroyed`] after [`destroy`](Self::destroy),
    /// [`SensorError::InvalidState`] for a negative radius or a missing
    /// material, and [`SensorError::Backend`] when an allocation fails.
    pub fn update(&mut self, frame: &mut FrameState, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        if self.destroyed {
            return Err(SensorError::Destroyed);
        }
        if !self.show || frame.mode != SceneMode::Scene3D {
            return Ok(());
        }

        if self.radius.is_nan() || self.radius < 0.0 {
            return Err(SensorError::InvalidState(format!(
                "{}: radius must be greater than or equal to zero, got {}",
                self.id, self.radius
            )));
        }
        let Some(material) = self.material.as_ref() else {
            return Err(SensorError::InvalidState(format!(
                "{}: lateral surface material must be set",
                self.id
            )));
        };
        let translucent = material.is_translucent();

        if self.dirty.contains(DirtyFlags::RENDER_STATE) || self.translucent != Some(translucent) {
            self.rebuild_render_states(translucent);
        }

        let geometry_changed = self.dirty.intersects(DirtyFlags::GEOMETRY);
        if geometry_changed {
            self.rebuild_geometry(backend)?;
        }

        if self.buffer.is_none() {
            return Ok(());
        }

        if geometry_changed || self.dirty.contains(DirtyFlags::TRANSFORM) {
            self.dirty.remove(DirtyFlags::TRANSFORM);
            if let Some(mesh) = &self.mesh {
                self.bounding_sphere_wc = mesh.bounding_sphere().transform(&self.model_matrix);
            }
        }
        for command in [&mut self.front_command, &mut self.back_command, &mut self.pick_command] {
            command.model_matrix = self.model_matrix;
            command.bounding_volume = self.bounding_sphere_wc;
        }

        if frame.passes.render {
            self.prepare_color_commands(backend)?;
            if translucent {
                frame.commands.push(self.back_command.clone());
                frame.commands.push(self.front_command.clone());
            } else {
                frame.commands.push(self.front_command.clone());
            }
        }

        if frame.passes.pick {
            self.prepare_pick_command(backend)?;
            self.pick_command.pass = if translucent { Pass::Translucent } else { Pass::Opaque };
            frame.commands.push(self.pick_command.clone());
        }

        Ok(())
    }

    fn rebuild_render_states(&mut self, translucent: bool) {
        if translucent {
            let through = self.show_through_ellipsoid;
            self.front_command.render_state = Some(RenderState::translucent(CullMode::Back, through));
            self.front_command.pass = Pass::Translucent;
            self.back_command.render_state = Some(RenderState::translucent(CullMode::Front, through));
            self.back_command.pass = Pass::Translucent;
            self.pick_command.render_state = Some(RenderState::translucent(CullMode::None, through));
        } else {
            self.front_command.render_state = Some(RenderState::opaque());
            self.front_command.pass = Pass::Opaque;
            self.back_command.render_state = Some(RenderState::opaque());
            self.back_command.pass = Pass::Opaque;
            self.pick_command.render_state = Some(RenderState::opaque());
        }

        self.translucent = Some(translucent);
        self.dirty.remove(DirtyFlags::RENDER_STATE);
        debug!("{}: rebuilt render states (translucent: {translucent})", self.id);
    }

    fn rebuild_geometry(&mut self, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        self.mesh = None;
        self.set_command_geometry();

        if let Some(mesh) = SensorMesh::synthesize(&self.directions, self.topology, self.radius) {
            let buffer = backend.create_vertex_buffer(mesh.as_bytes(), &SensorVertex::layout())?;
            debug!(
                "{}: rebuilt vertex buffer ({} triangles)",
                self.id,
                mesh.triangle_count()
            );
            self.buffer = Some(buffer);
            self.mesh = Some(mesh);
        }

        self.set_command_geometry();
        self.dirty.remove(DirtyFlags::GEOMETRY);
        Ok(())
    }

    fn set_command_geometry(&mut self) {
        let vertex_count = self.mesh.as_ref().map_or(0, SensorMesh::vertex_count);
        for command in [&mut self.front_command, &mut self.back_command, &mut self.pick_command] {
            command.buffer = self.buffer;
            command.vertex_count = vertex_count;
        }
    }

    fn prepare_color_commands(&mut self, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        if self.dirty.contains(DirtyFlags::COLOR_PROGRAM) || self.color_program.is_none() {
            let desc = ProgramDesc::color(self.current_material_kind()?);
            let handle = Self::ensure_program(backend, &mut self.color_program, desc, self.id)?;
            self.front_command.program = Some(handle);
            self.back_command.program = Some(handle);
            self.refresh_material_uniforms();
            self.dirty.remove(DirtyFlags::COLOR_PROGRAM);
        }

        let mut front = self.sensor_uniforms(1.0);
        front.extend(&self.material_uniforms);
        let mut back = self.sensor_uniforms(-1.0);
        back.extend(&self.material_uniforms);
        back.set(names::NORMAL_DIRECTION, UniformValue::Float(-1.0));

        self.front_command.uniforms = front;
        self.back_command.uniforms = back;
        Ok(())
    }

    fn prepare_pick_command(&mut self, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        if self.dirty.contains(DirtyFlags::PICK_ID) || self.pick_id.is_none() {
            if let Some(old) = self.pick_id.take() {
                backend.release_pick_id(old);
            }
            let owner = PickOwner {
                primitive: self.id,
                id: self.user_id.clone(),
            };
            self.pick_id = Some(backend.create_pick_id(owner)?);
            self.dirty.remove(DirtyFlags::PICK_ID);
            debug!("{}: allocated pick id {:?}", self.id, self.pick_id);
        }

        if self.dirty.contains(DirtyFlags::PICK_PROGRAM) || self.pick_program.is_none() {
            let desc = ProgramDesc::pick(self.current_material_kind()?);
            let handle = Self::ensure_program(backend, &mut self.pick_program, desc, self.id)?;
            self.pick_command.program = Some(handle);
            self.refresh_material_uniforms();
            self.dirty.remove(DirtyFlags::PICK_PROGRAM);
        }

        let mut uniforms = self.sensor_uniforms(1.0);
        uniforms.extend(&self.material_uniforms);
        if let Some(pick_id) = self.pick_id {
            uniforms.set(names::PICK_COLOR, UniformValue::Color(pick_id.color()));
        }
        self.pick_command.uniforms = uniforms;
        Ok(())
    }

    /// Link `desc` into `slot` unless the slot already holds the same source
    fn ensure_program(
        backend: &mut dyn RenderBackend,
        slot: &mut Option<LinkedProgram>,
        desc: ProgramDesc,
        id: PrimitiveId,
    ) -> SensorResult<ProgramHandle> {
        if let Some(linked) = slot {
            if linked.desc == desc {
                return Ok(linked.handle);
            }
        }

        let handle = backend.link_program(&desc)?;
        if let Some(previous) = slot.replace(LinkedProgram { handle, desc }) {
            backend.release_program(previous.handle);
        }
        debug!("{id}: linked program {handle:?}");
        Ok(handle)
    }

    fn current_material_kind(&self) -> SensorResult<crate::render::MaterialKind> {
        self.material
            .as_ref()
            .map(Material::kind)
            .ok_or_else(|| SensorError::InvalidState(format!("{}: lateral surface material must be set", self.id)))
    }

    fn refresh_material_uniforms(&mut self) {
        self.material_uniforms = self
            .material
            .as_ref()
            .map(Material::uniforms)
            .unwrap_or_default();
    }

    fn sensor_uniforms(&self, normal_direction: f64) -> UniformMap {
        UniformMap::new()
            .with(names::SHOW_THROUGH_ELLIPSOID, UniformValue::Bool(self.show_through_ellipsoid))
            .with(names::SHOW_INTERSECTION, UniformValue::Bool(self.show_intersection))
            .with(names::SENSOR_RADIUS, UniformValue::Float(effective_radius(self.radius)))
            .with(names::INTERSECTION_COLOR, UniformValue::Color(self.intersection_color))
            .with(names::INTERSECTION_WIDTH, UniformValue::Float(self.intersection_width))
            .with(names::NORMAL_DIRECTION, UniformValue::Float(normal_direction))
    }

    /// Release every backend resource; later calls do nothing
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        if self.destroyed {
            return;
        }

        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        if let Some(program) = self.color_program.take() {
            backend.release_program(program.handle);
        }
        if let Some(program) = self.pick_program.take() {
            backend.release_program(program.handle);
        }
        if let Some(pick_id) = self.pick_id.take() {
            backend.release_pick_id(pick_id);
        }

        for command in [&mut self.front_command, &mut self.back_command, &mut self.pick_command] {
            command.buffer = None;
            command.program = None;
        }
        self.mesh = None;
        self.destroyed = true;
        debug!("{}: destroyed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, utils, Quat};
    use crate::geometry::PyramidShape;
    use crate::render::{HeadlessBackend, MaterialKind, StripeParams};
    use crate::scene::Passes;
    use approx::assert_relative_eq;

    fn pyramid_primitive() -> SensorPrimitive {
        let mut primitive = SensorPrimitive::new();
        primitive.set_directions(PyramidShape::default().directions().directions);
        primitive.set_radius(100.0);
        primitive
    }

    fn frame(passes: Passes) -> FrameState {
        FrameState::new(SceneMode::Scene3D, passes)
    }

    fn render(primitive: &mut SensorPrimitive, backend: &mut HeadlessBackend, passes: Passes) -> Vec<DrawCommand> {
        let mut frame = frame(passes);
        primitive.update(&mut frame, backend).unwrap();
        frame.commands
    }

    #[test]
    fn test_setters_only_dirty_on_change() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert!(primitive.dirty_flags().is_empty());

        primitive.set_radius(100.0);
        primitive.set_id(None);
        primitive.set_material(Some(Material::default()));
        assert!(primitive.dirty_flags().is_empty());

        primitive.set_radius(50.0);
        assert_eq!(primitive.dirty_flags(), DirtyFlags::DIRECTIONS);
    }

    #[test]
    fn test_steady_state_allocates_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();

        let first = render(&mut primitive, &mut backend, Passes::render_and_pick());
        let allocations = backend.stats().total_allocations();
        assert_eq!(allocations, 4);

        let second = render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert_eq!(backend.stats().total_allocations(), allocations);
        assert_eq!(first, second);
    }

    #[test]
    fn test_translucent_emits_back_then_front_then_pick() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();

        let commands = render(&mut primitive, &mut backend, Passes::render_and_pick());
        let kinds: Vec<_> = commands.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CommandKind::BackFace, CommandKind::FrontFace, CommandKind::Pick]);

        assert_eq!(commands[0].uniforms.get_float(names::NORMAL_DIRECTION), Some(-1.0));
        assert_eq!(commands[1].uniforms.get_float(names::NORMAL_DIRECTION), Some(1.0));
        assert!(commands.iter().all(|c| c.pass == Pass::Translucent));
        assert!(commands.iter().all(DrawCommand::is_complete));

        let front_state = commands[1].render_state.unwrap();
        assert_eq!(front_state.cull_mode, CullMode::Back);
        assert!(!front_state.depth_write);
        assert_eq!(commands[0].render_state.unwrap().cull_mode, CullMode::Front);
        assert_eq!(commands[2].render_state.unwrap().cull_mode, CullMode::None);
    }

    #[test]
    fn test_opaque_emits_front_only() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        primitive.set_material(Some(Material::color(Color::WHITE)));

        let commands = render(&mut primitive, &mut backend, Passes::render_and_pick());
        let kinds: Vec<_> = commands.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CommandKind::FrontFace, CommandKind::Pick]);
        assert!(commands.iter().all(|c| c.pass == Pass::Opaque));

        let state = commands[0].render_state.unwrap();
        assert!(state.depth_test && state.depth_write);
    }

    #[test]
    fn test_show_through_ellipsoid_disables_depth_test() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_only());

        primitive.set_show_through_ellipsoid(true);
        let commands = render(&mut primitive, &mut backend, Passes::render_only());
        assert!(commands.iter().all(|c| !c.render_state.unwrap().depth_test));
        assert_eq!(commands[0].uniforms.get(names::SHOW_THROUGH_ELLIPSOID), Some(&UniformValue::Bool(true)));
    }

    #[test]
    fn test_radius_change_rebuilds_buffer_once() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_only());
        let old_buffer = primitive.buffer().unwrap();

        primitive.set_radius(200.0);
        render(&mut primitive, &mut backend, Passes::render_only());
        render(&mut primitive, &mut backend, Passes::render_only());

        assert_eq!(backend.stats().buffers_created, 2);
        assert_eq!(backend.stats().buffers_released, 1);
        assert!(!backend.is_buffer_live(old_buffer));
        assert_eq!(backend.stats().programs_linked, 1);
    }

    #[test]
    fn test_material_kind_change_relinks_once() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert_eq!(backend.stats().programs_linked, 2);

        // Same shader variant: uniforms change, programs are reused
        primitive.set_material(Some(Material::color(Color::RED.with_alpha(0.3))));
        let commands = render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert_eq!(backend.stats().programs_linked, 2);
        assert_eq!(
            commands[1].uniforms.get(crate::render::material::names::COLOR),
            Some(&UniformValue::Color(Color::RED.with_alpha(0.3)))
        );

        primitive.set_material(Some(Material::stripe(StripeParams::default())));
        render(&mut primitive, &mut backend, Passes::render_and_pick());
        render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert_eq!(backend.stats().programs_linked, 4);
        assert_eq!(backend.stats().programs_released, 2);
        assert_eq!(backend.live_program_count(), 2);

        let program = primitive.front_command().program.unwrap();
        let desc = backend.program(program).unwrap();
        assert!(desc.fragments.contains(&crate::render::ShaderFragment::Material(MaterialKind::Stripe)));
    }

    #[test]
    fn test_pick_only_frame_keeps_color_program_pending() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_and_pick());

        primitive.set_material(Some(Material::stripe(StripeParams::default())));
        render(&mut primitive, &mut backend, Passes::pick_only());
        assert!(primitive.dirty_flags().contains(DirtyFlags::COLOR_PROGRAM));

        render(&mut primitive, &mut backend, Passes::render_only());
        let program = primitive.front_command().program.unwrap();
        assert_eq!(backend.program(program), Some(&ProgramDesc::color(MaterialKind::Stripe)));
    }

    #[test]
    fn test_id_change_reallocates_pick_id_once() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        primitive.set_id(Some(EntityId::from("a")));
        render(&mut primitive, &mut backend, Passes::pick_only());
        let first = primitive.pick_id().unwrap();

        primitive.set_id(Some(EntityId::from("b")));
        render(&mut primitive, &mut backend, Passes::pick_only());
        render(&mut primitive, &mut backend, Passes::pick_only());

        let second = primitive.pick_id().unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.stats().pick_ids_created, 2);
        assert_eq!(backend.stats().pick_ids_released, 1);
        assert_eq!(backend.pick_owner(second).and_then(|o| o.id.clone()), Some(EntityId::from("b")));

        let commands = render(&mut primitive, &mut backend, Passes::pick_only());
        assert_eq!(commands[0].uniforms.get(names::PICK_COLOR), Some(&UniformValue::Color(second.color())));
    }

    #[test]
    fn test_too_few_directions_stays_latent() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = SensorPrimitive::new();
        primitive.set_directions(vec![Vec3::z()]);

        let commands = render(&mut primitive, &mut backend, Passes::render_and_pick());
        assert!(commands.is_empty());
        assert!(primitive.mesh().is_none());
        assert_eq!(backend.stats().buffers_created, 0);
    }

    #[test]
    fn test_hidden_and_non_3d_emit_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        primitive.set_show(false);
        assert!(render(&mut primitive, &mut backend, Passes::render_and_pick()).is_empty());

        primitive.set_show(true);
        let mut frame = FrameState::new(SceneMode::ColumbusView, Passes::render_and_pick());
        primitive.update(&mut frame, &mut backend).unwrap();
        assert!(frame.commands.is_empty());
        assert_eq!(backend.stats().total_allocations(), 0);
    }

    #[test]
    fn test_invalid_state_errors() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        primitive.set_radius(-1.0);
        let mut frame = frame(Passes::render_only());
        assert!(matches!(primitive.update(&mut frame, &mut backend), Err(SensorError::InvalidState(_))));

        primitive.set_radius(1.0);
        primitive.set_material(None);
        assert!(matches!(primitive.update(&mut frame, &mut backend), Err(SensorError::InvalidState(_))));
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn test_world_sphere_follows_model_matrix() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        let rotation = Quat::from_axis_angle(&Vec3::x_axis(), constants::HALF_PI);
        let translation = Vec3::new(1000.0, 0.0, 0.0);
        primitive.set_model_matrix(utils::from_rotation_translation(&rotation, &translation));

        let commands = render(&mut primitive, &mut backend, Passes::render_only());
        let local = *primitive.bounding_sphere().unwrap();
        let world = commands[0].bounding_volume;
        assert_relative_eq!(world.radius, local.radius, max_relative = 1e-6);
        assert_relative_eq!(world.center, rotation * local.center + translation, epsilon = 1e-6);
    }

    #[test]
    fn test_infinite_radius_uniform_uses_far_distance() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        primitive.set_radius(f64::INFINITY);

        let commands = render(&mut primitive, &mut backend, Passes::render_only());
        assert_eq!(
            commands[0].uniforms.get_float(names::SENSOR_RADIUS),
            Some(crate::geometry::FAR_DISTANCE)
        );
    }

    #[test]
    fn test_backend_failure_is_retried_next_frame() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        backend.set_fail_allocations(true);

        let mut failed = frame(Passes::render_only());
        assert!(matches!(primitive.update(&mut failed, &mut backend), Err(SensorError::Backend(_))));

        backend.set_fail_allocations(false);
        let commands = render(&mut primitive, &mut backend, Passes::render_only());
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_failed_rebuild_drops_released_buffer() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_and_pick());
        let old_buffer = primitive.buffer().unwrap();

        primitive.set_radius(300.0);
        backend.set_fail_allocations(true);
        let mut failed = frame(Passes::render_only());
        assert!(primitive.update(&mut failed, &mut backend).is_err());

        assert!(!backend.is_buffer_live(old_buffer));
        assert!(primitive.buffer().is_none());
        assert!(primitive.front_command().buffer.is_none());
        assert_eq!(primitive.front_command().vertex_count, 0);

        backend.set_fail_allocations(false);
        let commands = render(&mut primitive, &mut backend, Passes::render_only());
        assert!(commands.iter().all(|c| c.buffer.is_some() && c.buffer != Some(old_buffer)));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut primitive = pyramid_primitive();
        render(&mut primitive, &mut backend, Passes::render_and_pick());

        primitive.destroy(&mut backend);
        primitive.destroy(&mut backend);

        assert!(primitive.is_destroyed());
        let stats = backend.stats();
        assert_eq!(stats.buffers_released, 1);
        assert_eq!(stats.programs_released, 2);
        assert_eq!(stats.pick_ids_released, 1);
        assert_eq!(stats.invalid_releases, 0);

        let mut frame = frame(Passes::render_only());
        assert!(matches!(primitive.update(&mut frame, &mut backend), Err(SensorError::Destroyed)));
    }
}
