//! Shape-owning sensor volumes
//!
//! A [`SensorVolume`] pairs one [`SensorShape`] with the [`SensorPrimitive`]
//! that renders it. Shape setters clamp their input and push regenerated
//! directions into the primitive only when the clamped value changed.

use crate::entity::EntityId;
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::{
    ConicShape, DirectionSet, PyramidShape, Topology, TorusShape, DEFAULT_ANGULAR_RESOLUTION,
};
use crate::render::{Color, Material, RenderBackend};
use crate::scene::FrameState;
use crate::SensorResult;
use super::sensor_primitive::SensorPrimitive;

/// Kind of a sensor shape, without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Rectangular pyramid
    Pyramid,
    /// Cone
    Conic,
    /// Spherical shell wedge
    Torus,
    /// Caller-supplied directions
    Custom,
}

/// Angular description of a sensor volume
#[derive(Debug, Clone, PartialEq)]
pub enum SensorShape {
    /// Rectangular pyramid
    Pyramid(PyramidShape),
    /// Cone with optional hole and clock wedge
    Conic(ConicShape),
    /// Azimuth/elevation wedge of a spherical shell
    Torus(TorusShape),
    /// Explicit direction list
    Custom {
        /// Unit directions in sensor-local space
        directions: Vec<Vec3>,
        /// Triangle assembly mode
        topology: Topology,
    },
}

impl SensorShape {
    /// Kind of this shape
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Pyramid(_) => ShapeKind::Pyramid,
            Self::Conic(_) => ShapeKind::Conic,
            Self::Torus(_) => ShapeKind::Torus,
            Self::Custom { .. } => ShapeKind::Custom,
        }
    }

    /// Directions for this shape at the given angular resolution
    pub fn directions(&self, resolution: f64) -> DirectionSet {
        match self {
            Self::Pyramid(pyramid) => pyramid.directions(),
            Self::Conic(conic) => conic.directions(resolution),
            Self::Torus(torus) => torus.directions(resolution),
            Self::Custom { directions, topology } => DirectionSet::new(directions.clone(), *topology),
        }
    }
}

/// A sensor shape and the primitive that draws it
#[derive(Debug)]
pub struct SensorVolume {
    shape: SensorShape,
    resolution: f64,
    primitive: SensorPrimitive,
}

impl SensorVolume {
    /// Create a volume at the default angular resolution
    pub fn new(shape: SensorShape) -> Self {
        Self::with_resolution(shape, DEFAULT_ANGULAR_RESOLUTION)
    }

    /// Create a volume sampling arcs every `resolution` radians
    pub fn with_resolution(shape: SensorShape, resolution: f64) -> Self {
        let mut volume = Self {
            shape,
            resolution,
            primitive: SensorPrimitive::new(),
        };
        volume.regenerate();
        volume
    }

    /// Rectangular pyramid volume
    pub fn pyramid(shape: PyramidShape) -> Self {
        Self::new(SensorShape::Pyramid(shape))
    }

    /// Conic volume
    pub fn conic(shape: ConicShape) -> Self {
        Self::new(SensorShape::Conic(shape))
    }

    /// Torus volume
    pub fn torus(shape: TorusShape) -> Self {
        Self::new(SensorShape::Torus(shape))
    }

    /// Volume from explicit directions
    pub fn custom(directions: Vec<Vec3>, topology: Topology) -> Self {
        Self::new(SensorShape::Custom { directions, topology })
    }

    fn regenerate(&mut self) {
        let set = self.shape.directions(self.resolution);
        self.primitive.set_topology(set.topology);
        self.primitive.set_directions(set.directions);
    }

    /// Current shape parameters
    pub const fn shape(&self) -> &SensorShape {
        &self.shape
    }

    /// Kind of the current shape
    pub const fn shape_kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Angular resolution used for arcs
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Underlying render primitive
    pub const fn primitive(&self) -> &SensorPrimitive {
        &self.primitive
    }

    /// Apply `modify` to the shape; directions are regenerated when it
    /// reports a change
    pub fn modify_shape(&mut self, modify: impl FnOnce(&mut SensorShape) -> bool) -> bool {
        let changed = modify(&mut self.shape);
        if changed {
            self.regenerate();
        }
        changed
    }

    /// Replace the whole shape
    pub fn set_shape(&mut self, shape: SensorShape) {
        self.modify_shape(|current| {
            if *current == shape {
                return false;
            }
            *current = shape;
            true
        });
    }

    /// Set the pyramid X half-angle; ignored for other shapes
    pub fn set_x_half_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Pyramid(pyramid) => pyramid.set_x_half_angle(value),
            _ => false,
        })
    }

    /// Set the pyramid Y half-angle; ignored for other shapes
    pub fn set_y_half_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Pyramid(pyramid) => pyramid.set_y_half_angle(value),
            _ => false,
        })
    }

    /// Set the cone inner half-angle; ignored for other shapes
    pub fn set_inner_half_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Conic(conic) => conic.set_inner_half_angle(value),
            _ => false,
        })
    }

    /// Set the cone outer half-angle; ignored for other shapes
    pub fn set_outer_half_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Conic(conic) => conic.set_outer_half_angle(value),
            _ => false,
        })
    }

    /// Set the cone wedge start; ignored for other shapes
    pub fn set_minimum_clock_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Conic(conic) => conic.set_minimum_clock_angle(value),
            _ => false,
        })
    }

    /// Set the cone wedge end; ignored for other shapes
    pub fn set_maximum_clock_angle(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Conic(conic) => conic.set_maximum_clock_angle(value),
            _ => false,
        })
    }

    /// Set the torus elevation span; ignored for other shapes
    pub fn set_elevation_span(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Torus(torus) => torus.set_elevation_span(value),
            _ => false,
        })
    }

    /// Set the torus azimuth span; ignored for other shapes
    pub fn set_azimuth_span(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Torus(torus) => torus.set_azimuth_span(value),
            _ => false,
        })
    }

    /// Set the torus elevation offset; ignored for other shapes
    pub fn set_elevation(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Torus(torus) => torus.set_elevation(value),
            _ => false,
        })
    }

    /// Set the torus azimuth offset; ignored for other shapes
    pub fn set_azimuth(&mut self, value: f64) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Torus(torus) => torus.set_azimuth(value),
            _ => false,
        })
    }

    /// Replace custom directions; ignored for other shapes
    pub fn set_custom_directions(&mut self, new_directions: Vec<Vec3>, new_topology: Topology) -> bool {
        self.modify_shape(|shape| match shape {
            SensorShape::Custom { directions, topology } => {
                if *directions == new_directions && *topology == new_topology {
                    return false;
                }
                *directions = new_directions;
                *topology = new_topology;
                true
            }
            _ => false,
        })
    }

    /// Whether the volume is drawn
    pub const fn show(&self) -> bool {
        self.primitive.show()
    }

    /// Show or hide the volume
    pub fn set_show(&mut self, show: bool) {
        self.primitive.set_show(show);
    }

    /// Sensor range
    pub const fn radius(&self) -> f64 {
        self.primitive.radius()
    }

    /// Set the sensor range
    pub fn set_radius(&mut self, radius: f64) {
        self.primitive.set_radius(radius);
    }

    /// Lateral surface material
    pub const fn material(&self) -> Option<&Material> {
        self.primitive.material()
    }

    /// Set the lateral surface material
    pub fn set_material(&mut self, material: Option<Material>) {
        self.primitive.set_material(material);
    }

    /// Sensor-to-world transform
    pub const fn model_matrix(&self) -> &Mat4 {
        self.primitive.model_matrix()
    }

    /// Set the sensor-to-world transform
    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        self.primitive.set_model_matrix(model_matrix);
    }

    /// Color of the globe intersection line
    pub const fn intersection_color(&self) -> Color {
        self.primitive.intersection_color()
    }

    /// Set the color of the globe intersection line
    pub fn set_intersection_color(&mut self, color: Color) {
        self.primitive.set_intersection_color(color);
    }

    /// Width of the globe intersection line
    pub const fn intersection_width(&self) -> f64 {
        self.primitive.intersection_width()
    }

    /// Set the width of the globe intersection line
    pub fn set_intersection_width(&mut self, width: f64) {
        self.primitive.set_intersection_width(width);
    }

    /// Whether the globe intersection line is drawn
    pub const fn show_intersection(&self) -> bool {
        self.primitive.show_intersection()
    }

    /// Show or hide the globe intersection line
    pub fn set_show_intersection(&mut self, show: bool) {
        self.primitive.set_show_intersection(show);
    }

    /// Whether the volume is drawn through the globe
    pub const fn show_through_ellipsoid(&self) -> bool {
        self.primitive.show_through_ellipsoid()
    }

    /// Draw the volume through the globe
    pub fn set_show_through_ellipsoid(&mut self, show: bool) {
        self.primitive.set_show_through_ellipsoid(show);
    }

    /// User id returned when picked
    pub const fn id(&self) -> Option<&EntityId> {
        self.primitive.user_id()
    }

    /// Set the user id returned when picked
    pub fn set_id(&mut self, id: Option<EntityId>) {
        self.primitive.set_id(id);
    }

    /// Rebuild what changed and emit this frame's commands
    ///
    /// # Errors
    ///
    /// See [`SensorPrimitive::update`].
    pub fn update(&mut self, frame: &mut FrameState, backend: &mut dyn RenderBackend) -> SensorResult<()> {
        self.primitive.update(frame, backend)
    }

    /// Release every backend resource; later calls do nothing
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.primitive.destroy(backend);
    }

    /// Whether [`destroy`](Self::destroy) was called
    pub const fn is_destroyed(&self) -> bool {
        self.primitive.is_destroyed()
    }
}
