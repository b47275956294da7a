//! Direction builders for the built-in sensor shapes
//!
//! Each shape turns its angular parameters into an ordered list of unit
//! direction vectors in the sensor's local frame (+Z boresight). Angular
//! parameters are clamped on assignment so the stored value is always the one
//! used to build geometry.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, utils, Mat3, Mat3Ext, Spherical, Vec3};

/// Smallest angular span accepted by any shape, in radians
pub const MIN_SPAN: f64 = 1e-6;

/// Default angular step between generated directions (5 degrees)
pub const DEFAULT_ANGULAR_RESOLUTION: f64 = 5.0 * constants::DEG_TO_RAD;

/// Pyramid half-angles are capped below 90 degrees before taking tangents
const PYRAMID_TANGENT_LIMIT: f64 = 89.0 * constants::DEG_TO_RAD;

/// Spans at or above this are treated as a closed circle
const FULL_CIRCLE: f64 = constants::PI * 1.9999;

/// How a direction list is assembled into triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// Closed fan from the origin through consecutive directions
    #[default]
    Fan,
    /// Every three directions form an independent triangle
    Triangles,
}

/// Ordered directions plus the topology they are meant for
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectionSet {
    /// Unit vectors in sensor-local space
    pub directions: Vec<Vec3>,
    /// Triangle assembly mode
    pub topology: Topology,
}

impl DirectionSet {
    /// Create a direction set
    pub fn new(directions: Vec<Vec3>, topology: Topology) -> Self {
        Self { directions, topology }
    }

    /// Number of directions
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Whether the set holds no directions
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

/// Number of equal steps covering `span` at the given resolution, at least one
pub fn step_count(span: f64, resolution: f64) -> usize {
    let resolution = if resolution > 0.0 { resolution } else { DEFAULT_ANGULAR_RESOLUTION };
    // Tolerance keeps exact multiples like 90/5 from rounding up a step
    let steps = (span / resolution - 1e-9).ceil();
    if steps.is_finite() && steps >= 1.0 { steps as usize } else { 1 }
}

fn clamp_angle(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    utils::clamp(value, min, max)
}

fn assign(field: &mut f64, value: f64) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

/// Rectangular pyramid defined by two half-angles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PyramidShape {
    x_half_angle: f64,
    y_half_angle: f64,
}

impl Default for PyramidShape {
    fn default() -> Self {
        Self::new(constants::QUARTER_PI, constants::QUARTER_PI)
    }
}

impl PyramidShape {
    /// Create a pyramid, clamping both half-angles to `[MIN_SPAN, PI/2]`
    pub fn new(x_half_angle: f64, y_half_angle: f64) -> Self {
        Self {
            x_half_angle: Self::clamp_half_angle(x_half_angle),
            y_half_angle: Self::clamp_half_angle(y_half_angle),
        }
    }

    fn clamp_half_angle(value: f64) -> f64 {
        clamp_angle(value, MIN_SPAN, constants::HALF_PI)
    }

    /// Half-angle about the X axis
    pub const fn x_half_angle(&self) -> f64 {
        self.x_half_angle
    }

    /// Half-angle about the Y axis
    pub const fn y_half_angle(&self) -> f64 {
        self.y_half_angle
    }

    /// Set the X half-angle; returns whether the clamped value changed
    pub fn set_x_half_angle(&mut self, value: f64) -> bool {
        assign(&mut self.x_half_angle, Self::clamp_half_angle(value))
    }

    /// Set the Y half-angle; returns whether the clamped value changed
    pub fn set_y_half_angle(&mut self, value: f64) -> bool {
        assign(&mut self.y_half_angle, Self::clamp_half_angle(value))
    }

    /// Four corner directions in fan order
    pub fn directions(&self) -> DirectionSet {
        let tan_x = self.x_half_angle.min(PYRAMID_TANGENT_LIMIT).tan();
        let tan_y = self.y_half_angle.min(PYRAMID_TANGENT_LIMIT).tan();
        let theta = (tan_x / tan_y).atan();
        let cone = (tan_x * tan_x + tan_y * tan_y).sqrt().atan();

        let clocks = [
            theta,
            constants::PI - theta,
            constants::PI + theta,
            -theta,
        ];
        let directions = clocks
            .iter()
            .map(|&clock| Spherical::new(clock, cone).to_cartesian())
            .collect();
        DirectionSet::new(directions, Topology::Fan)
    }
}

/// Cone with optional inner hole and clock-angle wedge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicShape {
    inner_half_angle: f64,
    outer_half_angle: f64,
    minimum_clock_angle: f64,
    maximum_clock_angle: f64,
}

impl Default for ConicShape {
    fn default() -> Self {
        Self::new(0.0, constants::HALF_PI, 0.0, constants::TAU)
    }
}

impl ConicShape {
    /// Create a cone, clamping every angle into its valid range
    pub fn new(
        inner_half_angle: f64,
        outer_half_angle: f64,
        minimum_clock_angle: f64,
        maximum_clock_angle: f64,
    ) -> Self {
        let mut shape = Self {
            inner_half_angle,
            outer_half_angle,
            minimum_clock_angle: if minimum_clock_angle.is_nan() { 0.0 } else { minimum_clock_angle },
            maximum_clock_angle,
        };
        shape.normalize();
        shape
    }

    fn normalize(&mut self) {
        self.outer_half_angle = clamp_angle(self.outer_half_angle, MIN_SPAN, constants::PI);
        self.inner_half_angle = clamp_angle(self.inner_half_angle, 0.0, self.outer_half_angle);
        let span = clamp_angle(
            self.maximum_clock_angle - self.minimum_clock_angle,
            MIN_SPAN,
            constants::TAU,
        );
        self.maximum_clock_angle = self.minimum_clock_angle + span;
    }

    fn update(&mut self, apply: impl FnOnce(&mut Self)) -> bool {
        let before = *self;
        apply(self);
        self.normalize();
        *self != before
    }

    /// Inner half-angle, zero for a solid cone
    pub const fn inner_half_angle(&self) -> f64 {
        self.inner_half_angle
    }

    /// Outer half-angle
    pub const fn outer_half_angle(&self) -> f64 {
        self.outer_half_angle
    }

    /// Start of the clock wedge
    pub const fn minimum_clock_angle(&self) -> f64 {
        self.minimum_clock_angle
    }

    /// End of the clock wedge
    pub const fn maximum_clock_angle(&self) -> f64 {
        self.maximum_clock_angle
    }

    /// Clock span covered by the wedge
    pub fn clock_span(&self) -> f64 {
        self.maximum_clock_angle - self.minimum_clock_angle
    }

    /// Whether the wedge closes into a full circle
    pub fn is_full_circle(&self) -> bool {
        self.clock_span() >= FULL_CIRCLE
    }

    /// Set the inner half-angle; returns whether the clamped value changed
    pub fn set_inner_half_angle(&mut self, value: f64) -> bool {
        self.update(|s| s.inner_half_angle = value)
    }

    /// Set the outer half-angle; returns whether the clamped value changed
    pub fn set_outer_half_angle(&mut self, value: f64) -> bool {
        self.update(|s| s.outer_half_angle = value)
    }

    /// Set the wedge start; returns whether the clamped value changed
    pub fn set_minimum_clock_angle(&mut self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.update(|s| s.minimum_clock_angle = value)
    }

    /// Set the wedge end; returns whether the clamped value changed
    pub fn set_maximum_clock_angle(&mut self, value: f64) -> bool {
        self.update(|s| s.maximum_clock_angle = value)
    }

    /// Boundary directions in fan order
    ///
    /// A full circle yields one ring at the outer half-angle without a seam
    /// duplicate. A wedge walks the outer edge from minimum to maximum clock,
    /// then returns along the inner edge, or through the boresight when the
    /// cone is solid.
    pub fn directions(&self, resolution: f64) -> DirectionSet {
        let mut directions = Vec::new();

        if self.is_full_circle() {
            let steps = step_count(constants::TAU, resolution);
            let step = constants::TAU / steps as f64;
            for i in 0..steps {
                let clock = self.minimum_clock_angle + i as f64 * step;
                directions.push(Spherical::new(clock, self.outer_half_angle).to_cartesian());
            }
            return DirectionSet::new(directions, Topology::Fan);
        }

        let span = self.clock_span();
        let steps = step_count(span, resolution);
        let step = span / steps as f64;

        for i in 0..=steps {
            let clock = self.minimum_clock_angle + i as f64 * step;
            directions.push(Spherical::new(clock, self.outer_half_angle).to_cartesian());
        }

        if self.inner_half_angle > 0.0 {
            for i in 0..=steps {
                let clock = self.maximum_clock_angle - i as f64 * step;
                directions.push(Spherical::new(clock, self.inner_half_angle).to_cartesian());
            }
        } else {
            directions.push(Vec3::z());
        }

        DirectionSet::new(directions, Topology::Fan)
    }
}

/// Sample counts of a torus lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorusLattice {
    /// Cells along the azimuth span
    pub azimuth_steps: usize,
    /// Cells along the elevation span
    pub elevation_steps: usize,
    /// Whether the azimuth edges are closed with side walls
    pub side_walls: bool,
}

impl TorusLattice {
    /// Total triangles: two caps, optional side walls and the front lattice
    pub const fn triangle_count(&self) -> usize {
        let caps = 2 * self.azimuth_steps;
        let sides = if self.side_walls { 2 * self.elevation_steps } else { 0 };
        let front = 2 * self.azimuth_steps * self.elevation_steps;
        caps + sides + front
    }
}

/// Azimuth/elevation wedge of a spherical shell
///
/// Directions are emitted as independent triangles: cap triangles at both
/// elevation edges, side walls at both azimuth edges unless the span closes
/// the circle, and two triangles per lattice cell on the front surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusShape {
    elevation_span: f64,
    azimuth_span: f64,
    elevation: f64,
    azimuth: f64,
}

impl Default for TorusShape {
    fn default() -> Self {
        Self::new(constants::HALF_PI, constants::HALF_PI, 0.0, 0.0)
    }
}

impl TorusShape {
    /// Create a torus wedge; spans clamp to `[MIN_SPAN, PI]` and `[MIN_SPAN, 2 PI]`
    pub fn new(elevation_span: f64, azimuth_span: f64, elevation: f64, azimuth: f64) -> Self {
        Self {
            elevation_span: Self::clamp_elevation_span(elevation_span),
            azimuth_span: Self::clamp_azimuth_span(azimuth_span),
            elevation: if elevation.is_nan() { 0.0 } else { elevation },
            azimuth: if azimuth.is_nan() { 0.0 } else { azimuth },
        }
    }

    fn clamp_elevation_span(value: f64) -> f64 {
        clamp_angle(value, MIN_SPAN, constants::PI)
    }

    fn clamp_azimuth_span(value: f64) -> f64 {
        clamp_angle(value, MIN_SPAN, constants::TAU)
    }

    /// Total elevation span
    pub const fn elevation_span(&self) -> f64 {
        self.elevation_span
    }

    /// Total azimuth span
    pub const fn azimuth_span(&self) -> f64 {
        self.azimuth_span
    }

    /// Elevation offset of the wedge center
    pub const fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Azimuth offset of the wedge center
    pub const fn azimuth(&self) -> f64 {
        self.azimuth
    }

    /// Set the elevation span; returns whether the clamped value changed
    pub fn set_elevation_span(&mut self, value: f64) -> bool {
        assign(&mut self.elevation_span, Self::clamp_elevation_span(value))
    }

    /// Set the azimuth span; returns whether the clamped value changed
    pub fn set_azimuth_span(&mut self, value: f64) -> bool {
        assign(&mut self.azimuth_span, Self::clamp_azimuth_span(value))
    }

    /// Set the elevation offset; returns whether it changed
    pub fn set_elevation(&mut self, value: f64) -> bool {
        !value.is_nan() && assign(&mut self.elevation, value)
    }

    /// Set the azimuth offset; returns whether it changed
    pub fn set_azimuth(&mut self, value: f64) -> bool {
        !value.is_nan() && assign(&mut self.azimuth, value)
    }

    /// Sample counts for the given resolution
    pub fn lattice(&self, resolution: f64) -> TorusLattice {
        TorusLattice {
            azimuth_steps: step_count(self.azimuth_span, resolution),
            elevation_steps: step_count(self.elevation_span, resolution),
            side_walls: self.azimuth_span < FULL_CIRCLE,
        }
    }

    /// Triangle-list directions covering caps, side walls and front surface
    pub fn directions(&self, resolution: f64) -> DirectionSet {
        let lattice = self.lattice(resolution);
        let azimuth_step = self.azimuth_span / lattice.azimuth_steps as f64;
        let elevation_step = self.elevation_span / lattice.elevation_steps as f64;
        let azimuth_start = -self.azimuth_span * 0.5;
        let elevation_start = -self.elevation_span * 0.5;

        let mut directions = Vec::with_capacity(lattice.triangle_count() * 3);
        let apex = Vec3::zeros();

        for elevation in [elevation_start, -elevation_start] {
            for a in 0..lattice.azimuth_steps {
                let left = azimuth_start + a as f64 * azimuth_step;
                let right = left + azimuth_step;
                directions.push(apex);
                directions.push(shell_direction(left, elevation));
                directions.push(shell_direction(right, elevation));
            }
        }

        for e in 0..lattice.elevation_steps {
            let bottom = elevation_start + e as f64 * elevation_step;
            let top = bottom + elevation_step;

            if lattice.side_walls {
                for azimuth in [azimuth_start, -azimuth_start] {
                    directions.push(apex);
                    directions.push(shell_direction(azimuth, bottom));
                    directions.push(shell_direction(azimuth, top));
                }
            }

            for a in 0..lattice.azimuth_steps {
                let left = azimuth_start + a as f64 * azimuth_step;
                let right = left + azimuth_step;
                let bottom_left = shell_direction(left, bottom);
                let top_left = shell_direction(left, top);
                let bottom_right = shell_direction(right, bottom);
                let top_right = shell_direction(right, top);

                directions.extend_from_slice(&[
                    bottom_left,
                    top_left,
                    bottom_right,
                    bottom_right,
                    top_left,
                    top_right,
                ]);
            }
        }

        let orientation = Mat3::rotation_z(-self.azimuth) * Mat3::rotation_y(-self.elevation);
        for direction in &mut directions {
            *direction = orientation * *direction;
        }

        DirectionSet::new(directions, Topology::Triangles)
    }
}

fn shell_direction(azimuth: f64, elevation: f64) -> Vec3 {
    let (sin_az, cos_az) = azimuth.sin_cos();
    let (sin_el, cos_el) = elevation.sin_cos();
    Vec3::new(cos_az * cos_el, sin_az * cos_el, sin_el)
}
