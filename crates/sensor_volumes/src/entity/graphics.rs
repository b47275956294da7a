//! Sensor graphics attached to entities
//!
//! Every field is an optional time-dynamic property. Unset fields fall back to
//! defaults chosen by the visualizer. Cloning shares the property handles.

use crate::foundation::math::Vec3;
use crate::geometry::Topology;
use crate::primitive::ShapeKind;
use crate::render::{Color, Material};
use super::property::PropertyHandle;

/// Fill `target` from `source` when `target` is unset
fn merge_property<T: ?Sized>(target: &mut Option<std::rc::Rc<T>>, source: &Option<std::rc::Rc<T>>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

/// Rectangular pyramid parameters
#[derive(Debug, Clone, Default)]
pub struct PyramidGraphics {
    /// Half-angle about the X axis
    pub x_half_angle: Option<PropertyHandle<f64>>,
    /// Half-angle about the Y axis
    pub y_half_angle: Option<PropertyHandle<f64>>,
}

/// Cone parameters
#[derive(Debug, Clone, Default)]
pub struct ConicGraphics {
    /// Inner half-angle
    pub inner_half_angle: Option<PropertyHandle<f64>>,
    /// Outer half-angle
    pub outer_half_angle: Option<PropertyHandle<f64>>,
    /// Wedge start
    pub minimum_clock_angle: Option<PropertyHandle<f64>>,
    /// Wedge end
    pub maximum_clock_angle: Option<PropertyHandle<f64>>,
}

/// Spherical shell wedge parameters
#[derive(Debug, Clone, Default)]
pub struct TorusGraphics {
    /// Total elevation span
    pub elevation_span: Option<PropertyHandle<f64>>,
    /// Total azimuth span
    pub azimuth_span: Option<PropertyHandle<f64>>,
    /// Elevation offset of the wedge center
    pub elevation: Option<PropertyHandle<f64>>,
    /// Azimuth offset of the wedge center
    pub azimuth: Option<PropertyHandle<f64>>,
}

/// Explicit direction list
#[derive(Debug, Clone, Default)]
pub struct CustomGraphics {
    /// Unit directions in sensor-local space
    pub directions: Option<PropertyHandle<Vec<Vec3>>>,
    /// Triangle assembly mode
    pub topology: Option<PropertyHandle<Topology>>,
}

/// Shape-specific part of [`SensorGraphics`]
#[derive(Debug, Clone)]
pub enum ShapeGraphics {
    /// Rectangular pyramid
    Pyramid(PyramidGraphics),
    /// Cone
    Conic(ConicGraphics),
    /// Spherical shell wedge
    Torus(TorusGraphics),
    /// Explicit directions
    Custom(CustomGraphics),
}

impl Default for ShapeGraphics {
    fn default() -> Self {
        Self::Pyramid(PyramidGraphics::default())
    }
}

impl ShapeGraphics {
    /// Kind of shape described
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Pyramid(_) => ShapeKind::Pyramid,
            Self::Conic(_) => ShapeKind::Conic,
            Self::Torus(_) => ShapeKind::Torus,
            Self::Custom(_) => ShapeKind::Custom,
        }
    }

    /// Fill unset fields from `source` when both describe the same kind
    pub fn merge(&mut self, source: &Self) {
        match (self, source) {
            (Self::Pyramid(target), Self::Pyramid(source)) => {
                merge_property(&mut target.x_half_angle, &source.x_half_angle);
                merge_property(&mut target.y_half_angle, &source.y_half_angle);
            }
            (Self::Conic(target), Self::Conic(source)) => {
                merge_property(&mut target.inner_half_angle, &source.inner_half_angle);
                merge_property(&mut target.outer_half_angle, &source.outer_half_angle);
                merge_property(&mut target.minimum_clock_angle, &source.minimum_clock_angle);
                merge_property(&mut target.maximum_clock_angle, &source.maximum_clock_angle);
            }
            (Self::Torus(target), Self::Torus(source)) => {
                merge_property(&mut target.elevation_span, &source.elevation_span);
                merge_property(&mut target.azimuth_span, &source.azimuth_span);
                merge_property(&mut target.elevation, &source.elevation);
                merge_property(&mut target.azimuth, &source.azimuth);
            }
            (Self::Custom(target), Self::Custom(source)) => {
                merge_property(&mut target.directions, &source.directions);
                merge_property(&mut target.topology, &source.topology);
            }
            _ => {}
        }
    }
}

/// Visual description of an entity's sensor
#[derive(Debug, Clone, Default)]
pub struct SensorGraphics {
    /// Whether the sensor is drawn
    pub show: Option<PropertyHandle<bool>>,
    /// Sensor range
    pub radius: Option<PropertyHandle<f64>>,
    /// Lateral surface material
    pub lateral_surface_material: Option<PropertyHandle<Material>>,
    /// Color of the globe intersection line
    pub intersection_color: Option<PropertyHandle<Color>>,
    /// Width of the globe intersection line
    pub intersection_width: Option<PropertyHandle<f64>>,
    /// Whether the globe intersection line is drawn
    pub show_intersection: Option<PropertyHandle<bool>>,
    /// Whether the volume is drawn through the globe
    pub show_through_ellipsoid: Option<PropertyHandle<bool>>,
    /// Shape parameters
    pub shape: ShapeGraphics,
}

impl SensorGraphics {
    /// Graphics for the given shape with every common field unset
    pub fn new(shape: ShapeGraphics) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Rectangular pyramid graphics
    pub fn pyramid(pyramid: PyramidGraphics) -> Self {
        Self::new(ShapeGraphics::Pyramid(pyramid))
    }

    /// Cone graphics
    pub fn conic(conic: ConicGraphics) -> Self {
        Self::new(ShapeGraphics::Conic(conic))
    }

    /// Spherical shell wedge graphics
    pub fn torus(torus: TorusGraphics) -> Self {
        Self::new(ShapeGraphics::Torus(torus))
    }

    /// Explicit direction graphics
    pub fn custom(custom: CustomGraphics) -> Self {
        Self::new(ShapeGraphics::Custom(custom))
    }

    /// Fill every unset field from `source`; assigned fields are kept
    pub fn merge(&mut self, source: &Self) {
        merge_property(&mut self.show, &source.show);
        merge_property(&mut self.radius, &source.radius);
        merge_property(&mut self.lateral_surface_material, &source.lateral_surface_material);
        merge_property(&mut self.intersection_color, &source.intersection_color);
        merge_property(&mut self.intersection_width, &source.intersection_width);
        merge_property(&mut self.show_intersection, &source.show_intersection);
        merge_property(&mut self.show_through_ellipsoid, &source.show_through_ellipsoid);
        self.shape.merge(&source.shape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::property::constant;
    use crate::foundation::time::JulianDate;
    use std::rc::Rc;

    #[test]
    fn test_clone_shares_handles() {
        let graphics = SensorGraphics {
            radius: Some(constant(10.0)),
            ..SensorGraphics::default()
        };
        let copy = graphics.clone();
        assert!(Rc::ptr_eq(graphics.radius.as_ref().unwrap(), copy.radius.as_ref().unwrap()));
    }

    #[test]
    fn test_merge_fills_only_unset() {
        let mut target = SensorGraphics::conic(ConicGraphics {
            outer_half_angle: Some(constant(0.5)),
            ..ConicGraphics::default()
        });
        let source = SensorGraphics {
            radius: Some(constant(100.0)),
            ..SensorGraphics::conic(ConicGraphics {
                inner_half_angle: Some(constant(0.1)),
                outer_half_angle: Some(constant(0.9)),
                ..ConicGraphics::default()
            })
        };

        target.merge(&source);
        let time = JulianDate::from_seconds(0.0);
        assert_eq!(target.radius.as_ref().and_then(|p| p.value(time)), Some(100.0));
        match &target.shape {
            ShapeGraphics::Conic(conic) => {
                assert_eq!(conic.outer_half_angle.as_ref().and_then(|p| p.value(time)), Some(0.5));
                assert_eq!(conic.inner_half_angle.as_ref().and_then(|p| p.value(time)), Some(0.1));
                assert!(conic.minimum_clock_angle.is_none());
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_merge_ignores_other_shape_kind() {
        let mut target = SensorGraphics::pyramid(PyramidGraphics::default());
        let source = SensorGraphics::torus(TorusGraphics {
            azimuth: Some(constant(1.0)),
            ..TorusGraphics::default()
        });
        target.merge(&source);
        assert_eq!(target.shape.kind(), ShapeKind::Pyramid);
    }
}
