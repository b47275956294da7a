//! Sensor primitives
//!
//! [`SensorPrimitive`] is the dirty-flag driven render cache;
//! [`SensorVolume`] wraps it with a parametric shape.

pub mod sensor_primitive;
pub mod sensor_volume;

pub use sensor_primitive::{DirtyFlags, PrimitiveId, SensorPrimitive, DEFAULT_INTERSECTION_WIDTH};
pub use sensor_volume::{SensorShape, SensorVolume, ShapeKind};
