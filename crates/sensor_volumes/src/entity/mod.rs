//! Entity model
//!
//! Entities are the domain objects a sensor visualizer reads from: each
//! carries an id, availability, time-dynamic position and orientation, and
//! optional [`SensorGraphics`].

pub mod collection;
#[allow(clippy::module_inception)]
pub mod entity;
pub mod graphics;
pub mod property;

pub use collection::{ChangeBatch, EntityCollection, SubscriptionId};
pub use entity::{Entity, EntityId};
pub use graphics::{
    ConicGraphics, CustomGraphics, PyramidGraphics, SensorGraphics, ShapeGraphics, TorusGraphics,
};
pub use property::{
    constant, value_or_default, value_or_none, CallbackProperty, ConstantProperty, IntervalProperty,
    Lerp, Property, PropertyHandle, SampledProperty,
};
