//! Domain entities carrying sensor graphics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Quat, Vec3};
use crate::foundation::time::{JulianDate, TimeIntervalCollection};
use super::graphics::SensorGraphics;
use super::property::PropertyHandle;

/// Unique entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A domain object that may carry a sensor
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique id
    pub id: EntityId,
    /// Entity-level visibility switch
    pub show: bool,
    /// Times at which the entity exists; always available when `None`
    pub availability: Option<TimeIntervalCollection>,
    /// Position in world coordinates
    pub position: Option<PropertyHandle<Vec3>>,
    /// Orientation of the sensor frame in world coordinates
    pub orientation: Option<PropertyHandle<Quat>>,
    /// Sensor graphics
    pub sensor: Option<SensorGraphics>,
}

impl Entity {
    /// Create a shown entity with nothing attached
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            show: true,
            availability: None,
            position: None,
            orientation: None,
            sensor: None,
        }
    }

    /// Attach a position
    #[must_use]
    pub fn with_position(mut self, position: PropertyHandle<Vec3>) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach an orientation
    #[must_use]
    pub fn with_orientation(mut self, orientation: PropertyHandle<Quat>) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Attach sensor graphics
    #[must_use]
    pub fn with_sensor(mut self, sensor: SensorGraphics) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Restrict the entity to the given times
    #[must_use]
    pub fn with_availability(mut self, availability: TimeIntervalCollection) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Whether the entity exists at `time`
    pub fn is_available(&self, time: JulianDate) -> bool {
        self.availability
            .as_ref()
            .map_or(true, |availability| availability.contains(time))
    }

    /// Whether the entity carries everything a sensor needs
    pub const fn has_sensor_inputs(&self) -> bool {
        self.sensor.is_some() && self.position.is_some() && self.orientation.is_some()
    }
}
