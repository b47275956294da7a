//! Uniform values bound to draw commands

use std::collections::BTreeMap;

use super::material::Color;

/// Uniform names shared with the sensor shaders
pub mod names {
    /// Whether the volume is drawn through the globe
    pub const SHOW_THROUGH_ELLIPSOID: &str = "u_showThroughEllipsoid";
    /// Whether the globe intersection line is drawn
    pub const SHOW_INTERSECTION: &str = "u_showIntersection";
    /// Sensor radius, with infinity replaced by the far distance
    pub const SENSOR_RADIUS: &str = "u_sensorRadius";
    /// Color of the globe intersection line
    pub const INTERSECTION_COLOR: &str = "u_intersectionColor";
    /// Width of the globe intersection line
    pub const INTERSECTION_WIDTH: &str = "u_intersectionWidth";
    /// `1.0` for the front face, `-1.0` for the back face
    pub const NORMAL_DIRECTION: &str = "u_normalDirection";
    /// Color encoding the pick id
    pub const PICK_COLOR: &str = "czm_pickColor";
}

/// A single uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Boolean flag
    Bool(bool),
    /// Scalar
    Float(f64),
    /// Two component vector
    Vec2([f64; 2]),
    /// RGBA color
    Color(Color),
}

/// Uniform name to value bindings of one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformMap {
    values: BTreeMap<&'static str, UniformValue>,
}

impl UniformMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, replacing any previous binding
    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        self.values.insert(name, value);
    }

    /// Builder-style [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    /// Look up a scalar binding
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(UniformValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    /// Copy every binding of `other` into this map
    pub fn extend(&mut self, other: &Self) {
        self.values.extend(other.values.iter().map(|(name, value)| (*name, *value)));
    }

    /// Whether the map holds a binding for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over bindings in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }
}
