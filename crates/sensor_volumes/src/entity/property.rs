//! Time-dynamic property values
//!
//! Entities describe their state through properties that are sampled at a
//! simulation time. A property returns `None` when it has no value at that
//! time, which callers treat as "unresolved".

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::{Quat, Vec3};
use crate::foundation::time::{JulianDate, TimeInterval};
use crate::render::Color;

/// A value that may vary over simulation time
pub trait Property<T>: fmt::Debug {
    /// Value at `time`, `None` when undefined there
    fn value(&self, time: JulianDate) -> Option<T>;

    /// Whether the value never changes with time
    fn is_constant(&self) -> bool;
}

/// Shared handle to a property
pub type PropertyHandle<T> = Rc<dyn Property<T>>;

/// Wrap a fixed value into a property handle
pub fn constant<T: Clone + fmt::Debug + 'static>(value: T) -> PropertyHandle<T> {
    Rc::new(ConstantProperty::new(value))
}

/// Value of an optional property, or `default` when unset or unresolved
pub fn value_or_default<T>(property: Option<&PropertyHandle<T>>, time: JulianDate, default: T) -> T {
    value_or_none(property, time).unwrap_or(default)
}

/// Value of an optional property, `None` when unset or unresolved
pub fn value_or_none<T>(property: Option<&PropertyHandle<T>>, time: JulianDate) -> Option<T> {
    property.and_then(|p| p.value(time))
}

/// Property with a single value for all time
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantProperty<T> {
    value: T,
}

impl<T> ConstantProperty<T> {
    /// Create a constant property
    pub const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + fmt::Debug> Property<T> for ConstantProperty<T> {
    fn value(&self, _time: JulianDate) -> Option<T> {
        Some(self.value.clone())
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// Piecewise constant property over closed intervals
///
/// Where intervals overlap the one added first wins.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalProperty<T> {
    intervals: Vec<(TimeInterval, T)>,
}

impl<T> Default for IntervalProperty<T> {
    fn default() -> Self {
        Self { intervals: Vec::new() }
    }
}

impl<T> IntervalProperty<T> {
    /// Create a property with no intervals
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interval carrying `value`
    pub fn add(&mut self, interval: TimeInterval, value: T) {
        self.intervals.push((interval, value));
    }

    /// Builder-style [`add`](Self::add)
    #[must_use]
    pub fn with(mut self, interval: TimeInterval, value: T) -> Self {
        self.add(interval, value);
        self
    }
}

impl<T: Clone + fmt::Debug> Property<T> for IntervalProperty<T> {
    fn value(&self, time: JulianDate) -> Option<T> {
        self.intervals
            .iter()
            .find(|(interval, _)| interval.contains(time))
            .map(|(_, value)| value.clone())
    }

    fn is_constant(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Interpolation between two samples
pub trait Lerp: Sized {
    /// Value a fraction `t` of the way from `self` to `other`
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        // Opposite rotations have no unique arc; snap to the nearer sample
        self.try_slerp(other, t, 1e-12)
            .unwrap_or(if t < 0.5 { *self } else { *other })
    }
}

impl Lerp for Color {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t as f32;
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

/// Linearly interpolated samples
///
/// Undefined before the first and after the last sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledProperty<T> {
    samples: Vec<(JulianDate, T)>,
}

impl<T> Default for SampledProperty<T> {
    fn default() -> Self {
        Self { samples: Vec::new() }
    }
}

impl<T> SampledProperty<T> {
    /// Create a property with no samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample, keeping samples ordered by time
    ///
    /// A sample at an existing time replaces the previous value.
    pub fn add_sample(&mut self, time: JulianDate, value: T) {
        let index = self.samples.partition_point(|(t, _)| *t < time);
        match self.samples.get_mut(index) {
            Some(existing) if existing.0 == time => existing.1 = value,
            _ => self.samples.insert(index, (time, value)),
        }
    }

    /// Builder-style [`add_sample`](Self::add_sample)
    #[must_use]
    pub fn with_sample(mut self, time: JulianDate, value: T) -> Self {
        self.add_sample(time, value);
        self
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<T: Lerp + Clone + fmt::Debug> Property<T> for SampledProperty<T> {
    fn value(&self, time: JulianDate) -> Option<T> {
        let index = self.samples.partition_point(|(t, _)| *t < time);
        let (after_time, after) = self.samples.get(index)?;
        if *after_time == time {
            return Some(after.clone());
        }
        let (before_time, before) = self.samples.get(index.checked_sub(1)?)?;

        let span = after_time.seconds_since(*before_time);
        let t = time.seconds_since(*before_time) / span;
        Some(before.lerp(after, t))
    }

    fn is_constant(&self) -> bool {
        self.samples.len() <= 1
    }
}

/// Property computed by a closure
pub struct CallbackProperty<T> {
    callback: Box<dyn Fn(JulianDate) -> Option<T>>,
    constant: bool,
}

impl<T> CallbackProperty<T> {
    /// Create a property evaluating `callback` at each sample time
    pub fn new(callback: impl Fn(JulianDate) -> Option<T> + 'static, constant: bool) -> Self {
        Self {
            callback: Box::new(callback),
            constant,
        }
    }
}

impl<T> fmt::Debug for CallbackProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

impl<T> Property<T> for CallbackProperty<T> {
    fn value(&self, time: JulianDate) -> Option<T> {
        (self.callback)(time)
    }

    fn is_constant(&self) -> bool {
        self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use approx::assert_relative_eq;

    fn t(seconds: f64) -> JulianDate {
        JulianDate::from_seconds(seconds)
    }

    #[test]
    fn test_constant_property() {
        let property = constant(3.5);
        assert_eq!(property.value(t(-100.0)), Some(3.5));
        assert!(property.is_constant());
        assert_eq!(value_or_default(Some(&property), t(0.0), 1.0), 3.5);
        assert_eq!(value_or_default::<f64>(None, t(0.0), 1.0), 1.0);
    }

    #[test]
    fn test_interval_property() {
        let property = IntervalProperty::new()
            .with(TimeInterval::new(t(0.0), t(10.0)), true)
            .with(TimeInterval::new(t(20.0), t(30.0)), false);

        assert_eq!(property.value(t(5.0)), Some(true));
        assert_eq!(property.value(t(25.0)), Some(false));
        assert_eq!(property.value(t(15.0)), None);
    }

    #[test]
    fn test_sampled_property_interpolates() {
        let property = SampledProperty::new()
            .with_sample(t(10.0), Vec3::new(10.0, 0.0, 0.0))
            .with_sample(t(0.0), Vec3::zeros());

        assert_relative_eq!(property.value(t(2.5)).unwrap(), Vec3::new(2.5, 0.0, 0.0));
        assert_eq!(property.value(t(10.0)), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(property.value(t(-1.0)), None);
        assert_eq!(property.value(t(11.0)), None);
    }

    #[test]
    fn test_sampled_quaternion_slerps() {
        let start = Quat::identity();
        let end = Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI);
        let property = SampledProperty::new()
            .with_sample(t(0.0), start)
            .with_sample(t(1.0), end);

        let halfway = property.value(t(0.5)).unwrap();
        assert_relative_eq!(halfway.angle(), constants::QUARTER_PI, epsilon = 1e-9);
    }

    #[test]
    fn test_sample_replacement() {
        let mut property = SampledProperty::new();
        property.add_sample(t(1.0), 1.0);
        property.add_sample(t(1.0), 2.0);
        assert_eq!(property.len(), 1);
        assert_eq!(property.value(t(1.0)), Some(2.0));
    }

    #[test]
    fn test_callback_property() {
        let property = CallbackProperty::new(|time: JulianDate| (time.seconds() >= 0.0).then(|| time.seconds() * 2.0), false);
        assert_eq!(property.value(t(4.0)), Some(8.0));
        assert_eq!(property.value(t(-4.0)), None);
        assert!(!property.is_constant());
    }
}
