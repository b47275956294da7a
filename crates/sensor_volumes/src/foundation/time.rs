//! Simulation time and availability intervals
//!
//! Entity properties are sampled at a simulation time rather than at wall-clock
//! time, so time is modelled as an ordered scalar in seconds.

use serde::{Deserialize, Serialize};

/// Simulation instant, in seconds from an arbitrary epoch
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct JulianDate(f64);

impl JulianDate {
    /// Create an instant from seconds past the epoch
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Seconds past the epoch
    pub const fn seconds(self) -> f64 {
        self.0
    }

    /// Signed difference `self - earlier` in seconds
    pub fn seconds_since(self, earlier: Self) -> f64 {
        self.0 - earlier.0
    }
}

/// Closed time interval `[start, stop]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// First instant inside the interval
    pub start: JulianDate,
    /// Last instant inside the interval
    pub stop: JulianDate,
}

impl TimeInterval {
    /// Create a closed interval
    pub const fn new(start: JulianDate, stop: JulianDate) -> Self {
        Self { start, stop }
    }

    /// Whether the interval contains no instant
    pub fn is_empty(&self) -> bool {
        self.stop < self.start
    }

    /// Whether `time` lies inside the interval
    pub fn contains(&self, time: JulianDate) -> bool {
        !self.is_empty() && time >= self.start && time <= self.stop
    }
}

/// Set of intervals, used for entity availability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeIntervalCollection {
    intervals: Vec<TimeInterval>,
}

impl TimeIntervalCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection holding a single interval
    pub fn from_interval(interval: TimeInterval) -> Self {
        let mut collection = Self::new();
        collection.add(interval);
        collection
    }

    /// Add an interval, keeping the list ordered by start time
    pub fn add(&mut self, interval: TimeInterval) {
        if interval.is_empty() {
            return;
        }
        let index = self
            .intervals
            .partition_point(|existing| existing.start <= interval.start);
        self.intervals.insert(index, interval);
    }

    /// Whether any interval contains `time`
    pub fn contains(&self, time: JulianDate) -> bool {
        self.find(time).is_some()
    }

    /// Interval containing `time`, if any
    pub fn find(&self, time: JulianDate) -> Option<&TimeInterval> {
        self.intervals.iter().find(|interval| interval.contains(time))
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the collection has no intervals
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterate over intervals in start order
    pub fn iter(&self) -> impl Iterator<Item = &TimeInterval> {
        self.intervals.iter()
    }
}
