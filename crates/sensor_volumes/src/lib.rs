//! # Sensor Volumes
//!
//! Sensor coverage volumes (rectangular pyramid, conic, torus and custom
//! direction sets) overlaid on a globe scene.
//!
//! ## Features
//!
//! - **Geometry Synthesis**: Angular shape parameters to flat-shaded triangle meshes
//! - **Primitive Cache**: Dirty-flag driven per-frame rebuild of meshes, programs,
//!   render state and pick ids
//! - **Entity Synchronization**: Keeps one primitive per eligible entity in a
//!   time-varying entity collection
//! - **Headless Backend**: Recording backend for running the pipeline without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensor_volumes::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! fn main() -> Result<(), SensorError> {
//!     let scene = Rc::new(RefCell::new(Scene::new(Box::new(HeadlessBackend::new()))));
//!     let entities = Rc::new(RefCell::new(EntityCollection::new()));
//!
//!     let mut visualizer = SensorVisualizer::builder()
//!         .scene(scene.clone())
//!         .entities(entities.clone())
//!         .build()?;
//!
//!     let time = JulianDate::from_seconds(0.0);
//!     visualizer.update(time);
//!     let commands = scene.borrow_mut().render_frame(Passes::render_and_pick())?;
//!     println!("{} draw commands", commands.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod geometry;
pub mod render;
pub mod primitive;
pub mod scene;
pub mod entity;
pub mod visualizer;
pub mod config;

mod error;

#[cfg(test)]
mod tests;

pub use error::{SensorError, SensorResult};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        SensorError, SensorResult,
        config::{Config, SensorConfig},
        entity::{
            ConstantProperty, Entity, EntityCollection, EntityId, IntervalProperty, Property,
            SampledProperty, SensorGraphics, ShapeGraphics,
        },
        foundation::{
            math::{Mat4, Quat, Vec3},
            time::{JulianDate, TimeInterval, TimeIntervalCollection},
        },
        geometry::{BoundingSphere, SensorMesh, Topology},
        primitive::{SensorPrimitive, SensorShape, SensorVolume},
        render::{
            Color, DrawCommand, HeadlessBackend, Material, Pass, RenderBackend,
        },
        scene::{FrameState, Passes, PrimitiveKey, Scene, SceneMode},
        visualizer::SensorVisualizer,
    };
}
