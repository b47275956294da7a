//! Entity-to-primitive synchronization
//!
//! [`SensorVisualizer`] keeps exactly one sensor primitive in the scene for
//! every entity that carries sensor graphics, a position and an orientation.
//!
//! Each [`update`](SensorVisualizer::update):
//! 1. Drains the collection's change batch and starts or stops tracking
//!    entities
//! 2. Resolves every tracked entity's properties at the requested time
//! 3. Hides, creates or updates the entity's primitive
//!
//! Hidden entities keep their primitive so showing them again is free.
//! Primitives are destroyed only when an entity stops qualifying or the
//! visualizer itself is destroyed.
//!
//! The scene and the collection are shared through `Rc<RefCell<_>>`; neither
//! may be borrowed by the caller while `update` or `destroy` runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::config::SensorConfig;
use crate::entity::{
    value_or_default, value_or_none, ConicGraphics, CustomGraphics, Entity, EntityCollection,
    EntityId, PyramidGraphics, ShapeGraphics, SubscriptionId, TorusGraphics,
};
use crate::foundation::math::{constants, utils, Quat, Vec3};
use crate::foundation::time::JulianDate;
use crate::geometry::{ConicShape, PyramidShape, Topology, TorusShape};
use crate::primitive::{SensorShape, SensorVolume, ShapeKind};
use crate::scene::{PrimitiveKey, Scene};
use crate::{SensorError, SensorResult};

/// Default pyramid half-angle
pub const DEFAULT_HALF_ANGLE: f64 = constants::HALF_PI;

/// Default cone outer half-angle
pub const DEFAULT_OUTER_HALF_ANGLE: f64 = constants::PI;

/// Default torus span, both axes
pub const DEFAULT_TORUS_SPAN: f64 = constants::HALF_PI;

/// What the visualizer remembers about a tracked entity
#[derive(Debug, Clone, Default)]
struct EntityBinding {
    key: Option<PrimitiveKey>,
    shape_kind: Option<ShapeKind>,
    last_position: Option<Vec3>,
    last_orientation: Option<Quat>,
}

impl EntityBinding {
    fn hide(&self, scene: &mut Scene) {
        if let Some(primitive) = self.key.and_then(|key| scene.primitive_mut(key)) {
            primitive.set_show(false);
        }
    }
}

/// Builder for [`SensorVisualizer`]
#[derive(Debug, Default)]
pub struct SensorVisualizerBuilder {
    scene: Option<Rc<RefCell<Scene>>>,
    entities: Option<Rc<RefCell<EntityCollection>>>,
    config: SensorConfig,
}

impl SensorVisualizerBuilder {
    /// Scene the primitives are added to
    #[must_use]
    pub fn scene(mut self, scene: Rc<RefCell<Scene>>) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Entities to visualize
    #[must_use]
    pub fn entities(mut self, entities: Rc<RefCell<EntityCollection>>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Defaults for unset graphics properties
    #[must_use]
    pub fn config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe to the collection and track every entity already in it
    ///
    /// # Errors
    ///
    /// [`SensorError::MissingArgument`] when the scene or the entity
    /// collection was not supplied.
    pub fn build(self) -> SensorResult<SensorVisualizer> {
        let scene = self.scene.ok_or(SensorError::MissingArgument("scene"))?;
        let entities = self.entities.ok_or(SensorError::MissingArgument("entityCollection"))?;

        let (subscription, existing) = {
            let mut collection = entities.borrow_mut();
            let subscription = collection.subscribe();
            let existing: Vec<EntityId> = collection.iter().map(|entity| entity.id.clone()).collect();
            (subscription, existing)
        };

        let mut visualizer = SensorVisualizer {
            scene,
            entities,
            config: self.config,
            subscription,
            bindings: HashMap::new(),
            order: Vec::new(),
            destroyed: false,
        };
        visualizer.apply_changes(&existing, &[]);
        Ok(visualizer)
    }
}

/// Keeps scene primitives in step with sensor-carrying entities
#[derive(Debug)]
pub struct SensorVisualizer {
    scene: Rc<RefCell<Scene>>,
    entities: Rc<RefCell<EntityCollection>>,
    config: SensorConfig,
    subscription: SubscriptionId,
    bindings: HashMap<EntityId, EntityBinding>,
    order: Vec<EntityId>,
    destroyed: bool,
}

impl SensorVisualizer {
    /// Start building a visualizer
    pub fn builder() -> SensorVisualizerBuilder {
        SensorVisualizerBuilder::default()
    }

    /// Defaults in use
    pub const fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Number of tracked entities
    pub fn tracked_count(&self) -> usize {
        self.order.len()
    }

    /// Whether an entity is tracked
    pub fn is_tracked(&self, id: &EntityId) -> bool {
        self.bindings.contains_key(id)
    }

    /// Primitive created for an entity, if it has been visible at least once
    pub fn primitive_key(&self, id: &EntityId) -> Option<PrimitiveKey> {
        self.bindings.get(id).and_then(|binding| binding.key)
    }

    /// Whether [`destroy`](Self::destroy) was called
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Bring every primitive up to date with its entity at `time`
    ///
    /// Does nothing after [`destroy`](Self::destroy).
    pub fn update(&mut self, time: JulianDate) {
        if self.destroyed {
            return;
        }

        let batch = self.entities.borrow_mut().drain_changes(self.subscription);
        if !batch.is_empty() {
            let mut added_or_changed = batch.added;
            added_or_changed.extend(batch.changed);
            self.apply_changes(&added_or_changed, &batch.removed);
        }

        let entities = self.entities.borrow();
        let mut scene = self.scene.borrow_mut();
        for id in &self.order {
            let (Some(binding), Some(entity)) = (self.bindings.get_mut(id), entities.get(id)) else {
                continue;
            };
            update_binding(binding, entity, &mut scene, &self.config, time);
        }
    }

    fn apply_changes(&mut self, added_or_changed: &[EntityId], removed: &[EntityId]) {
        let entities = Rc::clone(&self.entities);
        let entities = entities.borrow();

        for id in added_or_changed {
            if entities.get(id).is_some_and(Entity::has_sensor_inputs) {
                if !self.bindings.contains_key(id) {
                    self.bindings.insert(id.clone(), EntityBinding::default());
                    self.order.push(id.clone());
                    debug!("Tracking sensor entity {id}");
                }
            } else {
                self.untrack(id);
            }
        }

        for id in removed {
            self.untrack(id);
        }
    }

    fn untrack(&mut self, id: &EntityId) {
        let Some(binding) = self.bindings.remove(id) else {
            return;
        };
        self.order.retain(|tracked| tracked != id);
        if let Some(key) = binding.key {
            self.scene.borrow_mut().remove_primitive(key);
        }
        debug!("Stopped tracking sensor entity {id}");
    }

    /// Remove every owned primitive and stop listening; later calls do nothing
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.entities.borrow_mut().unsubscribe(self.subscription);
        let mut scene = self.scene.borrow_mut();
        for id in self.order.drain(..) {
            if let Some(key) = self.bindings.remove(&id).and_then(|binding| binding.key) {
                scene.remove_primitive(key);
            }
        }
        self.bindings.clear();
        self.destroyed = true;
        debug!("Sensor visualizer destroyed");
    }
}

fn update_binding(
    binding: &mut EntityBinding,
    entity: &Entity,
    scene: &mut Scene,
    config: &SensorConfig,
    time: JulianDate,
) {
    let Some(graphics) = entity.sensor.as_ref() else {
        binding.hide(scene);
        return;
    };

    let visible = entity.show
        && entity.is_available(time)
        && value_or_default(graphics.show.as_ref(), time, true);
    let pose = if visible {
        value_or_none(entity.position.as_ref(), time).zip(value_or_none(entity.orientation.as_ref(), time))
    } else {
        None
    };
    let Some((position, orientation)) = pose else {
        binding.hide(scene);
        return;
    };

    let kind = graphics.shape.kind();
    let existing = binding
        .key
        .filter(|key| scene.contains_primitive(*key) && binding.shape_kind == Some(kind));
    let key = match existing {
        Some(key) => key,
        None => {
            if let Some(old) = binding.key.take() {
                scene.remove_primitive(old);
            }
            let mut volume = SensorVolume::with_resolution(
                resolve_shape(&graphics.shape, time),
                config.angular_resolution(),
            );
            volume.set_id(Some(entity.id.clone()));
            let key = scene.add_primitive(volume);
            debug!("Created {kind:?} sensor primitive for entity {}", entity.id);

            binding.key = Some(key);
            binding.shape_kind = Some(kind);
            binding.last_position = None;
            binding.last_orientation = None;
            key
        }
    };

    let Some(primitive) = scene.primitive_mut(key) else {
        return;
    };
    primitive.set_show(true);

    if binding.last_position != Some(position) || binding.last_orientation != Some(orientation) {
        primitive.set_model_matrix(utils::from_rotation_translation(&orientation, &position));
        binding.last_position = Some(position);
        binding.last_orientation = Some(orientation);
        trace!("Entity {} moved", entity.id);
    }

    primitive.set_shape(resolve_shape(&graphics.shape, time));
    primitive.set_radius(value_or_default(graphics.radius.as_ref(), time, f64::INFINITY));
    primitive.set_material(Some(value_or_default(
        graphics.lateral_surface_material.as_ref(),
        time,
        config.default_material.clone(),
    )));
    primitive.set_intersection_color(value_or_default(
        graphics.intersection_color.as_ref(),
        time,
        config.default_intersection_color,
    ));
    primitive.set_intersection_width(value_or_default(
        graphics.intersection_width.as_ref(),
        time,
        config.default_intersection_width,
    ));
    primitive.set_show_intersection(value_or_default(
        graphics.show_intersection.as_ref(),
        time,
        config.default_show_intersection,
    ));
    primitive.set_show_through_ellipsoid(value_or_default(
        graphics.show_through_ellipsoid.as_ref(),
        time,
        config.default_show_through_ellipsoid,
    ));
}

fn resolve_shape(shape: &ShapeGraphics, time: JulianDate) -> SensorShape {
    match shape {
        ShapeGraphics::Pyramid(pyramid) => SensorShape::Pyramid(resolve_pyramid(pyramid, time)),
        ShapeGraphics::Conic(conic) => SensorShape::Conic(resolve_conic(conic, time)),
        ShapeGraphics::Torus(torus) => SensorShape::Torus(resolve_torus(torus, time)),
        ShapeGraphics::Custom(custom) => resolve_custom(custom, time),
    }
}

fn resolve_pyramid(pyramid: &PyramidGraphics, time: JulianDate) -> PyramidShape {
    PyramidShape::new(
        value_or_default(pyramid.x_half_angle.as_ref(), time, DEFAULT_HALF_ANGLE),
        value_or_default(pyramid.y_half_angle.as_ref(), time, DEFAULT_HALF_ANGLE),
    )
}

fn resolve_conic(conic: &ConicGraphics, time: JulianDate) -> ConicShape {
    ConicShape::new(
        value_or_default(conic.inner_half_angle.as_ref(), time, 0.0),
        value_or_default(conic.outer_half_angle.as_ref(), time, DEFAULT_OUTER_HALF_ANGLE),
        value_or_default(conic.minimum_clock_angle.as_ref(), time, 0.0),
        value_or_default(conic.maximum_clock_angle.as_ref(), time, constants::TAU),
    )
}

fn resolve_torus(torus: &TorusGraphics, time: JulianDate) -> TorusShape {
    TorusShape::new(
        value_or_default(torus.elevation_span.as_ref(), time, DEFAULT_TORUS_SPAN),
        value_or_default(torus.azimuth_span.as_ref(), time, DEFAULT_TORUS_SPAN),
        value_or_default(torus.elevation.as_ref(), time, 0.0),
        value_or_default(torus.azimuth.as_ref(), time, 0.0),
    )
}

fn resolve_custom(custom: &CustomGraphics, time: JulianDate) -> SensorShape {
    SensorShape::Custom {
        directions: value_or_default(custom.directions.as_ref(), time, Vec::new()),
        topology: value_or_default(custom.topology.as_ref(), time, Topology::Fan),
    }
}
