//! Entity collection with change subscriptions
//!
//! Observers subscribe once and drain a [`ChangeBatch`] whenever they are ready
//! to process changes. Each subscriber accumulates its own batch, so slow and
//! fast observers never interfere.
//!
//! Within one batch the latest fact about an id wins: an entity added and
//! removed again before the batch is drained is dropped from both lists, and
//! an entity removed then re-added is reported as changed.

use std::collections::HashMap;

use log::debug;

use crate::{SensorError, SensorResult};
use super::entity::{Entity, EntityId};

/// Handle of a change subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Entities added, removed or changed since the last drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Newly added entities
    pub added: Vec<EntityId>,
    /// Removed entities
    pub removed: Vec<EntityId>,
    /// Entities modified in place
    pub changed: Vec<EntityId>,
}

impl ChangeBatch {
    /// Whether nothing happened
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn record_added(&mut self, id: &EntityId) {
        if let Some(index) = self.removed.iter().position(|r| r == id) {
            self.removed.remove(index);
            push_unique(&mut self.changed, id);
        } else {
            push_unique(&mut self.added, id);
        }
    }

    fn record_removed(&mut self, id: &EntityId) {
        if let Some(index) = self.added.iter().position(|a| a == id) {
            self.added.remove(index);
        } else {
            self.changed.retain(|c| c != id);
            push_unique(&mut self.removed, id);
        }
    }

    fn record_changed(&mut self, id: &EntityId) {
        if !self.added.contains(id) && !self.removed.contains(id) {
            push_unique(&mut self.changed, id);
        }
    }
}

fn push_unique(list: &mut Vec<EntityId>, id: &EntityId) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}

/// Set of entities keyed by id, iterated in insertion order
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    subscribers: HashMap<SubscriptionId, ChangeBatch>,
    next_subscription: u64,
}

impl EntityCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity
    ///
    /// # Errors
    ///
    /// [`SensorError::InvalidState`] when an entity with the same id exists.
    pub fn add(&mut self, entity: Entity) -> SensorResult<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(SensorError::InvalidState(format!(
                "an entity with id {} already exists",
                entity.id
            )));
        }
        let id = entity.id.clone();
        self.order.push(id.clone());
        self.entities.insert(id.clone(), entity);
        self.notify(|batch| batch.record_added(&id));
        debug!("Entity {id} added");
        Ok(())
    }

    /// Get an entity, adding an empty one when absent
    pub fn get_or_create(&mut self, id: impl Into<EntityId>) -> &Entity {
        let id = id.into();
        if !self.entities.contains_key(&id) {
            self.order.push(id.clone());
            self.entities.insert(id.clone(), Entity::new(id.clone()));
            self.notify(|batch| batch.record_added(&id));
        }
        &self.entities[&id]
    }

    /// Modify an entity in place and report it as changed
    ///
    /// Returns `false` when no entity has the id.
    pub fn modify(&mut self, id: &EntityId, modify: impl FnOnce(&mut Entity)) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        modify(entity);
        // The id is the key; edits to it are not honoured
        entity.id.clone_from(id);
        self.notify(|batch| batch.record_changed(id));
        true
    }

    /// Remove an entity
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|existing| existing != id);
        self.notify(|batch| batch.record_removed(id));
        debug!("Entity {id} removed");
        Some(entity)
    }

    /// Remove every entity
    pub fn remove_all(&mut self) {
        for id in std::mem::take(&mut self.order) {
            self.entities.remove(&id);
            self.notify(|batch| batch.record_removed(&id));
        }
    }

    /// Get an entity
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Whether an entity with the id exists
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Start accumulating changes for a new observer
    pub fn subscribe(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.insert(id, ChangeBatch::default());
        id
    }

    /// Stop accumulating changes; returns whether the subscription existed
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.remove(&subscription).is_some()
    }

    /// Take the changes accumulated since the last drain
    pub fn drain_changes(&mut self, subscription: SubscriptionId) -> ChangeBatch {
        self.subscribers
            .get_mut(&subscription)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn notify(&mut self, record: impl Fn(&mut ChangeBatch)) {
        for batch in self.subscribers.values_mut() {
            record(batch);
        }
    }
}
