//! In-memory resource loader

use super::Loader;
use crate::error::Result;
use crate::types::{Action, Instance, ResourceType};
use async_trait::async_trait;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Store = HashMap<ResourceType, BTreeMap<String, Instance>>;

/// Loader over instances held in memory, keyed by type and id
///
/// Supports collection scoping by returning every instance of the type;
/// the rules then narrow the collection.
#[derive(Clone, Default)]
pub struct InMemoryLoader {
    resources: Arc<RwLock<Store>>,
}

impl InMemoryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader seeded with `instances`
    pub fn with_instances<I>(instances: I) -> Self
    where
        I: IntoIterator<Item = Instance>,
    {
        let mut store = Store::new();
        for instance in instances {
            store
                .entry(instance.resource_type.clone())
                .or_default()
                .insert(instance.id_string(), instance);
        }

        Self {
            resources: Arc::new(RwLock::new(store)),
        }
    }

    /// Insert or replace an instance, returning the previous one
    pub async fn insert(&self, instance: Instance) -> Option<Instance> {
        let mut resources = self.resources.write().await;
        resources
            .entry(instance.resource_type.clone())
            .or_default()
            .insert(instance.id_string(), instance)
    }

    /// Insert a new instance; refuses an id that is already taken
    ///
    /// Ids are keyed by their rendered form, so `1` and `"1"` collide.
    pub async fn create(&self, instance: Instance) -> bool {
        let mut resources = self.resources.write().await;
        match resources
            .entry(instance.resource_type.clone())
            .or_default()
            .entry(instance.id_string())
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(instance);
                true
            }
        }
    }

    /// Modify a stored instance in place under the write lock
    ///
    /// Returns the updated instance, or `None` when it no longer exists.
    pub async fn update<F>(&self, resource_type: &ResourceType, id: &str, f: F) -> Option<Instance>
    where
        F: FnOnce(&mut Instance),
    {
        let mut resources = self.resources.write().await;
        let instance = resources.get_mut(resource_type)?.get_mut(id)?;
        f(instance);
        Some(instance.clone())
    }

    pub async fn remove(&self, resource_type: &ResourceType, id: &str) -> Option<Instance> {
        let mut resources = self.resources.write().await;
        resources.get_mut(resource_type)?.remove(id)
    }

    /// Number of instances of `resource_type`
    pub async fn count(&self, resource_type: &ResourceType) -> usize {
        let resources = self.resources.read().await;
        resources.get(resource_type).map(BTreeMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl<A: Sync> Loader<A> for InMemoryLoader {
    async fn find(&self, resource_type: &ResourceType, id: &str) -> Result<Option<Instance>> {
        let resources = self.resources.read().await;
        Ok(resources
            .get(resource_type)
            .and_then(|instances| instances.get(id))
            .cloned())
    }

    async fn accessible(
        &self,
        resource_type: &ResourceType,
        _actor: &A,
        _action: &Action,
    ) -> Result<Option<Vec<Instance>>> {
        let resources = self.resources.read().await;
        Ok(Some(
            resources
                .get(resource_type)
                .map(|instances| instances.values().cloned().collect())
                .unwrap_or_default(),
        ))
    }
}
