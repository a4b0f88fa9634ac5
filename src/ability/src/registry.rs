//! Resource type registry
//!
//! Domain types declare their resource type statically through
//! [`Resource`]; the [`ResourceRegistry`] maps route segments to resource
//! types so a host can address resources by name.

use crate::error::{AuthzError, Result};
use crate::types::{Instance, ResourceType};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A domain type that can be authorized as an instance
pub trait Resource: Serialize {
    /// Resource type identifier for every value of this type
    const RESOURCE_TYPE: &'static str;

    /// Primary identifier
    fn id(&self) -> Value;

    fn resource_type() -> ResourceType
    where
        Self: Sized,
    {
        ResourceType::new(Self::RESOURCE_TYPE)
    }

    /// Snapshot the value as an [`Instance`], attributes taken from its
    /// serialized fields
    fn to_instance(&self) -> Result<Instance>
    where
        Self: Sized,
    {
        let attributes = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            other => {
                return Err(AuthzError::InvalidInput(format!(
                    "{} must serialize to an object, got {}",
                    Self::RESOURCE_TYPE,
                    other
                )))
            }
        };

        Ok(Instance {
            resource_type: Self::resource_type(),
            id: self.id(),
            attributes,
        })
    }
}

/// Route segment -> resource type mapping
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    routes: BTreeMap<String, ResourceType>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` for `resource_type`; each route maps to one type
    pub fn register(
        &mut self,
        route: impl Into<String>,
        resource_type: impl Into<ResourceType>,
    ) -> Result<&mut Self> {
        let route = route.into();
        if route.is_empty() || route.contains('/') {
            return Err(AuthzError::InvalidInput(format!(
                "invalid route segment `{}`",
                route
            )));
        }

        if self.routes.contains_key(&route) {
            return Err(AuthzError::InvalidInput(format!(
                "route `{}` is already registered",
                route
            )));
        }

        self.routes.insert(route, resource_type.into());
        Ok(self)
    }

    /// Register `route` for the resource type of `R`
    pub fn register_type<R: Resource>(&mut self, route: impl Into<String>) -> Result<&mut Self> {
        self.register(route, R::resource_type())
    }

    pub fn resolve(&self, route: &str) -> Option<&ResourceType> {
        self.routes.get(route)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &ResourceType)> {
        self.routes.iter().map(|(route, rt)| (route.as_str(), rt))
    }
}
