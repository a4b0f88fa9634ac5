//! Core ability types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Action name that matches every action
pub const MANAGE: &str = "manage";

/// Action being performed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    /// Action name (read, update, publish, etc.)
    pub name: String,
}

impl Action {
    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn read() -> Self {
        Self::new("read")
    }

    pub fn list() -> Self {
        Self::new("list")
    }

    pub fn create() -> Self {
        Self::new("create")
    }

    pub fn update() -> Self {
        Self::new("update")
    }

    pub fn delete() -> Self {
        Self::new("delete")
    }

    pub fn destroy() -> Self {
        Self::new("destroy")
    }

    /// The catch-all action, matched by every query
    pub fn manage() -> Self {
        Self::new(MANAGE)
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_manage(&self) -> bool {
        self.name == MANAGE
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Resource type identifier (e.g. "article", "comment")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a new resource type identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A concrete resource, as seen by conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Resource type of the instance
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Primary identifier
    pub id: Value,

    /// Attributes compared by attribute-map conditions
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Instance {
    /// Create a new instance with no attributes
    pub fn new(resource_type: impl Into<ResourceType>, id: impl Into<Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Add an attribute to the instance
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute; `id` falls back to the primary identifier
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self.attributes.get(name) {
            Some(value) => Some(value),
            None if name == "id" => Some(&self.id),
            None => None,
        }
    }

    /// Identifier rendered for paths and messages (strings unquoted)
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// What a query is about
///
/// `All` is the wildcard subject: only rules declared for every subject
/// match it. `Type` is a bare resource type; conditioned rules never apply
/// to it. `Instance` is a concrete resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    All,
    Type(&'a ResourceType),
    Instance(&'a Instance),
}

impl<'a> Target<'a> {
    /// Subject type used for rule matching (`None` for the wildcard)
    pub fn subject_type(&self) -> Option<&'a ResourceType> {
        match *self {
            Target::All => None,
            Target::Type(resource_type) => Some(resource_type),
            Target::Instance(instance) => Some(&instance.resource_type),
        }
    }

    pub fn instance(&self) -> Option<&'a Instance> {
        match *self {
            Target::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn to_owned_target(&self) -> OwnedTarget {
        match *self {
            Target::All => OwnedTarget::All,
            Target::Type(resource_type) => OwnedTarget::Type(resource_type.clone()),
            Target::Instance(instance) => OwnedTarget::Instance(instance.clone()),
        }
    }
}

impl<'a> From<&'a ResourceType> for Target<'a> {
    fn from(resource_type: &'a ResourceType) -> Self {
        Target::Type(resource_type)
    }
}

impl<'a> From<&'a Instance> for Target<'a> {
    fn from(instance: &'a Instance) -> Self {
        Target::Instance(instance)
    }
}

impl<'a> From<&'a OwnedTarget> for Target<'a> {
    fn from(target: &'a OwnedTarget) -> Self {
        target.as_target()
    }
}

/// Owned counterpart of [`Target`], carried by authorization failures
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedTarget {
    All,
    Type(ResourceType),
    Instance(Instance),
}

impl OwnedTarget {
    pub fn as_target(&self) -> Target<'_> {
        match self {
            OwnedTarget::All => Target::All,
            OwnedTarget::Type(resource_type) => Target::Type(resource_type),
            OwnedTarget::Instance(instance) => Target::Instance(instance),
        }
    }
}

impl fmt::Display for OwnedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedTarget::All => f.write_str("all"),
            OwnedTarget::Type(resource_type) => write!(f, "{}", resource_type),
            OwnedTarget::Instance(instance) => {
                write!(f, "{} {}", instance.resource_type, instance.id_string())
            }
        }
    }
}

/// Options passed through `authorize` to the failure
///
/// Never consulted by rule matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeOptions {
    /// Where the host should send the actor instead of rendering a 403
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,

    /// Additional key-value data for the host
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl AuthorizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect to `location` on failure
    pub fn redirect_to(mut self, location: impl Into<String>) -> Self {
        self.redirect_to = Some(location.into());
        self
    }

    /// Add an extra key-value pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
