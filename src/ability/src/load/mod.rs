//! Resource loading combined with authorization
//!
//! Maps a request verb to an action, fetches the resource through a
//! [`Loader`], and authorizes the action on what was loaded. A missing
//! resource is always reported as [`AuthzError::NotFound`], never as a
//! denial.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryLoader;
#[cfg(feature = "postgres")]
pub use postgres::PostgresLoader;

use crate::ability::Ability;
use crate::error::{AuthzError, Result};
use crate::types::{Action, AuthorizeOptions, Instance, OwnedTarget, ResourceType};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// Request verb
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Any other method, kept upper-cased
    Other(String),
}

impl Verb {
    /// Parse a method name, case-insensitively
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Verb::Get,
            "POST" => Verb::Post,
            "PUT" => Verb::Put,
            "PATCH" => Verb::Patch,
            "DELETE" => Verb::Delete,
            other => Verb::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Other(method) => method,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action implied by a request verb
///
/// `None` for verbs with no mapping; such requests are denied without
/// consulting any rule.
pub fn verb_action(verb: &Verb, has_id: bool) -> Option<Action> {
    match verb {
        Verb::Get if has_id => Some(Action::read()),
        Verb::Get => Some(Action::list()),
        Verb::Post => Some(Action::create()),
        Verb::Put | Verb::Patch => Some(Action::update()),
        Verb::Delete => Some(Action::destroy()),
        Verb::Other(_) => None,
    }
}

/// Resource persistence capability
///
/// `find` is required. `accessible` is optional collection scoping: the
/// default returns `None`, meaning the backend cannot list resources for
/// an actor.
#[async_trait]
pub trait Loader<A: Sync>: Send + Sync {
    /// Fetch one resource by primary identifier
    async fn find(&self, resource_type: &ResourceType, id: &str) -> Result<Option<Instance>>;

    /// Resources of `resource_type` the backend considers visible to `actor`
    async fn accessible(
        &self,
        _resource_type: &ResourceType,
        _actor: &A,
        _action: &Action,
    ) -> Result<Option<Vec<Instance>>> {
        Ok(None)
    }
}

/// What `load_and_authorize` produced
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// A single resource (request carried an id)
    Member(Instance),

    /// A scoped, rule-filtered collection
    Collection(Vec<Instance>),

    /// Type-level authorization only (create, or listing without scoping)
    Type(ResourceType),
}

impl Loaded {
    pub fn into_member(self) -> Option<Instance> {
        match self {
            Loaded::Member(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Vec<Instance>> {
        match self {
            Loaded::Collection(instances) => Some(instances),
            _ => None,
        }
    }
}

/// Load the addressed resource and authorize the verb's action on it
///
/// - with an id: find it (missing → `NotFound`), then authorize on the
///   instance;
/// - without an id, listing: fetch the scoped collection if the loader
///   supports it, authorize `list` on the type, then drop the instances
///   the rules do not permit listing;
/// - without an id, anything else: authorize on the type.
pub async fn load_and_authorize<A, L>(
    ability: &Ability<A>,
    loader: &L,
    verb: &Verb,
    resource_type: &ResourceType,
    id: Option<&str>,
    options: AuthorizeOptions,
) -> Result<Loaded>
where
    A: Sync,
    L: Loader<A> + ?Sized,
{
    let action = verb_action(verb, id.is_some());

    if let Some(id) = id {
        let instance = match loader.find(resource_type, id).await? {
            Some(instance) => instance,
            None => {
                debug!("{} `{}` not found", resource_type, id);
                return Err(AuthzError::not_found(resource_type.clone(), id));
            }
        };

        let Some(action) = action else {
            return Err(undefined_action(verb, OwnedTarget::Instance(instance), options));
        };

        ability.authorize(&action, &instance, options)?;
        return Ok(Loaded::Member(instance));
    }

    let Some(action) = action else {
        return Err(undefined_action(
            verb,
            OwnedTarget::Type(resource_type.clone()),
            options,
        ));
    };

    if action == Action::list() {
        let scoped = loader
            .accessible(resource_type, ability.actor(), &action)
            .await?;
        ability.authorize(&action, resource_type, options)?;

        return Ok(match scoped {
            Some(instances) => {
                let total = instances.len();
                let permitted = ability.accessible(&action, instances);
                debug!(
                    "Listing {}: {} of {} scoped resources permitted",
                    resource_type,
                    permitted.len(),
                    total
                );
                Loaded::Collection(permitted)
            }
            None => Loaded::Type(resource_type.clone()),
        });
    }

    ability.authorize(&action, resource_type, options)?;
    Ok(Loaded::Type(resource_type.clone()))
}

fn undefined_action(verb: &Verb, target: OwnedTarget, options: AuthorizeOptions) -> AuthzError {
    debug!("No action mapped for {} on {}, denying", verb, target);
    AuthzError::unauthorized(
        Action::new(verb.as_str().to_ascii_lowercase()),
        target,
        options,
    )
}
