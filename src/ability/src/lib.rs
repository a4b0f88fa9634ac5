//! # CretoAI Ability
//!
//! Rule-based authorization: what may an actor do to a resource?
//!
//! ## Features
//!
//! - **Ordered rules** where the most recent matching rule wins
//! - **Default deny** when no rule matches
//! - **Wildcards** for every action (`manage`) and every resource type
//! - **Conditions** as predicates or attribute equality maps
//! - **Action aliases** (`read` covers `show` and `index`, ...)
//! - **`load_and_authorize`** for request handlers, with axum integration
//!
//! ## Example
//!
//! ```rust
//! use cretoai_ability::{Ability, Action, Instance, ResourceType, Result, RuleSet};
//!
//! struct User {
//!     id: u64,
//! }
//!
//! fn define(user: &User, rules: &mut RuleSet) -> Result<()> {
//!     rules
//!         .allow("read", "article")?
//!         .allow_where("update", "article", [("owner_id", user.id)])?;
//!     Ok(())
//! }
//!
//! let ability = Ability::build(User { id: 7 }, &define).unwrap();
//! let own = Instance::new("article", 1).with_attribute("owner_id", 7);
//! let other = Instance::new("article", 2).with_attribute("owner_id", 8);
//!
//! assert!(ability.permitted(&Action::read(), &ResourceType::new("article")));
//! assert!(ability.permitted(&Action::update(), &own));
//! assert!(ability.forbidden(&Action::update(), &other));
//! ```

pub mod ability;
pub mod config;
pub mod error;
pub mod load;
pub mod registry;
pub mod rule;
pub mod server;
pub mod types;
pub mod web;

// Re-export commonly used types
pub use ability::{
    Ability, AbilityDefinition, ActionAliases, Decision, DecisionReason, RuleSet,
};
pub use error::{AuthorizationFailure, AuthzError, Result};
pub use load::{load_and_authorize, verb_action, InMemoryLoader, Loaded, Loader, Verb};
#[cfg(feature = "postgres")]
pub use load::PostgresLoader;
pub use registry::{Resource, ResourceRegistry};
pub use rule::{Actions, Behavior, Condition, Rule, Subjects};
pub use types::{Action, AuthorizeOptions, Instance, OwnedTarget, ResourceType, Target};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
