//! Error types for the ability engine

use std::fmt;

use thiserror::Error;

use crate::types::{Action, AuthorizeOptions, OwnedTarget, ResourceType};

/// Denied authorization, carried by [`AuthzError::Unauthorized`]
///
/// Holds everything the host needs to render the failure: what was
/// attempted, on what, and the options passed to `authorize`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationFailure {
    /// Attempted action
    pub action: Action,

    /// Resource, resource type or wildcard the action was attempted on
    pub target: OwnedTarget,

    /// Caller-supplied options (redirect override, extra pairs)
    pub options: AuthorizeOptions,
}

impl AuthorizationFailure {
    /// Redirect target requested by the caller, if any
    pub fn redirect_to(&self) -> Option<&str> {
        self.options.redirect_to.as_deref()
    }
}

impl fmt::Display for AuthorizationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not authorized to {} {}", self.action, self.target)
    }
}

/// Ability engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The actor may not perform the action
    #[error("{0}")]
    Unauthorized(Box<AuthorizationFailure>),

    /// The loader found no resource with the given id
    #[error("{resource_type} `{id}` not found")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },

    /// Malformed rule or alias declaration
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource loader failure
    #[error("Loader error: {0}")]
    Loader(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    /// Build an `Unauthorized` error
    pub fn unauthorized(
        action: Action,
        target: OwnedTarget,
        options: AuthorizeOptions,
    ) -> Self {
        Self::Unauthorized(Box::new(AuthorizationFailure {
            action,
            target,
            options,
        }))
    }

    /// Build a `NotFound` error
    pub fn not_found(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// The authorization failure, if this is a denial
    pub fn as_failure(&self) -> Option<&AuthorizationFailure> {
        match self {
            Self::Unauthorized(failure) => Some(&**failure),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for ability operations
pub type Result<T> = std::result::Result<T, AuthzError>;
