//! Rule definition and matching

use crate::error::{AuthzError, Result};
use crate::types::{Action, Instance, ResourceType, Target};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Rule behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Grant the action
    Allow,
    /// Revoke the action
    Deny,
}

impl Behavior {
    pub fn is_allow(&self) -> bool {
        matches!(self, Behavior::Allow)
    }
}

impl From<bool> for Behavior {
    fn from(allowed: bool) -> Self {
        if allowed {
            Behavior::Allow
        } else {
            Behavior::Deny
        }
    }
}

/// Actions a rule covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actions {
    /// Every action
    All,
    Only(BTreeSet<Action>),
}

impl Actions {
    pub fn only<I, T>(actions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Action>,
    {
        Actions::Only(actions.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, action: &Action) -> bool {
        match self {
            Actions::All => true,
            Actions::Only(actions) => actions.contains(action),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Actions::Only(actions) if actions.is_empty())
    }
}

impl From<Action> for Actions {
    fn from(action: Action) -> Self {
        Actions::Only(BTreeSet::from([action]))
    }
}

impl From<&str> for Actions {
    fn from(action: &str) -> Self {
        Action::new(action).into()
    }
}

impl<const N: usize> From<[&str; N]> for Actions {
    fn from(actions: [&str; N]) -> Self {
        Actions::only(actions)
    }
}

impl From<Vec<Action>> for Actions {
    fn from(actions: Vec<Action>) -> Self {
        Actions::only(actions)
    }
}

/// Resource types a rule covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subjects {
    /// Every resource type, and the wildcard target itself
    All,
    Only(BTreeSet<ResourceType>),
}

impl Subjects {
    pub fn only<I, T>(subjects: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        Subjects::Only(subjects.into_iter().map(Into::into).collect())
    }

    /// `None` is the wildcard target, covered only by `Subjects::All`
    pub fn contains(&self, subject_type: Option<&ResourceType>) -> bool {
        match (self, subject_type) {
            (Subjects::All, _) => true,
            (Subjects::Only(subjects), Some(subject_type)) => subjects.contains(subject_type),
            (Subjects::Only(_), None) => false,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Subjects::Only(subjects) if subjects.is_empty())
    }
}

impl From<ResourceType> for Subjects {
    fn from(subject: ResourceType) -> Self {
        Subjects::Only(BTreeSet::from([subject]))
    }
}

impl From<&ResourceType> for Subjects {
    fn from(subject: &ResourceType) -> Self {
        subject.clone().into()
    }
}

impl From<&str> for Subjects {
    fn from(subject: &str) -> Self {
        ResourceType::new(subject).into()
    }
}

impl<const N: usize> From<[&str; N]> for Subjects {
    fn from(subjects: [&str; N]) -> Self {
        Subjects::only(subjects)
    }
}

/// Predicate over a concrete instance
pub type Predicate = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Refinement narrowing a rule to specific instances
#[derive(Clone)]
pub enum Condition {
    /// Arbitrary check on the instance
    Predicate(Predicate),

    /// Every attribute must equal the expected value exactly
    Attributes(BTreeMap<String, Value>),
}

impl Condition {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(f))
    }

    pub fn attributes<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Evaluate against an instance
    pub fn evaluate(&self, instance: &Instance) -> bool {
        match self {
            Condition::Predicate(predicate) => predicate(instance),
            Condition::Attributes(expected) => expected
                .iter()
                .all(|(key, value)| instance.attribute(key) == Some(value)),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Predicate(_) => f.write_str("Predicate(<fn>)"),
            Condition::Attributes(expected) => f.debug_tuple("Attributes").field(expected).finish(),
        }
    }
}

/// One declared grant or denial
#[derive(Debug, Clone)]
pub struct Rule {
    behavior: Behavior,
    actions: Actions,
    subjects: Subjects,
    condition: Option<Condition>,
}

impl Rule {
    /// Create a rule; empty action or subject sets are rejected
    pub fn new(
        behavior: Behavior,
        actions: Actions,
        subjects: Subjects,
        condition: Option<Condition>,
    ) -> Result<Self> {
        if actions.is_empty() {
            return Err(AuthzError::InvalidRule(
                "rule must name at least one action or use Actions::All".to_string(),
            ));
        }

        if subjects.is_empty() {
            return Err(AuthzError::InvalidRule(
                "rule must name at least one subject or use Subjects::All".to_string(),
            ));
        }

        Ok(Self {
            behavior,
            actions,
            subjects,
            condition,
        })
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn subjects(&self) -> &Subjects {
        &self.subjects
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Check the action and subject type, ignoring the condition
    pub fn matches(&self, action: &Action, subject_type: Option<&ResourceType>) -> bool {
        self.actions.contains(action) && self.subjects.contains(subject_type)
    }

    /// Check the condition against the target
    ///
    /// Conditioned rules never apply to a bare type or the wildcard target.
    pub fn applies_to(&self, target: Target<'_>) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };

        match target.instance() {
            Some(instance) => condition.evaluate(instance),
            None => false,
        }
    }
}
