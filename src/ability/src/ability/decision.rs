//! Authorization decision types

use crate::rule::Behavior;
use serde::{Deserialize, Serialize};

/// Outcome of resolving one query against a rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the action is permitted
    pub allowed: bool,

    /// Why
    pub reason: DecisionReason,
}

impl Decision {
    /// Decision made by the rule at `index` (declaration order)
    pub fn matched(index: usize, behavior: Behavior) -> Self {
        Self {
            allowed: behavior.is_allow(),
            reason: DecisionReason::RuleMatch { index, behavior },
        }
    }

    /// No rule matched
    pub fn default_deny() -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::DefaultDeny,
        }
    }

    /// Index of the deciding rule, if any
    pub fn rule_index(&self) -> Option<usize> {
        match self.reason {
            DecisionReason::RuleMatch { index, .. } => Some(index),
            DecisionReason::DefaultDeny => None,
        }
    }
}

/// Reason for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// The most recently declared matching rule decided
    RuleMatch { index: usize, behavior: Behavior },

    /// No rule matched, denied by default
    DefaultDeny,
}
