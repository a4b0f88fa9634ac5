//! Ordered rule declarations and resolution

use super::aliases::ActionAliases;
use super::decision::Decision;
use crate::error::Result;
use crate::rule::{Actions, Behavior, Condition, Rule, Subjects};
use crate::types::{Action, Instance, Target};
use serde_json::Value;

/// Ordered, append-only set of rules with its alias table
///
/// Later declarations take precedence over earlier ones: resolution scans
/// from the most recent rule backwards and stops at the first rule that
/// matches and applies. With no match the answer is deny.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    aliases: ActionAliases,
}

impl RuleSet {
    /// Empty rule set with the default aliases
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: ActionAliases) -> Self {
        Self {
            rules: Vec::new(),
            aliases,
        }
    }

    /// Append a rule
    pub fn declare(
        &mut self,
        behavior: impl Into<Behavior>,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        condition: Option<Condition>,
    ) -> Result<&mut Self> {
        let rule = Rule::new(behavior.into(), actions.into(), subjects.into(), condition)?;
        self.rules.push(rule);
        Ok(self)
    }

    pub fn allow(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
    ) -> Result<&mut Self> {
        self.declare(Behavior::Allow, actions, subjects, None)
    }

    pub fn deny(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
    ) -> Result<&mut Self> {
        self.declare(Behavior::Deny, actions, subjects, None)
    }

    /// Allow for instances accepted by `predicate`
    pub fn allow_if<F>(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        predicate: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.declare(
            Behavior::Allow,
            actions,
            subjects,
            Some(Condition::predicate(predicate)),
        )
    }

    /// Deny for instances accepted by `predicate`
    pub fn deny_if<F>(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        predicate: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.declare(
            Behavior::Deny,
            actions,
            subjects,
            Some(Condition::predicate(predicate)),
        )
    }

    /// Allow for instances whose attributes equal `attributes`
    pub fn allow_where<I, K, V>(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        attributes: I,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.declare(
            Behavior::Allow,
            actions,
            subjects,
            Some(Condition::attributes(attributes)),
        )
    }

    /// Deny for instances whose attributes equal `attributes`
    pub fn deny_where<I, K, V>(
        &mut self,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        attributes: I,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.declare(
            Behavior::Deny,
            actions,
            subjects,
            Some(Condition::attributes(attributes)),
        )
    }

    /// Make `to` stand for each of `actions`
    pub fn alias<I, T>(&mut self, actions: I, to: impl Into<Action>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Action>,
    {
        self.aliases.alias(actions, to)?;
        Ok(self)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn aliases(&self) -> &ActionAliases {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve `action` on `target`
    pub fn decide(&self, action: &Action, target: Target<'_>) -> Decision {
        let candidates = self.aliases.candidates(action);
        let subject_type = target.subject_type();

        self.rules
            .iter()
            .enumerate()
            .rev()
            .find(|(_, rule)| {
                candidates
                    .iter()
                    .any(|candidate| rule.matches(candidate, subject_type))
                    && rule.applies_to(target)
            })
            .map(|(index, rule)| Decision::matched(index, rule.behavior()))
            .unwrap_or_else(Decision::default_deny)
    }

    pub fn permitted(&self, action: &Action, target: Target<'_>) -> bool {
        self.decide(action, target).allowed
    }
}
