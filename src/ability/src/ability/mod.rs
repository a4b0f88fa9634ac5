//! Per-actor ability
//!
//! An [`Ability`] pairs an actor with the rules an ability definition
//! declared for it. It is built fresh for every actor (typically once per
//! request) and answers `permitted` / `forbidden` / `authorize` queries.
//!
//! ```text
//! AbilityDefinition(actor) → RuleSet → permitted(action, target)
//!                                         ↓ (reverse scan, first match wins)
//!                                      Decision → authorize → AuthorizationFailure
//! ```

pub mod aliases;
pub mod decision;
pub mod rule_set;

pub use aliases::ActionAliases;
pub use decision::{Decision, DecisionReason};
pub use rule_set::RuleSet;

use crate::error::{AuthzError, Result};
use crate::rule::{Actions, Behavior, Condition, Subjects};
use crate::types::{Action, AuthorizeOptions, Instance, Target};

/// Declares the rules of one actor
///
/// Replayed once per [`Ability`] construction. Implemented for closures
/// `Fn(&A, &mut RuleSet) -> Result<()>`.
pub trait AbilityDefinition<A>: Send + Sync {
    fn define(&self, actor: &A, rules: &mut RuleSet) -> Result<()>;
}

impl<A, F> AbilityDefinition<A> for F
where
    F: Fn(&A, &mut RuleSet) -> Result<()> + Send + Sync,
{
    fn define(&self, actor: &A, rules: &mut RuleSet) -> Result<()> {
        self(actor, rules)
    }
}

/// Rules of one actor plus the resolution algorithm
#[derive(Debug, Clone)]
pub struct Ability<A> {
    actor: A,
    rules: RuleSet,
}

impl<A> Ability<A> {
    /// Ability with no rules: every query is denied
    pub fn new(actor: A) -> Self {
        Self::with_rules(actor, RuleSet::new())
    }

    pub fn with_rules(actor: A, rules: RuleSet) -> Self {
        Self { actor, rules }
    }

    /// Build the ability of `actor` by replaying `definition`
    pub fn build<D>(actor: A, definition: &D) -> Result<Self>
    where
        D: AbilityDefinition<A> + ?Sized,
    {
        let mut rules = RuleSet::new();
        definition.define(&actor, &mut rules)?;
        Ok(Self { actor, rules })
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Append a rule after construction; later queries see it
    pub fn declare(
        &mut self,
        behavior: impl Into<Behavior>,
        actions: impl Into<Actions>,
        subjects: impl Into<Subjects>,
        condition: Option<Condition>,
    ) -> Result<&mut Self> {
        self.rules.declare(behavior, actions, subjects, condition)?;
        Ok(self)
    }

    /// Resolve `action` on `target`, reporting the deciding rule
    pub fn decide<'t>(&self, action: &Action, target: impl Into<Target<'t>>) -> Decision {
        self.rules.decide(action, target.into())
    }

    pub fn permitted<'t>(&self, action: &Action, target: impl Into<Target<'t>>) -> bool {
        self.decide(action, target).allowed
    }

    pub fn forbidden<'t>(&self, action: &Action, target: impl Into<Target<'t>>) -> bool {
        !self.permitted(action, target)
    }

    /// Fail with [`AuthzError::Unauthorized`] unless `action` is permitted
    pub fn authorize<'t>(
        &self,
        action: &Action,
        target: impl Into<Target<'t>>,
        options: AuthorizeOptions,
    ) -> Result<()> {
        let target = target.into();
        if self.permitted(action, target) {
            Ok(())
        } else {
            Err(AuthzError::unauthorized(
                action.clone(),
                target.to_owned_target(),
                options,
            ))
        }
    }

    /// Keep the instances `action` is permitted on
    pub fn accessible<I>(&self, action: &Action, instances: I) -> Vec<Instance>
    where
        I: IntoIterator<Item = Instance>,
    {
        instances
            .into_iter()
            .filter(|instance| self.permitted(action, instance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OwnedTarget, ResourceType};

    #[derive(Debug, Clone)]
    struct User {
        id: u64,
        admin: bool,
    }

    fn definition(user: &User, rules: &mut RuleSet) -> Result<()> {
        if user.admin {
            rules.allow(Actions::All, Subjects::All)?;
        }
        let id = user.id;
        rules.allow("read", "article")?;
        rules.allow_where(["update", "destroy"], "article", [("owner_id", id)])?;
        Ok(())
    }

    #[test]
    fn test_build_replays_definition() {
        let ability = Ability::build(User { id: 1, admin: false }, &definition).unwrap();

        assert_eq!(ability.rules().len(), 2);
        assert_eq!(ability.actor().id, 1);
    }

    #[test]
    fn test_owner_condition() {
        let ability = Ability::build(User { id: 1, admin: false }, &definition).unwrap();
        let own = Instance::new("article", 10).with_attribute("owner_id", 1);
        let other = Instance::new("article", 11).with_attribute("owner_id", 2);

        assert!(ability.permitted(&Action::update(), &own));
        assert!(ability.forbidden(&Action::update(), &other));
        assert!(ability.permitted(&Action::read(), &other));
    }

    #[test]
    fn test_authorize_carries_options() {
        let ability = Ability::build(User { id: 1, admin: false }, &definition).unwrap();
        let article = ResourceType::new("article");

        assert!(ability
            .authorize(&Action::read(), &article, AuthorizeOptions::default())
            .is_ok());

        let err = ability
            .authorize(
                &Action::create(),
                &article,
                AuthorizeOptions::new().redirect_to("/login"),
            )
            .unwrap_err();

        let failure = err.as_failure().unwrap();
        assert_eq!(failure.action, Action::create());
        assert_eq!(failure.target, OwnedTarget::Type(article.clone()));
        assert_eq!(failure.redirect_to(), Some("/login"));
    }

    #[test]
    fn test_accessible_filters_instances() {
        let ability = Ability::build(User { id: 1, admin: false }, &definition).unwrap();
        let articles = vec![
            Instance::new("article", 1).with_attribute("owner_id", 1),
            Instance::new("article", 2).with_attribute("owner_id", 2),
            Instance::new("article", 3).with_attribute("owner_id", 1),
        ];

        let editable = ability.accessible(&Action::update(), articles);
        let ids: Vec<String> = editable.iter().map(Instance::id_string).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_declare_after_queries() {
        let mut ability = Ability::new(User { id: 1, admin: false });
        let comment = ResourceType::new("comment");

        assert!(ability.forbidden(&Action::create(), &comment));
        ability.declare(true, "create", "comment", None).unwrap();
        assert!(ability.permitted(&Action::create(), &comment));
    }

    #[test]
    fn test_definition_errors_propagate() {
        let broken = |_: &User, rules: &mut RuleSet| -> Result<()> {
            rules.allow(Actions::only(Vec::<Action>::new()), Subjects::All)?;
            Ok(())
        };

        let err = Ability::build(User { id: 1, admin: true }, &broken).unwrap_err();
        assert!(matches!(err, AuthzError::InvalidRule(_)));
    }
}
