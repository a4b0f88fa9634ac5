//! Rule resolution tests
//!
//! Precedence, wildcards, conditions and aliases as seen through the
//! public `Ability` API.

use cretoai_ability::{
    Ability, Action, ActionAliases, Actions, AuthorizeOptions, AuthzError, Behavior, Condition,
    DecisionReason, Instance, OwnedTarget, ResourceType, Result, RuleSet, Subjects, Target,
};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct Member {
    id: u64,
    admin: bool,
}

fn article() -> ResourceType {
    ResourceType::new("article")
}

fn article_with(status: &str, owner_id: u64) -> Instance {
    Instance::new("article", 1)
        .with_attribute("status", status)
        .with_attribute("owner_id", owner_id)
}

// ============================================================================
// DEFAULT DENY AND WILDCARDS
// ============================================================================

#[test]
fn test_empty_rules_deny_everything() {
    let ability = Ability::new(Member { id: 1, admin: false });

    assert!(ability.forbidden(&Action::read(), &article()));
    assert!(ability.forbidden(&Action::manage(), Target::All));
    assert!(ability.forbidden(&Action::create(), &article_with("draft", 1)));

    let decision = ability.decide(&Action::read(), &article());
    assert_eq!(decision.reason, DecisionReason::DefaultDeny);
}

#[test]
fn test_wildcard_grant_allows_anything() {
    let mut ability = Ability::new(Member { id: 1, admin: true });
    ability
        .declare(true, Actions::All, Subjects::All, None)
        .unwrap();

    assert!(ability.permitted(&Action::new("publish"), &ResourceType::new("comment")));
    assert!(ability.permitted(&Action::destroy(), &article_with("draft", 9)));
    assert!(ability.permitted(&Action::new("archive"), Target::All));
}

#[test]
fn test_manage_covers_every_action_on_its_subject() {
    let mut rules = RuleSet::new();
    rules.allow("manage", "article").unwrap();
    let ability = Ability::with_rules((), rules);

    for action in ["read", "list", "create", "update", "destroy", "publish"] {
        assert!(ability.permitted(&Action::new(action), &article()), "{}", action);
    }
    assert!(ability.forbidden(&Action::read(), &ResourceType::new("comment")));
}

#[test]
fn test_wildcard_target_needs_wildcard_subject() {
    let mut rules = RuleSet::new();
    rules.allow("read", "article").unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.forbidden(&Action::read(), Target::All));

    let mut rules = RuleSet::new();
    rules.allow("read", Subjects::All).unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.permitted(&Action::read(), Target::All));
}

// ============================================================================
// PRECEDENCE
// ============================================================================

#[test]
fn test_recent_deny_overrides_broad_allow() {
    let mut ability = Ability::new(());
    ability
        .declare(true, "manage", Subjects::All, None)
        .unwrap()
        .declare(false, "create", "article", None)
        .unwrap();

    assert!(ability.forbidden(&Action::create(), &article()));
    assert!(ability.permitted(&Action::new("edit"), &article()));
    assert!(ability.permitted(&Action::create(), &ResourceType::new("comment")));

    let decision = ability.decide(&Action::create(), &article());
    assert_eq!(
        decision.reason,
        DecisionReason::RuleMatch {
            index: 1,
            behavior: Behavior::Deny
        }
    );
}

#[test]
fn test_later_broad_deny_shadows_earlier_narrow_allow() {
    let mut rules = RuleSet::new();
    rules
        .allow_where("read", "article", [("owner_id", 1)])
        .unwrap()
        .deny("read", Subjects::All)
        .unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.forbidden(&Action::read(), &article_with("published", 1)));
}

#[test]
fn test_end_to_end_admin_scenario() {
    fn define(member: &Member, rules: &mut RuleSet) -> Result<()> {
        if member.admin {
            rules.allow("edit", Subjects::All)?;
        }
        rules
            .allow("read", Subjects::All)?
            .allow("read", "article")?
            .deny("create", "article")?;
        Ok(())
    }

    let admin = Ability::build(Member { id: 1, admin: true }, &define).unwrap();
    let member = Ability::build(Member { id: 2, admin: false }, &define).unwrap();

    assert!(admin.permitted(&Action::new("edit"), Target::All));
    assert!(member.forbidden(&Action::new("edit"), Target::All));

    for ability in [&admin, &member] {
        assert!(ability.forbidden(&Action::create(), &article()));
        assert!(ability.permitted(&Action::read(), &article()));
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[test]
fn test_conditioned_rule_requires_instance() {
    let mut rules = RuleSet::new();
    rules
        .allow_where("read", "article", [("status", "published")])
        .unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.forbidden(&Action::read(), &article()));
    assert!(ability.permitted(&Action::read(), &article_with("published", 1)));
    assert!(ability.forbidden(&Action::read(), &article_with("draft", 1)));
}

#[test]
fn test_attribute_equality_is_exact() {
    let mut rules = RuleSet::new();
    rules.allow_where("update", "article", [("owner_id", 5)]).unwrap();
    let ability = Ability::with_rules((), rules);

    let owned = Instance::new("article", 1).with_attribute("owner_id", 5);
    let as_string = Instance::new("article", 2).with_attribute("owner_id", "5");
    let as_float = Instance::new("article", 3).with_attribute("owner_id", json!(5.0));
    let missing = Instance::new("article", 4);

    assert!(ability.permitted(&Action::update(), &owned));
    assert!(ability.forbidden(&Action::update(), &as_string));
    assert!(ability.forbidden(&Action::update(), &as_float));
    assert!(ability.forbidden(&Action::update(), &missing));
}

#[test]
fn test_predicate_sees_actor_through_closure() {
    fn define(member: &Member, rules: &mut RuleSet) -> Result<()> {
        let id = member.id;
        rules.allow_if("destroy", "article", move |article: &Instance| {
            article.attribute("owner_id") == Some(&json!(id))
        })?;
        Ok(())
    }

    let ability = Ability::build(Member { id: 3, admin: false }, &define).unwrap();

    assert!(ability.permitted(&Action::destroy(), &article_with("draft", 3)));
    assert!(ability.forbidden(&Action::destroy(), &article_with("draft", 4)));
}

#[test]
fn test_conditioned_deny_only_hits_matching_instances() {
    let mut rules = RuleSet::new();
    rules
        .allow("read", "article")
        .unwrap()
        .deny_if("read", "article", |article: &Instance| {
            article.attribute("status") == Some(&json!("draft"))
        })
        .unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.permitted(&Action::read(), &article()));
    assert!(ability.permitted(&Action::read(), &article_with("published", 1)));
    assert!(ability.forbidden(&Action::read(), &article_with("draft", 1)));
}

#[test]
fn test_condition_on_id_attribute() {
    let mut ability = Ability::new(());
    ability
        .declare(
            Behavior::Allow,
            "read",
            "article",
            Some(Condition::attributes([("id", 7)])),
        )
        .unwrap();

    assert!(ability.permitted(&Action::read(), &Instance::new("article", 7)));
    assert!(ability.forbidden(&Action::read(), &Instance::new("article", 8)));
}

// ============================================================================
// ALIASES
// ============================================================================

#[test]
fn test_default_aliases() {
    let mut rules = RuleSet::new();
    rules.allow("read", "article").unwrap().allow("update", "article").unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.permitted(&Action::new("show"), &article()));
    assert!(ability.permitted(&Action::new("index"), &article()));
    assert!(ability.permitted(&Action::new("edit"), &article()));
    assert!(ability.forbidden(&Action::list(), &article()));
    assert!(ability.forbidden(&Action::new("new"), &article()));
}

#[test]
fn test_custom_alias_chain() {
    let mut rules = RuleSet::with_aliases(ActionAliases::empty());
    rules
        .alias(["publish", "unpublish"], "moderate")
        .unwrap()
        .alias(["moderate"], "curate")
        .unwrap()
        .allow("curate", "article")
        .unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability.permitted(&Action::new("publish"), &article()));
    assert!(ability.permitted(&Action::new("moderate"), &article()));
    assert!(ability.forbidden(&Action::new("show"), &article()));
}

#[test]
fn test_invalid_alias_rejected() {
    let mut rules = RuleSet::new();

    assert!(matches!(
        rules.alias(["read"], "manage"),
        Err(AuthzError::InvalidRule(_))
    ));
    assert!(matches!(
        rules.alias(["read"], "read"),
        Err(AuthzError::InvalidRule(_))
    ));
    assert!(matches!(
        rules.alias(["read"], "show"),
        Err(AuthzError::InvalidRule(_))
    ));
}

// ============================================================================
// AUTHORIZE
// ============================================================================

#[test]
fn test_authorize_carries_failure_details() {
    let ability = Ability::new(());
    let options = AuthorizeOptions::new()
        .redirect_to("/login")
        .with("flash", "Please sign in");

    let err = ability
        .authorize(&Action::update(), &article_with("draft", 1), options.clone())
        .unwrap_err();

    let failure = err.as_failure().unwrap();
    assert_eq!(failure.action, Action::update());
    assert!(matches!(failure.target, OwnedTarget::Instance(_)));
    assert_eq!(failure.options, options);
    assert_eq!(failure.redirect_to(), Some("/login"));
    assert_eq!(err.to_string(), "not authorized to update article 1");
}

#[test]
fn test_authorize_ok_when_permitted() {
    let mut rules = RuleSet::new();
    rules.allow("read", "article").unwrap();
    let ability = Ability::with_rules((), rules);

    assert!(ability
        .authorize(&Action::read(), &article(), AuthorizeOptions::default())
        .is_ok());
}

#[test]
fn test_accessible_filters_collection() {
    let mut rules = RuleSet::new();
    rules
        .allow_where("list", "article", [("status", "published")])
        .unwrap();
    let ability = Ability::with_rules((), rules);

    let articles = vec![
        article_with("published", 1),
        article_with("draft", 1),
        article_with("published", 2),
    ];

    let visible = ability.accessible(&Action::list(), articles);
    assert_eq!(visible.len(), 2);
    assert!(visible
        .iter()
        .all(|a| a.attribute("status") == Some(&json!("published"))));
}

#[test]
fn test_empty_rule_sets_rejected() {
    let mut rules = RuleSet::new();
    let no_actions: Vec<Action> = Vec::new();

    assert!(matches!(
        rules.allow(no_actions, "article"),
        Err(AuthzError::InvalidRule(_))
    ));
    assert!(rules.is_empty());
}

// ============================================================================
// PROPERTY-BASED TESTS (PROPTEST)
// ============================================================================

proptest! {
    #[test]
    fn test_default_deny_for_any_query(
        action in "[a-z]{1,12}",
        subject in "[a-z]{1,12}",
        id in 0u64..10_000
    ) {
        let ability = Ability::new(());
        let instance = Instance::new(subject.as_str(), id);

        prop_assert!(ability.forbidden(&Action::new(action.clone()), &ResourceType::new(subject.clone())));
        prop_assert!(ability.forbidden(&Action::new(action.clone()), &instance));
        prop_assert!(ability.forbidden(&Action::new(action), Target::All));
    }

    #[test]
    fn test_wildcard_grant_for_any_query(
        action in "[a-z]{1,12}",
        subject in "[a-z]{1,12}"
    ) {
        let mut rules = RuleSet::new();
        rules.allow(Actions::All, Subjects::All).unwrap();
        let ability = Ability::with_rules((), rules);

        prop_assert!(ability.permitted(&Action::new(action), &ResourceType::new(subject)));
    }

    #[test]
    fn test_queries_are_idempotent(
        owner in 0u64..4,
        status in "(draft|published)",
        action in "(read|list|update|destroy|show)"
    ) {
        let mut rules = RuleSet::new();
        rules
            .allow("read", "article")
            .unwrap()
            .deny_where("read", "article", [("status", "draft")])
            .unwrap()
            .allow_where(["update", "destroy"], "article", [("owner_id", 1)])
            .unwrap();
        let ability = Ability::with_rules((), rules);
        let instance = article_with(&status, owner);
        let action = Action::new(action);

        let first = ability.decide(&action, &instance);
        for _ in 0..3 {
            prop_assert_eq!(ability.decide(&action, &instance), first);
        }
    }
}
