//! Demo blog domain: visitors, seed data and their ability definition

use crate::ability::RuleSet;
use crate::error::Result;
use crate::registry::Resource;
use crate::rule::{Actions, Subjects};
use crate::types::Instance;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Registered user of the demo blog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
}

/// Whoever is making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visitor {
    Guest,
    Member(User),
}

impl Visitor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Visitor::Guest => None,
            Visitor::Member(user) => Some(user),
        }
    }
}

/// Blog article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    #[serde(skip_serializing)]
    pub id: u64,
    pub title: String,
    pub status: String,
    pub owner_id: u64,
}

impl Resource for Article {
    const RESOURCE_TYPE: &'static str = "article";

    fn id(&self) -> Value {
        json!(self.id)
    }
}

/// Rules of the demo blog
///
/// Everyone reads and lists published articles. Members create articles
/// and fully control their own. Admins may do anything.
pub fn blog_ability(visitor: &Visitor, rules: &mut RuleSet) -> Result<()> {
    let article = Article::resource_type();

    rules
        .allow("list", &article)?
        .deny_where("list", &article, [("status", "draft")])?
        .allow_where("read", &article, [("status", "published")])?;

    if let Some(user) = visitor.user() {
        rules
            .allow("create", &article)?
            .allow_where(
                ["list", "read", "update", "destroy"],
                &article,
                [("owner_id", user.id)],
            )?;

        if user.admin {
            rules.allow(Actions::All, Subjects::All)?;
        }
    }

    Ok(())
}

/// Users and resources served by the demo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub resources: Vec<Instance>,
}

impl Fixtures {
    /// Read fixtures from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Built-in data set
    pub fn seed() -> Result<Self> {
        let user = |id: u64, name: &str, admin: bool| User {
            id,
            name: name.to_string(),
            admin,
        };
        let article = |id: u64, title: &str, status: &str, owner_id: u64| Article {
            id,
            title: title.to_string(),
            status: status.to_string(),
            owner_id,
        };

        let resources = [
            article(1, "Ownership in practice", "published", 1),
            article(2, "Lifetimes, unfinished", "draft", 1),
            article(3, "Async traits", "published", 2),
        ]
        .iter()
        .map(Resource::to_instance)
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            users: vec![
                user(1, "alice", false),
                user(2, "bob", false),
                user(3, "root", true),
            ],
            resources,
        })
    }

    /// Integer id following the largest seeded one
    ///
    /// Numeric string ids count too, since the loader keys `"4"` and `4`
    /// alike.
    pub fn next_id(&self) -> u64 {
        self.resources
            .iter()
            .filter_map(|instance| match &instance.id {
                Value::String(id) => id.parse().ok(),
                id => id.as_u64(),
            })
            .max()
            .map_or(1, |max| max + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::types::{Action, ResourceType};

    fn member(id: u64, admin: bool) -> Visitor {
        Visitor::Member(User {
            id,
            name: format!("user-{}", id),
            admin,
        })
    }

    #[test]
    fn test_guest_rules() {
        let ability = Ability::build(Visitor::Guest, &blog_ability).unwrap();
        let seed = Fixtures::seed().unwrap();
        let article = ResourceType::new("article");

        assert!(ability.permitted(&Action::list(), &article));
        assert!(ability.forbidden(&Action::create(), &article));
        assert!(ability.permitted(&Action::read(), &seed.resources[0]));
        assert!(ability.forbidden(&Action::read(), &seed.resources[1]));
        assert!(ability.forbidden(&Action::update(), &seed.resources[0]));
    }

    #[test]
    fn test_owner_sees_own_draft() {
        let ability = Ability::build(member(1, false), &blog_ability).unwrap();
        let seed = Fixtures::seed().unwrap();

        assert!(ability.permitted(&Action::list(), &seed.resources[1]));
        assert!(ability.permitted(&Action::update(), &seed.resources[1]));
        assert!(ability.forbidden(&Action::update(), &seed.resources[2]));

        let other = Ability::build(member(2, false), &blog_ability).unwrap();
        assert!(other.forbidden(&Action::list(), &seed.resources[1]));
    }

    #[test]
    fn test_admin_manages_everything() {
        let ability = Ability::build(member(3, true), &blog_ability).unwrap();
        let seed = Fixtures::seed().unwrap();

        assert!(ability.permitted(&Action::destroy(), &seed.resources[2]));
        assert!(ability.permitted(&Action::new("publish"), &ResourceType::new("comment")));
    }

    #[test]
    fn test_seed_and_next_id() {
        let seed = Fixtures::seed().unwrap();
        assert_eq!(seed.users.len(), 3);
        assert_eq!(seed.next_id(), 4);
        assert_eq!(Fixtures::default().next_id(), 1);
    }

    #[test]
    fn test_next_id_counts_numeric_string_ids() {
        let fixtures = Fixtures {
            users: Vec::new(),
            resources: vec![
                Instance::new("article", "7"),
                Instance::new("article", 2),
                Instance::new("article", "draft-a"),
            ],
        };

        assert_eq!(fixtures.next_id(), 8);
    }

    #[test]
    fn test_seed_articles_are_resources() {
        let seed = Fixtures::seed().unwrap();
        let first = &seed.resources[0];

        assert_eq!(first.resource_type, Article::resource_type());
        assert_eq!(first.id, json!(1));
        assert!(!first.attributes.contains_key("id"));
        assert_eq!(first.attribute("owner_id"), Some(&json!(1)));
    }

    #[test]
    fn test_fixtures_from_json() {
        let json = json!({
            "users": [{ "id": 7, "name": "eve" }],
            "resources": [{ "type": "article", "id": 12, "attributes": { "status": "draft" } }]
        });

        let fixtures: Fixtures = serde_json::from_value(json).unwrap();
        assert!(!fixtures.users[0].admin);
        assert_eq!(fixtures.next_id(), 13);
    }
}
