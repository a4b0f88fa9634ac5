//! Action aliases
//!
//! An alias stands for a set of actions: a rule declared for `read` also
//! answers queries for `index` and `show`. Aliases nest, and `manage`
//! covers every action without being declared.

use crate::error::{AuthzError, Result};
use crate::types::Action;
use std::collections::{BTreeMap, BTreeSet};

/// Alias table, alias -> actions it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAliases {
    aliases: BTreeMap<Action, BTreeSet<Action>>,
}

impl ActionAliases {
    /// Table with no aliases besides the implicit `manage`
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Make `to` stand for each of `actions`
    pub fn alias<I, T>(&mut self, actions: I, to: impl Into<Action>) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Action>,
    {
        let to = to.into();
        if to.is_manage() {
            return Err(AuthzError::InvalidRule(
                "`manage` already covers every action and cannot be aliased".to_string(),
            ));
        }

        let actions: Vec<Action> = actions.into_iter().map(Into::into).collect();
        for action in &actions {
            if *action == to {
                return Err(AuthzError::InvalidRule(format!(
                    "cannot alias action `{}` to itself",
                    to
                )));
            }

            // `action` already standing for `to` would close a loop
            if self.covered_by(&to).contains(action) {
                return Err(AuthzError::InvalidRule(format!(
                    "aliasing `{}` to `{}` would be circular",
                    action, to
                )));
            }
        }

        self.aliases.entry(to).or_default().extend(actions);
        Ok(())
    }

    /// Actions directly aliased by `alias`
    pub fn get(&self, alias: &Action) -> Option<&BTreeSet<Action>> {
        self.aliases.get(alias)
    }

    /// Every action name whose rules answer a query for `action`
    ///
    /// The action itself, each alias that covers it (transitively), and
    /// `manage`.
    pub fn candidates(&self, action: &Action) -> Vec<Action> {
        let mut found = self.covered_by(action);
        found.insert(action.clone());
        found.insert(Action::manage());
        found.into_iter().collect()
    }

    /// Aliases that cover `action`, directly or through other aliases
    fn covered_by(&self, action: &Action) -> BTreeSet<Action> {
        let mut found = BTreeSet::new();
        let mut frontier = vec![action.clone()];

        while let Some(current) = frontier.pop() {
            for (alias, targets) in &self.aliases {
                if targets.contains(&current) && found.insert(alias.clone()) {
                    frontier.push(alias.clone());
                }
            }
        }

        found
    }
}

impl Default for ActionAliases {
    /// `read` for index/show, `create` for new, `update` for edit
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            Action::read(),
            BTreeSet::from([Action::new("index"), Action::new("show")]),
        );
        aliases.insert(Action::create(), BTreeSet::from([Action::new("new")]));
        aliases.insert(Action::update(), BTreeSet::from([Action::new("edit")]));

        Self { aliases }
    }
}
