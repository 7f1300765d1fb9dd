//! Multi-outcome results
//!
//! Clicking "Save" may open a save dialog or an overwrite prompt. A
//! [`MultiResultProxy`] stands for all possible outcomes and creates the
//! one the caller names:
//!
//! ```text
//! proxy.lookup("overwrite yes")
//!   └─ searcher ─▶ OverwritePrompt.yes ─▶ OverwritePrompt under its parent ─▶ ,yes
//! proxy.lookup("save dialog")
//!   └─ searcher ─▶ SaveDialog ─▶ SaveDialog under its parent
//! ```

use std::fmt;
use tracing::debug;

use crate::entity::{ClassRef, Entity, ResultChoice, Session};
use crate::error::Result;
use crate::searcher::{Query, Searcher};

#[derive(Clone)]
pub struct MultiResultProxy {
    session: Session,
    parent: Option<Entity>,
    classes: Vec<ClassRef>,
    caller: Option<Entity>,
    searcher: Searcher,
}

impl MultiResultProxy {
    /// Build a proxy over `choices`; deferred classes are resolved here, once
    pub fn new(
        session: &Session,
        parent: Option<Entity>,
        choices: &[ResultChoice],
        caller: Option<&Entity>,
    ) -> Result<Self> {
        let mut searcher = Searcher::new();
        let mut classes = Vec::with_capacity(choices.len());
        for choice in choices {
            let class = choice.class.resolve(parent.as_ref())?;
            searcher.add_class(&class, choice.parent.clone());
            classes.push(class);
        }

        Ok(Self {
            session: session.clone(),
            parent,
            classes,
            caller: caller.cloned(),
            searcher,
        })
    }

    pub fn parent(&self) -> Option<&Entity> {
        self.parent.as_ref()
    }

    pub fn caller(&self) -> Option<&Entity> {
        self.caller.as_ref()
    }

    /// Classes this proxy can produce, in declaration order
    pub fn classes(&self) -> &[ClassRef] {
        &self.classes
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    /// Create the outcome named by `key`
    pub fn lookup<'q>(&self, key: impl Into<Query<'q>>) -> Result<Entity> {
        let found = self.searcher.search(key)?;

        let parent = match &found.parent {
            Some(custom) => Some(custom.resolve(self.parent.as_ref())?),
            None => self.parent.clone(),
        };

        let entity = match &found.owner {
            Some(owner) => {
                let owner = self
                    .session
                    .instantiate(owner, parent.as_ref(), self.caller.as_ref());
                owner.get(&found.entity)?
            }
            None => self.session.instantiate(
                found.entity.entity_class(),
                parent.as_ref(),
                self.caller.as_ref(),
            ),
        };
        debug!("Result {} chosen from {}", entity, self);
        Ok(entity)
    }
}

impl fmt::Display for MultiResultProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.classes.iter().map(|c| c.name()).collect();
        write!(f, "MultiResultProxy[{}]", names.join(", "))
    }
}

impl fmt::Debug for MultiResultProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiResultProxy")
            .field("parent", &self.parent)
            .field("classes", &self.classes)
            .field("caller", &self.caller)
            .finish()
    }
}
