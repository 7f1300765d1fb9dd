//! Entity tree
//!
//! An [`Entity`] is a lightweight handle onto a node of the session arena.
//! Nodes start out invalid and are bound to a screen region on demand by
//! [`Entity::validate`]; anything that may have moved the widget drops the
//! binding again through [`Entity::invalidate`].
//!
//! ```text
//! Notebook (application)
//!   └── SaveDialog            get(&EntityDef::class(&SAVE_DIALOG))
//!         ├── ,save           get(&EntityDef::sub("save", &BUTTON))
//!         └── ,fileName       lookup("file name")
//! ```

pub mod class;
mod interact;
mod session;
pub(crate) mod store;

pub use class::{
    Capability, ClassBuilder, ClassRef, EntityArgs, EntityClass, EntityDef, Factory, Resolvable,
    ResultChoice, ResultTarget,
};
pub use interact::ClickOptions;
pub use session::Session;
pub use store::EntityId;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use sightline_common::{Region, Scope};

use crate::baseline::BaselineSet;
use crate::click::ClickStrategy;
use crate::error::{Error, Result};
use crate::finder::Finder;
use crate::naming::{EntityNames, NameChain, NameOptions, Segment};
use crate::proxy::MultiResultProxy;
use crate::searcher::Searcher;
use session::Spawn;
use store::Binding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Invalid,
    Valid,
}

/// What an interaction produced
#[derive(Debug, Clone)]
pub enum Outcome {
    Entity(Entity),
    /// Several windows may follow; pick one by key
    Choices(MultiResultProxy),
}

impl Outcome {
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Outcome::Entity(entity) => Some(entity),
            Outcome::Choices(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Outcome::Entity(entity) => Some(entity),
            Outcome::Choices(_) => None,
        }
    }

    /// Resolve `key` against the outcome: a child of the entity, or one of the choices
    pub fn lookup(&self, key: &str) -> Result<Entity> {
        match self {
            Outcome::Entity(entity) => entity.lookup(key),
            Outcome::Choices(proxy) => proxy.lookup(key),
        }
    }
}

/// Handle onto an entity node; the node lives at least as long as the handle
#[derive(Clone)]
pub struct Entity {
    session: Session,
    id: EntityId,
    _anchor: Arc<()>,
}

impl Entity {
    pub(crate) fn new(session: Session, id: EntityId, anchor: Arc<()>) -> Self {
        Self {
            session,
            id,
            _anchor: anchor,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn name(&self) -> String {
        self.session.with_node(self.id, |n| n.name.clone())
    }

    pub fn class_name(&self) -> String {
        self.session.with_node(self.id, |n| n.class_name.clone())
    }

    pub fn class(&self) -> ClassRef {
        self.session.with_node(self.id, |n| n.class.clone())
    }

    /// Created through an explicit lookup name
    pub fn is_sub_entity(&self) -> bool {
        self.session.with_node(self.id, |n| n.sub_entity)
    }

    pub fn family(&self) -> bool {
        self.session.with_node(self.id, |n| n.family)
    }

    pub fn status_cascade(&self) -> bool {
        self.session.with_node(self.id, |n| n.status_cascade)
    }

    pub fn timeout(&self) -> Duration {
        self.session.with_node(self.id, |n| n.timeout)
    }

    pub fn status(&self) -> Status {
        if self.is_valid() {
            Status::Valid
        } else {
            Status::Invalid
        }
    }

    pub fn is_valid(&self) -> bool {
        self.session.with_node(self.id, |n| n.binding.is_valid())
    }

    /// Current region without triggering a search
    pub fn region(&self) -> Option<Region> {
        self.session.with_node(self.id, |n| n.binding.region())
    }

    pub fn parent(&self) -> Option<Entity> {
        self.session
            .with_node(self.id, |n| n.parent)
            .map(|id| self.session.entity(id))
    }

    /// Entity whose interaction created this one
    pub fn caller(&self) -> Option<Entity> {
        self.session
            .with_node(self.id, |n| n.caller)
            .map(|id| self.session.entity(id))
    }

    /// Topmost ancestor, usually the application
    pub fn root(&self) -> Entity {
        let root = self
            .session
            .with_store(|store| store.ancestry(self.id).last().copied())
            .unwrap_or(self.id);
        self.session.entity(root)
    }

    /// Cached children as `(key, entity)` pairs, sorted by key
    pub fn instances(&self) -> Vec<(String, Entity)> {
        let mut pairs: Vec<(String, EntityId)> = self.session.with_node(self.id, |n| {
            n.instances.iter().map(|(k, id)| (k.clone(), *id)).collect()
        });
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
            .into_iter()
            .map(|(key, id)| (key, self.session.entity(id)))
            .collect()
    }

    /// Baselines discovered by the last stateless search
    pub fn baselines(&self) -> Option<BaselineSet> {
        self.session.with_node(self.id, |n| n.baselines.clone())
    }

    /// Series index that produced the current region
    pub fn last_series(&self) -> Option<usize> {
        self.session.with_node(self.id, |n| n.last_series)
    }

    pub fn name_chain(&self) -> NameChain {
        self.session.with_store(|store| {
            let segments = store
                .ancestry(self.id)
                .into_iter()
                .rev()
                .map(|id| {
                    let node = store.get(id);
                    let segment = if node.sub_entity {
                        Segment::sub(&node.name)
                    } else {
                        Segment::window(&node.name)
                    };
                    segment.family(node.family)
                })
                .collect();
            NameChain::new(segments)
        })
    }

    pub fn canonical_name(&self, options: NameOptions) -> String {
        self.name_chain().canonical(options)
    }

    pub fn full_name(&self) -> String {
        self.canonical_name(NameOptions::default())
    }

    /// Baseline stems derived from the canonical name and class
    pub fn names(&self) -> EntityNames {
        self.name_chain().names(&self.class_name())
    }

    /// Regions of this entity and its ancestors, nearest first
    pub fn lineage(&self) -> Vec<Option<Region>> {
        self.session.with_store(|store| {
            store
                .ancestry(self.id)
                .into_iter()
                .map(|id| store.get(id).binding.region())
                .collect()
        })
    }

    pub fn is_clickable(&self) -> bool {
        self.session.with_node(self.id, |n| n.clickable.is_some())
    }

    pub fn click_strategy(&self) -> Option<ClickStrategy> {
        self.session
            .with_node(self.id, |n| n.clickable.as_ref().map(|c| c.strategy))
    }

    /// Swap the click strategy; ignored on entities that cannot be clicked
    pub fn set_click_strategy(&self, strategy: ClickStrategy) {
        let applied = self.session.with_node_mut(self.id, |n| match n.clickable.as_mut() {
            Some(clickable) => {
                clickable.strategy = strategy;
                true
            }
            None => false,
        });
        if applied {
            debug!("{} now clicks with {:?}", self, strategy);
        } else {
            warn!("{} is not clickable, ignoring {:?}", self, strategy);
        }
    }

    /// Bind the entity to a region within its own timeout
    pub fn validate(&self) -> Result<Region> {
        self.validate_within(self.timeout())
    }

    /// Bind the entity to a region, searching for at most `timeout`.
    ///
    /// A no-op when already valid. Cascading entities validate their
    /// parent first with the parent's own timeout.
    pub fn validate_within(&self, timeout: Duration) -> Result<Region> {
        if let Some(region) = self.region() {
            return Ok(region);
        }

        let (cascade, parent, parent_region) = self
            .session
            .with_node(self.id, |n| (n.status_cascade, n.parent, n.parent_region));
        let parent = parent.map(|id| self.session.entity(id));

        if cascade {
            if let Some(parent) = &parent {
                parent.validate()?;
            }
        }

        let scope = parent_region
            .or_else(|| parent.as_ref().and_then(Entity::region))
            .map(Scope::Region)
            .unwrap_or(Scope::Screen);
        trace!(
            "Validating {} in {} within {}ms",
            self,
            scope,
            timeout.as_millis()
        );

        match Finder::new(self).find(scope, timeout) {
            Ok(region) => {
                self.session
                    .with_node_mut(self.id, |n| n.binding = Binding::Valid(region));
                debug!("{} identified at {}", self, region);
                Ok(region)
            }
            Err(e @ Error::FindExhausted { .. }) => Err(Error::UpdateFailure {
                entity: self.to_string(),
                source: Box::new(e),
            }),
            Err(e) => Err(e),
        }
    }

    /// Drop the region binding and the child cache
    pub fn invalidate(&self) {
        self.invalidate_by(self)
    }

    /// Like [`Entity::invalidate`], recording `trigger` as the cause.
    ///
    /// Cascading entities pass the invalidation on to their parent even
    /// when they were already invalid themselves.
    pub fn invalidate_by(&self, trigger: &Entity) {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let (was_valid, next) = self.session.with_node_mut(id, |n| {
                let was_valid = n.binding.is_valid();
                if was_valid {
                    n.binding = Binding::Invalid;
                    n.instances.clear();
                }
                (was_valid, n.parent.filter(|_| n.status_cascade))
            });
            if was_valid {
                trace!("{} invalidated by {}", self.session.entity(id), trigger);
            }
            current = next;
        }
        self.session.collect_unreachable();
    }

    /// Child for a declared definition, created on first access
    pub fn get(&self, def: &EntityDef) -> Result<Entity> {
        let class = self.class();
        let declared = class.declared(def).ok_or_else(|| Error::NotInContext {
            key: def.key().to_string(),
            entity: self.to_string(),
        })?;

        let key = declared.key().to_string();
        let cached = self
            .session
            .with_node(self.id, |n| n.instances.get(&key).copied());
        if let Some(id) = cached {
            return Ok(self.session.entity(id));
        }

        let child = self.session.spawn(Spawn {
            class: declared.entity_class(),
            lookup: declared.lookup(),
            args: declared.args(),
            parent: Some(self.id),
            caller: None,
        });
        self.session
            .with_node_mut(self.id, |n| n.instances.insert(key, child.id()));
        trace!("{} created", child);
        Ok(child)
    }

    /// Child declared under `attribute` in the class builder
    pub fn member(&self, attribute: &str) -> Result<Entity> {
        let class = self.class();
        let def = class.def(attribute).ok_or_else(|| Error::NotInContext {
            key: attribute.to_string(),
            entity: self.to_string(),
        })?;
        self.get(def)
    }

    /// Child whose name best matches the space separated words of `query`
    pub fn lookup(&self, query: &str) -> Result<Entity> {
        let found = Searcher::for_class(&self.class()).search(query)?;
        self.get(&found.entity)
    }

    /// Outcome of interacting with this entity
    pub fn result(&self) -> Result<Outcome> {
        self.result_with_parent(None)
    }

    /// Outcome of interacting with this entity, created under `parent` when given
    pub fn result_with_parent(&self, parent: Option<&Entity>) -> Result<Outcome> {
        let (target, result_parent, own_parent) = self.session.with_node(self.id, |n| {
            (n.result.clone(), n.result_parent.clone(), n.parent)
        });
        let own_parent = own_parent.map(|id| self.session.entity(id));

        let result_parent = match (parent, result_parent) {
            (Some(parent), _) => Some(parent.clone()),
            (None, Some(deferred)) => Some(deferred.resolve(own_parent.as_ref())?),
            (None, None) => own_parent.clone(),
        };

        match target {
            ResultTarget::Parent => own_parent
                .map(Outcome::Entity)
                .ok_or_else(|| Error::NoParent {
                    entity: self.to_string(),
                }),
            ResultTarget::Class(class) => {
                let class = class.resolve(own_parent.as_ref())?;
                let entity = self
                    .session
                    .instantiate(&class, result_parent.as_ref(), Some(self));
                debug!("{} resulted in {}", self, entity);
                Ok(Outcome::Entity(entity))
            }
            ResultTarget::Entity(entity) => Ok(Outcome::Entity(entity.resolve(own_parent.as_ref())?)),
            ResultTarget::Choices(choices) => Ok(Outcome::Choices(MultiResultProxy::new(
                &self.session,
                result_parent,
                &choices,
                Some(self),
            )?)),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.session.same(&other.session)
    }
}

impl Eq for Entity {}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.full_name(), self.class_name())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({self})")
    }
}
