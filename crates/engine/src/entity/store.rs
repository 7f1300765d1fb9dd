//! Entity storage
//!
//! Entities live in a slab owned by the session. Parent links, callers and
//! the instance cache hold ids rather than handles. A node stays alive while
//! an [`Entity`] handle points at it or while it can be reached from such a
//! node or from a registered application, following parent, caller and
//! instance-cache links. [`EntityStore::sweep`] frees everything else.

use slab::Slab;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use sightline_common::Region;

use crate::baseline::BaselineSet;
use crate::click::ClickStrategy;
use crate::entity::class::{ClassRef, Resolvable, ResultTarget};
use crate::entity::Entity;

/// Identifier of an entity within its session; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    key: usize,
    serial: u64,
}

/// Resolution status; a region exists exactly while valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    Invalid,
    Valid(Region),
}

impl Binding {
    pub fn region(&self) -> Option<Region> {
        match self {
            Binding::Invalid => None,
            Binding::Valid(region) => Some(*region),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Binding::Valid(_))
    }
}

/// Clickable capability state
#[derive(Debug, Clone)]
pub(crate) struct Clickable {
    pub strategy: ClickStrategy,
    pub invalidate_on_click: bool,
    pub post_state: Option<String>,
}

pub(crate) struct EntityNode {
    pub name: String,
    pub class_name: String,
    pub class: ClassRef,
    pub sub_entity: bool,
    pub family: bool,
    pub status_cascade: bool,
    pub timeout: Duration,
    pub parent: Option<EntityId>,
    pub caller: Option<EntityId>,
    pub parent_region: Option<Region>,
    pub binding: Binding,
    pub instances: HashMap<String, EntityId>,
    pub baselines: Option<BaselineSet>,
    pub last_series: Option<usize>,
    pub result: ResultTarget,
    pub result_parent: Option<Resolvable<Entity>>,
    pub clickable: Option<Clickable>,
}

struct Slot {
    serial: u64,
    /// Cloned into every handle; a count above one means the node is held
    anchor: Arc<()>,
    node: EntityNode,
}

#[derive(Default)]
pub(crate) struct EntityStore {
    nodes: Slab<Slot>,
    serial: u64,
}

impl EntityStore {
    /// Store a node, returning its id and the anchor for its first handle
    pub fn insert(&mut self, node: EntityNode) -> (EntityId, Arc<()>) {
        self.serial += 1;
        let anchor = Arc::new(());
        let key = self.nodes.insert(Slot {
            serial: self.serial,
            anchor: anchor.clone(),
            node,
        });
        (
            EntityId {
                key,
                serial: self.serial,
            },
            anchor,
        )
    }

    // a live handle or a link from a live node keeps every reachable id in the slab
    pub fn get(&self, id: EntityId) -> &EntityNode {
        let slot = &self.nodes[id.key];
        debug_assert_eq!(slot.serial, id.serial);
        &slot.node
    }

    pub fn get_mut(&mut self, id: EntityId) -> &mut EntityNode {
        let slot = &mut self.nodes[id.key];
        debug_assert_eq!(slot.serial, id.serial);
        &mut slot.node
    }

    pub fn anchor(&self, id: EntityId) -> Arc<()> {
        self.nodes[id.key].anchor.clone()
    }

    /// Ids from `id` up to the root
    pub fn ancestry(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = vec![id];
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).parent;
        }
        chain
    }

    /// Empty the instance caches of `root` and every cached descendant
    pub fn release_caches(&mut self, root: EntityId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            stack.extend(self.get_mut(id).instances.drain().map(|(_, child)| child));
        }
    }

    /// Remove every node that neither a handle nor `roots` can reach.
    ///
    /// The removed nodes are returned so the caller can drop them outside
    /// the lock; handles they own may free more nodes on the next sweep.
    pub fn sweep(&mut self, roots: &[EntityId]) -> Vec<EntityNode> {
        let mut stack: Vec<EntityId> = roots
            .iter()
            .copied()
            .filter(|id| self.nodes.contains(id.key))
            .collect();
        stack.extend(
            self.nodes
                .iter()
                .filter(|(_, slot)| Arc::strong_count(&slot.anchor) > 1)
                .map(|(key, slot)| EntityId {
                    key,
                    serial: slot.serial,
                }),
        );

        let mut reachable = HashSet::new();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id.key) {
                continue;
            }
            let node = self.get(id);
            stack.extend(node.parent);
            stack.extend(node.caller);
            stack.extend(node.instances.values().copied());
        }

        let dead: Vec<usize> = self
            .nodes
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !reachable.contains(key))
            .collect();
        dead.into_iter()
            .map(|key| self.nodes.remove(key).node)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
