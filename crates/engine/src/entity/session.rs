//! Session context
//!
//! A [`Session`] bundles everything resolution needs: configuration, the
//! screen backend, the baseline locator, the entity arena and the registry
//! of running applications. It is cheap to clone and every [`Entity`]
//! carries one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

use sightline_common::Screen;

use crate::baseline::BaselineLocator;
use crate::config::Config;
use crate::entity::class::{Capability, ClassRef, EntityArgs};
use crate::entity::store::{Binding, Clickable, EntityId, EntityNode, EntityStore};
use crate::entity::Entity;

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: Config,
    screen: Arc<dyn Screen>,
    locator: BaselineLocator,
    store: Mutex<EntityStore>,
    /// One root entity per application class
    applications: Mutex<HashMap<String, EntityId>>,
}

/// Parameters for creating a node
pub(crate) struct Spawn<'a> {
    pub class: &'a ClassRef,
    pub lookup: Option<&'a str>,
    pub args: &'a EntityArgs,
    pub parent: Option<EntityId>,
    pub caller: Option<EntityId>,
}

impl Session {
    pub fn new(config: Config, screen: Arc<dyn Screen>) -> Self {
        let locator = BaselineLocator::from_config(&config.baselines);
        debug!(
            "Session created with {} baseline roots",
            locator.roots().len()
        );
        Self {
            inner: Arc::new(SessionInner {
                config,
                screen,
                locator,
                store: Mutex::new(EntityStore::default()),
                applications: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn screen(&self) -> &dyn Screen {
        self.inner.screen.as_ref()
    }

    pub fn locator(&self) -> &BaselineLocator {
        &self.inner.locator
    }

    /// The single root entity for an application class
    pub fn application(&self, class: &ClassRef) -> Entity {
        let mut apps = self.inner.applications.lock();
        if let Some(id) = apps.get(class.name()) {
            return self.entity(*id);
        }
        let app = self.spawn(Spawn {
            class,
            lookup: None,
            args: &EntityArgs::default(),
            parent: None,
            caller: None,
        });
        apps.insert(class.name().to_string(), app.id());
        info!("Registered application {}", class.name());
        app
    }

    /// Forget an application and its cached children; the next
    /// [`Session::application`] call builds a fresh tree
    pub fn close_application(&self, class: &ClassRef) -> bool {
        let removed = self.inner.applications.lock().remove(class.name());
        let Some(root) = removed else {
            return false;
        };
        self.inner.store.lock().release_caches(root);
        info!("Closed application {}", class.name());
        self.collect_unreachable();
        true
    }

    /// A parentless entity outside any application tree
    pub fn detached(&self, class: &ClassRef) -> Entity {
        self.instantiate(class, None, None)
    }

    /// A class-named entity under `parent`, not cached by the parent
    pub fn instantiate(&self, class: &ClassRef, parent: Option<&Entity>, caller: Option<&Entity>) -> Entity {
        self.collect_unreachable();
        self.spawn(Spawn {
            class,
            lookup: None,
            args: &EntityArgs::default(),
            parent: parent.map(Entity::id),
            caller: caller.map(Entity::id),
        })
    }

    /// Number of entities currently stored, including any not yet collected
    pub fn entity_count(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// Free entities that no handle, application or cached link can reach
    pub(crate) fn collect_unreachable(&self) {
        let roots: Vec<EntityId> = self.inner.applications.lock().values().copied().collect();
        let mut freed = 0;
        loop {
            let dead = self.inner.store.lock().sweep(&roots);
            if dead.is_empty() {
                break;
            }
            freed += dead.len();
        }
        if freed > 0 {
            trace!("Freed {} unreachable entities", freed);
        }
    }

    pub(crate) fn spawn(&self, spawn: Spawn<'_>) -> Entity {
        let Spawn {
            class,
            lookup,
            args,
            parent,
            caller,
        } = spawn;
        let config = &self.inner.config;

        let (name, class_name) = match lookup {
            Some(lookup) => (lookup.to_string(), class.name().to_string()),
            None => (class.name().to_string(), class.base().to_string()),
        };
        let clickable = (class.capability() == Capability::Clickable).then(|| Clickable {
            strategy: args
                .click_strategy
                .unwrap_or(config.input.default_click_strategy),
            invalidate_on_click: args.invalidate_on_click,
            post_state: args.post_state.clone(),
        });

        let node = EntityNode {
            name,
            class_name,
            class: class.clone(),
            sub_entity: lookup.is_some(),
            family: class.family(),
            status_cascade: args.status_cascade.unwrap_or(class.status_cascade()),
            timeout: args
                .timeout
                .or(class.timeout())
                .unwrap_or_else(|| config.timing.entity_timeout()),
            parent,
            caller,
            parent_region: args.parent_region,
            binding: Binding::Invalid,
            instances: HashMap::new(),
            baselines: None,
            last_series: None,
            result: args.result.clone().unwrap_or_default(),
            result_parent: args.result_parent.clone(),
            clickable,
        };

        let (id, anchor) = self.inner.store.lock().insert(node);
        Entity::new(self.clone(), id, anchor)
    }

    pub(crate) fn entity(&self, id: EntityId) -> Entity {
        let anchor = self.inner.store.lock().anchor(id);
        Entity::new(self.clone(), id, anchor)
    }

    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        f(&self.inner.store.lock())
    }

    pub(crate) fn with_node<R>(&self, id: EntityId, f: impl FnOnce(&EntityNode) -> R) -> R {
        f(self.inner.store.lock().get(id))
    }

    pub(crate) fn with_node_mut<R>(&self, id: EntityId, f: impl FnOnce(&mut EntityNode) -> R) -> R {
        f(self.inner.store.lock().get_mut(id))
    }

    pub(crate) fn same(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("roots", &self.inner.locator.roots())
            .field("applications", &self.inner.applications.lock().len())
            .finish()
    }
}
