//! Entity class declarations
//!
//! A class is declared once through [`EntityClass::builder`] and shared as
//! a [`ClassRef`]. Its member list is the registry the searcher and
//! [`crate::Entity::get`] consult to materialize children.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sightline_common::Region;

use crate::click::ClickStrategy;
use crate::entity::Entity;
use crate::error::Result;

pub type ClassRef = Arc<EntityClass>;

/// Behaviour composed onto entities of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Plain,
    /// Click, hover, drag and post-click state checks
    Clickable,
    /// Typing into a field
    TextInput,
    /// Reading text through the backend
    TextOutput,
    /// Waiting for a progress indicator to settle
    Progress,
    /// Scrolling via up/down buttons and a drag bar
    Scroll,
    /// Drawing strokes with the pointer
    Canvas,
}

pub struct EntityClass {
    name: String,
    base: String,
    capability: Capability,
    status_cascade: bool,
    family: bool,
    timeout: Option<Duration>,
    members: Vec<(String, EntityDef)>,
}

impl EntityClass {
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder {
            class: EntityClass {
                name: name.to_string(),
                base: "Entity".to_string(),
                capability: Capability::Plain,
                status_cascade: false,
                family: false,
                timeout: None,
                members: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class this one extends
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn status_cascade(&self) -> bool {
        self.status_cascade
    }

    pub fn family(&self) -> bool {
        self.family
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Declared members as `(attribute, definition)` pairs
    pub fn members(&self) -> &[(String, EntityDef)] {
        &self.members
    }

    /// Definition declared under `attribute`
    pub fn def(&self, attribute: &str) -> Option<&EntityDef> {
        self.members
            .iter()
            .find(|(attr, _)| attr == attribute)
            .map(|(_, def)| def)
    }

    pub fn declares(&self, def: &EntityDef) -> bool {
        self.members.iter().any(|(_, d)| d == def)
    }

    /// Declared definition equal to `def`, carrying the declared arguments
    pub(crate) fn declared(&self, def: &EntityDef) -> Option<&EntityDef> {
        self.members.iter().map(|(_, d)| d).find(|d| *d == def)
    }
}

impl PartialEq for EntityClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClass")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("capability", &self.capability)
            .field("members", &self.members.len())
            .finish()
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub struct ClassBuilder {
    class: EntityClass,
}

impl ClassBuilder {
    /// Inherit flags and capability from `parent`; members are not inherited
    pub fn extends(mut self, parent: &EntityClass) -> Self {
        self.class.base = parent.name.clone();
        self.class.capability = parent.capability;
        self.class.status_cascade = parent.status_cascade;
        self.class.family = parent.family;
        self.class.timeout = parent.timeout;
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.class.capability = capability;
        self
    }

    pub fn status_cascade(mut self, cascade: bool) -> Self {
        self.class.status_cascade = cascade;
        self
    }

    pub fn family(mut self, family: bool) -> Self {
        self.class.family = family;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.class.timeout = Some(timeout);
        self
    }

    /// Declare a member under `attribute`
    pub fn member(mut self, attribute: &str, def: EntityDef) -> Self {
        self.class.members.push((attribute.to_string(), def));
        self
    }

    pub fn build(self) -> ClassRef {
        Arc::new(self.class)
    }
}

/// Factory evaluated on demand with an anchor entity (usually a parent)
pub type Factory<T> = Arc<dyn Fn(Option<&Entity>) -> Result<T> + Send + Sync>;

/// A value known now or produced later
#[derive(Clone)]
pub enum Resolvable<T> {
    Immediate(T),
    Deferred(Factory<T>),
}

impl<T: Clone> Resolvable<T> {
    pub fn deferred<F>(factory: F) -> Self
    where
        F: Fn(Option<&Entity>) -> Result<T> + Send + Sync + 'static,
    {
        Resolvable::Deferred(Arc::new(factory))
    }

    pub fn resolve(&self, anchor: Option<&Entity>) -> Result<T> {
        match self {
            Resolvable::Immediate(value) => Ok(value.clone()),
            Resolvable::Deferred(factory) => factory(anchor),
        }
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Resolvable::Immediate(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Resolvable::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What an interaction yields
#[derive(Debug, Clone, Default)]
pub enum ResultTarget {
    /// The entity's parent
    #[default]
    Parent,
    /// A fresh entity of this class under the result parent
    Class(Resolvable<ClassRef>),
    /// A ready-made entity
    Entity(Resolvable<Entity>),
    /// One of several possible entities, chosen later by key
    Choices(Vec<ResultChoice>),
}

/// One possible outcome of an interaction
#[derive(Debug, Clone)]
pub struct ResultChoice {
    pub class: Resolvable<ClassRef>,
    /// Parent for the outcome; the proxy's parent when `None`
    pub parent: Option<Resolvable<Entity>>,
}

impl ResultChoice {
    pub fn new(class: &ClassRef) -> Self {
        Self {
            class: Resolvable::Immediate(class.clone()),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<Resolvable<Entity>>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Optional per-definition settings
#[derive(Debug, Clone, Default)]
pub struct EntityArgs {
    pub timeout: Option<Duration>,
    pub status_cascade: Option<bool>,
    /// Search scope used instead of the parent's region
    pub parent_region: Option<Region>,
    pub result: Option<ResultTarget>,
    pub result_parent: Option<Resolvable<Entity>>,
    pub invalidate_on_click: bool,
    pub click_strategy: Option<ClickStrategy>,
    /// State the entity must show after a click
    pub post_state: Option<String>,
}

impl EntityArgs {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn status_cascade(mut self, cascade: bool) -> Self {
        self.status_cascade = Some(cascade);
        self
    }

    pub fn parent_region(mut self, region: Region) -> Self {
        self.parent_region = Some(region);
        self
    }

    pub fn result(mut self, result: ResultTarget) -> Self {
        self.result = Some(result);
        self
    }

    pub fn result_class(self, class: &ClassRef) -> Self {
        self.result(ResultTarget::Class(Resolvable::Immediate(class.clone())))
    }

    pub fn result_parent(mut self, parent: impl Into<Resolvable<Entity>>) -> Self {
        self.result_parent = Some(parent.into());
        self
    }

    pub fn invalidate_on_click(mut self, invalidate: bool) -> Self {
        self.invalidate_on_click = invalidate;
        self
    }

    pub fn click_strategy(mut self, strategy: ClickStrategy) -> Self {
        self.click_strategy = Some(strategy);
        self
    }

    pub fn post_state(mut self, state: &str) -> Self {
        self.post_state = Some(state.to_string());
        self
    }
}

/// A declared member: an optional lookup name, its class and settings.
///
/// Definitions compare by lookup name and class name; settings do not take
/// part in equality.
#[derive(Clone)]
pub struct EntityDef {
    lookup: Option<String>,
    class: ClassRef,
    args: EntityArgs,
}

impl EntityDef {
    /// A named sub-entity such as a button inside a dialog
    pub fn sub(lookup: &str, class: &ClassRef) -> Self {
        Self {
            lookup: Some(lookup.to_string()),
            class: class.clone(),
            args: EntityArgs::default(),
        }
    }

    /// A window-like member named after its class
    pub fn class(class: &ClassRef) -> Self {
        Self {
            lookup: None,
            class: class.clone(),
            args: EntityArgs::default(),
        }
    }

    pub fn with_args(mut self, args: EntityArgs) -> Self {
        self.args = args;
        self
    }

    pub fn lookup(&self) -> Option<&str> {
        self.lookup.as_deref()
    }

    pub fn entity_class(&self) -> &ClassRef {
        &self.class
    }

    pub fn args(&self) -> &EntityArgs {
        &self.args
    }

    /// Name used for instance caching and word search
    pub fn key(&self) -> &str {
        self.lookup.as_deref().unwrap_or(self.class.name())
    }
}

impl PartialEq for EntityDef {
    fn eq(&self, other: &Self) -> bool {
        self.lookup == other.lookup && self.class.name() == other.class.name()
    }
}

impl fmt::Display for EntityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lookup {
            Some(lookup) => write!(f, "[{}, {}]", lookup, self.class.name()),
            None => write!(f, "[{}]", self.class.name()),
        }
    }
}

impl fmt::Debug for EntityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
