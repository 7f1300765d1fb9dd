//! Sightline entity resolution engine
//!
//! This crate lets a test describe a desktop application as a tree of
//! named entities and interact with them without handling coordinates:
//! - Entities resolve lazily to screen regions by matching baseline images
//! - Baselines are discovered by canonical name with class-level fallbacks
//! - Per-image transforms adjust search scope, similarity and click targets
//! - Names are resolved to declared children by word search
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session (config, Screen backend, arena, applications)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Entity                                                     │
//! │    ├── validate() ──▶ Finder                                │
//! │    │                    ├── discover baselines (6 stems ×   │
//! │    │                    │   SINGLE/SEQUENCE/SERIES/…)       │
//! │    │                    └── attempts until timeout          │
//! │    │                          └── Transform per image       │
//! │    │                               PREVIOUS/CURRENT/NEXT/   │
//! │    │                               MATCH/FINAL/ENTITY       │
//! │    ├── invalidate() ──▶ parent when status_cascade          │
//! │    ├── get(def) / lookup("words") ──▶ Searcher              │
//! │    ├── canvas() ──▶ DrawingStrategy strokes                 │
//! │    └── click() ──▶ ClickStrategy ──▶ Outcome                │
//! │                                        ├── Entity           │
//! │                                        └── MultiResultProxy │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod baseline;
pub mod canvas;
pub mod click;
pub mod config;
pub mod entity;
pub mod error;
pub mod finder;
pub mod naming;
pub mod proxy;
pub mod searcher;
pub mod transform;
pub mod widgets;

pub use baseline::{BaselineLocator, BaselineName, BaselineSet, Collection, NameType, StemCandidate};
pub use canvas::{Canvas, DrawingStrategy};
pub use click::ClickStrategy;
pub use config::Config;
pub use entity::{
    Capability, ClassRef, ClickOptions, Entity, EntityArgs, EntityClass, EntityDef, EntityId,
    Outcome, Resolvable, ResultChoice, ResultTarget, Session, Status,
};
pub use error::{Error, Result};
pub use finder::Finder;
pub use naming::{NameChain, NameOptions, Segment};
pub use proxy::MultiResultProxy;
pub use searcher::{Query, SearchResult, Searcher};
pub use transform::{Operator, Transform, TransformContext};
