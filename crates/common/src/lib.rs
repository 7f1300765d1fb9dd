//! Sightline Common Library
//!
//! Geometry value types and the screen backend contract shared by the
//! resolution engine and its tooling. Pixel matching, capture and input
//! injection live behind [`Screen`]; this crate only describes them.

pub mod backend;
pub mod error;
pub mod memory;
pub mod types;

// Re-export commonly used types
pub use backend::Screen;
pub use error::{BackendError, BackendResult, GeometryError};
pub use memory::{InputEvent, Lookup, MemoryScreen};
pub use types::*;

/// Sightline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
