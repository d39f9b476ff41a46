//! Search engine module
//!
//! Defines the Engine trait, the provider adapters, and the registry that
//! resolves provider identifiers to adapters.

mod loader;
mod registry;
mod traits;

// Engine implementations
pub mod bing;
pub mod duckduckgo;
pub mod google;

pub use loader::EngineLoader;
pub use registry::EngineRegistry;
pub use traits::*;
