//! Authorization and revision-lifecycle engine for a section-scoped wiki.
//!
//! Zero internal dependencies: persistence is reached only through the traits
//! in [`store`], so the API layer and any CLI tooling can share the engine.

pub mod admin;
pub mod diff;
pub mod directory;
pub mod error;
pub mod locks;
pub mod page;
pub mod permissions;
pub mod roles;
pub mod section;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod validation;
pub mod workflow;
