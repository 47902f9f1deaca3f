//! Well-known group and section names.
//!
//! These must match the built-in seed in [`crate::snapshot::seed`].

pub const GROUP_ADMIN: &str = "admin";
pub const GROUP_EDITOR: &str = "editor";
pub const GROUP_VIEWER: &str = "viewer";

/// Section a brand-new page lands in when the caller names none.
pub const DEFAULT_SECTION: &str = "general";
