//! Row types for the wiki tables and their conversions to domain types.

pub mod directory;
pub mod page;
pub mod section;
