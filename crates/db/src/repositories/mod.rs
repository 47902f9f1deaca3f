//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument and return raw `sqlx` results. Mapping to
//! domain errors happens in [`crate::store`].

pub mod group_repo;
pub mod page_repo;
pub mod section_repo;
pub mod user_repo;

pub use group_repo::GroupRepo;
pub use page_repo::{CommitResult, PageRepo};
pub use section_repo::SectionRepo;
pub use user_repo::UserRepo;
