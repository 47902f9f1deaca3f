//! Input validation for page and directory writes.
//!
//! Shared by the engine and the API layer so both reject the same inputs.

use crate::error::CoreError;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CONTENT_LEN: usize = 100_000;
pub const MAX_SLUG_LEN: usize = 128;
pub const MAX_ID_LEN: usize = 64;

/// Validate a page slug (non-empty, lowercase alphanumeric + hyphens).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::Validation(format!(
            "Slug must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

/// Validate a page title (non-blank, bounded length).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate page content. Empty content is allowed (blanking a page is an edit).
/// The limit is on UTF-8 bytes.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(CoreError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LEN} bytes"
        )));
    }
    Ok(())
}

/// Validate a user, group, or section identifier.
pub fn validate_id(kind: &str, id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::Validation(format!("{kind} id must not be empty")));
    }
    if id.len() > MAX_ID_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} id must be at most {MAX_ID_LEN} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(format!(
            "{kind} id may contain only ASCII letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
