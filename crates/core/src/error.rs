use std::fmt;

use crate::types::SectionId;

/// Why a permission check refused the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Caller shares no group with the section's read groups.
    NotReader,
    /// Caller shares no group with the section's write groups.
    NotWriter,
    /// Caller shares no group with the destination section's approver groups.
    NotApprover,
    /// Caller authored the pending revision it tried to approve.
    SelfApproval,
    /// Caller cannot write to the section the page would be moved out of.
    CrossSectionMove,
    /// Operation requires the `admin` group.
    NotAdmin,
}

impl ForbiddenReason {
    /// Machine-readable code used by the HTTP layer.
    pub fn code(self) -> &'static str {
        match self {
            ForbiddenReason::NotReader => "not_reader",
            ForbiddenReason::NotWriter => "not_writer",
            ForbiddenReason::NotApprover => "not_approver",
            ForbiddenReason::SelfApproval => "self_approval",
            ForbiddenReason::CrossSectionMove => "cross_section_move_denied",
            ForbiddenReason::NotAdmin => "not_admin",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ForbiddenReason::NotReader => "read access to this section is required",
            ForbiddenReason::NotWriter => "write access to this section is required",
            ForbiddenReason::NotApprover => "approver rights on the destination section are required",
            ForbiddenReason::SelfApproval => "a revision cannot be approved by its own author",
            ForbiddenReason::CrossSectionMove => {
                "write access to the page's current section is required to move it"
            }
            ForbiddenReason::NotAdmin => "admin group required",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenReason),

    #[error("Invalid section: {0}")]
    InvalidSection(SectionId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}
