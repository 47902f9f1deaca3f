use std::collections::BTreeSet;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identity reference of a user (e.g. `"u1"`).
pub type UserId = String;

/// Group names are the unit of permission grant.
pub type GroupId = String;

pub type SectionId = String;

/// Stable handle of a pending revision, assigned at enqueue time (UUID v7).
pub type PendingId = uuid::Uuid;

/// Published revision number. Starts at 1 per page.
pub type Version = i32;

/// A user's resolved group memberships.
pub type GroupSet = BTreeSet<GroupId>;
