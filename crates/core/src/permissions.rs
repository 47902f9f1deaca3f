//! Permission evaluator.
//!
//! The predicates here are the only place group sets are intersected.
//! Every operation in [`crate::workflow`] and [`crate::admin`] goes through
//! them (usually via the `ensure_*` wrappers).

use std::collections::BTreeSet;

use crate::error::{CoreError, ForbiddenReason};
use crate::roles::GROUP_ADMIN;
use crate::section::Section;
use crate::types::{GroupId, GroupSet};

fn intersects(groups: &GroupSet, allowed: &BTreeSet<GroupId>) -> bool {
    !groups.is_disjoint(allowed)
}

pub fn can_read(section: &Section, groups: &GroupSet) -> bool {
    intersects(groups, &section.read_groups)
}

pub fn can_write(section: &Section, groups: &GroupSet) -> bool {
    intersects(groups, &section.write_groups)
}

pub fn can_approve(section: &Section, groups: &GroupSet) -> bool {
    intersects(groups, &section.approver_groups)
}

pub fn is_admin(groups: &GroupSet) -> bool {
    groups.contains(GROUP_ADMIN)
}

fn ensure(allowed: bool, reason: ForbiddenReason) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(reason))
    }
}

pub fn ensure_read(section: &Section, groups: &GroupSet) -> Result<(), CoreError> {
    ensure(can_read(section, groups), ForbiddenReason::NotReader)
}

pub fn ensure_write(section: &Section, groups: &GroupSet) -> Result<(), CoreError> {
    ensure(can_write(section, groups), ForbiddenReason::NotWriter)
}

pub fn ensure_approve(section: &Section, groups: &GroupSet) -> Result<(), CoreError> {
    ensure(can_approve(section, groups), ForbiddenReason::NotApprover)
}

pub fn ensure_admin(groups: &GroupSet) -> Result<(), CoreError> {
    ensure(is_admin(groups), ForbiddenReason::NotAdmin)
}
