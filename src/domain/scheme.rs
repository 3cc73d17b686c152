//! Scheme lock: a course's term-numbering scheme freezes once terms exist.
//!
//! Every term under a course must carry the course's scheme type. Allowing a
//! scheme change after terms exist would orphan that invariant, so the first
//! term creation implicitly moves the course from `Unlocked` to `Locked`.

use crate::domain::error::DomainError;
use crate::domain::types::SchemeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeLock {
    /// No terms exist yet; the scheme may still change.
    Unlocked,
    /// At least one term exists; the scheme is frozen.
    Locked,
}

impl SchemeLock {
    pub fn for_term_count(term_count: u64) -> Self {
        if term_count == 0 {
            SchemeLock::Unlocked
        } else {
            SchemeLock::Locked
        }
    }

    /// Validate a requested scheme change against the current state.
    ///
    /// Keeping the same scheme is always permitted; changing it is only
    /// permitted while unlocked.
    pub fn ensure_change_allowed(
        self,
        current: SchemeType,
        requested: SchemeType,
    ) -> Result<(), DomainError> {
        if current == requested || self == SchemeLock::Unlocked {
            return Ok(());
        }
        Err(DomainError::conflict(format!(
            "cannot change scheme type from {} to {} while terms exist for this course",
            current.as_str(),
            requested.as_str()
        )))
    }
}

/// Validate that a new term's type matches its parent course's scheme.
pub fn ensure_term_matches_scheme(
    course_scheme: SchemeType,
    term_type: SchemeType,
) -> Result<(), DomainError> {
    if course_scheme == term_type {
        return Ok(());
    }
    Err(DomainError::validation(format!(
        "course scheme type is {}; term type must match",
        course_scheme.as_str()
    )))
}
