//! Ownership guard: pure read/write eligibility predicates.
//!
//! Project access is owner-or-member for reads and owner-only for writes.
//! Todo access belongs solely to the todo's creator; owning the enclosing
//! project grants nothing at the todo level.
//!
//! Callers translate a `false` into [`CoreError::Unauthorized`] via the
//! `require_*` helpers.

use crate::error::CoreError;
use crate::types::DbId;

/// The ownership facts of a project needed to authorize access.
pub trait ProjectAccess {
    fn owner_id(&self) -> DbId;
    fn member_ids(&self) -> &[DbId];
}

/// The ownership facts of a todo needed to authorize access.
pub trait TodoAccess {
    fn created_by(&self) -> DbId;
}

/// The principal is the owner or one of the members.
pub fn can_read_project(user_id: DbId, project: &impl ProjectAccess) -> bool {
    project.owner_id() == user_id || project.member_ids().contains(&user_id)
}

/// Only the owner may update, delete, or manage members of a project.
pub fn can_write_project(user_id: DbId, project: &impl ProjectAccess) -> bool {
    project.owner_id() == user_id
}

/// Only the creator may read or mutate a todo.
pub fn can_mutate_todo(user_id: DbId, todo: &impl TodoAccess) -> bool {
    todo.created_by() == user_id
}

pub fn require_read_project(user_id: DbId, project: &impl ProjectAccess) -> Result<(), CoreError> {
    if can_read_project(user_id, project) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized(
            "Not authorized to access this project".into(),
        ))
    }
}

pub fn require_write_project(user_id: DbId, project: &impl ProjectAccess) -> Result<(), CoreError> {
    if can_write_project(user_id, project) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized(
            "Not authorized to modify this project".into(),
        ))
    }
}

pub fn require_mutate_todo(user_id: DbId, todo: &impl TodoAccess) -> Result<(), CoreError> {
    if can_mutate_todo(user_id, todo) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized(
            "Not authorized to access this todo".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    struct P {
        owner: DbId,
        members: Vec<DbId>,
    }

    impl ProjectAccess for P {
        fn owner_id(&self) -> DbId {
            self.owner
        }
        fn member_ids(&self) -> &[DbId] {
            &self.members
        }
    }

    struct T(DbId);

    impl TodoAccess for T {
        fn created_by(&self) -> DbId {
            self.0
        }
    }

    fn project() -> P {
        P {
            owner: 1,
            members: vec![1, 2],
        }
    }

    #[test]
    fn owner_and_members_can_read() {
        let p = project();
        assert!(can_read_project(1, &p));
        assert!(can_read_project(2, &p));
        assert!(!can_read_project(3, &p));
    }

    #[test]
    fn owner_reads_even_when_missing_from_members() {
        let p = P {
            owner: 7,
            members: vec![],
        };
        assert!(can_read_project(7, &p));
    }

    #[test]
    fn membership_does_not_grant_write() {
        let p = project();
        assert!(can_write_project(1, &p));
        assert!(!can_write_project(2, &p));
    }

    #[test]
    fn only_creator_mutates_todo() {
        assert!(can_mutate_todo(5, &T(5)));
        assert!(!can_mutate_todo(1, &T(5)));
    }

    #[test]
    fn require_helpers_return_unauthorized() {
        assert_matches!(require_write_project(2, &project()), Err(CoreError::Unauthorized(_)));
        assert_matches!(require_read_project(3, &project()), Err(CoreError::Unauthorized(_)));
        assert_matches!(require_mutate_todo(9, &T(5)), Err(CoreError::Unauthorized(_)));
        assert!(require_read_project(2, &project()).is_ok());
    }
}
