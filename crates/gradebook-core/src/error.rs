//! Gradebook error types.
//!
//! Every failure an operation can produce is one of these variants. They are
//! detected before any mutation is applied, so an `Err` always means the
//! gradebook is unchanged. The `Display` strings are the detail messages
//! callers hand back to clients.

use std::fmt;

use thiserror::Error;

use crate::auth::{Capability, Operation};
use crate::model::{Role, StudentId, TestId};

/// Errors returned by gradebook operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    /// No valid identity could be established from the presented credentials.
    #[error("Could not validate credentials")]
    Unauthorized,

    /// The identity is valid but lacks the capability the operation requires.
    #[error("{role} '{username}' may not {operation}: requires {required}")]
    Forbidden {
        username: String,
        role: Role,
        operation: Operation,
        required: Capability,
    },

    /// An entity with this id is already registered.
    #[error("{entity} ID already exists")]
    DuplicateKey { entity: EntityKind, id: i64 },

    /// A referenced entity is absent.
    #[error("{0} not found")]
    NotFound(Missing),

    /// The score is above the test's maximum (or not a finite number).
    #[error("Score exceeds maximum allowed")]
    InvalidScore { score: f64, max_score: f64 },

    /// The test's maximum score is not a number.
    #[error("Maximum score must be a number")]
    InvalidMaxScore { test_id: TestId, max_score: f64 },

    /// An aggregate was requested over a test with no results.
    #[error("No results found for this test")]
    NoResults { test_id: TestId },
}

pub type Result<T, E = GradebookError> = std::result::Result<T, E>;

/// The keyed entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Student,
    Test,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Student => write!(f, "Student"),
            EntityKind::Test => write!(f, "Test"),
        }
    }
}

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Student(StudentId),
    Test(TestId),
    /// Result submission does not say which of the two lookups failed.
    StudentOrTest {
        student_id: StudentId,
        test_id: TestId,
    },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Student(_) => write!(f, "Student"),
            Missing::Test(_) => write!(f, "Test"),
            Missing::StudentOrTest { .. } => write!(f, "Student or Test"),
        }
    }
}

impl GradebookError {
    /// Returns `true` if the caller's identity, not the payload, caused the failure.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            GradebookError::Unauthorized | GradebookError::Forbidden { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_messages() {
        let dup = GradebookError::DuplicateKey {
            entity: EntityKind::Student,
            id: 1,
        };
        assert_eq!(dup.to_string(), "Student ID already exists");

        let dup = GradebookError::DuplicateKey {
            entity: EntityKind::Test,
            id: 1,
        };
        assert_eq!(dup.to_string(), "Test ID already exists");

        assert_eq!(
            GradebookError::NotFound(Missing::Student(3)).to_string(),
            "Student not found"
        );
        assert_eq!(
            GradebookError::NotFound(Missing::StudentOrTest {
                student_id: 1,
                test_id: 2
            })
            .to_string(),
            "Student or Test not found"
        );
        assert_eq!(
            GradebookError::NoResults { test_id: 1 }.to_string(),
            "No results found for this test"
        );
    }

    #[test]
    fn forbidden_names_the_capability() {
        let err = GradebookError::Forbidden {
            username: "bob".into(),
            role: Role::Student,
            operation: Operation::CreateStudent,
            required: Capability::Admin,
        };
        assert_eq!(
            err.to_string(),
            "student 'bob' may not create_student: requires admin"
        );
        assert!(err.is_access_denied());
        assert!(!GradebookError::NoResults { test_id: 1 }.is_access_denied());
    }
}
