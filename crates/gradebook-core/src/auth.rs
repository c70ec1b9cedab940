//! Identity store contract and the authorization gate.
//!
//! Every operation declares the capability it needs in a single policy table
//! ([`Operation::required_capability`]). [`authorize`] checks an identity
//! against that table before the gradebook touches any storage.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GradebookError, Result};
use crate::model::{Identity, Role};

// ---------------------------------------------------------------------------
// Identity store
// ---------------------------------------------------------------------------

/// Username and password presented by a caller.
///
/// Note: Custom Debug impl masks the password to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Resolves credentials into an identity.
///
/// How credentials are stored and checked is up to the implementation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Verify the credentials. Fails with [`GradebookError::Unauthorized`].
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity>;
}

// ---------------------------------------------------------------------------
// Authorization gate
// ---------------------------------------------------------------------------

/// What an operation requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Any identity the store vouched for.
    Authenticated,
    Admin,
    Instructor,
}

impl Capability {
    /// Roles are a flat set: admin does not imply instructor.
    pub fn permits(self, role: Role) -> bool {
        match self {
            Capability::Authenticated => true,
            Capability::Admin => role == Role::Admin,
            Capability::Instructor => role == Role::Instructor,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Authenticated => write!(f, "authenticated"),
            Capability::Admin => write!(f, "admin"),
            Capability::Instructor => write!(f, "instructor"),
        }
    }
}

/// Every gradebook operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateStudent,
    GetStudent,
    ListStudents,
    DeleteStudent,
    CreateTest,
    GetTest,
    ListTests,
    SubmitResult,
    ResultsForStudent,
    ResultsForTest,
    AverageScore,
    HighestScore,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::CreateStudent,
        Operation::GetStudent,
        Operation::ListStudents,
        Operation::DeleteStudent,
        Operation::CreateTest,
        Operation::GetTest,
        Operation::ListTests,
        Operation::SubmitResult,
        Operation::ResultsForStudent,
        Operation::ResultsForTest,
        Operation::AverageScore,
        Operation::HighestScore,
    ];

    /// The policy table.
    pub fn required_capability(self) -> Capability {
        match self {
            Operation::CreateStudent | Operation::DeleteStudent => Capability::Admin,
            Operation::CreateTest | Operation::SubmitResult => Capability::Instructor,
            Operation::GetStudent
            | Operation::ListStudents
            | Operation::GetTest
            | Operation::ListTests
            | Operation::ResultsForStudent
            | Operation::ResultsForTest
            | Operation::AverageScore
            | Operation::HighestScore => Capability::Authenticated,
        }
    }

    /// Whether the operation changes gradebook state.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::CreateStudent
                | Operation::DeleteStudent
                | Operation::CreateTest
                | Operation::SubmitResult
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateStudent => "create_student",
            Operation::GetStudent => "get_student",
            Operation::ListStudents => "list_students",
            Operation::DeleteStudent => "delete_student",
            Operation::CreateTest => "create_test",
            Operation::GetTest => "get_test",
            Operation::ListTests => "list_tests",
            Operation::SubmitResult => "submit_result",
            Operation::ResultsForStudent => "results_for_student",
            Operation::ResultsForTest => "results_for_test",
            Operation::AverageScore => "average_score",
            Operation::HighestScore => "highest_score",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check `identity` against the capability `operation` requires.
pub fn authorize(identity: &Identity, operation: Operation) -> Result<()> {
    let required = operation.required_capability();
    if required.permits(identity.role) {
        return Ok(());
    }
    tracing::warn!(
        username = %identity.username,
        role = %identity.role,
        %operation,
        %required,
        "authorization denied"
    );
    Err(GradebookError::Forbidden {
        username: identity.username.clone(),
        role: identity.role,
        operation,
        required,
    })
}
