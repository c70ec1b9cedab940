//! Core data model types for gradebook.
//!
//! Students, tests and the results that link them, plus the identity a
//! caller presents when invoking an operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of a [`Student`].
pub type StudentId = i64;

/// Key of a [`Test`].
pub type TestId = i64;

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier.
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// IDs of the tests this student has results for, in submission order.
    #[serde(default)]
    pub tests_taken: Vec<TestId>,
}

impl Student {
    /// Create a student that has not taken any tests yet.
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tests_taken: Vec::new(),
        }
    }
}

/// A registered test. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// Unique identifier.
    pub id: TestId,
    /// Highest score a result for this test may carry.
    pub max_score: f64,
}

/// One student's score on one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub student_id: StudentId,
    pub test_id: TestId,
    pub score: f64,
}

/// Success value for operations that don't return an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

impl Acknowledgement {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    /// Plain user: may read, may not mutate.
    #[serde(alias = "user")]
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Instructor => write!(f, "instructor"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" | "user" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Who is calling, as resolved by an identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}
