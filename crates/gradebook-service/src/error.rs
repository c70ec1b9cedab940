//! Mapping gradebook failures to transport status codes.
//!
//! The core only knows typed failures. This is the single place where they
//! become numeric statuses and `{"detail": ...}` bodies.

use serde::{Deserialize, Serialize};

use gradebook_core::error::GradebookError;

/// Status of a successful call.
pub const STATUS_OK: u16 = 200;

/// Status when a response body cannot be produced.
pub const STATUS_INTERNAL: u16 = 500;

/// Every status a call can end with.
pub const KNOWN_STATUSES: [u16; 6] = [200, 400, 401, 403, 404, 500];

/// The transport status for a failure.
pub fn status_code(error: &GradebookError) -> u16 {
    match error {
        GradebookError::Unauthorized => 401,
        GradebookError::Forbidden { .. } => 403,
        GradebookError::DuplicateKey { .. }
        | GradebookError::InvalidScore { .. }
        | GradebookError::InvalidMaxScore { .. } => 400,
        GradebookError::NotFound(_) | GradebookError::NoResults { .. } => 404,
    }
}

/// Body returned for a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: u16,
    pub detail: String,
}

impl From<&GradebookError> for ErrorResponse {
    fn from(error: &GradebookError) -> Self {
        Self {
            status: status_code(error),
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradebook_core::auth::{Capability, Operation};
    use gradebook_core::error::{EntityKind, Missing};
    use gradebook_core::model::Role;

    #[test]
    fn status_table() {
        let cases = [
            (GradebookError::Unauthorized, 401),
            (
                GradebookError::Forbidden {
                    username: "kid".into(),
                    role: Role::Student,
                    operation: Operation::CreateTest,
                    required: Capability::Instructor,
                },
                403,
            ),
            (
                GradebookError::DuplicateKey {
                    entity: EntityKind::Test,
                    id: 1,
                },
                400,
            ),
            (GradebookError::NotFound(Missing::Student(1)), 404),
            (
                GradebookError::InvalidScore {
                    score: 11.0,
                    max_score: 10.0,
                },
                400,
            ),
            (
                GradebookError::InvalidMaxScore {
                    test_id: 1,
                    max_score: f64::NAN,
                },
                400,
            ),
            (GradebookError::NoResults { test_id: 1 }, 404),
        ];
        for (error, status) in cases {
            assert_eq!(status_code(&error), status, "{error}");
            assert!(KNOWN_STATUSES.contains(&status));
        }
    }

    #[test]
    fn body_carries_detail_only() {
        let body = ErrorResponse::from(&GradebookError::NoResults { test_id: 3 });
        assert_eq!(body.status, 404);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"detail": "No results found for this test"})
        );
    }
}
