//! The request-handling service.
//!
//! Authenticates each caller, then runs the request against the gradebook
//! while holding one global lock, so every operation is atomic with respect
//! to every other.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use gradebook_core::auth::{Credentials, IdentityStore};
use gradebook_core::error::Result;
use gradebook_core::Gradebook;

use crate::error::{ErrorResponse, STATUS_INTERNAL, STATUS_OK};
use crate::request::{dispatch, Request, Response};

/// Status plus JSON body, as a transport would send it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Shared entry point for all callers.
pub struct GradebookService {
    identities: Arc<dyn IdentityStore>,
    book: Mutex<Gradebook>,
}

impl GradebookService {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self::with_gradebook(identities, Gradebook::new())
    }

    pub fn with_gradebook(identities: Arc<dyn IdentityStore>, book: Gradebook) -> Self {
        Self {
            identities,
            book: Mutex::new(book),
        }
    }

    /// Authenticate, then run the request under the gradebook lock.
    pub async fn handle(&self, credentials: &Credentials, request: Request) -> Result<Response> {
        let span = tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            op = %request.operation(),
            user = %credentials.username,
        );
        async move {
            let identity = self.identities.authenticate(credentials).await?;
            let mut book = self.book.lock().await;
            dispatch(&mut book, &identity, request)
        }
        .instrument(span)
        .await
    }

    /// [`handle`](Self::handle), with failures mapped to statuses.
    pub async fn call(&self, credentials: &Credentials, request: Request) -> Reply {
        let (status, encoded) = match self.handle(credentials, request).await {
            Ok(response) => (STATUS_OK, serde_json::to_value(&response)),
            Err(error) => {
                let response = ErrorResponse::from(&error);
                (response.status, serde_json::to_value(&response))
            }
        };
        match encoded {
            Ok(body) => Reply { status, body },
            Err(e) => {
                tracing::error!("failed to encode response: {e}");
                let response = ErrorResponse {
                    status: STATUS_INTERNAL,
                    detail: "failed to encode response".into(),
                };
                Reply {
                    status: response.status,
                    body: serde_json::to_value(&response).unwrap_or_default(),
                }
            }
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Gradebook {
        self.book.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradebook_core::error::{GradebookError, Missing};
    use gradebook_core::model::{Role, Student, Test, TestResult};

    use crate::identity::StaticIdentityStore;

    fn service() -> GradebookService {
        let store = StaticIdentityStore::default()
            .with_user("admin", "root-pw", Role::Admin)
            .with_user("prof", "prof-pw", Role::Instructor)
            .with_user("kid", "kid-pw", Role::Student);
        GradebookService::new(Arc::new(store))
    }

    fn admin() -> Credentials {
        Credentials::new("admin", "root-pw")
    }

    fn prof() -> Credentials {
        Credentials::new("prof", "prof-pw")
    }

    fn kid() -> Credentials {
        Credentials::new("kid", "kid-pw")
    }

    #[tokio::test]
    async fn scenario_through_the_service() {
        let svc = service();
        assert!(svc
            .call(&admin(), Request::CreateStudent(Student::new(1, "A")))
            .await
            .is_success());
        assert!(svc
            .call(
                &prof(),
                Request::CreateTest(Test {
                    id: 1,
                    max_score: 100.0
                })
            )
            .await
            .is_success());
        let reply = svc
            .call(
                &prof(),
                Request::SubmitResult(TestResult {
                    student_id: 1,
                    test_id: 1,
                    score: 95.0,
                }),
            )
            .await;
        assert_eq!(
            reply.body,
            serde_json::json!({"message": "Test result submitted successfully"})
        );

        let reply = svc.call(&kid(), Request::GetStudent { id: 1 }).await;
        assert_eq!(reply.body["tests_taken"], serde_json::json!([1]));

        let reply = svc.call(&kid(), Request::AverageScore { id: 1 }).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, serde_json::json!(95.0));
    }

    #[tokio::test]
    async fn failure_body_is_the_error_response() {
        let svc = service();
        let reply = svc.call(&kid(), Request::HighestScore { id: 4 }).await;
        let expected = ErrorResponse::from(&GradebookError::NotFound(Missing::Test(4)));
        assert_eq!(reply.status, expected.status);
        assert_eq!(reply.body, serde_json::to_value(&expected).unwrap());
        assert!(reply.body.get("status").is_none());
    }

    #[tokio::test]
    async fn bad_credentials_are_401_before_anything_else() {
        let svc = service();
        let reply = svc
            .call(
                &Credentials::new("admin", "guess"),
                Request::CreateStudent(Student::new(1, "A")),
            )
            .await;
        assert_eq!(reply.status, 401);
        assert_eq!(
            reply.body,
            serde_json::json!({"detail": "Could not validate credentials"})
        );
        assert!(svc.snapshot().await.repository().students().is_empty());
    }

    #[tokio::test]
    async fn role_and_lookup_failures_map_to_statuses() {
        let svc = service();
        let reply = svc
            .call(&kid(), Request::CreateStudent(Student::new(1, "A")))
            .await;
        assert_eq!(reply.status, 403);

        let reply = svc.call(&kid(), Request::GetTest { id: 9 }).await;
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body["detail"], "Test not found");

        svc.call(&admin(), Request::CreateStudent(Student::new(1, "A")))
            .await;
        let reply = svc
            .call(&admin(), Request::CreateStudent(Student::new(1, "A")))
            .await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["detail"], "Student ID already exists");
    }

    #[tokio::test]
    async fn handle_returns_typed_errors() {
        let svc = service();
        let err = svc
            .handle(&kid(), Request::HighestScore { id: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, GradebookError::NotFound(_)));
    }
}
