//! Domain operations.
//!
//! [`Gradebook`] pairs the authorization gate with a [`Repository`]. Each
//! method authorizes the caller first, then validates, then mutates, so a
//! failed call never leaves partial state behind. Methods that change state
//! take `&mut self`; whoever shares a gradebook across requests must
//! serialize access to it.

use crate::auth::{authorize, Operation};
use crate::error::{GradebookError, Result};
use crate::model::{Acknowledgement, Identity, Student, StudentId, Test, TestId, TestResult};
use crate::repository::Repository;
use crate::statistics;

pub const STUDENT_DELETED: &str = "Student deleted successfully";
pub const RESULT_SUBMITTED: &str = "Test result submitted successfully";

/// The gradebook: authorization plus storage.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    repo: Repository,
}

impl Gradebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing storage.
    pub fn with_repository(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // -----------------------------------------------------------------------
    // Students
    // -----------------------------------------------------------------------

    pub fn create_student(&mut self, identity: &Identity, student: Student) -> Result<Student> {
        authorize(identity, Operation::CreateStudent)?;
        self.repo.insert_student(student.clone())?;
        tracing::info!(student_id = student.id, by = %identity.username, "student created");
        Ok(student)
    }

    pub fn get_student(&self, identity: &Identity, id: StudentId) -> Result<Student> {
        authorize(identity, Operation::GetStudent)?;
        tracing::debug!(student_id = id, "get student");
        self.repo.students().get(id).cloned()
    }

    pub fn list_students(&self, identity: &Identity) -> Result<Vec<Student>> {
        authorize(identity, Operation::ListStudents)?;
        Ok(self.repo.students().list_all())
    }

    /// Delete a student together with all of its results.
    pub fn delete_student(
        &mut self,
        identity: &Identity,
        id: StudentId,
    ) -> Result<Acknowledgement> {
        authorize(identity, Operation::DeleteStudent)?;
        let (_, dropped) = self.repo.remove_student(id)?;
        tracing::info!(
            student_id = id,
            results_removed = dropped,
            by = %identity.username,
            "student deleted"
        );
        Ok(Acknowledgement::new(STUDENT_DELETED))
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    pub fn create_test(&mut self, identity: &Identity, test: Test) -> Result<Test> {
        authorize(identity, Operation::CreateTest)?;
        self.repo.insert_test(test.clone())?;
        tracing::info!(
            test_id = test.id,
            max_score = test.max_score,
            by = %identity.username,
            "test created"
        );
        Ok(test)
    }

    pub fn get_test(&self, identity: &Identity, id: TestId) -> Result<Test> {
        authorize(identity, Operation::GetTest)?;
        tracing::debug!(test_id = id, "get test");
        self.repo.tests().get(id).cloned()
    }

    pub fn list_tests(&self, identity: &Identity) -> Result<Vec<Test>> {
        authorize(identity, Operation::ListTests)?;
        Ok(self.repo.tests().list_all())
    }

    // -----------------------------------------------------------------------
    // Results
    // -----------------------------------------------------------------------

    /// Record a score and append the test to the student's `tests_taken`.
    pub fn submit_result(
        &mut self,
        identity: &Identity,
        result: TestResult,
    ) -> Result<Acknowledgement> {
        authorize(identity, Operation::SubmitResult)?;
        let (student_id, test_id, score) = (result.student_id, result.test_id, result.score);
        self.repo.record_result(result)?;
        tracing::info!(student_id, test_id, score, by = %identity.username, "result recorded");
        Ok(Acknowledgement::new(RESULT_SUBMITTED))
    }

    pub fn results_for_student(
        &self,
        identity: &Identity,
        id: StudentId,
    ) -> Result<Vec<TestResult>> {
        authorize(identity, Operation::ResultsForStudent)?;
        self.repo.students().get(id)?;
        Ok(self.repo.results_for_student(id))
    }

    pub fn results_for_test(&self, identity: &Identity, id: TestId) -> Result<Vec<TestResult>> {
        authorize(identity, Operation::ResultsForTest)?;
        self.repo.tests().get(id)?;
        Ok(self.repo.results_for_test(id))
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    pub fn average_score(&self, identity: &Identity, id: TestId) -> Result<f64> {
        authorize(identity, Operation::AverageScore)?;
        let scores = self.scores_for_existing_test(id)?;
        statistics::mean(&scores).ok_or(GradebookError::NoResults { test_id: id })
    }

    pub fn highest_score(&self, identity: &Identity, id: TestId) -> Result<f64> {
        authorize(identity, Operation::HighestScore)?;
        let scores = self.scores_for_existing_test(id)?;
        statistics::highest(&scores).ok_or(GradebookError::NoResults { test_id: id })
    }

    fn scores_for_existing_test(&self, id: TestId) -> Result<Vec<f64>> {
        self.repo.tests().get(id)?;
        Ok(self.repo.scores_for_test(id))
    }
}
