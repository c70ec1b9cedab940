//! In-memory entity storage.
//!
//! A [`Repository`] owns one keyed [`Table`] per entity type plus the list of
//! recorded results. It enforces key uniqueness, referential checks on result
//! recording, and the student → results cascade. It knows nothing about
//! identities; callers authorize first.

use std::collections::BTreeMap;

use crate::error::{EntityKind, GradebookError, Missing, Result};
use crate::model::{Student, StudentId, Test, TestId, TestResult};

/// An entity stored under an integer key.
pub trait Keyed: Clone {
    const KIND: EntityKind;

    fn key(&self) -> i64;

    fn missing(key: i64) -> Missing;
}

impl Keyed for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn key(&self) -> i64 {
        self.id
    }

    fn missing(key: i64) -> Missing {
        Missing::Student(key)
    }
}

impl Keyed for Test {
    const KIND: EntityKind = EntityKind::Test;

    fn key(&self) -> i64 {
        self.id
    }

    fn missing(key: i64) -> Missing {
        Missing::Test(key)
    }
}

/// Unique-key collection of one entity type. Iterates in ascending key order.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Keyed> Table<T> {
    /// Fails with `DuplicateKey` and leaves the table untouched if the key is taken.
    pub fn insert(&mut self, entity: T) -> Result<()> {
        let key = entity.key();
        if self.rows.contains_key(&key) {
            return Err(GradebookError::DuplicateKey {
                entity: T::KIND,
                id: key,
            });
        }
        self.rows.insert(key, entity);
        Ok(())
    }

    pub fn get(&self, key: i64) -> Result<&T> {
        self.rows
            .get(&key)
            .ok_or_else(|| GradebookError::NotFound(T::missing(key)))
    }

    fn get_mut(&mut self, key: i64) -> Result<&mut T> {
        self.rows
            .get_mut(&key)
            .ok_or_else(|| GradebookError::NotFound(T::missing(key)))
    }

    pub fn contains(&self, key: i64) -> bool {
        self.rows.contains_key(&key)
    }

    /// Snapshot of every row.
    pub fn list_all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    pub fn remove(&mut self, key: i64) -> Result<T> {
        self.rows
            .remove(&key)
            .ok_or_else(|| GradebookError::NotFound(T::missing(key)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All gradebook state.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    students: Table<Student>,
    tests: Table<Test>,
    /// Submission order.
    results: Vec<TestResult>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn students(&self) -> &Table<Student> {
        &self.students
    }

    pub fn tests(&self) -> &Table<Test> {
        &self.tests
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn insert_student(&mut self, student: Student) -> Result<()> {
        self.students.insert(student)
    }

    /// Refuses a NaN `max_score`. An infinite maximum leaves the test uncapped.
    pub fn insert_test(&mut self, test: Test) -> Result<()> {
        if test.max_score.is_nan() {
            return Err(GradebookError::InvalidMaxScore {
                test_id: test.id,
                max_score: test.max_score,
            });
        }
        self.tests.insert(test)
    }

    /// Remove a student and every result that references it.
    ///
    /// Returns the removed student and the number of results dropped with it.
    pub fn remove_student(&mut self, id: StudentId) -> Result<(Student, usize)> {
        let student = self.students.remove(id)?;
        let before = self.results.len();
        self.results.retain(|r| r.student_id != id);
        Ok((student, before - self.results.len()))
    }

    /// Record a result against an existing student and test.
    ///
    /// Checks run in order (student, test, score) and all of them finish
    /// before the result list or the student's `tests_taken` is touched.
    pub fn record_result(&mut self, result: TestResult) -> Result<()> {
        let missing = GradebookError::NotFound(Missing::StudentOrTest {
            student_id: result.student_id,
            test_id: result.test_id,
        });
        if !self.students.contains(result.student_id) {
            return Err(missing);
        }
        let Ok(test) = self.tests.get(result.test_id) else {
            return Err(missing);
        };
        if !result.score.is_finite() || result.score > test.max_score {
            return Err(GradebookError::InvalidScore {
                score: result.score,
                max_score: test.max_score,
            });
        }

        let student = self.students.get_mut(result.student_id)?;
        student.tests_taken.push(result.test_id);
        self.results.push(result);
        Ok(())
    }

    pub fn results_for_student(&self, id: StudentId) -> Vec<TestResult> {
        self.results
            .iter()
            .filter(|r| r.student_id == id)
            .cloned()
            .collect()
    }

    pub fn results_for_test(&self, id: TestId) -> Vec<TestResult> {
        self.results
            .iter()
            .filter(|r| r.test_id == id)
            .cloned()
            .collect()
    }

    /// Scores recorded for a test, in submission order.
    pub fn scores_for_test(&self, id: TestId) -> Vec<f64> {
        self.results
            .iter()
            .filter(|r| r.test_id == id)
            .map(|r| r.score)
            .collect()
    }
}
