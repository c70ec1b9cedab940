//! Request and response envelopes.

use serde::{Deserialize, Serialize};

use gradebook_core::auth::Operation;
use gradebook_core::error::Result;
use gradebook_core::model::{Acknowledgement, Identity, Student, StudentId, Test, TestId, TestResult};
use gradebook_core::Gradebook;

/// A decoded call against the gradebook, tagged by operation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateStudent(Student),
    GetStudent { id: StudentId },
    ListStudents,
    DeleteStudent { id: StudentId },
    CreateTest(Test),
    GetTest { id: TestId },
    ListTests,
    SubmitResult(TestResult),
    ResultsForStudent { id: StudentId },
    ResultsForTest { id: TestId },
    AverageScore { id: TestId },
    HighestScore { id: TestId },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::CreateStudent(_) => Operation::CreateStudent,
            Request::GetStudent { .. } => Operation::GetStudent,
            Request::ListStudents => Operation::ListStudents,
            Request::DeleteStudent { .. } => Operation::DeleteStudent,
            Request::CreateTest(_) => Operation::CreateTest,
            Request::GetTest { .. } => Operation::GetTest,
            Request::ListTests => Operation::ListTests,
            Request::SubmitResult(_) => Operation::SubmitResult,
            Request::ResultsForStudent { .. } => Operation::ResultsForStudent,
            Request::ResultsForTest { .. } => Operation::ResultsForTest,
            Request::AverageScore { .. } => Operation::AverageScore,
            Request::HighestScore { .. } => Operation::HighestScore,
        }
    }
}

/// Success value of a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Student(Student),
    Students(Vec<Student>),
    Test(Test),
    Tests(Vec<Test>),
    Results(Vec<TestResult>),
    Score(f64),
    Message(Acknowledgement),
}

/// Route a request to the matching gradebook operation.
pub fn dispatch(book: &mut Gradebook, identity: &Identity, request: Request) -> Result<Response> {
    Ok(match request {
        Request::CreateStudent(student) => Response::Student(book.create_student(identity, student)?),
        Request::GetStudent { id } => Response::Student(book.get_student(identity, id)?),
        Request::ListStudents => Response::Students(book.list_students(identity)?),
        Request::DeleteStudent { id } => Response::Message(book.delete_student(identity, id)?),
        Request::CreateTest(test) => Response::Test(book.create_test(identity, test)?),
        Request::GetTest { id } => Response::Test(book.get_test(identity, id)?),
        Request::ListTests => Response::Tests(book.list_tests(identity)?),
        Request::SubmitResult(result) => Response::Message(book.submit_result(identity, result)?),
        Request::ResultsForStudent { id } => {
            Response::Results(book.results_for_student(identity, id)?)
        }
        Request::ResultsForTest { id } => Response::Results(book.results_for_test(identity, id)?),
        Request::AverageScore { id } => Response::Score(book.average_score(identity, id)?),
        Request::HighestScore { id } => Response::Score(book.highest_score(identity, id)?),
    })
}
