//! gradebook-core: Role-gated student, test and result records.
//!
//! This crate defines the data model, the authorization gate, in-memory
//! storage and the domain operations that the rest of gradebook builds on.

pub mod auth;
pub mod error;
pub mod gradebook;
pub mod model;
pub mod repository;
pub mod statistics;

pub use auth::{authorize, Capability, Credentials, IdentityStore, Operation};
pub use error::{EntityKind, GradebookError, Missing};
pub use gradebook::Gradebook;
pub use model::{Acknowledgement, Identity, Role, Student, StudentId, Test, TestId, TestResult};
pub use repository::Repository;
