//! Executes untrusted candidate code against test cases and reports a verdict.
//!
//! The flow of one request: [`evaluator::Evaluator`] validates it and picks a
//! backend, [`tester::TestScheduler`] builds a [`harness`] per test case and
//! drives the backend, and [`tester::aggregate`] folds the results into an
//! [`model::EvaluationOutcome`].

pub mod config;
pub mod evaluator;
pub mod harness;
pub mod model;
pub mod runner;
pub mod tester;

#[cfg(test)]
mod test;

pub use evaluator::{BackendChoice, Evaluator, ValidationError};
