//! Interprets executor output against test cases.
//!
//! Running programs is done by [`crate::runner`]; this module decides which
//! test cases run ([`scheduler`]), whether each one passed ([`utils`]) and
//! what the whole evaluation amounts to ([`aggregate`]).

pub mod aggregate;
pub mod scheduler;
pub mod utils;

pub use aggregate::aggregate;
pub use scheduler::TestScheduler;
