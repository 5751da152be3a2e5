//! Tests of the async components, driven through test doubles.

mod remote_tests;
mod scheduler_tests;
pub mod util;
