use itertools::Itertools;

use crate::model::{EvaluationOutcome, ExecutionResult, FirstFailure, PerformanceSummary};

/// Fold the results of one evaluation into its outcome. `total_tests` is the
/// length of the request's test case list, executed or not.
pub fn aggregate(total_tests: usize, results: Vec<ExecutionResult>) -> EvaluationOutcome {
    let executed_tests = results.iter().filter(|r| r.passed.is_some()).count();
    let passed_tests = results.iter().filter(|r| r.passed == Some(true)).count();
    let first_failure = results
        .iter()
        .find(|r| r.passed == Some(false))
        .map(FirstFailure::from);
    let all_passed =
        executed_tests == total_tests && results.iter().all(|r| r.passed == Some(true));

    EvaluationOutcome {
        performance_summary: performance_summary(&results),
        results,
        first_failure,
        passed_tests,
        total_tests,
        executed_tests,
        all_passed,
    }
}

/// Timing and memory statistics over the results that carry samples.
///
/// Returns `None` when no result carries a time; `peak_memory_kb` is `None`
/// when no result carries a memory figure.
pub fn performance_summary(results: &[ExecutionResult]) -> Option<PerformanceSummary> {
    let times = results
        .iter()
        .filter_map(|r| r.execution_time_ms)
        .filter(|t| t.is_finite())
        .collect_vec();
    if times.is_empty() {
        return None;
    }

    let fastest = times.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Rounding may push the mean just outside its bounds
    let average = (times.iter().sum::<f64>() / times.len() as f64).clamp(fastest, slowest);
    let peak_memory = results.iter().filter_map(|r| r.memory_kb).max();

    Some(PerformanceSummary {
        average_ms: Some(average),
        fastest_ms: Some(fastest),
        slowest_ms: Some(slowest),
        peak_memory_kb: peak_memory,
    })
}
