//! End-to-end scheduling behavior of [`crate::evaluator::Evaluator`] over a
//! mock backend.

use std::{sync::Arc, time::Duration};

use pretty_assertions::assert_eq;
use test_env_log::test;

use super::util::{finished, MockExecutor};
use crate::{
    evaluator::Evaluator,
    model::{EvaluateRequest, Language, Mode, TestCase},
    runner::{RunOutput, RunStatus},
    tester::scheduler::EXECUTION_ERROR,
};

fn adder_request(mode: Mode, test_cases: Vec<TestCase>) -> EvaluateRequest {
    EvaluateRequest {
        code: "def solve(a,b): return a+b".into(),
        language: Language::Python,
        test_cases,
        mode,
        adapter: None,
        problem_id: Some("two-sum".into()),
    }
}

fn evaluator(mock: MockExecutor) -> (Evaluator, Arc<MockExecutor>) {
    let mock = Arc::new(mock);
    (Evaluator::new().with_remote(mock.clone()), mock)
}

#[test(tokio::test)]
async fn scenario_all_pass() {
    let (ev, _) = evaluator(MockExecutor::adder());
    let req = adder_request(
        Mode::Submit,
        vec![TestCase::public("2 3", "5"), TestCase::hidden("10 20", "30")],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.executed_tests, 2);
    assert_eq!(outcome.passed_tests, 2);
    assert_eq!(outcome.total_tests, 2);
    assert!(outcome.all_passed);
    assert_eq!(outcome.first_failure, None);
    assert!(outcome.performance_summary.is_some());
}

#[test(tokio::test)]
async fn scenario_hidden_failure() {
    let (ev, _) = evaluator(MockExecutor::adder());
    let req = adder_request(
        Mode::Submit,
        vec![TestCase::public("2 3", "5"), TestCase::hidden("10 20", "31")],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.executed_tests, 2);
    assert_eq!(outcome.passed_tests, 1);
    assert!(!outcome.all_passed);
    let failure = outcome.first_failure.unwrap();
    assert_eq!(failure.test_case, 2);
    assert!(failure.is_hidden);
    assert_eq!(failure.actual_output, "30");
    assert_eq!(failure.status, "Wrong Answer");
}

#[test(tokio::test)]
async fn scenario_public_failure_skips_hidden() {
    let (ev, mock) = evaluator(MockExecutor::adder());
    let req = adder_request(
        Mode::Submit,
        vec![TestCase::public("2 3", "6"), TestCase::hidden("10 20", "30")],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.executed_tests, 1);
    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results.iter().all(|r| !r.is_hidden));
    assert_eq!(outcome.first_failure.unwrap().test_case, 1);
    // The hidden test never reached the backend
    assert_eq!(mock.calls(), vec!["2 3".to_string()]);
}

#[test(tokio::test)]
async fn run_mode_executes_everything() {
    let (ev, mock) = evaluator(MockExecutor::adder());
    let req = adder_request(
        Mode::Run,
        vec![
            TestCase::public("1 1", "3"),
            TestCase::hidden("2 2", "5"),
            TestCase::public("3 3", "6"),
        ],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.executed_tests, outcome.total_tests);
    assert_eq!(outcome.passed_tests, 1);
    assert_eq!(mock.calls().len(), 3);
    assert!(!outcome.all_passed);
    // Public tests are reported before hidden ones
    let order = outcome.results.iter().map(|r| r.index).collect::<Vec<_>>();
    assert_eq!(order, vec![0, 2, 1]);
}

#[test(tokio::test)]
async fn first_failure_is_lowest_index_not_first_completed() {
    // Later tests finish first
    let mock = MockExecutor::adder().with_delay(|h| match h.stdin.as_str() {
        "1 1" => Duration::from_millis(80),
        "2 2" => Duration::from_millis(40),
        _ => Duration::from_millis(0),
    });
    let (ev, mock) = evaluator(mock);
    let req = adder_request(
        Mode::Submit,
        vec![
            TestCase::public("1 1", "2"),
            TestCase::public("2 2", "0"),
            TestCase::public("3 3", "0"),
            TestCase::hidden("4 4", "8"),
        ],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.first_failure.unwrap().test_case, 2);
    assert_eq!(outcome.executed_tests, 2);
    let reported = outcome.results.iter().map(|r| r.index).collect::<Vec<_>>();
    assert_eq!(reported, vec![0, 1]);
    // Public tests ran as one batch, the hidden one never ran
    assert_eq!(mock.max_in_flight(), 3);
    assert!(!mock.calls().contains(&"4 4".to_string()));
}

#[test(tokio::test)]
async fn hidden_tests_run_one_at_a_time() {
    let mock = MockExecutor::adder().with_delay(|_| Duration::from_millis(5));
    let (ev, mock) = evaluator(mock);
    let req = adder_request(
        Mode::Submit,
        vec![
            TestCase::public("0 1", "1"),
            TestCase::hidden("1 1", "2"),
            TestCase::hidden("1 2", "3"),
            TestCase::hidden("2 2", "5"),
            TestCase::hidden("2 3", "5"),
        ],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(mock.max_in_flight(), 1);
    assert_eq!(outcome.executed_tests, 4);
    assert_eq!(outcome.first_failure.unwrap().test_case, 4);
    assert_eq!(
        mock.calls(),
        vec!["0 1".to_string(), "1 1".into(), "1 2".into(), "2 2".into()]
    );
}

#[test(tokio::test)]
async fn infrastructure_failure_degrades_one_test() {
    let mock = MockExecutor::named("flaky").with_response(|h| {
        if h.stdin == "boom" {
            anyhow::bail!("judge unreachable")
        }
        Ok(finished(&h.stdin))
    });
    let (ev, _) = evaluator(mock);
    let req = adder_request(
        Mode::Run,
        vec![TestCase::public("ok", "ok"), TestCase::public("boom", "boom")],
    );
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.executed_tests, 2);
    assert_eq!(outcome.passed_tests, 1);
    let failed = &outcome.results[1];
    assert_eq!(failed.status, EXECUTION_ERROR);
    assert_eq!(failed.passed, Some(false));
    assert!(failed.error_output.contains("judge unreachable"));
}

#[test(tokio::test)]
async fn verdicts_without_timing_give_no_summary() {
    let mock = MockExecutor::named("tle").with_response(|_| {
        Ok(RunOutput::with_status(RunStatus::TimeLimitExceeded))
    });
    let (ev, _) = evaluator(mock);
    let req = adder_request(Mode::Run, vec![TestCase::public("1 2", "3")]);
    let outcome = ev.evaluate(&req).await.unwrap();
    assert_eq!(outcome.results[0].status, "Time Limit Exceeded");
    assert_eq!(outcome.performance_summary, None);
}
