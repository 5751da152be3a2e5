use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    harness::Harness,
    runner::{Executor, RunOutput, RunStatus},
};

type Respond = Box<dyn Fn(&Harness) -> anyhow::Result<RunOutput> + Send + Sync>;
type Delay = Box<dyn Fn(&Harness) -> Duration + Send + Sync>;

/// An executor that never starts a process. It answers from a closure and
/// records what it was asked to run.
pub struct MockExecutor {
    name: Cow<'static, str>,
    respond: Respond,
    delay: Delay,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockExecutor {
    /// Echoes stdin back as stdout.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        MockExecutor {
            name: name.into(),
            respond: Box::new(|h: &Harness| Ok(finished(&h.stdin))),
            delay: Box::new(|_: &Harness| Duration::ZERO),
            calls: Mutex::new(vec![]),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Behaves like a correct `solve(a, b) -> a + b`: prints the sum of the
    /// integers found in stdin.
    pub fn adder() -> Self {
        Self::named("adder").with_response(|h| {
            let sum: i64 = h
                .stdin
                .split_whitespace()
                .filter_map(|t| t.parse::<i64>().ok())
                .sum();
            Ok(finished(&format!("{}\n", sum)))
        })
    }

    pub fn with_response(
        mut self,
        f: impl Fn(&Harness) -> anyhow::Result<RunOutput> + Send + Sync + 'static,
    ) -> Self {
        self.respond = Box::new(f);
        self
    }

    pub fn with_delay(mut self, f: impl Fn(&Harness) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(f);
        self
    }

    /// Stdin of every call, in the order the calls started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub fn finished(stdout: &str) -> RunOutput {
    RunOutput {
        stdout: stdout.into(),
        time_ms: Some(1.0),
        ..RunOutput::with_status(RunStatus::Finished)
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    async fn execute(
        &self,
        harness: &Harness,
        _expected: Option<&str>,
    ) -> anyhow::Result<RunOutput> {
        self.calls.lock().unwrap().push(harness.stdin.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay)(harness);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let res = (self.respond)(harness);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}
