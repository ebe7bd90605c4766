//! Test registry and runner
//!
//! Holds the ordered suite and drives each case through its lifecycle:
//! setup barrier, setup, body, teardown, teardown barrier. Faults inside a
//! case are converted to outcomes at the case boundary; faults inside a
//! collective are not recoverable and abort the whole run.

#![allow(dead_code)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::group::{GroupError, ProcessGroup};
use crate::models::{Outcome, Status, TestFault};

/// Per-invocation view handed to setup, body, and teardown hooks.
pub struct TestContext<'a> {
    pub group: &'a dyn ProcessGroup,
}

impl TestContext<'_> {
    pub fn rank(&self) -> usize {
        self.group.rank()
    }

    pub fn size(&self) -> usize {
        self.group.size()
    }
}

type Hook = Box<dyn Fn(&TestContext<'_>) -> Result<(), TestFault>>;

/// A named unit of verification with optional per-invocation hooks.
pub struct TestCase {
    name: String,
    setup: Option<Hook>,
    body: Hook,
    teardown: Option<Hook>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&TestContext<'_>) -> Result<(), TestFault> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            setup: None,
            body: Box::new(body),
            teardown: None,
        }
    }

    pub fn with_setup(
        mut self,
        hook: impl Fn(&TestContext<'_>) -> Result<(), TestFault> + 'static,
    ) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    pub fn with_teardown(
        mut self,
        hook: impl Fn(&TestContext<'_>) -> Result<(), TestFault> + 'static,
    ) -> Self {
        self.teardown = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered collection of registered test cases.
///
/// Registration order is execution order. Duplicate names are allowed but
/// discouraged; there is no dedup.
#[derive(Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name()).collect()
    }
}

/// Executes a registry against a process group.
pub struct Runner<'g> {
    group: &'g dyn ProcessGroup,
    registry: Registry,
}

impl<'g> Runner<'g> {
    pub fn new(group: &'g dyn ProcessGroup, registry: Registry) -> Self {
        Self { group, registry }
    }

    /// Run every registered case in order. One failed or errored case never
    /// stops the run; a collective fault does.
    pub fn run_all(&self) -> Result<Vec<Outcome>, GroupError> {
        let mut outcomes = Vec::with_capacity(self.registry.len());
        for case in &self.registry.cases {
            let outcome = self.run_case(case)?;
            info!("{outcome}");
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn run_case(&self, case: &TestCase) -> Result<Outcome, GroupError> {
        let cx = TestContext { group: self.group };
        let start = Instant::now();

        // Opening barrier aligns all members before per-case work or output.
        self.group.barrier()?;

        let mut status = Status::Passed;
        let mut detail: Option<String> = None;

        if let Some(setup) = &case.setup {
            if let Err(fault) = contain(|| setup(&cx)) {
                // Any setup fault is a lifecycle error, not an assertion.
                status = Status::Errored;
                detail = Some(fault.to_string());
            }
        }

        if status == Status::Passed {
            if let Err(fault) = contain(|| (case.body)(&cx)) {
                match fault {
                    TestFault::Mismatch { .. } => status = Status::Failed,
                    TestFault::Fault(_) => status = Status::Errored,
                }
                detail = Some(fault.to_string());
            }
        }

        // Teardown runs even after a setup or body fault. First failure
        // wins: a teardown fault never overwrites an earlier status.
        if let Some(teardown) = &case.teardown {
            if let Err(fault) = contain(|| teardown(&cx)) {
                if status == Status::Passed {
                    status = Status::Errored;
                    detail = Some(fault.to_string());
                } else {
                    warn!("teardown fault in {} after {status}: {fault}", case.name);
                }
            }
        }

        // Closing barrier keeps console output from interleaving between
        // consecutive cases.
        self.group.barrier()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(match (status, detail) {
            (Status::Failed, Some(detail)) => {
                Outcome::failed(case.name.as_str(), duration_ms, detail)
            }
            (Status::Errored, Some(detail)) => {
                Outcome::errored(case.name.as_str(), duration_ms, detail)
            }
            _ => Outcome::passed(case.name.as_str(), duration_ms),
        })
    }
}

/// Run a hook, converting panics into the unexpected-fault channel so that
/// no fault escapes the test-case boundary.
fn contain<F>(hook: F) -> Result<(), TestFault>
where
    F: FnOnce() -> Result<(), TestFault>,
{
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            };
            Err(TestFault::Fault(anyhow!("panic: {message}")))
        }
    }
}
