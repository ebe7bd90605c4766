//! Outcome models for the lockstep harness
//!
//! Defines test statuses, per-case outcomes, per-process summaries, and the
//! two-channel fault type used by test bodies.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final status of one test case on one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Passed => "✓",
            Status::Failed => "✗",
            Status::Errored => "!",
            Status::Skipped => "○",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Passed | Status::Skipped)
    }

    /// Statuses that count toward the group-wide verdict.
    pub fn is_fault(&self) -> bool {
        matches!(self, Status::Failed | Status::Errored)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Passed => write!(f, "PASS"),
            Status::Failed => write!(f, "FAIL"),
            Status::Errored => write!(f, "ERROR"),
            Status::Skipped => write!(f, "SKIP"),
        }
    }
}

/// A fault raised by a test body, setup, or teardown.
///
/// Assertion mismatches and unexpected faults are distinct channels: a
/// mismatch becomes a `Failed` outcome carrying expected/actual, anything
/// else becomes `Errored`. One never shadows the other.
#[derive(Debug)]
pub enum TestFault {
    Mismatch { expected: String, actual: String },
    Fault(anyhow::Error),
}

impl fmt::Display for TestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestFault::Mismatch { expected, actual } => {
                write!(f, "expected {expected:?}, got {actual:?}")
            }
            TestFault::Fault(err) => write!(f, "{err:#}"),
        }
    }
}

impl From<anyhow::Error> for TestFault {
    fn from(err: anyhow::Error) -> Self {
        TestFault::Fault(err)
    }
}

/// Assert that two renderings are equal.
pub fn expect_eq(expected: impl Into<String>, actual: impl Into<String>) -> Result<(), TestFault> {
    let expected = expected.into();
    let actual = actual.into();
    if expected == actual {
        Ok(())
    } else {
        Err(TestFault::Mismatch { expected, actual })
    }
}

/// Assert that `actual` starts with `prefix`.
pub fn expect_prefix(prefix: &str, actual: impl Into<String>) -> Result<(), TestFault> {
    let actual = actual.into();
    if actual.starts_with(prefix) {
        Ok(())
    } else {
        Err(TestFault::Mismatch {
            expected: format!("{prefix}..."),
            actual,
        })
    }
}

/// Result of running one test case on one process. Immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub status: Status,
    pub detail: Option<String>,
    pub duration_ms: u64,
}

impl Outcome {
    pub fn passed(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: Status::Passed,
            detail: None,
            duration_ms,
        }
    }

    pub fn failed(name: impl Into<String>, duration_ms: u64, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Failed,
            detail: Some(detail.into()),
            duration_ms,
        }
    }

    pub fn errored(name: impl Into<String>, duration_ms: u64, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Errored,
            detail: Some(detail.into()),
            duration_ms,
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Skipped,
            detail: Some(reason.into()),
            duration_ms: 0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}ms]",
            self.status.symbol(),
            self.name,
            self.status,
            self.duration_ms
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " - {detail}")?;
        }
        Ok(())
    }
}

/// Per-process summary of one suite run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub suite: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub total_duration_ms: u64,
    pub outcomes: Vec<Outcome>,
}

impl RunSummary {
    pub fn new(suite: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            suite: suite.into(),
            total: outcomes.len(),
            passed: count(Status::Passed),
            failed: count(Status::Failed),
            errored: count(Status::Errored),
            skipped: count(Status::Skipped),
            total_duration_ms: outcomes.iter().map(|o| o.duration_ms).sum(),
            outcomes,
        }
    }

    /// Failures plus errors on this process only.
    pub fn local_fault_count(&self) -> usize {
        self.failed + self.errored
    }
}
