//! Result aggregation and leader-only reporting
//!
//! Counts local faults, folds them into a single group-wide reduction, and
//! renders the human-readable report on rank 0 only. The leader decision is
//! made once, at `Reporter` construction, and nowhere else.

#![allow(dead_code)]

use std::fmt::Write as _;

use crate::group::{GroupError, ProcessGroup};
use crate::models::{Outcome, RunSummary, Status};

/// Count (failed, errored) over a finished outcome sequence. Passed and
/// skipped cases contribute nothing.
pub fn local_counts(outcomes: &[Outcome]) -> (usize, usize) {
    let failed = outcomes.iter().filter(|o| o.status == Status::Failed).count();
    let errored = outcomes.iter().filter(|o| o.status == Status::Errored).count();
    (failed, errored)
}

/// Fold local fault counts into the group-wide total.
///
/// This is the run's single reduction: exactly one `sum_all` call, not one
/// per test case, so synchronization cost stays constant.
pub fn reduce(
    group: &dyn ProcessGroup,
    failed: usize,
    errored: usize,
) -> Result<i64, GroupError> {
    group.sum_all((failed + errored) as i64)
}

/// Exit code for runs that aborted before a sound global count existed,
/// e.g. a fault inside a collective. Kept outside the plausible count range
/// of a small suite.
pub const ABORT_EXIT_CODE: i32 = 120;

/// Process exit code for the whole group: the global fault count itself,
/// identical on every member. Zero means full success.
pub fn exit_status(global: i64) -> i32 {
    i32::try_from(global).unwrap_or(i32::MAX)
}

/// Renders the run report. Only the leader produces output; requested
/// verbosity is forced to zero everywhere else.
pub struct Reporter {
    is_leader: bool,
    verbosity: u8,
}

impl Reporter {
    pub fn new(is_leader: bool, verbosity: u8) -> Self {
        Self {
            is_leader,
            verbosity: if is_leader { verbosity } else { 0 },
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Banner printed before the suite runs. Leader only.
    pub fn banner(&self, suite: &str) -> String {
        if !self.is_leader {
            return String::new();
        }
        let title = format!("Testing {suite}");
        let rule = "*".repeat(title.len());
        format!("\n{rule}\n{title}\n{rule}\n")
    }

    /// Full report for a finished run. Empty off-leader.
    pub fn render(&self, summary: &RunSummary, global: i64) -> String {
        if !self.is_leader {
            return String::new();
        }

        let mut out = String::new();

        if self.verbosity >= 1 {
            for outcome in &summary.outcomes {
                let _ = writeln!(out, "{outcome}");
            }
            let _ = writeln!(
                out,
                "Total: {} | Pass: {} | Fail: {} | Error: {} | Skip: {} [{}ms]",
                summary.total,
                summary.passed,
                summary.failed,
                summary.errored,
                summary.skipped,
                summary.total_duration_ms
            );
        }

        // The verdict line is never silenced by verbosity: a failing run
        // always says so on the leader, a clean run always gets its banner.
        if global == 0 {
            let _ = writeln!(out, "End Result: TEST PASSED");
        } else {
            let _ = writeln!(out, "Group failures+errors: {global}");
        }

        out
    }

    pub fn print(&self, summary: &RunSummary, global: i64) {
        let rendered = self.render(summary, global);
        if !rendered.is_empty() {
            print!("{rendered}");
        }
    }

    pub fn print_banner(&self, suite: &str) {
        let banner = self.banner(suite);
        if !banner.is_empty() {
            print!("{banner}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SoloGroup;
    use crate::models::Outcome;

    /// Pretends to be one member of a three-member group in which the two
    /// remote members contribute a fixed fault count.
    struct RemoteFaults(i64);

    impl ProcessGroup for RemoteFaults {
        fn rank(&self) -> usize {
            0
        }

        fn size(&self) -> usize {
            3
        }

        fn barrier(&self) -> Result<(), GroupError> {
            Ok(())
        }

        fn sum_all(&self, local: i64) -> Result<i64, GroupError> {
            Ok(local + self.0)
        }
    }

    fn sample_outcomes() -> Vec<Outcome> {
        vec![
            Outcome::passed("version", 1),
            Outcome::failed("display", 2, "expected a, got b"),
            Outcome::errored("ctor", 0, "boom"),
            Outcome::skipped("jambo", "capability absent"),
        ]
    }

    #[test]
    fn local_counts_ignore_pass_and_skip() {
        let (failed, errored) = local_counts(&sample_outcomes());
        assert_eq!(failed, 1);
        assert_eq!(errored, 1);
    }

    #[test]
    fn reduce_is_a_single_sum() {
        let group = SoloGroup::new();
        assert_eq!(reduce(&group, 1, 1).unwrap(), 2);
        assert_eq!(reduce(&group, 0, 0).unwrap(), 0);
    }

    #[test]
    fn faulty_rank_raises_everyone_elses_verdict() {
        // One member with 1 fail + 1 error, two clean members.
        let clean_member = RemoteFaults(2);
        assert_eq!(reduce(&clean_member, 0, 0).unwrap(), 2);
        let faulty_member = RemoteFaults(0);
        assert_eq!(reduce(&faulty_member, 1, 1).unwrap(), 2);
    }

    #[test]
    fn exit_status_is_the_count() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(2), 2);
        assert_eq!(exit_status(17), 17);
    }

    #[test]
    fn non_leader_is_forced_silent() {
        let reporter = Reporter::new(false, 5);
        assert_eq!(reporter.verbosity(), 0);
        assert!(reporter.banner("New_Package").is_empty());
        let summary = RunSummary::new("newpack", sample_outcomes());
        assert!(reporter.render(&summary, 0).is_empty());
    }

    #[test]
    fn leader_banner_frames_the_suite_name() {
        let reporter = Reporter::new(true, 2);
        let banner = reporter.banner("New_Package");
        assert!(banner.contains("Testing New_Package"));
        assert!(banner.contains("*******************"));
    }

    #[test]
    fn passed_line_only_when_global_is_zero() {
        let reporter = Reporter::new(true, 2);
        let clean = RunSummary::new("newpack", vec![Outcome::passed("version", 1)]);
        assert!(reporter.render(&clean, 0).contains("End Result: TEST PASSED"));

        let summary = RunSummary::new("newpack", sample_outcomes());
        let report = reporter.render(&summary, 2);
        assert!(!report.contains("End Result: TEST PASSED"));
        assert!(report.contains("display"));
        assert!(report.contains("Group failures+errors: 2"));
    }

    #[test]
    fn verbosity_zero_keeps_only_the_verdict() {
        let reporter = Reporter::new(true, 0);
        let clean = RunSummary::new("newpack", vec![Outcome::passed("version", 1)]);
        let report = reporter.render(&clean, 0);
        assert_eq!(report, "End Result: TEST PASSED\n");
    }

    #[test]
    fn silent_leader_still_reports_a_failing_run() {
        let reporter = Reporter::new(true, 0);
        let summary = RunSummary::new("newpack", sample_outcomes());
        let report = reporter.render(&summary, 2);
        assert_eq!(report, "Group failures+errors: 2\n");
    }
}
