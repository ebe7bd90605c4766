//! The bundled New_Package suite
//!
//! Registers the checks the harness runs on every group member: the version
//! prefix, the Hello constructor and rendering, and the Swahili variants
//! when the capability probe says they exist. Gating happens here, once, at
//! suite-build time; a gated-off case is never registered, so its barriers
//! never run.

use crate::models::{expect_eq, expect_prefix};
use crate::newpack;
use crate::runner::{Registry, TestCase};

pub const SUITE_NAME: &str = "New_Package";

const VERSION_PREFIX: &str = "New_Package Version";

/// Expected greeting for a given rank and size. The single place this
/// string is computed; every display check goes through it.
pub fn expected_greeting(noun: &str, rank: usize, size: usize) -> String {
    let mut expected = String::new();
    if rank == 0 {
        expected.push_str(&format!(
            "This will print out one line for each of the {size} processes \n\n"
        ));
    }
    expected.push_str(&format!("{noun}.  I am process {rank}"));
    expected
}

/// Build the registered suite. Deterministic: every member of the group
/// running the same binary gets an identical registry.
pub fn build_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register(TestCase::new("version", |_cx| {
        expect_prefix(VERSION_PREFIX, newpack::version())
    }));

    registry.register(TestCase::new("hello_constructor", |cx| {
        // Constructing without a fault is the whole check.
        let _hello = newpack::Hello::new(cx.group);
        Ok(())
    }));

    registry.register(TestCase::new("hello_print", |cx| {
        let hello = newpack::Hello::new(cx.group);
        expect_eq(
            expected_greeting("Hello", cx.rank(), cx.size()),
            hello.to_string(),
        )
    }));

    if newpack::has_swahili() {
        register_swahili(&mut registry);
    }

    registry
}

#[cfg(feature = "swahili")]
fn register_swahili(registry: &mut Registry) {
    registry.register(TestCase::new("jambo_constructor", |cx| {
        let _jambo = newpack::Jambo::new(cx.group);
        Ok(())
    }));

    registry.register(TestCase::new("jambo_print", |cx| {
        let jambo = newpack::Jambo::new(cx.group);
        expect_eq(
            expected_greeting("Jambo", cx.rank(), cx.size()),
            jambo.to_string(),
        )
    }));
}

#[cfg(not(feature = "swahili"))]
fn register_swahili(_registry: &mut Registry) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SoloGroup;
    use crate::models::Status;
    use crate::report::local_counts;
    use crate::runner::Runner;

    #[test]
    fn greeting_is_parameterized_by_rank_and_size() {
        assert_eq!(
            expected_greeting("Hello", 0, 4),
            "This will print out one line for each of the 4 processes \n\nHello.  I am process 0"
        );
        assert_eq!(expected_greeting("Hello", 3, 4), "Hello.  I am process 3");
        assert_eq!(expected_greeting("Jambo", 1, 2), "Jambo.  I am process 1");
        // Banner appears for rank 0 at every group size.
        assert!(expected_greeting("Hello", 0, 1).starts_with("This will print out"));
    }

    #[test]
    fn gated_cases_track_the_probe() {
        let registry = build_registry();
        let names = registry.names();
        if newpack::has_swahili() {
            assert_eq!(names.len(), 5);
            assert!(names.contains(&"jambo_print"));
        } else {
            assert_eq!(names.len(), 3);
            assert!(!names.iter().any(|n| n.starts_with("jambo")));
        }
    }

    #[test]
    fn full_suite_passes_on_a_solo_group() {
        let group = SoloGroup::new();
        let runner = Runner::new(&group, build_registry());
        let outcomes = runner.run_all().unwrap();

        assert!(outcomes.iter().all(|o| o.status == Status::Passed));
        let (failed, errored) = local_counts(&outcomes);
        assert_eq!(failed + errored, 0);
    }

    #[test]
    fn suite_is_deterministic_across_runs() {
        let group = SoloGroup::new();
        let runner = Runner::new(&group, build_registry());

        let first: Vec<Status> = runner
            .run_all()
            .unwrap()
            .iter()
            .map(|o| o.status)
            .collect();
        let second: Vec<Status> = runner
            .run_all()
            .unwrap()
            .iter()
            .map(|o| o.status)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_greeting_fails_with_both_sides() {
        let group = SoloGroup::new();
        let mut registry = Registry::new();
        registry.register(TestCase::new("hello_print_mismatched", |cx| {
            let hello = newpack::Hello::new(cx.group);
            // Expect the Swahili noun from the English greeter.
            expect_eq(
                expected_greeting("Jambo", cx.rank(), cx.size()),
                hello.to_string(),
            )
        }));

        let runner = Runner::new(&group, registry);
        let outcomes = runner.run_all().unwrap();

        assert_eq!(outcomes[0].status, Status::Failed);
        let detail = outcomes[0].detail.as_deref().unwrap();
        assert!(detail.contains("Jambo"));
        assert!(detail.contains("Hello"));

        let (failed, errored) = local_counts(&outcomes);
        assert_eq!(failed + errored, 1);
    }
}
