//! Lockstep - distributed lockstep test harness
//!
//! Runs the bundled New_Package suite independently on every member of a
//! fixed process group, reduces the failure/error counts across the group,
//! and reports from rank 0 only. Every member exits with the same code:
//! the group-wide total of failed plus errored cases.
//!
//! ## Usage
//!
//! ```bash
//! # Run alone (a group of one)
//! lockstep
//!
//! # Launch a local 4-member group
//! lockstep --procs 4
//!
//! # Wire members by hand (e.g. across hosts)
//! lockstep --rank 0 --size 2 --leader 10.0.0.1:7199
//! lockstep --rank 1 --size 2 --leader 10.0.0.1:7199
//!
//! # List the registered cases
//! lockstep --list
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod group;
mod launch;
mod models;
mod newpack;
mod report;
mod runner;
mod suite;

use cli::Args;
use config::EnvConfig;
use group::{ProcessGroup, SoloGroup, TcpGroup};
use models::RunSummary;
use report::Reporter;
use runner::Runner;

fn main() {
    let args = Args::parse();

    if args.list {
        let registry = suite::build_registry();
        for (i, name) in registry.names().iter().enumerate() {
            println!("{:2}. {name}", i + 1);
        }
        return;
    }

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            // Collective faults and wiring errors have no sound global
            // count; abort with a code outside the count range.
            eprintln!("lockstep: {err:#}");
            report::ABORT_EXIT_CODE
        }
    };
    std::process::exit(code);
}

fn run(args: &Args) -> Result<i32> {
    if let Some(procs) = args.procs {
        init_tracing(true, args.verbosity);
        return launch::launch(procs, args);
    }

    let env = EnvConfig::load();
    let wiring = config::resolve_group(args.rank, args.size, args.leader.clone(), &env)?;
    init_tracing(wiring.rank == 0, args.verbosity);

    let group: Box<dyn ProcessGroup> = if wiring.size == 1 {
        Box::new(SoloGroup::new())
    } else {
        Box::new(TcpGroup::connect(
            wiring.rank,
            wiring.size,
            &wiring.leader_addr,
            Duration::from_secs(args.connect_timeout),
        )?)
    };

    run_suite(group.as_ref(), args.verbosity)
}

fn run_suite(group: &dyn ProcessGroup, verbosity: u8) -> Result<i32> {
    let reporter = Reporter::new(group.is_leader(), verbosity);
    reporter.print_banner(suite::SUITE_NAME);

    let runner = Runner::new(group, suite::build_registry());
    let outcomes = runner.run_all()?;

    let (failed, errored) = report::local_counts(&outcomes);
    // The run's single collective reduction.
    let global = report::reduce(group, failed, errored)?;

    let summary = RunSummary::new(suite::SUITE_NAME, outcomes);
    reporter.print(&summary, global);

    Ok(report::exit_status(global))
}

/// Logging goes to stderr so the leader's stdout report stays clean.
/// Non-leaders log warnings only, regardless of the requested verbosity.
fn init_tracing(is_leader: bool, verbosity: u8) {
    let level = if !is_leader {
        Level::WARN
    } else {
        match verbosity {
            0 => Level::WARN,
            1 | 2 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("lockstep={level}")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
