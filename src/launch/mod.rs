//! Local group launcher
//!
//! Re-execs the current binary once per rank with the group wiring passed
//! through `LOCKSTEP_*` environment variables, then waits for all members.
//! After the reduction every member exits with the same verdict code, so
//! the launcher simply propagates it (taking the maximum if a member dies
//! abnormally and the codes ever disagree).

use std::env;
use std::net::TcpListener;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::cli::Args;
use crate::config;
use crate::report::ABORT_EXIT_CODE;

/// Spawn `procs` members and wait for the shared verdict.
pub fn launch(procs: usize, args: &Args) -> Result<i32> {
    if procs == 0 {
        bail!("--procs must be at least 1");
    }

    let exe = env::current_exe().context("could not locate the harness binary")?;
    let leader_addr = reserve_leader_addr()?;

    info!("launching {procs} member(s), leader at {leader_addr}");

    let mut children = Vec::with_capacity(procs);
    for rank in 0..procs {
        let mut cmd = Command::new(&exe);
        cmd.env(config::ENV_RANK, rank.to_string())
            .env(config::ENV_SIZE, procs.to_string())
            .env(config::ENV_LEADER, &leader_addr)
            .args(member_args(args));
        if rank != 0 {
            // Non-leaders report nothing; keep their stdout closed anyway.
            cmd.stdout(Stdio::null());
        }
        let child = cmd
            .spawn()
            .with_context(|| format!("could not spawn member rank {rank}"))?;
        children.push((rank, child));
    }

    let mut verdict = 0;
    for (rank, mut child) in children {
        let status = child.wait()?;
        let code = match status.code() {
            Some(code) => code,
            None => {
                warn!("member rank {rank} was killed by a signal");
                ABORT_EXIT_CODE
            }
        };
        if code != 0 {
            info!("member rank {rank} exited with {code}");
        }
        verdict = verdict.max(code);
    }

    Ok(verdict)
}

/// Arguments forwarded to every member. The wiring itself travels in the
/// environment; only the report settings ride the command line.
fn member_args(args: &Args) -> Vec<String> {
    vec![
        "--verbosity".to_string(),
        args.verbosity.to_string(),
        "--connect-timeout".to_string(),
        args.connect_timeout.to_string(),
    ]
}

/// Reserve an ephemeral loopback port for the leader by binding and
/// dropping a listener. A tiny window exists before the leader rebinds it;
/// acceptable for a local launcher.
fn reserve_leader_addr() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    Ok(addr.to_string())
}
