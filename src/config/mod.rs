//! Harness configuration
//!
//! Group wiring comes from CLI flags with `LOCKSTEP_*` environment
//! variables as the fallback; the launcher uses the environment channel to
//! hand each child its identity.

use std::env;

use anyhow::{bail, Result};

pub const ENV_RANK: &str = "LOCKSTEP_RANK";
pub const ENV_SIZE: &str = "LOCKSTEP_SIZE";
pub const ENV_LEADER: &str = "LOCKSTEP_LEADER";

/// Leader address used when nothing is configured.
pub const DEFAULT_LEADER_ADDR: &str = "127.0.0.1:7199";

/// Resolved group wiring for this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupConfig {
    pub rank: usize,
    pub size: usize,
    pub leader_addr: String,
}

/// Raw values read from the environment.
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    pub rank: Option<usize>,
    pub size: Option<usize>,
    pub leader_addr: Option<String>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self {
            rank: get_env_parse(ENV_RANK),
            size: get_env_parse(ENV_SIZE),
            leader_addr: env::var(ENV_LEADER).ok(),
        }
    }
}

/// Merge CLI flags over environment values into a validated `GroupConfig`.
/// A lone process with nothing configured is a group of one.
pub fn resolve_group(
    rank: Option<usize>,
    size: Option<usize>,
    leader: Option<String>,
    env: &EnvConfig,
) -> Result<GroupConfig> {
    let size = size.or(env.size).unwrap_or(1);
    let rank = rank.or(env.rank).unwrap_or(0);

    if size == 0 {
        bail!("group size must be at least 1");
    }
    if rank >= size {
        bail!("rank {rank} out of range for group of {size}");
    }

    let leader_addr = leader
        .or_else(|| env.leader_addr.clone())
        .unwrap_or_else(|| DEFAULT_LEADER_ADDR.to_string());

    Ok(GroupConfig {
        rank,
        size,
        leader_addr,
    })
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
