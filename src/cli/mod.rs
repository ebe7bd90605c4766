//! CLI argument parsing
//!
//! Defines the command-line interface using clap.

use clap::Parser;

/// Distributed lockstep test harness
///
/// Runs the bundled New_Package suite on every member of a process group
/// and exits with the group-wide count of failures plus errors.
#[derive(Parser, Debug)]
#[command(name = "lockstep")]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Run the same suite on every member of a process group")]
#[command(long_about = None)]
pub struct Args {
    /// Verbosity of the leader's report; 0 keeps only the final verdict
    #[arg(short, long, default_value = "2")]
    pub verbosity: u8,

    /// Rank of this process (falls back to LOCKSTEP_RANK)
    #[arg(long)]
    pub rank: Option<usize>,

    /// Group size (falls back to LOCKSTEP_SIZE)
    #[arg(long)]
    pub size: Option<usize>,

    /// Leader address for collective coordination, host:port
    /// (falls back to LOCKSTEP_LEADER)
    #[arg(long)]
    pub leader: Option<String>,

    /// Launch N member processes locally and wait for the shared verdict
    #[arg(long, conflicts_with_all = ["rank", "size", "leader"])]
    pub procs: Option<usize>,

    /// Seconds to keep retrying the connection to the leader
    #[arg(long, default_value = "30")]
    pub connect_timeout: u64,

    /// List the registered test cases and exit
    #[arg(long)]
    pub list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["lockstep"]);
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.rank, None);
        assert_eq!(args.size, None);
        assert_eq!(args.procs, None);
        assert!(!args.list);
    }

    #[test]
    fn member_flags() {
        let args = Args::parse_from([
            "lockstep",
            "--rank",
            "1",
            "--size",
            "3",
            "--leader",
            "127.0.0.1:7199",
            "--verbosity",
            "0",
        ]);
        assert_eq!(args.rank, Some(1));
        assert_eq!(args.size, Some(3));
        assert_eq!(args.leader.as_deref(), Some("127.0.0.1:7199"));
        assert_eq!(args.verbosity, 0);
    }

    #[test]
    fn launcher_mode_excludes_member_wiring() {
        let args = Args::parse_from(["lockstep", "--procs", "4"]);
        assert_eq!(args.procs, Some(4));

        let conflict = Args::try_parse_from(["lockstep", "--procs", "4", "--rank", "1"]);
        assert!(conflict.is_err());
    }
}
