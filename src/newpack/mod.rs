//! New_Package collaborator
//!
//! The small greeting library the bundled suite exercises. It exposes the
//! capability set the harness expects from a collaborator: a version string
//! with a fixed prefix, a greeting object constructed from a process-group
//! handle whose rendering depends on rank and size, and an optional Swahili
//! variant behind the `swahili` cargo feature.

use std::fmt;

use crate::group::ProcessGroup;

const VERSION: &str = "New_Package Version 4.0";

/// Version string, always beginning with `"New_Package Version"`.
pub fn version() -> String {
    VERSION.to_string()
}

/// One-time capability probe for the optional Swahili greeting.
///
/// Compile-time, so every member of a group running the same binary
/// observes the same answer and registers the same suite.
pub fn has_swahili() -> bool {
    cfg!(feature = "swahili")
}

/// English greeting. Rank 0 renders an N-process banner first; every rank
/// renders its own identity line.
pub struct Hello {
    rank: usize,
    size: usize,
}

impl Hello {
    pub fn new(group: &dyn ProcessGroup) -> Self {
        Self {
            rank: group.rank(),
            size: group.size(),
        }
    }
}

impl fmt::Display for Hello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank == 0 {
            write!(
                f,
                "This will print out one line for each of the {} processes \n\n",
                self.size
            )?;
        }
        write!(f, "Hello.  I am process {}", self.rank)
    }
}

/// Swahili greeting, same shape as [`Hello`].
#[cfg(feature = "swahili")]
pub struct Jambo {
    rank: usize,
    size: usize,
}

#[cfg(feature = "swahili")]
impl Jambo {
    pub fn new(group: &dyn ProcessGroup) -> Self {
        Self {
            rank: group.rank(),
            size: group.size(),
        }
    }
}

#[cfg(feature = "swahili")]
impl fmt::Display for Jambo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank == 0 {
            write!(
                f,
                "This will print out one line for each of the {} processes \n\n",
                self.size
            )?;
        }
        write!(f, "Jambo.  I am process {}", self.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{GroupError, SoloGroup};

    struct FixedGroup {
        rank: usize,
        size: usize,
    }

    impl ProcessGroup for FixedGroup {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) -> Result<(), GroupError> {
            Ok(())
        }

        fn sum_all(&self, local: i64) -> Result<i64, GroupError> {
            Ok(local)
        }
    }

    #[test]
    fn version_has_fixed_prefix() {
        assert!(version().starts_with("New_Package Version"));
        assert_eq!(version(), "New_Package Version 4.0");
    }

    #[test]
    fn leader_greeting_carries_banner() {
        let hello = Hello::new(&SoloGroup::new());
        assert_eq!(
            hello.to_string(),
            "This will print out one line for each of the 1 processes \n\nHello.  I am process 0"
        );
    }

    #[test]
    fn follower_greeting_is_identity_only() {
        let group = FixedGroup { rank: 2, size: 4 };
        let hello = Hello::new(&group);
        assert_eq!(hello.to_string(), "Hello.  I am process 2");
    }

    #[cfg(feature = "swahili")]
    #[test]
    fn jambo_mirrors_hello() {
        let group = FixedGroup { rank: 1, size: 3 };
        let jambo = Jambo::new(&group);
        assert_eq!(jambo.to_string(), "Jambo.  I am process 1");
    }
}
