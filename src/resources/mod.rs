//! Files oh-my-dot owns outside the manifests: generated init scripts and
//! profile hook blocks.
//!
//! Each one can report whether it is up to date, so regeneration and hook
//! installation only write when the content differs and dry runs can report
//! the difference without touching the disk.
pub mod fs;
pub mod init_script;
pub mod profile_hook;

use anyhow::Result;

/// A file oh-my-dot writes and can take back out.
pub trait Applicable {
    /// Label used in log lines and the run summary.
    fn description(&self) -> String;

    /// Write the desired content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    fn apply(&self) -> Result<ResourceChange>;

    /// Undo [`apply`](Self::apply); a no-op when nothing was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or deleted.
    fn remove(&self) -> Result<ResourceChange>;
}

/// How the file on disk compares with the content oh-my-dot would write.
///
/// # Examples
///
/// ```
/// use oh_my_dot::resources::ResourceState;
///
/// let stale = ResourceState::Incorrect { current: "content differs".into() };
/// assert_ne!(stale, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// The file does not exist, or the hook block is absent.
    Missing,
    /// Content matches.
    Correct,
    /// Content differs.
    Incorrect {
        /// What differs.
        current: String,
    },
    /// Something other than a regular file sits at the path.
    Invalid {
        /// Why it cannot be written.
        reason: String,
    },
}

/// Outcome of [`Applicable::apply`] or [`Applicable::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The file was written or deleted.
    Applied,
    /// Nothing to do.
    AlreadyCorrect,
    /// Left alone, for example in a dry run.
    Skipped {
        /// Why.
        reason: String,
    },
}

/// An [`Applicable`] that can inspect the disk first.
pub trait Resource: Applicable {
    /// Compare the file on disk with the desired content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn current_state(&self) -> Result<ResourceState>;

    /// Whether [`apply`](Applicable::apply) would write anything.
    ///
    /// An [`Invalid`](ResourceState::Invalid) path is not rewritten.
    ///
    /// # Errors
    ///
    /// Propagates [`current_state`](Self::current_state) errors.
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct FixedState(ResourceState);

    impl Applicable for FixedState {
        fn description(&self) -> String {
            "init.sh".to_string()
        }

        fn apply(&self) -> Result<ResourceChange> {
            Ok(ResourceChange::Applied)
        }

        fn remove(&self) -> Result<ResourceChange> {
            Ok(ResourceChange::AlreadyCorrect)
        }
    }

    impl Resource for FixedState {
        fn current_state(&self) -> Result<ResourceState> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn missing_and_stale_files_need_writing() {
        assert!(FixedState(ResourceState::Missing).needs_change().unwrap());
        let stale = ResourceState::Incorrect {
            current: "content differs".to_string(),
        };
        assert!(FixedState(stale).needs_change().unwrap());
    }

    #[test]
    fn matching_file_is_left_alone() {
        assert!(!FixedState(ResourceState::Correct).needs_change().unwrap());
    }

    #[test]
    fn directory_in_the_way_is_not_overwritten() {
        let blocked = ResourceState::Invalid {
            reason: "is a directory".to_string(),
        };
        assert!(!FixedState(blocked).needs_change().unwrap());
    }
}
