//! Core logging types: action entries, status, and the [`Log`] trait.

/// Outcome of one action (a shell regenerated, a hook installed, ...) for the summary.
#[derive(Debug, Clone)]
pub struct ActionEntry {
    /// Human-readable action name.
    pub name: String,
    /// Final status of the action.
    pub status: ActionStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// The action changed something on disk.
    Changed,
    /// Everything was already up to date.
    Unchanged,
    /// The action was skipped (e.g., shell not initialized).
    Skipped,
    /// Dry-run mode; the change was only reported.
    DryRun,
    /// The action failed.
    Failed,
}

/// Abstraction over logging backends.
///
/// Core code logs through `&dyn Log` so it does not care whether messages
/// reach the console, the log file, or a test capture.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an action result for the summary.
    fn record(&self, name: &str, status: ActionStatus, message: Option<&str>);
}
