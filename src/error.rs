//! Domain-specific error types for the oh-my-dot core.
//!
//! Core modules return typed errors (e.g. [`ManifestError`], [`TrustViolation`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator and attach the operation and path as context.
//!
//! # Error families
//!
//! ```text
//! ManifestError  feature validation, lookup, JSON parsing, manifest I/O
//! OptionError    feature option values checked against the catalog schema
//! ShellError     unknown shells, uninitialized shell directories
//! TrustViolation a local override file the trust policy refuses to read
//! ```

use thiserror::Error;

/// Errors that arise from the feature manifest model.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A feature entry has an empty name.
    #[error("feature name cannot be empty")]
    EmptyName,

    /// A feature name contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid feature name '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidName(String),

    /// A strategy string is not one of `eager`, `defer`, `on-command`.
    #[error("invalid strategy '{strategy}' for feature '{name}': must be one of eager, defer, on-command")]
    InvalidStrategy {
        /// Feature carrying the bad strategy.
        name: String,
        /// The rejected strategy string.
        strategy: String,
    },

    /// An `on-command` feature lists no trigger commands.
    #[error("feature '{0}' uses the on-command strategy but lists no trigger commands")]
    MissingTriggerCommands(String),

    /// A feature with the same name is already present.
    #[error("feature '{0}' already exists")]
    DuplicateFeature(String),

    /// The named feature is not present in the manifest.
    #[error("feature '{0}' not found")]
    FeatureNotFound(String),

    /// An entry inside a parsed manifest failed validation.
    #[error("invalid feature at index {index}: {source}")]
    InvalidFeature {
        /// Zero-based position of the entry in the `features` array.
        index: usize,
        /// The validation failure for that entry.
        source: Box<Self>,
    },

    /// The manifest is not well-formed JSON or does not match the schema.
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing a manifest file failed.
    #[error("IO error on manifest {path}: {source}")]
    Io {
        /// Path to the manifest file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise when a feature option value is checked against its schema.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionError {
    /// The feature's catalog entry declares no option with this name.
    #[error("unknown option '{name}' for feature '{feature}'")]
    Unknown {
        /// Feature the option was supplied for.
        feature: String,
        /// The unrecognised option name.
        name: String,
    },

    /// A required option has no value and no default.
    #[error("option '{0}' is required")]
    Required(String),

    /// A string value is longer than allowed.
    #[error("option '{name}' exceeds {max} characters")]
    TooLong {
        /// Option name.
        name: String,
        /// Maximum accepted length.
        max: usize,
    },

    /// A string value contains shell metacharacters or traversal sequences.
    #[error("option '{name}' contains forbidden {what}")]
    Forbidden {
        /// Option name.
        name: String,
        /// What was found (e.g. `command substitution`).
        what: &'static str,
    },

    /// The value does not have the declared type.
    #[error("option '{name}' must be {expected}, got '{value}'")]
    WrongType {
        /// Option name.
        name: String,
        /// Human-readable expected type.
        expected: &'static str,
        /// The rejected value as written.
        value: String,
    },

    /// An integer lies outside the declared bounds.
    #[error("option '{name}' value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Option name.
        name: String,
        /// The rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// An enum value is not one of the declared choices.
    #[error("option '{name}' must be one of: {choices}")]
    NotAChoice {
        /// Option name.
        name: String,
        /// Comma-separated list of accepted values.
        choices: String,
    },

    /// A path value must exist but does not.
    #[error("option '{name}' path does not exist: {path}")]
    PathMissing {
        /// Option name.
        name: String,
        /// The expanded path.
        path: String,
    },

    /// A path value resolves outside the home directory while restricted.
    #[error("option '{name}' path is outside the home directory: {path}")]
    OutsideHome {
        /// Option name.
        name: String,
        /// The expanded path.
        path: String,
    },
}

/// Errors that arise from shell registry lookups and shell directories.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    /// The shell name is not in the registry.
    #[error("unsupported shell '{0}': must be one of bash, zsh, fish, powershell, posix")]
    Unsupported(String),

    /// The shell has no `enabled.json` in the repository yet.
    #[error("shell '{0}' is not initialized")]
    NotInitialized(String),

    /// Neither `HOME` nor `USERPROFILE` is set.
    #[error("could not determine the home directory")]
    NoHome,
}

/// Reasons a local override file is refused by the trust policy.
///
/// The display strings are surfaced verbatim to operators in warnings.
#[derive(Error, Debug)]
pub enum TrustViolation {
    /// The path is a symlink, directory, device, or other non-regular file.
    #[error("not a regular file (possibly a symlink)")]
    NotRegularFile,

    /// The file belongs to another user.
    #[error("file not owned by current user (uid {owner} != {current})")]
    NotOwned {
        /// Owner uid of the file.
        owner: u32,
        /// Effective uid of this process.
        current: u32,
    },

    /// Group or other may write to the file.
    #[error("file is group or world writable (permissions: {mode:o})")]
    Writable {
        /// Permission bits of the file.
        mode: u32,
    },

    /// The file was replaced between the metadata check and the read.
    #[error("file changed while it was being verified")]
    Replaced,

    /// The platform offers no ownership check this policy can perform.
    #[error("file ownership and permissions cannot be verified on this platform")]
    Unverifiable,

    /// The file could not be inspected or read.
    #[error("cannot inspect file: {0}")]
    Inaccessible(#[from] std::io::Error),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn manifest_error_invalid_strategy_display() {
        let e = ManifestError::InvalidStrategy {
            name: "git-prompt".to_string(),
            strategy: "lazy".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid strategy 'lazy' for feature 'git-prompt': must be one of eager, defer, on-command"
        );
    }

    #[test]
    fn manifest_error_invalid_feature_has_source() {
        use std::error::Error as StdError;
        let e = ManifestError::InvalidFeature {
            index: 2,
            source: Box::new(ManifestError::EmptyName),
        };
        assert_eq!(
            e.to_string(),
            "invalid feature at index 2: feature name cannot be empty"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn manifest_error_io_display() {
        let e = ManifestError::Io {
            path: "/repo/omd-shells/bash/enabled.json".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/repo/omd-shells/bash/enabled.json"));
    }

    #[test]
    fn trust_violation_operator_strings() {
        assert_eq!(
            TrustViolation::NotRegularFile.to_string(),
            "not a regular file (possibly a symlink)"
        );
        assert_eq!(
            TrustViolation::NotOwned {
                owner: 0,
                current: 1000
            }
            .to_string(),
            "file not owned by current user (uid 0 != 1000)"
        );
        assert_eq!(
            TrustViolation::Writable { mode: 0o666 }.to_string(),
            "file is group or world writable (permissions: 666)"
        );
    }

    #[test]
    fn shell_error_unsupported_display() {
        let e = ShellError::Unsupported("tcsh".to_string());
        assert!(e.to_string().starts_with("unsupported shell 'tcsh'"));
    }

    #[test]
    fn option_error_out_of_range_display() {
        let e = OptionError::OutOfRange {
            name: "depth".to_string(),
            value: 12,
            min: 1,
            max: 10,
        };
        assert_eq!(e.to_string(), "option 'depth' value 12 is out of range [1, 10]");
    }
}
