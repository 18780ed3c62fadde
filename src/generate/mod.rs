//! Init-script generation: strategy categorization and one backend per dialect.
//!
//! Generation is a pure function of the merged manifest: the same input
//! always renders byte-identical text, and nothing touches the filesystem
//! until the whole script has been rendered.
mod bash;
mod fish;
mod posix;
mod powershell;
mod zsh;

pub use bash::BashGenerator;
pub use fish::FishGenerator;
pub use posix::PosixGenerator;
pub use powershell::PowerShellGenerator;
pub use zsh::ZshGenerator;

use std::fmt;

use crate::manifest::Strategy;
use crate::manifest::merge::MergedManifest;
use crate::shell::ShellKind;

/// Enabled features grouped by load strategy, in merged-manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeaturesByStrategy {
    /// Features sourced at startup.
    pub eager: Vec<String>,
    /// Features sourced in the background once interactive.
    pub defer: Vec<String>,
    /// Features sourced on first use, with their trigger commands.
    pub on_command: Vec<(String, Vec<String>)>,
}

impl FeaturesByStrategy {
    /// Whether no feature will be loaded at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.eager.is_empty() && self.defer.is_empty() && self.on_command.is_empty()
    }
}

/// Partition the enabled features of `merged` by effective strategy.
///
/// Disabled features are dropped entirely. An on-command feature without
/// trigger commands has nothing to hook and is dropped as well.
#[must_use]
pub fn categorize(merged: &MergedManifest) -> FeaturesByStrategy {
    let mut out = FeaturesByStrategy::default();
    for feature in merged.enabled_features() {
        match feature.effective_strategy() {
            Strategy::Eager => out.eager.push(feature.name.clone()),
            Strategy::Defer => out.defer.push(feature.name.clone()),
            Strategy::OnCommand if !feature.on_command.is_empty() => out
                .on_command
                .push((feature.name.clone(), feature.on_command.clone())),
            Strategy::OnCommand => {}
        }
    }
    out
}

/// Renders an init script for one dialect.
pub trait ScriptGenerator {
    /// Render the complete init script text.
    fn generate(&self, features: &FeaturesByStrategy) -> String;
}

/// The backend for `kind`.
#[must_use]
pub fn generator_for(kind: ShellKind) -> &'static dyn ScriptGenerator {
    match kind {
        ShellKind::Bash => &BashGenerator,
        ShellKind::Zsh => &ZshGenerator,
        ShellKind::Fish => &FishGenerator,
        ShellKind::PowerShell => &PowerShellGenerator,
        ShellKind::Posix => &PosixGenerator,
    }
}

/// Categorize `merged` and render it for `kind`.
#[must_use]
pub fn render(kind: ShellKind, merged: &MergedManifest) -> String {
    generator_for(kind).generate(&categorize(merged))
}

/// Name of the shared loader function for a multi-trigger feature.
///
/// `_` becomes `__` and `-` becomes `_2d`, so distinct feature names never
/// share a loader.
fn loader_name(feature: &str) -> String {
    let mut out = String::from("__omd_load_");
    for c in feature.chars() {
        match c {
            '_' => out.push_str("__"),
            '-' => out.push_str("_2d"),
            c => out.push(c),
        }
    }
    out
}

/// A trigger problem that makes part of an on-command feature unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerIssue {
    /// Some trigger commands cannot be wrapped and are left out.
    Unwrappable {
        /// Feature declaring the triggers.
        feature: String,
        /// Commands left out of the script.
        commands: Vec<String>,
    },
    /// No trigger can be wrapped, so the feature is never loaded.
    NoUsableTrigger {
        /// Feature left out of the script.
        feature: String,
        /// Its declared trigger commands.
        commands: Vec<String>,
    },
    /// A later feature wraps the same command, replacing the earlier wrapper.
    Shadowed {
        /// The contested trigger command.
        command: String,
        /// Feature whose wrapper is replaced.
        feature: String,
        /// Feature whose wrapper wins.
        by: String,
    },
}

impl fmt::Display for TriggerIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unwrappable { feature, commands } => write!(
                f,
                "feature '{feature}': skipping trigger command(s) {} that cannot be wrapped",
                commands.join(", ")
            ),
            Self::NoUsableTrigger { feature, commands } => write!(
                f,
                "feature '{feature}' will not load: none of its trigger commands ({}) can be wrapped",
                commands.join(", ")
            ),
            Self::Shadowed {
                command,
                feature,
                by,
            } => write!(
                f,
                "trigger command '{command}' of feature '{feature}' is replaced by feature '{by}'"
            ),
        }
    }
}

/// Trigger problems in `features` when rendered for `kind`, in manifest order.
#[must_use]
pub fn trigger_issues(kind: ShellKind, features: &FeaturesByStrategy) -> Vec<TriggerIssue> {
    let strict = kind == ShellKind::Posix;
    let mut issues = Vec::new();
    let mut owners: Vec<(&str, &str)> = Vec::new();
    for (feature, commands) in &features.on_command {
        let usable = usable_triggers(commands, strict);
        let skipped: Vec<String> = commands
            .iter()
            .filter(|c| !is_function_name(c, strict))
            .cloned()
            .collect();
        if usable.is_empty() {
            issues.push(TriggerIssue::NoUsableTrigger {
                feature: feature.clone(),
                commands: commands.clone(),
            });
            continue;
        }
        if !skipped.is_empty() {
            issues.push(TriggerIssue::Unwrappable {
                feature: feature.clone(),
                commands: skipped,
            });
        }
        for cmd in usable {
            match owners.iter_mut().find(|(c, _)| *c == cmd) {
                Some(owner) => {
                    issues.push(TriggerIssue::Shadowed {
                        command: cmd.to_string(),
                        feature: owner.1.to_string(),
                        by: feature.clone(),
                    });
                    owner.1 = feature.as_str();
                }
                None => owners.push((cmd, feature.as_str())),
            }
        }
    }
    issues
}

fn not_found_message(cmd: &str) -> String {
    format!("oh-my-dot: {cmd} command not found after loading feature")
}

fn missing_feature_message(feature: &str) -> String {
    format!("oh-my-dot: warning: feature '{feature}' not found")
}

/// Whether `cmd` can be defined as a wrapper function.
///
/// `strict_posix` limits names to `[A-Za-z_][A-Za-z0-9_]*`; otherwise a
/// leading digit and `-`, `.` or `+` after the first character are allowed.
#[must_use]
pub fn is_function_name(cmd: &str, strict_posix: bool) -> bool {
    let mut chars = cmd.chars();
    let first_ok = chars.next().is_some_and(|c| {
        c.is_ascii_alphabetic() || c == '_' || (!strict_posix && c.is_ascii_digit())
    });
    first_ok
        && chars.all(|c| {
            c.is_ascii_alphanumeric() || c == '_' || (!strict_posix && matches!(c, '-' | '.' | '+'))
        })
}

/// Trigger commands that can become function names, deduplicated.
fn usable_triggers(commands: &[String], strict_posix: bool) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(commands.len());
    for cmd in commands {
        if is_function_name(cmd, strict_posix) && !out.contains(&cmd.as_str()) {
            out.push(cmd);
        }
    }
    out
}

fn shell_header(shebang: Option<&str>, dialect: &str) -> String {
    let mut out = String::new();
    if let Some(interpreter) = shebang {
        out.push_str(&format!("#!/usr/bin/env {interpreter}\n"));
    }
    out.push_str(&format!(
        "# oh-my-dot shell framework - {dialect} init script\n# Auto-generated - do not edit manually\n\n"
    ));
    out
}

/// Prefix every non-empty line of `text` with `pad`.
fn indent(text: &str, pad: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                "\n".to_string()
            } else {
                format!("{pad}{l}\n")
            }
        })
        .collect()
}
