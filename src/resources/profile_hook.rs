//! Marker-delimited hook block inside a user's shell profile.
//!
//! The block sources the generated init script. Everything outside the
//! markers belongs to the user and is preserved byte for byte.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::shell::ShellKind;

/// First line of the main hook block.
pub const HOOK_START: &str = "# >>> oh-my-dot shell >>>";
/// Last line of the main hook block.
pub const HOOK_END: &str = "# <<< oh-my-dot shell <<<";
/// First line of the bash login shim in `~/.bash_profile`.
pub const LOGIN_SHIM_START: &str = "# >>> oh-my-dot bash login >>>";
/// Last line of the bash login shim.
pub const LOGIN_SHIM_END: &str = "# <<< oh-my-dot bash login <<<";

/// Render `path` for a double-quoted string in `kind`'s syntax, using
/// `$HOME` for the home prefix.
fn quoted_path(kind: ShellKind, path: &Path, home: Option<&Path>) -> String {
    let escape = |s: &str| -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match (kind, c) {
                (ShellKind::PowerShell, '"' | '$' | '`') => {
                    out.push('`');
                    out.push(c);
                }
                (ShellKind::PowerShell, _) => out.push(c),
                (ShellKind::Fish, '"' | '$' | '\\') => {
                    out.push('\\');
                    out.push(c);
                }
                (_, '"' | '$' | '\\' | '`') => {
                    out.push('\\');
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        out
    };
    let to_slashes = |p: &Path| p.to_string_lossy().replace('\\', "/");

    if let Some(rest) = home.and_then(|h| path.strip_prefix(h).ok()) {
        let rest = to_slashes(rest);
        if rest.is_empty() {
            return "$HOME".to_string();
        }
        return format!("$HOME/{}", escape(&rest));
    }
    let rendered = if kind == ShellKind::PowerShell {
        path.to_string_lossy().into_owned()
    } else {
        to_slashes(path)
    };
    escape(&rendered)
}

/// The hook block that sources `init_script` from `kind`'s profile.
///
/// The POSIX block also sets `OMD_SHELL_ROOT`, since a sourced POSIX
/// script cannot discover its own location.
#[must_use]
pub fn hook_block(kind: ShellKind, init_script: &Path, home: Option<&Path>) -> String {
    let init = quoted_path(kind, init_script, home);
    let body = match kind {
        ShellKind::Bash => format!("if [ -r \"{init}\" ]; then\n  . \"{init}\"\nfi"),
        ShellKind::Zsh => format!("if [ -r \"{init}\" ]; then\n  source \"{init}\"\nfi"),
        ShellKind::Fish => format!("if test -r \"{init}\"\n  source \"{init}\"\nend"),
        ShellKind::PowerShell => {
            format!("$omdInit = \"{init}\"\nif (Test-Path $omdInit) {{\n  . $omdInit\n}}")
        }
        ShellKind::Posix => {
            let root = init_script
                .parent()
                .map_or_else(String::new, |dir| quoted_path(kind, dir, home));
            format!(
                "if [ -r \"{init}\" ]; then\n  OMD_SHELL_ROOT=\"{root}\"\n  . \"{init}\"\nfi"
            )
        }
    };
    format!("{HOOK_START}\n{body}\n{HOOK_END}")
}

/// The `~/.bash_profile` shim that sources `~/.bashrc` in login shells.
#[must_use]
pub fn login_shim_block(bashrc: &Path, home: Option<&Path>) -> String {
    let rc = quoted_path(ShellKind::Bash, bashrc, home);
    format!("{LOGIN_SHIM_START}\nif [ -r \"{rc}\" ]; then\n  . \"{rc}\"\nfi\n{LOGIN_SHIM_END}")
}

/// Whether any line of `content` is exactly `start` (ignoring surrounding whitespace).
#[must_use]
pub fn has_block(content: &str, start: &str) -> bool {
    content.lines().any(|l| l.trim() == start)
}

/// Append `block` to `content`, separated by a blank line.
#[must_use]
pub fn append_block(content: &str, block: &str) -> String {
    if content.is_empty() {
        format!("{block}\n")
    } else if content.ends_with('\n') {
        format!("{content}\n{block}\n")
    } else {
        format!("{content}\n\n{block}\n")
    }
}

/// Drop every line from `start` through `end` inclusive, along with the
/// blank separator line [`append_block`] put before `start`.
///
/// Returns `None` when `content` has no `start` line.
#[must_use]
pub fn strip_block(content: &str, start: &str, end: &str) -> Option<String> {
    let mut found = false;
    let mut inside = false;
    let mut kept: Vec<&str> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == start {
            if kept.last().is_some_and(|l| l.trim().is_empty()) {
                kept.pop();
            }
            found = true;
            inside = true;
        } else if inside && trimmed == end {
            inside = false;
        } else if !inside {
            kept.push(line);
        }
    }
    if !found {
        return None;
    }
    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Some(out)
}

/// Whether `.bash_profile` content already reaches `.bashrc`.
#[must_use]
pub fn sources_bashrc(content: &str) -> bool {
    content.lines().map(str::trim).any(|line| {
        line == LOGIN_SHIM_START
            || (!line.starts_with('#')
                && line.contains(".bashrc")
                && (line.contains("source") || line.contains(". ")))
    })
}

/// A hook block that should be present in (or absent from) one file.
#[derive(Debug, Clone)]
pub struct ProfileHookResource {
    /// Profile file that carries the block.
    pub profile: PathBuf,
    /// Full block text, markers included.
    pub block: String,
    start: &'static str,
    end: &'static str,
}

impl ProfileHookResource {
    /// The main hook for `kind` in `profile`.
    #[must_use]
    pub fn shell_hook(kind: ShellKind, profile: PathBuf, init_script: &Path, home: Option<&Path>) -> Self {
        Self {
            profile,
            block: hook_block(kind, init_script, home),
            start: HOOK_START,
            end: HOOK_END,
        }
    }

    /// The bash login shim in `bash_profile` sourcing `bashrc`.
    #[must_use]
    pub fn login_shim(bash_profile: PathBuf, bashrc: &Path, home: Option<&Path>) -> Self {
        Self {
            profile: bash_profile,
            block: login_shim_block(bashrc, home),
            start: LOGIN_SHIM_START,
            end: LOGIN_SHIM_END,
        }
    }

    fn read_profile(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.profile) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read profile: {}", self.profile.display())),
        }
    }

    fn write_profile(&self, content: &str) -> Result<()> {
        super::fs::write_atomic(&self.profile, content.as_bytes())
            .with_context(|| format!("write profile: {}", self.profile.display()))
    }
}

impl Applicable for ProfileHookResource {
    fn description(&self) -> String {
        format!("hook in {}", self.profile.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let existing = self.read_profile()?.unwrap_or_default();
        if has_block(&existing, self.start) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        self.write_profile(&append_block(&existing, &self.block))?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        let Some(existing) = self.read_profile()? else {
            return Ok(ResourceChange::AlreadyCorrect);
        };
        match strip_block(&existing, self.start, self.end) {
            Some(stripped) => {
                self.write_profile(&stripped)?;
                Ok(ResourceChange::Applied)
            }
            None => Ok(ResourceChange::AlreadyCorrect),
        }
    }
}

impl Resource for ProfileHookResource {
    fn current_state(&self) -> Result<ResourceState> {
        match self.read_profile()? {
            Some(content) if has_block(&content, self.start) => Ok(ResourceState::Correct),
            _ => Ok(ResourceState::Missing),
        }
    }
}
