//! Shell registry: the closed set of supported dialects and their file conventions.
//!
//! The registry is an explicitly constructed value handed to every component
//! that needs shell metadata; nothing here is process-global.
pub mod detect;
pub mod layout;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ShellError;

/// A supported shell dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShellKind {
    /// GNU Bash.
    Bash,
    /// Z shell.
    Zsh,
    /// The friendly interactive shell.
    Fish,
    /// PowerShell (Windows PowerShell and `pwsh`).
    PowerShell,
    /// Plain POSIX `sh` (dash, busybox ash, ...).
    Posix,
}

impl ShellKind {
    /// Every dialect, in registry order.
    pub const ALL: [Self; 5] = [
        Self::Bash,
        Self::Zsh,
        Self::Fish,
        Self::PowerShell,
        Self::Posix,
    ];

    /// Canonical lowercase name used on disk and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::PowerShell => "powershell",
            Self::Posix => "posix",
        }
    }

    /// Executable names that run this dialect, in lookup order.
    #[must_use]
    pub const fn executables(self) -> &'static [&'static str] {
        match self {
            Self::Bash => &["bash"],
            Self::Zsh => &["zsh"],
            Self::Fish => &["fish"],
            Self::PowerShell => &["pwsh", "powershell"],
            Self::Posix => &["sh"],
        }
    }

    /// Whether any of [`executables`](Self::executables) is on `PATH`.
    #[must_use]
    pub fn is_installed(self) -> bool {
        self.executables().iter().any(|exe| which::which(exe).is_ok())
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShellKind {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ShellError::Unsupported(s.to_string()))
    }
}

/// Placeholder profile path resolved from the `PROFILE` environment variable.
pub const POWERSHELL_PROFILE_VAR: &str = "$PROFILE";

/// Static per-shell file conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Which dialect this record describes.
    pub kind: ShellKind,
    /// Default profile file, `~/`-relative or [`POWERSHELL_PROFILE_VAR`].
    pub profile_path: &'static str,
    /// Extension of feature files, including the dot.
    pub extension: &'static str,
    /// File name of the generated init script.
    pub init_script: &'static str,
}

impl ShellConfig {
    /// Canonical shell name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Resolve the profile path against the current environment.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::NoHome`] if the home directory is unknown and the
    /// path needs it.
    pub fn resolve_profile(&self) -> Result<PathBuf, ShellError> {
        let ps_profile = std::env::var_os("PROFILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        if self.profile_path == POWERSHELL_PROFILE_VAR
            && let Some(path) = ps_profile
        {
            return Ok(path);
        }
        let home = crate::platform::home_dir()?;
        Ok(self.profile_in(&home, None))
    }

    /// Resolve the profile path against an explicit home directory.
    ///
    /// `ps_profile` stands in for the `PROFILE` environment variable.
    #[must_use]
    pub fn profile_in(&self, home: &Path, ps_profile: Option<&Path>) -> PathBuf {
        if self.profile_path == POWERSHELL_PROFILE_VAR {
            return ps_profile.map_or_else(
                || {
                    home.join("Documents")
                        .join("PowerShell")
                        .join("Microsoft.PowerShell_profile.ps1")
                },
                Path::to_path_buf,
            );
        }
        self.profile_path
            .strip_prefix("~/")
            .map_or_else(|| PathBuf::from(self.profile_path), |rest| home.join(rest))
    }
}

/// The table of supported shells.
#[derive(Debug, Clone)]
pub struct ShellRegistry {
    shells: Vec<ShellConfig>,
}

impl ShellRegistry {
    /// The five stock dialects.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            shells: vec![
                ShellConfig {
                    kind: ShellKind::Bash,
                    profile_path: "~/.bashrc",
                    extension: ".sh",
                    init_script: "init.sh",
                },
                ShellConfig {
                    kind: ShellKind::Zsh,
                    profile_path: "~/.zshrc",
                    extension: ".zsh",
                    init_script: "init.zsh",
                },
                ShellConfig {
                    kind: ShellKind::Fish,
                    profile_path: "~/.config/fish/config.fish",
                    extension: ".fish",
                    init_script: "init.fish",
                },
                ShellConfig {
                    kind: ShellKind::PowerShell,
                    profile_path: POWERSHELL_PROFILE_VAR,
                    extension: ".ps1",
                    init_script: "init.ps1",
                },
                ShellConfig {
                    kind: ShellKind::Posix,
                    profile_path: "~/.profile",
                    extension: ".sh",
                    init_script: "init.sh",
                },
            ],
        }
    }

    /// Look up a shell by name.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Unsupported`] for names the registry does not know.
    pub fn get(&self, name: &str) -> Result<&ShellConfig, ShellError> {
        self.shells
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ShellError::Unsupported(name.to_string()))
    }

    /// Look up a shell by kind.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Unsupported`] if the registry was built without it.
    pub fn lookup(&self, kind: ShellKind) -> Result<&ShellConfig, ShellError> {
        self.get(kind.name())
    }

    /// Whether `name` is a registered shell.
    #[must_use]
    pub fn is_supported(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Registered shell names in registry order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.shells.iter().map(ShellConfig::name).collect()
    }

    /// Iterate over every registered shell.
    pub fn iter(&self) -> impl Iterator<Item = &ShellConfig> {
        self.shells.iter()
    }
}
