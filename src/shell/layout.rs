//! On-disk layout of the `omd-shells/` tree inside a dotfiles repository.
use std::path::{Path, PathBuf};

use super::ShellConfig;

/// Directory under the repository root holding every shell's files.
pub const SHELLS_DIR: &str = "omd-shells";
/// Shared library directory under [`SHELLS_DIR`].
pub const LIB_DIR: &str = "lib";
/// Tracked manifest file name.
pub const MANIFEST_FILE: &str = "enabled.json";
/// Untracked local override manifest file name.
pub const LOCAL_MANIFEST_FILE: &str = "enabled.local.json";
/// Per-shell directory holding feature files.
pub const FEATURES_DIR: &str = "features";

/// Contents of `omd-shells/lib/helpers.sh`, sourced by bash, zsh and POSIX init scripts.
pub const HELPERS_SH: &str = "#!/usr/bin/env sh
# oh-my-dot shell framework - helper functions
# Shared utilities for all shells

# Check if a command exists
omd_command_exists() {
    command -v \"$1\" >/dev/null 2>&1
}
";

/// Paths shared by all shells of one repository.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    /// Layout rooted at a dotfiles repository.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `omd-shells/`.
    #[must_use]
    pub fn shells_dir(&self) -> PathBuf {
        self.root.join(SHELLS_DIR)
    }

    /// `omd-shells/lib/helpers.sh`.
    #[must_use]
    pub fn helpers_path(&self) -> PathBuf {
        self.shells_dir().join(LIB_DIR).join("helpers.sh")
    }

    /// Paths for one shell.
    #[must_use]
    pub fn shell(&self, shell: &ShellConfig) -> ShellLayout {
        let dir = self.shells_dir().join(shell.name());
        ShellLayout {
            manifest: dir.join(MANIFEST_FILE),
            local_manifest: dir.join(LOCAL_MANIFEST_FILE),
            features_dir: dir.join(FEATURES_DIR),
            init_script: dir.join(shell.init_script),
            extension: shell.extension,
            dir,
        }
    }
}

/// Paths inside `omd-shells/<shell>/`.
#[derive(Debug, Clone)]
pub struct ShellLayout {
    /// `omd-shells/<shell>/`.
    pub dir: PathBuf,
    /// `enabled.json`.
    pub manifest: PathBuf,
    /// `enabled.local.json`.
    pub local_manifest: PathBuf,
    /// `features/`.
    pub features_dir: PathBuf,
    /// The generated init script.
    pub init_script: PathBuf,
    extension: &'static str,
}

impl ShellLayout {
    /// `features/<name><ext>`.
    #[must_use]
    pub fn feature_file(&self, name: &str) -> PathBuf {
        self.features_dir.join(format!("{name}{}", self.extension))
    }

    /// Whether the shell has been initialized (its manifest exists).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.manifest.is_file()
    }
}
