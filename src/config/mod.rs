//! User configuration (`config.toml`) and repository root resolution.
pub mod toml_loader;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::shell::layout::SHELLS_DIR;

/// Environment variable naming the dotfiles repository.
pub const REPO_PATH_ENV: &str = "OMD_REPO_PATH";

/// Settings read from `$XDG_CONFIG_HOME/oh-my-dot/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Dotfiles repository root; `~/` expands to the home directory.
    pub repo_path: Option<String>,
    /// Reject path-typed feature options that resolve outside `$HOME`.
    pub restrict_paths_to_home: bool,
}

impl UserConfig {
    /// Load the config file at its default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        toml_loader::load_config(path).with_context(|| format!("loading {}", path.display()))
    }

    /// `repo_path` with `~/` expanded.
    #[must_use]
    pub fn repo_path(&self, home: Option<&Path>) -> Option<PathBuf> {
        self.repo_path.as_deref().map(|p| expand_tilde(p, home))
    }
}

/// `$XDG_CONFIG_HOME/oh-my-dot/config.toml`, falling back to `~/.config`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| crate::platform::home_dir().ok().map(|h| h.join(".config")))?;
    Some(base.join("oh-my-dot").join("config.toml"))
}

fn expand_tilde(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map_or_else(|| PathBuf::from(path), Path::to_path_buf),
        _ => PathBuf::from(path),
    }
}

/// Where the repository root was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    /// `--root`.
    Flag,
    /// [`REPO_PATH_ENV`].
    Env,
    /// `repo_path` in `config.toml`.
    Config,
    /// The working directory or one of its ancestors contains `omd-shells/`.
    WorkingDir,
}

/// Pick the repository root: flag, environment, config, then the nearest
/// directory from `cwd` upwards that contains `omd-shells/`.
///
/// # Errors
///
/// Returns an error when no candidate applies.
pub fn resolve_root(
    flag: Option<&Path>,
    env: Option<&str>,
    config: &UserConfig,
    home: Option<&Path>,
    cwd: &Path,
) -> Result<(PathBuf, RootSource)> {
    if let Some(path) = flag {
        return Ok((path.to_path_buf(), RootSource::Flag));
    }
    if let Some(path) = env.filter(|s| !s.is_empty()) {
        return Ok((expand_tilde(path, home), RootSource::Env));
    }
    if let Some(path) = config.repo_path(home) {
        return Ok((path, RootSource::Config));
    }
    if let Some(dir) = cwd.ancestors().find(|d| d.join(SHELLS_DIR).is_dir()) {
        return Ok((dir.to_path_buf(), RootSource::WorkingDir));
    }
    bail!(
        "no dotfiles repository found: pass --root, set {REPO_PATH_ENV}, set repo_path in config.toml, or run inside a repository containing {SHELLS_DIR}/"
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn config_keys_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "repo_path = \"~/dotfiles\"\nrestrict_paths_to_home = true\n",
        )
        .unwrap();
        let cfg = UserConfig::load_from(&path).unwrap();
        assert!(cfg.restrict_paths_to_home);
        assert_eq!(
            cfg.repo_path(Some(Path::new("/home/ada"))),
            Some(PathBuf::from("/home/ada/dotfiles"))
        );
    }

    #[test]
    fn missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            UserConfig::load_from(&dir.path().join("none.toml")).unwrap(),
            UserConfig::default()
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "repo = \"x\"\n").unwrap();
        assert!(UserConfig::load_from(&path).is_err());
    }

    #[test]
    fn flag_beats_env_beats_config() {
        let cfg = UserConfig {
            repo_path: Some("/from/config".to_string()),
            ..UserConfig::default()
        };
        let cwd = Path::new("/nowhere");
        let (root, src) =
            resolve_root(Some(Path::new("/from/flag")), Some("/from/env"), &cfg, None, cwd).unwrap();
        assert_eq!((root.as_path(), src), (Path::new("/from/flag"), RootSource::Flag));
        let (root, src) = resolve_root(None, Some("/from/env"), &cfg, None, cwd).unwrap();
        assert_eq!((root.as_path(), src), (Path::new("/from/env"), RootSource::Env));
        let (root, src) = resolve_root(None, Some(""), &cfg, None, cwd).unwrap();
        assert_eq!((root.as_path(), src), (Path::new("/from/config"), RootSource::Config));
    }

    #[test]
    fn working_directory_ancestor_with_shells_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("omd-shells")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let (root, src) = resolve_root(None, None, &UserConfig::default(), None, &nested).unwrap();
        assert_eq!(root, dir.path());
        assert_eq!(src, RootSource::WorkingDir);
    }

    #[test]
    fn nothing_found_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_root(None, None, &UserConfig::default(), None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("--root"));
    }
}
