pub mod feature;
pub mod hook;
pub mod shell;
pub mod version;

use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::cli::{GlobalOpts, ShellTargets};
use crate::config::{self, REPO_PATH_ENV, UserConfig};
use crate::logging::{Log, Logger};
use crate::manifest::options::OptionContext;
use crate::manifest::trust::{LocalOverrideTrustPolicy, platform_policy};
use crate::platform::{self, Platform};
use crate::shell::detect::detect_current_shell;
use crate::shell::{ShellConfig, ShellRegistry};
use crate::workspace::Workspace;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the repository root and constructs the registry, catalog and
/// trust policy once so each command only decides what to do with them.
pub struct CommandSetup {
    pub platform: Platform,
    pub root: PathBuf,
    pub home: Option<PathBuf>,
    pub registry: ShellRegistry,
    pub catalog: Catalog,
    pub policy: Box<dyn LocalOverrideTrustPolicy>,
    pub option_ctx: OptionContext,
    pub dry_run: bool,
}

impl std::fmt::Debug for CommandSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSetup")
            .field("platform", &self.platform)
            .field("root", &self.root)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl CommandSetup {
    /// Load the user config and resolve the repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed or no repository
    /// root can be determined.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let user_config = UserConfig::load()?;
        let home = platform::home_dir().ok();
        let cwd = std::env::current_dir().context("reading current directory")?;
        let env_root = std::env::var(REPO_PATH_ENV).ok();
        let (root, source) = config::resolve_root(
            global.root.as_deref(),
            env_root.as_deref(),
            &user_config,
            home.as_deref(),
            &cwd,
        )?;
        let root = dunce::canonicalize(&root).unwrap_or(root);
        log.debug(&format!("repository: {} ({source:?})", root.display()));

        Ok(Self {
            platform: Platform::detect(),
            root,
            option_ctx: OptionContext {
                home: home.clone(),
                restrict_paths_to_home: user_config.restrict_paths_to_home,
            },
            home,
            registry: ShellRegistry::builtin(),
            catalog: Catalog::builtin(),
            policy: platform_policy(),
            dry_run: global.dry_run,
        })
    }

    /// Workspace over the resolved repository.
    #[must_use]
    pub fn workspace<'a>(&'a self, log: &'a dyn Log) -> Workspace<'a> {
        Workspace::new(
            &self.root,
            &self.registry,
            &self.catalog,
            self.policy.as_ref(),
            log,
        )
        .with_option_context(self.option_ctx.clone())
        .with_dry_run(self.dry_run)
    }

    /// Look up each named shell, failing on the first unknown name.
    ///
    /// # Errors
    ///
    /// Returns an error for a shell the registry does not know.
    pub fn shells(&self, names: &[String]) -> Result<Vec<&ShellConfig>> {
        names
            .iter()
            .map(|n| self.registry.get(n).map_err(Into::into))
            .collect()
    }

    /// The shell `omdot` is running under.
    ///
    /// # Errors
    ///
    /// Returns an error if `SHELL` does not name a supported shell.
    pub fn current_shell(&self) -> Result<&ShellConfig> {
        let Some(kind) = detect_current_shell(&self.registry, &self.platform) else {
            bail!("could not detect current shell, please specify with --shell");
        };
        Ok(self.registry.lookup(kind)?)
    }

    /// Explicit `--shell` values, else the current shell.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or when detection fails.
    pub fn explicit_or_current(&self, names: &[String]) -> Result<Vec<&ShellConfig>> {
        if names.is_empty() {
            Ok(vec![self.current_shell()?])
        } else {
            self.shells(names)
        }
    }

    /// Every initialized shell under `omd-shells/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shells directory cannot be read.
    pub fn initialized_shells(&self, log: &dyn Log) -> Result<Vec<&ShellConfig>> {
        let names = self.workspace(log).list_shells()?;
        Ok(names
            .iter()
            .filter_map(|n| self.registry.get(n).ok())
            .collect())
    }

    /// Resolve `--shell`/`--all` where `--all` means every initialized shell.
    ///
    /// # Errors
    ///
    /// See [`explicit_or_current`](Self::explicit_or_current).
    pub fn targets(&self, targets: &ShellTargets, log: &dyn Log) -> Result<Vec<&ShellConfig>> {
        if targets.all {
            self.initialized_shells(log)
        } else {
            self.explicit_or_current(&targets.shells)
        }
    }
}

/// Run `op` once per shell, recording failures instead of stopping, then
/// print the summary and bail if any shell failed.
///
/// # Errors
///
/// Returns an error if one or more shells failed.
pub fn for_each_shell<'a>(
    shells: impl IntoIterator<Item = &'a ShellConfig>,
    log: &Logger,
    mut op: impl FnMut(&'a ShellConfig) -> Result<()>,
) -> Result<()> {
    for shell in shells {
        if let Err(e) = op(shell) {
            log.error(&format!("{}: {e:#}", shell.name()));
            log.record(
                shell.name(),
                crate::logging::ActionStatus::Failed,
                Some(e.to_string().as_str()),
            );
        }
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        bail!("{count} shell(s) failed");
    }
    Ok(())
}
