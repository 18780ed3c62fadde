//! `omdot hook ...`: wire the generated init scripts into shell profiles.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{CommandSetup, for_each_shell};
use crate::cli::{GlobalOpts, HookCommand, HookOpts};
use crate::error::ShellError;
use crate::logging::{ActionStatus, Log, Logger};
use crate::resources::profile_hook::{ProfileHookResource, sources_bashrc};
use crate::resources::{Applicable as _, Resource as _, ResourceChange};
use crate::shell::{ShellConfig, ShellKind};

/// Run a `hook` subcommand.
///
/// # Errors
///
/// Returns an error if setup fails or any targeted shell fails.
pub fn run(global: &GlobalOpts, cmd: &HookCommand, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    match cmd {
        HookCommand::Install(opts) => each_profile(&setup, opts, log, |t| install(&t, log)),
        HookCommand::Remove(opts) => each_profile(&setup, opts, log, |t| uninstall(&t, log)),
        HookCommand::Status => status(&setup, log),
    }
}

/// Everything a hook operation needs to know about one shell.
#[derive(Debug, Clone)]
pub struct HookTarget<'a> {
    /// The shell being hooked.
    pub shell: &'a ShellConfig,
    /// Profile file that carries the hook.
    pub profile: PathBuf,
    /// Generated init script the hook sources.
    pub init_script: PathBuf,
    /// Home directory for `$HOME`-relative rendering.
    pub home: Option<PathBuf>,
    /// Report instead of writing.
    pub dry_run: bool,
}

impl HookTarget<'_> {
    fn hook(&self) -> ProfileHookResource {
        ProfileHookResource::shell_hook(
            self.shell.kind,
            self.profile.clone(),
            &self.init_script,
            self.home.as_deref(),
        )
    }

    fn bash_profile(&self) -> Option<PathBuf> {
        (self.shell.kind == ShellKind::Bash)
            .then(|| self.home.as_ref().map(|h| h.join(".bash_profile")))
            .flatten()
    }
}

fn each_profile(
    setup: &CommandSetup,
    opts: &HookOpts,
    log: &Logger,
    mut op: impl FnMut(HookTarget<'_>) -> Result<ResourceChange>,
) -> Result<()> {
    let shells = setup.targets(&opts.targets, log)?;
    let ws = setup.workspace(log);
    for_each_shell(shells, log, |shell| {
        let layout = ws.shell_layout(shell);
        if !layout.is_initialized() {
            return Err(ShellError::NotInitialized(shell.name().to_string()).into());
        }
        op(HookTarget {
            shell,
            profile: shell.resolve_profile()?,
            init_script: layout.init_script,
            home: setup.home.clone(),
            dry_run: setup.dry_run,
        })?;
        Ok(())
    })
}

/// Append the hook block to the profile, plus the bash login shim when
/// `~/.bash_profile` does not already reach `~/.bashrc`.
///
/// # Errors
///
/// Returns an error if a profile cannot be read or written.
pub fn install(target: &HookTarget<'_>, log: &dyn Log) -> Result<ResourceChange> {
    let change = apply_one(&target.hook(), target, log)?;
    if let Some(bash_profile) = target.bash_profile()
        && needs_login_shim(&bash_profile)?
    {
        let shim = ProfileHookResource::login_shim(
            bash_profile,
            &target.profile,
            target.home.as_deref(),
        );
        apply_one(&shim, target, log)?;
    }
    Ok(change)
}

/// Remove the hook block (and the bash login shim) from the profile.
///
/// # Errors
///
/// Returns an error if a profile cannot be read or written.
pub fn uninstall(target: &HookTarget<'_>, log: &dyn Log) -> Result<ResourceChange> {
    let change = remove_one(&target.hook(), target, log)?;
    if let Some(bash_profile) = target.bash_profile() {
        let shim = ProfileHookResource::login_shim(
            bash_profile,
            &target.profile,
            target.home.as_deref(),
        );
        remove_one(&shim, target, log)?;
    }
    Ok(change)
}

fn needs_login_shim(bash_profile: &Path) -> Result<bool> {
    match std::fs::read_to_string(bash_profile) {
        Ok(content) => Ok(!sources_bashrc(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

fn apply_one(
    resource: &ProfileHookResource,
    target: &HookTarget<'_>,
    log: &dyn Log,
) -> Result<ResourceChange> {
    let name = resource.description();
    if !resource.needs_change()? {
        log.record(&name, ActionStatus::Unchanged, None);
        return Ok(ResourceChange::AlreadyCorrect);
    }
    if target.dry_run {
        log.dry_run(&format!("would add {name}"));
        log.record(&name, ActionStatus::DryRun, None);
        return Ok(ResourceChange::Skipped {
            reason: "dry run".to_string(),
        });
    }
    let change = resource.apply()?;
    log.info(&format!("added {name}"));
    log.record(&name, ActionStatus::Changed, None);
    Ok(change)
}

fn remove_one(
    resource: &ProfileHookResource,
    target: &HookTarget<'_>,
    log: &dyn Log,
) -> Result<ResourceChange> {
    let name = resource.description();
    if resource.needs_change()? {
        log.record(&name, ActionStatus::Unchanged, None);
        return Ok(ResourceChange::AlreadyCorrect);
    }
    if target.dry_run {
        log.dry_run(&format!("would remove {name}"));
        log.record(&name, ActionStatus::DryRun, None);
        return Ok(ResourceChange::Skipped {
            reason: "dry run".to_string(),
        });
    }
    let change = resource.remove()?;
    log.info(&format!("removed {name}"));
    log.record(&name, ActionStatus::Changed, None);
    Ok(change)
}

fn status(setup: &CommandSetup, log: &Logger) -> Result<()> {
    let ws = setup.workspace(log);
    for shell in setup.initialized_shells(log)? {
        let profile = shell.resolve_profile()?;
        let init_script = ws.shell_layout(shell).init_script;
        let hook = ProfileHookResource::shell_hook(
            shell.kind,
            profile.clone(),
            &init_script,
            setup.home.as_deref(),
        );
        let state = if hook.needs_change()? {
            "not installed"
        } else {
            "installed"
        };
        println!("{}: {state} ({})", shell.name(), profile.display());
    }
    Ok(())
}
