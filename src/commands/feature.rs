//! `omdot feature ...`: add, remove, enable, disable, list and inspect features.
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{CommandSetup, for_each_shell};
use crate::catalog::{Catalog, FeatureMetadata};
use crate::cli::{
    FeatureAddOpts, FeatureCommand, FeatureDisableOpts, FeatureEnableOpts, FeatureListOpts,
    FeatureRemoveOpts, GlobalOpts,
};
use crate::logging::Logger;
use crate::manifest::OptionValue;
use crate::manifest::merge::MergedManifest;
use crate::shell::ShellConfig;
use crate::workspace::AddRequest;

/// Run a `feature` subcommand.
///
/// # Errors
///
/// Returns an error if setup fails or any targeted shell fails.
pub fn run(global: &GlobalOpts, cmd: &FeatureCommand, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    match cmd {
        FeatureCommand::Add(opts) => add(&setup, opts, log),
        FeatureCommand::Remove(opts) => remove(&setup, opts, log),
        FeatureCommand::Enable(opts) => enable(&setup, opts, log),
        FeatureCommand::Disable(opts) => disable(&setup, opts, log),
        FeatureCommand::List(opts) => list(&setup, opts, log),
        FeatureCommand::Info { name } => info(&setup, name, log),
    }
}

fn add(setup: &CommandSetup, opts: &FeatureAddOpts, log: &Logger) -> Result<()> {
    let shells: Vec<&ShellConfig> = if opts.targets.all {
        setup
            .catalog
            .default_shells(&opts.name)
            .iter()
            .map(|kind| setup.registry.lookup(*kind))
            .collect::<Result<_, _>>()?
    } else {
        setup.explicit_or_current(&opts.targets.shells)?
    };
    if let Some(shell) = shells
        .iter()
        .find(|s| !setup.catalog.allows(&opts.name, s.kind))
    {
        bail!(
            "feature '{}' does not support shell '{}'",
            opts.name,
            shell.name()
        );
    }

    let req = AddRequest {
        name: opts.name.clone(),
        strategy: opts.strategy,
        on_command: opts.on_command.clone(),
        disabled: opts.disabled,
        options: raw_options(&opts.options),
    };
    let ws = setup.workspace(log);
    for_each_shell(shells, log, |shell| {
        log.stage(&format!("Adding {} to {}", req.name, shell.name()));
        let feature = ws.add_feature(shell, &req)?;
        if !setup.dry_run {
            log.info(&format!(
                "added {} ({})",
                feature.name,
                feature.effective_strategy()
            ));
        }
        Ok(())
    })
}

fn remove(setup: &CommandSetup, opts: &FeatureRemoveOpts, log: &Logger) -> Result<()> {
    let shells = if opts.targets.all {
        shells_with_feature(setup, &opts.name, log)?
    } else {
        setup.explicit_or_current(&opts.targets.shells)?
    };
    let ws = setup.workspace(log);
    for_each_shell(shells, log, |shell| {
        log.stage(&format!("Removing {} from {}", opts.name, shell.name()));
        ws.remove_feature(shell, &opts.name)?;
        if setup.dry_run || !ws.needs_cleanup(shell)? {
            return Ok(());
        }
        if opts.force {
            ws.cleanup_shell(shell)?;
        } else {
            log.info(&format!(
                "{} has no features left; rerun with --force to delete its directory",
                shell.name()
            ));
        }
        Ok(())
    })
}

fn enable(setup: &CommandSetup, opts: &FeatureEnableOpts, log: &Logger) -> Result<()> {
    let shells = setup.explicit_or_current(&opts.shells)?;
    let ws = setup.workspace(log);
    for_each_shell(shells, log, |shell| {
        ws.enable_feature(shell, &opts.name, opts.strategy, &opts.on_command)?;
        log.info(&format!("enabled {} in {}", opts.name, shell.name()));
        Ok(())
    })
}

fn disable(setup: &CommandSetup, opts: &FeatureDisableOpts, log: &Logger) -> Result<()> {
    let shells = if opts.targets.all {
        shells_with_feature(setup, &opts.name, log)?
    } else {
        setup.explicit_or_current(&opts.targets.shells)?
    };
    let ws = setup.workspace(log);
    for_each_shell(shells, log, |shell| {
        ws.disable_feature(shell, &opts.name)?;
        log.info(&format!("disabled {} in {}", opts.name, shell.name()));
        Ok(())
    })
}

fn list(setup: &CommandSetup, opts: &FeatureListOpts, log: &Logger) -> Result<()> {
    if opts.catalog {
        let shells = setup.shells(&opts.shells)?;
        print!("{}", format_catalog(&setup.catalog, &shells));
        return Ok(());
    }

    let shells = if opts.shells.is_empty() {
        setup.initialized_shells(log)?
    } else {
        setup.shells(&opts.shells)?
    };
    if shells.is_empty() {
        log.info("no initialized shells; run 'omdot feature add <name>' to start");
        return Ok(());
    }
    let ws = setup.workspace(log);
    for shell in shells {
        match ws.load(shell) {
            Ok(merged) => print!("{}", format_shell(shell, &merged, &setup.catalog)),
            Err(e) => log.error(&format!("reading {} manifest: {e:#}", shell.name())),
        }
    }
    Ok(())
}

fn info(setup: &CommandSetup, name: &str, log: &Logger) -> Result<()> {
    let Some(meta) = setup.catalog.get(name) else {
        bail!("feature '{name}' not found in catalog");
    };
    let ws = setup.workspace(log);
    let mut configured = Vec::new();
    for shell in setup.initialized_shells(log)? {
        if let Ok(merged) = ws.load(shell)
            && let Some(feature) = merged.get(name)
        {
            configured.push((shell.name(), describe(&feature.config)));
        }
    }
    print!("{}", format_info(meta, &configured));
    Ok(())
}

fn shells_with_feature<'a>(
    setup: &'a CommandSetup,
    name: &str,
    log: &Logger,
) -> Result<Vec<&'a ShellConfig>> {
    let ws = setup.workspace(log);
    let shells: Vec<_> = setup
        .initialized_shells(log)?
        .into_iter()
        .filter(|s| ws.load(s).is_ok_and(|m| m.get(name).is_some()))
        .collect();
    if shells.is_empty() {
        bail!("feature '{name}' is not configured in any shell");
    }
    Ok(shells)
}

fn raw_options(pairs: &[(String, String)]) -> BTreeMap<String, OptionValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), OptionValue::Text(v.clone())))
        .collect()
}

fn describe(feature: &crate::manifest::FeatureConfig) -> String {
    let mut out = if feature.disabled {
        "disabled".to_string()
    } else {
        "enabled".to_string()
    };
    if let Some(strategy) = feature.strategy {
        let _ = write!(out, " ({strategy}");
        if !feature.on_command.is_empty() {
            let _ = write!(out, ": {}", feature.on_command.join(", "));
        }
        out.push(')');
    }
    out
}

/// One shell's merged features as printed by `feature list`.
#[must_use]
pub fn format_shell(shell: &ShellConfig, merged: &MergedManifest, catalog: &Catalog) -> String {
    let mut out = format!("{}:\n", shell.name());
    if merged.features.is_empty() {
        out.push_str("  (no features)\n");
        return out;
    }
    for feature in &merged.features {
        let cfg = &feature.config;
        let mark = if cfg.disabled { '✗' } else { '✓' };
        let origin = if feature.local.is_from_local {
            " (local)"
        } else if feature.local.is_overridden {
            " (overridden)"
        } else {
            ""
        };
        let strategy = cfg
            .strategy
            .unwrap_or_else(|| catalog.default_strategy(&cfg.name));
        let _ = write!(out, "  {mark} {}{origin} ({strategy}", cfg.name);
        if !cfg.on_command.is_empty() {
            let _ = write!(out, ": {}", cfg.on_command.join(", "));
        }
        out.push_str(")\n");
    }
    out
}

/// Catalog entries, optionally limited to features supporting `shells`.
#[must_use]
pub fn format_catalog(catalog: &Catalog, shells: &[&ShellConfig]) -> String {
    let mut out = String::new();
    for meta in catalog
        .iter()
        .filter(|m| shells.iter().all(|s| m.supports(s.kind)))
    {
        let _ = writeln!(
            out,
            "{:<22} {:<11} {:<10} {}",
            meta.name, meta.category, meta.default_strategy, meta.description
        );
    }
    out
}

/// Catalog metadata plus per-shell configuration for `feature info`.
#[must_use]
pub fn format_info(meta: &FeatureMetadata, configured: &[(&str, String)]) -> String {
    let mut out = format!("{}\n", meta.name);
    let _ = writeln!(out, "  Category: {}", meta.category);
    let _ = writeln!(out, "  Description: {}", meta.description);
    let _ = writeln!(out, "  Default Strategy: {}", meta.default_strategy);
    if !meta.default_commands.is_empty() {
        let _ = writeln!(out, "  Default Commands: {}", meta.default_commands.join(", "));
    }
    let shells: Vec<&str> = meta.supported_shells.iter().map(|k| k.name()).collect();
    let _ = writeln!(out, "  Supported Shells: {}", shells.join(", "));
    if !meta.options.is_empty() {
        out.push_str("  Options:\n");
        for spec in &meta.options {
            let default = spec
                .default
                .as_ref()
                .map_or_else(String::new, |d| format!(" [default: {d}]"));
            let _ = writeln!(out, "    {}: {}{default}", spec.name, spec.description);
        }
    }
    out.push_str("\nCurrent Configuration:\n");
    if configured.is_empty() {
        out.push_str("  (not installed)\n");
    }
    for (shell, status) in configured {
        let _ = writeln!(out, "  {shell}: {status}");
    }
    out
}
