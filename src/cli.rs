use clap::{Args, Parser, Subcommand};

use crate::manifest::Strategy;

/// Top-level CLI entry point for the shell feature manager.
#[derive(Parser, Debug)]
#[command(
    name = "omdot",
    about = "Per-shell feature manifests compiled into idempotent init scripts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override dotfiles repository root
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage shell features
    #[command(subcommand)]
    Feature(FeatureCommand),
    /// Manage per-shell directories and init scripts
    #[command(subcommand)]
    Shell(ShellCommand),
    /// Manage the profile hook that sources the init script
    #[command(subcommand)]
    Hook(HookCommand),
    /// Print a completion script for omdot
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Print version information
    Version,
}

/// `feature` subcommands.
#[derive(Subcommand, Debug)]
pub enum FeatureCommand {
    /// Add a feature to one or more shells
    Add(FeatureAddOpts),
    /// Remove a feature and its feature file
    Remove(FeatureRemoveOpts),
    /// Enable a disabled feature
    Enable(FeatureEnableOpts),
    /// Disable a feature without removing it
    Disable(FeatureDisableOpts),
    /// List configured features
    List(FeatureListOpts),
    /// Show catalog details and current configuration of a feature
    Info {
        /// Feature name
        name: String,
    },
}

/// Shell selection shared by feature subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ShellTargets {
    /// Target specific shell(s)
    #[arg(long = "shell", value_delimiter = ',')]
    pub shells: Vec<String>,

    /// Target every applicable shell
    #[arg(long, conflicts_with = "shells")]
    pub all: bool,
}

/// Options for `feature add`.
#[derive(Args, Debug, Clone)]
pub struct FeatureAddOpts {
    /// Feature name
    pub name: String,

    #[command(flatten)]
    pub targets: ShellTargets,

    /// Override load strategy (eager, defer, on-command)
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<Strategy>,

    /// Trigger commands for the on-command strategy
    #[arg(long = "on-command", value_delimiter = ',')]
    pub on_command: Vec<String>,

    /// Add the feature but keep it disabled
    #[arg(long)]
    pub disabled: bool,

    /// Feature option as KEY=VALUE (repeatable)
    #[arg(long = "option", short = 'o', value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,
}

/// Options for `feature remove`.
#[derive(Args, Debug, Clone)]
pub struct FeatureRemoveOpts {
    /// Feature name
    pub name: String,

    #[command(flatten)]
    pub targets: ShellTargets,

    /// Delete a shell directory whose manifest became empty
    #[arg(long)]
    pub force: bool,
}

/// Options for `feature enable`.
#[derive(Args, Debug, Clone)]
pub struct FeatureEnableOpts {
    /// Feature name
    pub name: String,

    /// Target specific shell(s)
    #[arg(long = "shell", value_delimiter = ',')]
    pub shells: Vec<String>,

    /// Switch load strategy
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<Strategy>,

    /// Replace trigger commands
    #[arg(long = "on-command", value_delimiter = ',')]
    pub on_command: Vec<String>,
}

/// Options for `feature disable`.
#[derive(Args, Debug, Clone)]
pub struct FeatureDisableOpts {
    /// Feature name
    pub name: String,

    #[command(flatten)]
    pub targets: ShellTargets,
}

/// Options for `feature list`.
#[derive(Args, Debug, Clone, Default)]
pub struct FeatureListOpts {
    /// Filter by specific shell(s)
    #[arg(long = "shell", value_delimiter = ',')]
    pub shells: Vec<String>,

    /// List the feature catalog instead of configured features
    #[arg(long)]
    pub catalog: bool,
}

/// `shell` subcommands.
#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Create omd-shells/<shell>/ with an empty manifest
    Init {
        /// Shells to initialize
        #[arg(required = true)]
        shells: Vec<String>,
    },
    /// Rewrite init scripts from their manifests
    Regenerate {
        /// Shells to regenerate (default: every initialized shell)
        shells: Vec<String>,
    },
    /// List initialized shells
    List,
}

/// `hook` subcommands.
#[derive(Subcommand, Debug)]
pub enum HookCommand {
    /// Append the oh-my-dot block to shell profiles
    Install(HookOpts),
    /// Remove the oh-my-dot block from shell profiles
    Remove(HookOpts),
    /// Show whether each initialized shell's profile carries the hook
    Status,
}

/// Options for `hook install` and `hook remove`.
#[derive(Args, Debug, Clone, Default)]
pub struct HookOpts {
    #[command(flatten)]
    pub targets: ShellTargets,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    Strategy::parse(s).ok_or_else(|| {
        format!("invalid strategy '{s}': must be one of eager, defer, on-command")
    })
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_feature_add_with_flags() {
        let cli = Cli::parse_from([
            "omdot",
            "feature",
            "add",
            "nvm",
            "--shell",
            "bash,zsh",
            "--strategy",
            "on-command",
            "--on-command",
            "nvm,node",
            "-o",
            "dir=~/x",
        ]);
        let Command::Feature(FeatureCommand::Add(opts)) = cli.command else {
            unreachable!("expected feature add");
        };
        assert_eq!(opts.name, "nvm");
        assert_eq!(opts.targets.shells, vec!["bash", "zsh"]);
        assert_eq!(opts.strategy, Some(Strategy::OnCommand));
        assert_eq!(opts.on_command, vec!["nvm", "node"]);
        assert_eq!(opts.options, vec![("dir".to_string(), "~/x".to_string())]);
    }

    #[test]
    fn invalid_strategy_is_rejected() {
        let result = Cli::try_parse_from(["omdot", "feature", "add", "x", "--strategy", "lazy"]);
        assert!(result.is_err());
    }

    #[test]
    fn option_without_equals_is_rejected() {
        let result = Cli::try_parse_from(["omdot", "feature", "add", "x", "-o", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn shell_and_all_conflict() {
        let result =
            Cli::try_parse_from(["omdot", "feature", "remove", "x", "--all", "--shell", "bash"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["omdot", "-d", "shell", "list"]);
        assert!(cli.global.dry_run);
        assert!(matches!(cli.command, Command::Shell(ShellCommand::List)));
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["omdot", "--root", "/tmp/dots", "shell", "regenerate"]);
        assert_eq!(cli.global.root, Some(std::path::PathBuf::from("/tmp/dots")));
        assert!(matches!(
            cli.command,
            Command::Shell(ShellCommand::Regenerate { ref shells }) if shells.is_empty()
        ));
    }

    #[test]
    fn shell_init_requires_a_shell() {
        assert!(Cli::try_parse_from(["omdot", "shell", "init"]).is_err());
    }

    #[test]
    fn parse_verbose_and_version() {
        let cli = Cli::parse_from(["omdot", "-v", "version"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["omdot", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Command::Completions {
                shell: clap_complete::Shell::Zsh
            }
        ));
    }

    #[test]
    fn parse_hook_status() {
        let cli = Cli::parse_from(["omdot", "hook", "status"]);
        assert!(matches!(cli.command, Command::Hook(HookCommand::Status)));
    }
}
