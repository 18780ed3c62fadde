use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};

use oh_my_dot::cli::{Cli, Command};
use oh_my_dot::commands;
use oh_my_dot::logging::{Logger, init_subscriber};

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Feature(_) => "feature",
        Command::Shell(_) => "shell",
        Command::Hook(_) => "hook",
        Command::Completions { .. } => "completions",
        Command::Version => "version",
    }
}

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let name = command_name(&args.command);
    init_subscriber(args.verbose, name);
    let log = Logger::new(name);

    match &args.command {
        Command::Feature(cmd) => commands::feature::run(&args.global, cmd, &log),
        Command::Shell(cmd) => commands::shell::run(&args.global, cmd, &log),
        Command::Hook(cmd) => commands::hook::run(&args.global, cmd, &log),
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "omdot", &mut std::io::stdout());
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
