//! `omdot shell ...`: initialize, regenerate and list shell directories.
use anyhow::Result;

use super::{CommandSetup, for_each_shell};
use crate::cli::{GlobalOpts, ShellCommand};
use crate::logging::Logger;

/// Run a `shell` subcommand.
///
/// # Errors
///
/// Returns an error if setup fails or any targeted shell fails.
pub fn run(global: &GlobalOpts, cmd: &ShellCommand, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let ws = setup.workspace(log);
    match cmd {
        ShellCommand::Init { shells } => {
            let shells = setup.shells(shells)?;
            for_each_shell(shells, log, |shell| {
                log.stage(&format!("Initializing {}", shell.name()));
                if !shell.kind.is_installed() {
                    log.warn(&format!("{} not found on PATH", shell.kind.executables().join("/")));
                }
                ws.init_shell(shell)?;
                Ok(())
            })
        }
        ShellCommand::Regenerate { shells } => {
            let shells = if shells.is_empty() {
                setup.initialized_shells(log)?
            } else {
                setup.shells(shells)?
            };
            if shells.is_empty() {
                log.info("no initialized shells to regenerate");
                return Ok(());
            }
            log.stage("Regenerating init scripts");
            for_each_shell(shells, log, |shell| {
                ws.regenerate(shell)?;
                Ok(())
            })
        }
        ShellCommand::List => {
            for name in ws.list_shells()? {
                println!("{name}");
            }
            Ok(())
        }
    }
}
