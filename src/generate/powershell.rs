//! PowerShell init script.
//!
//! `init.ps1` is dot-sourced from `$PROFILE`, so functions it defines land
//! in the global scope. Feature files are dot-sourced from inside wrapper
//! functions; they must declare functions with the `global:` modifier to
//! outlive the wrapper.
use super::{
    FeaturesByStrategy, ScriptGenerator, loader_name, missing_feature_message, not_found_message,
    shell_header, usable_triggers,
};

const EXT: &str = "ps1";

/// Generates `init.ps1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellGenerator;

impl ScriptGenerator for PowerShellGenerator {
    fn generate(&self, features: &FeaturesByStrategy) -> String {
        let mut out = shell_header(None, "PowerShell");
        out.push_str(
            "# Guard against double-loading\n\
             if ($global:OMD_POWERSHELL_LOADED) {\n\
             \x20 return\n\
             }\n\
             $global:OMD_POWERSHELL_LOADED = $true\n\n\
             # Determine shell root\n\
             $global:OMD_SHELL_ROOT = Split-Path -Parent $PSCommandPath\n",
        );

        if !features.eager.is_empty() {
            out.push_str("\n# Load eager features\n");
            for name in &features.eager {
                out.push_str(&format!(
                    "$featureFile = {}\n\
                     if (Test-Path $featureFile) {{\n  \
                     . $featureFile\n\
                     }} else {{\n  \
                     Write-Warning \"{}\"\n\
                     }}\n",
                    join_path(name),
                    missing_feature_message(name)
                ));
            }
        }

        if !features.on_command.is_empty() {
            out.push_str("\n# Register on-command features\n");
            let wrappers: Vec<String> = features
                .on_command
                .iter()
                .map(|(name, cmds)| on_command_block(name, &usable_triggers(cmds, false)))
                .collect();
            out.push_str(&wrappers.join("\n"));
        }

        if !features.defer.is_empty() {
            out.push_str("\n# Load deferred features (background jobs)\nif ($Host.UI.RawUI) {\n");
            for name in &features.defer {
                out.push_str(&format!(
                    "  $featureFile = {}\n  \
                     if (Test-Path $featureFile) {{\n    \
                     Start-Job -ScriptBlock {{ param($f) . $f }} -ArgumentList $featureFile | Out-Null\n  \
                     }}\n",
                    join_path(name)
                ));
            }
            out.push_str("}\n");
        }

        if !features.eager.is_empty() || !features.defer.is_empty() {
            out.push_str("\n# Cleanup\nRemove-Variable -Name featureFile -ErrorAction SilentlyContinue\n");
        }
        out
    }
}

fn join_path(name: &str) -> String {
    format!("Join-Path $global:OMD_SHELL_ROOT \"features/{name}.{EXT}\"")
}

fn on_command_block(feature: &str, triggers: &[&str]) -> String {
    let path = join_path(feature);
    match triggers {
        [] => String::new(),
        [cmd] => format!(
            "function {cmd} {{\n  \
             Remove-Item Function:{cmd} -ErrorAction SilentlyContinue\n  \
             $featureFile = {path}\n  \
             if (Test-Path $featureFile) {{\n    \
             . $featureFile\n  \
             }}\n\
             {}}}\n",
            reinvoke(cmd)
        ),
        _ => {
            let loader = loader_name(feature);
            let mut out = format!(
                "function {loader} {{\n  \
                 $featureFile = {path}\n  \
                 if (Test-Path $featureFile) {{\n    \
                 . $featureFile\n  \
                 }}\n\
                 }}\n"
            );
            let all = triggers
                .iter()
                .map(|c| format!("Function:{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            for cmd in triggers {
                out.push_str(&format!(
                    "function {cmd} {{\n  \
                     Remove-Item {all} -ErrorAction SilentlyContinue\n  \
                     {loader}\n  \
                     Remove-Item Function:{loader} -ErrorAction SilentlyContinue\n\
                     {}}}\n",
                    reinvoke(cmd)
                ));
            }
            out
        }
    }
}

fn reinvoke(cmd: &str) -> String {
    format!(
        "  if (Get-Command {cmd} -ErrorAction SilentlyContinue) {{\n    \
         & {cmd} @args\n  \
         }} else {{\n    \
         Write-Warning \"{}\"\n    \
         $global:LASTEXITCODE = 127\n    \
         return\n  \
         }}\n",
        not_found_message(cmd)
    )
}
