//! Fish init script.
//!
//! The whole body sits inside the load guard, so no early exit from a
//! sourced file is needed. Fish functions defined in a block are still
//! global, and deferred features load synchronously on the first prompt.
use super::{
    FeaturesByStrategy, ScriptGenerator, indent, loader_name, missing_feature_message,
    not_found_message, shell_header, usable_triggers,
};

const EXT: &str = "fish";

/// Generates `init.fish`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FishGenerator;

impl ScriptGenerator for FishGenerator {
    fn generate(&self, features: &FeaturesByStrategy) -> String {
        let mut body = String::from(
            "set -g OMD_FISH_LOADED 1\n\n\
             # Determine shell root\n\
             set -g OMD_SHELL_ROOT (dirname (status --current-filename))\n",
        );

        if !features.eager.is_empty() {
            body.push_str("\n# Load eager features\n");
            for name in &features.eager {
                let path = feature_path(name);
                body.push_str(&format!(
                    "if test -r \"{path}\"\n  \
                     source \"{path}\"\n\
                     else\n  \
                     echo \"{}\" >&2\n\
                     end\n",
                    missing_feature_message(name)
                ));
            }
        }

        if !features.on_command.is_empty() {
            body.push_str("\n# Register on-command features\n");
            let wrappers: Vec<String> = features
                .on_command
                .iter()
                .map(|(name, cmds)| on_command_block(name, &usable_triggers(cmds, false)))
                .collect();
            body.push_str(&wrappers.join("\n"));
        }

        if !features.defer.is_empty() {
            let paths: Vec<String> = features
                .defer
                .iter()
                .map(|name| format!("\"{}\"", feature_path(name)))
                .collect();
            body.push_str(&format!(
                "\n# Load deferred features (on first prompt)\n\
                 function __omd_deferred_on_prompt --on-event fish_prompt\n  \
                 functions -e __omd_deferred_on_prompt\n  \
                 for feature_file in {}\n    \
                 test -r \"$feature_file\"; and source \"$feature_file\"\n  \
                 end\n\
                 end\n",
                paths.join(" ")
            ));
        }

        let mut out = shell_header(Some("fish"), "fish");
        out.push_str("# Guard against double-loading\nif not set -q OMD_FISH_LOADED\n");
        out.push_str(&indent(&body, "  "));
        out.push_str("end\n");
        out
    }
}

fn feature_path(name: &str) -> String {
    format!("$OMD_SHELL_ROOT/features/{name}.{EXT}")
}

fn on_command_block(feature: &str, triggers: &[&str]) -> String {
    let path = feature_path(feature);
    match triggers {
        [] => String::new(),
        [cmd] => format!(
            "function {cmd}\n  \
             functions -e {cmd}\n  \
             test -r \"{path}\"; and source \"{path}\"\n\
             {}end\n",
            reinvoke(cmd)
        ),
        _ => {
            let loader = loader_name(feature);
            let mut out = format!(
                "function {loader}\n  \
                 test -r \"{path}\"; and source \"{path}\"\n\
                 end\n"
            );
            let all = triggers.join(" ");
            for cmd in triggers {
                out.push_str(&format!(
                    "function {cmd}\n  \
                     functions -e {all}\n  \
                     {loader}\n  \
                     functions -e {loader}\n\
                     {}end\n",
                    reinvoke(cmd)
                ));
            }
            out
        }
    }
}

fn reinvoke(cmd: &str) -> String {
    format!(
        "  if type -q {cmd}\n    \
         {cmd} $argv\n  \
         else\n    \
         echo \"{}\" >&2\n    \
         return 127\n  \
         end\n",
        not_found_message(cmd)
    )
}
