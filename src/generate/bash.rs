//! Bash init script.
use super::{
    FeaturesByStrategy, ScriptGenerator, indent, loader_name, missing_feature_message,
    not_found_message, shell_header, usable_triggers,
};

const EXT: &str = "sh";

/// Generates the bash `init.sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BashGenerator;

impl ScriptGenerator for BashGenerator {
    fn generate(&self, features: &FeaturesByStrategy) -> String {
        let mut out = shell_header(Some("bash"), "bash");

        // A re-sourced .bashrc may reset PS1, so the guard re-applies eager
        // features before bailing out.
        out.push_str(
            "# Guard against double-loading\n\
             if [ \"${OMD_BASH_LOADED:-}\" = \"1\" ]; then\n\
             \x20 if declare -F _omd_load_eager_features >/dev/null 2>&1; then\n\
             \x20   _omd_load_eager_features\n\
             \x20 fi\n\
             \x20 return 0\n\
             fi\n\
             OMD_BASH_LOADED=1\n\n\
             # Determine shell root\n\
             OMD_SHELL_ROOT=\"$(cd \"$(dirname \"${BASH_SOURCE[0]}\")\" && pwd)\"\n\n\
             # Source helper library\n\
             if [ -r \"$OMD_SHELL_ROOT/../lib/helpers.sh\" ]; then\n\
             \x20 . \"$OMD_SHELL_ROOT/../lib/helpers.sh\"\n\
             fi\n\n",
        );

        let mut calls = Vec::new();
        let mut cleanup = Vec::new();

        if !features.eager.is_empty() {
            out.push_str("# Load eager features\n_omd_load_eager_features() {\n  local feature_file\n");
            for name in &features.eager {
                out.push_str(&format!(
                    "  feature_file=\"$OMD_SHELL_ROOT/features/{name}.{EXT}\"\n  \
                     if [ -r \"$feature_file\" ]; then\n    \
                     . \"$feature_file\"\n  \
                     else\n    \
                     echo \"{}\" >&2\n  \
                     fi\n",
                    missing_feature_message(name)
                ));
            }
            out.push_str("}\n\n");
            calls.push("_omd_load_eager_features");
        }

        if !features.on_command.is_empty() {
            out.push_str("# Register on-command features\n_omd_register_oncommand_features() {\n");
            let wrappers: Vec<String> = features
                .on_command
                .iter()
                .map(|(name, cmds)| on_command_block(name, &usable_triggers(cmds, false)))
                .collect();
            out.push_str(&indent(&wrappers.join("\n"), "  "));
            out.push_str("}\n\n");
            calls.push("_omd_register_oncommand_features");
            cleanup.push("_omd_register_oncommand_features");
        }

        if !features.defer.is_empty() {
            out.push_str(
                "# Load deferred features (background)\n_omd_load_deferred_features() {\n  \
                 if [[ $- == *i* ]]; then\n",
            );
            for name in &features.defer {
                let path = format!("$OMD_SHELL_ROOT/features/{name}.{EXT}");
                out.push_str(&format!("    ( ( [ -r \"{path}\" ] && . \"{path}\" ) & )\n"));
            }
            out.push_str("  fi\n}\n\n");
            calls.push("_omd_load_deferred_features");
            cleanup.push("_omd_load_deferred_features");
        }

        out.push_str("# Execute loading\n");
        for call in &calls {
            out.push_str(call);
            out.push('\n');
        }

        if !cleanup.is_empty() {
            out.push_str(&format!(
                "\n# Cleanup (keep _omd_load_eager_features for re-sourcing)\nunset -f {}\n",
                cleanup.join(" ")
            ));
        }
        out
    }
}

/// Wrapper functions for one on-command feature.
fn on_command_block(feature: &str, triggers: &[&str]) -> String {
    let path = format!("$OMD_SHELL_ROOT/features/{feature}.{EXT}");
    match triggers {
        [] => String::new(),
        [cmd] => format!(
            "{cmd}() {{\n  \
             unset -f {cmd}\n  \
             local feature_file=\"{path}\"\n  \
             if [ -r \"$feature_file\" ]; then\n    \
             . \"$feature_file\"\n  \
             fi\n\
             {}}}\n",
            reinvoke(cmd)
        ),
        _ => {
            let loader = loader_name(feature);
            let mut out = format!(
                "{loader}() {{\n  \
                 local feature_file=\"{path}\"\n  \
                 if [ -r \"$feature_file\" ]; then\n    \
                 . \"$feature_file\"\n  \
                 fi\n\
                 }}\n"
            );
            let all = triggers.join(" ");
            for cmd in triggers {
                out.push_str(&format!(
                    "{cmd}() {{\n  \
                     unset -f {all}\n  \
                     {loader}\n  \
                     unset -f {loader}\n\
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
        "  if command -v {cmd} >/dev/null 2>&1; then\n    \
         {cmd} \"$@\"\n  \
         else\n    \
         echo \"{}\" >&2\n    \
         return 127\n  \
         fi\n",
        not_found_message(cmd)
    )
}
