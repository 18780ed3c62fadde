//! POSIX sh init script.
//!
//! A sourced POSIX script cannot find its own path, so the profile hook
//! exports `OMD_SHELL_ROOT` before sourcing and `$0` is only a fallback.
use super::{
    FeaturesByStrategy, ScriptGenerator, loader_name, missing_feature_message, not_found_message,
    shell_header, usable_triggers,
};

const EXT: &str = "sh";

/// Generates the POSIX `init.sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixGenerator;

impl ScriptGenerator for PosixGenerator {
    fn generate(&self, features: &FeaturesByStrategy) -> String {
        let mut out = shell_header(Some("sh"), "POSIX sh");
        out.push_str(
            "# Guard against double-loading\n\
             if [ \"${OMD_POSIX_LOADED:-}\" = \"1\" ]; then\n\
             \x20 return 0 2>/dev/null || exit 0\n\
             fi\n\
             OMD_POSIX_LOADED=1\n\n\
             # Determine shell root\n\
             if [ -z \"${OMD_SHELL_ROOT:-}\" ]; then\n\
             \x20 OMD_SHELL_ROOT=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\n\
             fi\n\n\
             # Source helper library\n\
             if [ -r \"$OMD_SHELL_ROOT/../lib/helpers.sh\" ]; then\n\
             \x20 . \"$OMD_SHELL_ROOT/../lib/helpers.sh\"\n\
             fi\n",
        );

        if !features.eager.is_empty() {
            out.push_str("\n# Load eager features\n");
            for name in &features.eager {
                out.push_str(&format!(
                    "feature_file=\"{}\"\n\
                     if [ -r \"$feature_file\" ]; then\n  \
                     . \"$feature_file\"\n\
                     else\n  \
                     echo \"{}\" >&2\n\
                     fi\n",
                    feature_path(name),
                    missing_feature_message(name)
                ));
            }
            out.push_str("unset feature_file\n");
        }

        if !features.on_command.is_empty() {
            out.push_str("\n# Register on-command features\n");
            let wrappers: Vec<String> = features
                .on_command
                .iter()
                .map(|(name, cmds)| on_command_block(name, &usable_triggers(cmds, true)))
                .collect();
            out.push_str(&wrappers.join("\n"));
        }

        if !features.defer.is_empty() {
            out.push_str("\n# Load deferred features (background)\ncase $- in\n  *i*)\n");
            for name in &features.defer {
                let path = feature_path(name);
                out.push_str(&format!("    ( ( [ -r \"{path}\" ] && . \"{path}\" ) & )\n"));
            }
            out.push_str("    ;;\nesac\n");
        }
        out
    }
}

fn feature_path(name: &str) -> String {
    format!("$OMD_SHELL_ROOT/features/{name}.{EXT}")
}

fn source_if_readable(path: &str) -> String {
    format!("  if [ -r \"{path}\" ]; then\n    . \"{path}\"\n  fi\n")
}

fn on_command_block(feature: &str, triggers: &[&str]) -> String {
    let path = feature_path(feature);
    match triggers {
        [] => String::new(),
        [cmd] => format!(
            "{cmd}() {{\n  \
             unset -f {cmd}\n\
             {}{}}}\n",
            source_if_readable(&path),
            reinvoke(cmd)
        ),
        _ => {
            let loader = loader_name(feature);
            let mut out = format!("{loader}() {{\n{}}}\n", source_if_readable(&path));
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
