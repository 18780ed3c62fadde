//! Detect the user's current shell from the environment.
use super::{ShellKind, ShellRegistry};
use crate::platform::Platform;

/// Normalize a shell executable name to a registry name.
///
/// Strips Windows executable suffixes and maps aliases (`pwsh` and
/// `powershell` to `powershell`, `sh` and `dash` to `posix`).
#[must_use]
pub fn normalize_shell_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem = [".exe", ".bat", ".cmd"]
        .iter()
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(&lower);
    match stem {
        "pwsh" | "powershell" => "powershell".to_string(),
        "sh" | "dash" => "posix".to_string(),
        other => other.to_string(),
    }
}

/// Detect the current shell from `SHELL` (and, on Windows,
/// `POWERSHELL_DISTRIBUTION_CHANNEL`).
#[must_use]
pub fn detect_current_shell(registry: &ShellRegistry, platform: &Platform) -> Option<ShellKind> {
    detect_from(
        registry,
        platform,
        std::env::var("SHELL").ok().as_deref(),
        std::env::var("POWERSHELL_DISTRIBUTION_CHANNEL").ok().as_deref(),
    )
}

/// Environment-free core of [`detect_current_shell`].
#[must_use]
pub fn detect_from(
    registry: &ShellRegistry,
    platform: &Platform,
    shell_var: Option<&str>,
    ps_channel: Option<&str>,
) -> Option<ShellKind> {
    if platform.is_windows() && ps_channel.is_some_and(|c| !c.is_empty()) {
        return Some(ShellKind::PowerShell);
    }
    let shell = shell_var.filter(|s| !s.is_empty())?;
    let base = shell.rsplit(['/', '\\']).next().unwrap_or(shell);
    let name = normalize_shell_name(base);
    registry.get(&name).ok().map(|c| c.kind)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Os;

    #[test]
    fn normalize_maps_aliases() {
        assert_eq!(normalize_shell_name("pwsh.exe"), "powershell");
        assert_eq!(normalize_shell_name("PowerShell"), "powershell");
        assert_eq!(normalize_shell_name("dash"), "posix");
        assert_eq!(normalize_shell_name("sh"), "posix");
        assert_eq!(normalize_shell_name("Zsh"), "zsh");
    }

    #[test]
    fn detects_from_shell_path() {
        let registry = ShellRegistry::builtin();
        let unix = Platform::new(Os::Unix);
        assert_eq!(
            detect_from(&registry, &unix, Some("/usr/bin/zsh"), None),
            Some(ShellKind::Zsh)
        );
        assert_eq!(
            detect_from(&registry, &unix, Some("/bin/dash"), None),
            Some(ShellKind::Posix)
        );
    }

    #[test]
    fn unknown_or_missing_shell_is_none() {
        let registry = ShellRegistry::builtin();
        let unix = Platform::new(Os::Unix);
        assert_eq!(detect_from(&registry, &unix, Some("/bin/tcsh"), None), None);
        assert_eq!(detect_from(&registry, &unix, None, None), None);
    }

    #[test]
    fn windows_powershell_channel_wins() {
        let registry = ShellRegistry::builtin();
        let windows = Platform::new(Os::Windows);
        assert_eq!(
            detect_from(&registry, &windows, Some("C:\\bin\\bash.exe"), Some("MSI:Windows 10")),
            Some(ShellKind::PowerShell)
        );
        assert_eq!(
            detect_from(&registry, &windows, Some("C:\\bin\\bash.exe"), None),
            Some(ShellKind::Bash)
        );
    }

    #[test]
    fn channel_ignored_off_windows() {
        let registry = ShellRegistry::builtin();
        let unix = Platform::new(Os::Unix);
        assert_eq!(
            detect_from(&registry, &unix, Some("/bin/bash"), Some("PSGallery")),
            Some(ShellKind::Bash)
        );
    }
}
