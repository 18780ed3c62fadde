//! Metadata for the stock features shipped with oh-my-dot.
use crate::manifest::options::{OptionKind, OptionSpec};
use crate::manifest::{OptionValue, Strategy};
use crate::shell::ShellKind;

/// Catalog entry for one feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMetadata {
    /// Feature identifier.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Grouping such as `prompt` or `completion`.
    pub category: &'static str,
    /// Strategy used when the user does not pick one.
    pub default_strategy: Strategy,
    /// Trigger commands used for `on-command` when none are given.
    pub default_commands: &'static [&'static str],
    /// Dialects this feature has an implementation for.
    pub supported_shells: &'static [ShellKind],
    /// Declared options.
    pub options: Vec<OptionSpec>,
}

impl FeatureMetadata {
    /// Whether `shell` is among [`supported_shells`](Self::supported_shells).
    #[must_use]
    pub fn supports(&self, shell: ShellKind) -> bool {
        self.supported_shells.contains(&shell)
    }

    /// Default trigger commands as owned strings.
    #[must_use]
    pub fn default_triggers(&self) -> Vec<String> {
        self.default_commands.iter().map(ToString::to_string).collect()
    }
}

const POSIX_FAMILY: &[ShellKind] = &[
    ShellKind::Bash,
    ShellKind::Zsh,
    ShellKind::Fish,
    ShellKind::Posix,
];
const INTERACTIVE: &[ShellKind] = &[ShellKind::Bash, ShellKind::Zsh, ShellKind::Fish];

const fn entry(
    name: &'static str,
    description: &'static str,
    category: &'static str,
    default_strategy: Strategy,
    default_commands: &'static [&'static str],
    supported_shells: &'static [ShellKind],
) -> FeatureMetadata {
    FeatureMetadata {
        name,
        description,
        category,
        default_strategy,
        default_commands,
        supported_shells,
        options: Vec::new(),
    }
}

/// The set of features `add` knows defaults and options for.
#[derive(Debug, Clone)]
pub struct Catalog {
    features: Vec<FeatureMetadata>,
}

impl Catalog {
    /// The ten stock features.
    #[must_use]
    pub fn builtin() -> Self {
        let completion = |name: &'static str,
                          description: &'static str,
                          commands: &'static [&'static str]| {
            entry(name, description, "completion", Strategy::OnCommand, commands, INTERACTIVE)
        };

        let mut git_prompt = entry(
            "git-prompt",
            "Git branch and status in shell prompt",
            "prompt",
            Strategy::Defer,
            &[],
            INTERACTIVE,
        );
        git_prompt.options.push(OptionSpec {
            name: "style",
            description: "How much repository state the prompt shows",
            kind: OptionKind::Enum {
                choices: &["minimal", "full"],
            },
            required: false,
            default: Some(OptionValue::Text("minimal".to_string())),
        });

        let mut python_venv = entry(
            "python-venv",
            "Python virtual environment helpers",
            "tool",
            Strategy::Eager,
            &[],
            INTERACTIVE,
        );
        python_venv.options.push(OptionSpec {
            name: "venv_dir",
            description: "Directory holding named virtual environments",
            kind: OptionKind::Path { must_exist: false },
            required: false,
            default: None,
        });
        python_venv.options.push(OptionSpec {
            name: "auto_activate",
            description: "Activate .venv when entering a directory that has one",
            kind: OptionKind::Bool,
            required: false,
            default: Some(OptionValue::Bool(false)),
        });

        let mut shortcuts = entry(
            "directory-shortcuts",
            "Quick navigation to common directories",
            "alias",
            Strategy::Eager,
            &[],
            POSIX_FAMILY,
        );
        shortcuts.options.push(OptionSpec {
            name: "projects_dir",
            description: "Target of the `proj` shortcut",
            kind: OptionKind::Path { must_exist: false },
            required: false,
            default: None,
        });
        shortcuts.options.push(OptionSpec {
            name: "max_depth",
            description: "How many parent levels the `up` helper accepts",
            kind: OptionKind::Int { min: 1, max: 20 },
            required: false,
            default: Some(OptionValue::Int(5)),
        });

        Self {
            features: vec![
                entry(
                    "core-aliases",
                    "Essential command aliases (ls, cd, git shortcuts)",
                    "alias",
                    Strategy::Eager,
                    &[],
                    POSIX_FAMILY,
                ),
                git_prompt,
                completion("kubectl-completion", "Kubernetes CLI command completion", &["kubectl"]),
                completion("docker-completion", "Docker CLI command completion", &["docker"]),
                entry(
                    "nvm",
                    "Node Version Manager integration",
                    "tool",
                    Strategy::OnCommand,
                    &["nvm", "node", "npm"],
                    INTERACTIVE,
                ),
                completion(
                    "terraform-completion",
                    "Terraform CLI command completion",
                    &["terraform", "tf"],
                ),
                completion("aws-completion", "AWS CLI command completion", &["aws"]),
                completion("gcloud-completion", "Google Cloud CLI command completion", &["gcloud"]),
                python_venv,
                shortcuts,
            ],
        }
    }

    /// Look up a feature by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureMetadata> {
        self.features.iter().find(|f| f.name == name)
    }

    /// All features in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureMetadata> {
        self.features.iter()
    }

    /// Whether `name` can be added to `shell`.
    ///
    /// Features outside the catalog are user-defined and allowed anywhere.
    #[must_use]
    pub fn allows(&self, name: &str, shell: ShellKind) -> bool {
        self.get(name).is_none_or(|f| f.supports(shell))
    }

    /// Shells `add --all` targets for `name`.
    ///
    /// User-defined features default to every dialect except PowerShell.
    #[must_use]
    pub fn default_shells(&self, name: &str) -> &'static [ShellKind] {
        self.get(name).map_or(POSIX_FAMILY, |f| f.supported_shells)
    }

    /// Strategy for `name` when the user gave none.
    #[must_use]
    pub fn default_strategy(&self, name: &str) -> Strategy {
        self.get(name).map_or(Strategy::Eager, |f| f.default_strategy)
    }
}
