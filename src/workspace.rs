//! Per-repository pipeline: shell directories, feature edits, regeneration.
//!
//! Every feature edit persists `enabled.json` and then regenerates the init
//! script from the merged manifest, so the script on disk always matches
//! the tracked manifest plus any trusted local override.
use anyhow::{Context as _, Result, bail};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{Catalog, FeatureMetadata};
use crate::error::ShellError;
use crate::generate;
use crate::logging::{ActionStatus, Log};
use crate::manifest::io::{read_manifest, write_manifest};
use crate::manifest::load::load_merged;
use crate::manifest::merge::MergedManifest;
use crate::manifest::options::{OptionContext, validate_options};
use crate::manifest::trust::LocalOverrideTrustPolicy;
use crate::manifest::{FeatureConfig, FeatureManifest, OptionValue, Strategy};
use crate::resources::fs::ensure_parent_dir;
use crate::resources::init_script::InitScriptResource;
use crate::resources::{Applicable as _, Resource as _, ResourceChange};
use crate::shell::layout::{HELPERS_SH, LIB_DIR, RepoLayout, ShellLayout};
use crate::shell::{ShellConfig, ShellKind, ShellRegistry};

/// What the user asked `feature add` for.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// Feature name.
    pub name: String,
    /// Strategy; the catalog default applies when `None`.
    pub strategy: Option<Strategy>,
    /// Trigger commands; catalog defaults apply when empty.
    pub on_command: Vec<String>,
    /// Add the feature in the disabled state.
    pub disabled: bool,
    /// Raw option values, validated against the catalog schema.
    pub options: BTreeMap<String, OptionValue>,
}

impl AddRequest {
    /// A request with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A dotfiles repository plus the collaborators every operation needs.
pub struct Workspace<'a> {
    layout: RepoLayout,
    registry: &'a ShellRegistry,
    catalog: &'a Catalog,
    policy: &'a dyn LocalOverrideTrustPolicy,
    log: &'a dyn Log,
    option_ctx: OptionContext,
    dry_run: bool,
}

impl std::fmt::Debug for Workspace<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.layout.root())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Workspace<'a> {
    /// Workspace rooted at `root`.
    #[must_use]
    pub fn new(
        root: &Path,
        registry: &'a ShellRegistry,
        catalog: &'a Catalog,
        policy: &'a dyn LocalOverrideTrustPolicy,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            layout: RepoLayout::new(root),
            registry,
            catalog,
            policy,
            log,
            option_ctx: OptionContext::default(),
            dry_run: false,
        }
    }

    /// Use `ctx` for path-typed option checks.
    #[must_use]
    pub fn with_option_context(mut self, ctx: OptionContext) -> Self {
        self.option_ctx = ctx;
        self
    }

    /// Report changes instead of writing them.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Repository layout.
    #[must_use]
    pub const fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    /// Paths for `shell`.
    #[must_use]
    pub fn shell_layout(&self, shell: &ShellConfig) -> ShellLayout {
        self.layout.shell(shell)
    }

    /// Create `omd-shells/<shell>/`, the shared helper library, an empty
    /// manifest and the init script. Existing files are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or file cannot be created.
    pub fn init_shell(&self, shell: &ShellConfig) -> Result<ResourceChange> {
        let paths = self.layout.shell(shell);
        if paths.is_initialized() {
            self.log.debug(&format!("{} already initialized", shell.name()));
            return Ok(ResourceChange::AlreadyCorrect);
        }
        if self.dry_run {
            self.log
                .dry_run(&format!("would initialize {}", paths.dir.display()));
            return Ok(ResourceChange::Skipped {
                reason: "dry run".to_string(),
            });
        }

        std::fs::create_dir_all(&paths.features_dir)
            .with_context(|| format!("create {}", paths.features_dir.display()))?;
        let helpers = self.layout.helpers_path();
        if !helpers.exists() {
            ensure_parent_dir(&helpers)?;
            std::fs::write(&helpers, HELPERS_SH)
                .with_context(|| format!("write {}", helpers.display()))?;
        }
        write_manifest(&paths.manifest, &FeatureManifest::new())
            .with_context(|| format!("create {}", paths.manifest.display()))?;
        self.regenerate(shell)?;
        self.log.info(&format!("initialized {}", paths.dir.display()));
        Ok(ResourceChange::Applied)
    }

    /// Add a feature to `shell`, initializing the shell on demand.
    ///
    /// Catalog defaults fill in the strategy and trigger commands, options
    /// are checked against the catalog schema, and a feature file template
    /// is written unless one already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog does not offer the feature for this
    /// shell, if validation fails, or on I/O failure.
    pub fn add_feature(&self, shell: &ShellConfig, req: &AddRequest) -> Result<FeatureConfig> {
        if !self.catalog.allows(&req.name, shell.kind) {
            bail!(
                "feature '{}' does not support shell '{}'",
                req.name,
                shell.name()
            );
        }
        let metadata = self.catalog.get(&req.name);
        if metadata.is_none() {
            self.log.warn(&format!(
                "feature '{}' not found in catalog, using defaults",
                req.name
            ));
        }

        let feature = self.resolve_request(shell, metadata, req)?;
        let paths = self.layout.shell(shell);
        let mut manifest = if paths.is_initialized() {
            self.read_base(&paths)?
        } else {
            FeatureManifest::new()
        };
        manifest
            .add_feature(feature.clone())
            .with_context(|| format!("adding '{}' to {}", req.name, shell.name()))?;

        if self.dry_run {
            self.log.dry_run(&format!(
                "would add {} to {} ({})",
                feature.name,
                shell.name(),
                feature.effective_strategy()
            ));
            return Ok(feature);
        }

        self.init_shell(shell)?;
        write_manifest(&paths.manifest, &manifest)
            .with_context(|| format!("write {}", paths.manifest.display()))?;
        self.write_feature_template(shell, &paths, &feature, metadata)?;
        self.regenerate(shell)?;
        Ok(feature)
    }

    /// Remove a feature from `shell` and delete its feature file.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is not initialized, the feature is not
    /// in the manifest, or on I/O failure.
    pub fn remove_feature(&self, shell: &ShellConfig, name: &str) -> Result<FeatureConfig> {
        let paths = self.require_initialized(shell)?;
        let mut manifest = self.read_base(&paths)?;
        let removed = manifest.remove_feature(name)?;
        let file = paths.feature_file(name);

        if self.dry_run {
            self.log.dry_run(&format!(
                "would remove {name} from {} and delete {}",
                shell.name(),
                file.display()
            ));
            return Ok(removed);
        }

        write_manifest(&paths.manifest, &manifest)
            .with_context(|| format!("write {}", paths.manifest.display()))?;
        match std::fs::remove_file(&file) {
            Ok(()) => self.log.debug(&format!("deleted {}", file.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("delete {}", file.display())),
        }
        self.regenerate(shell)?;
        Ok(removed)
    }

    /// Clear `disabled`, optionally switching strategy or trigger commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is missing, the result is invalid,
    /// or on I/O failure.
    pub fn enable_feature(
        &self,
        shell: &ShellConfig,
        name: &str,
        strategy: Option<Strategy>,
        on_command: &[String],
    ) -> Result<()> {
        self.check_triggers(shell, on_command)?;
        self.edit_feature(shell, name, "enable", |f| {
            f.disabled = false;
            if let Some(s) = strategy {
                f.strategy = Some(s);
            }
            if !on_command.is_empty() {
                f.on_command = on_command.to_vec();
            }
        })
    }

    /// Set `disabled` on a feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is missing or on I/O failure.
    pub fn disable_feature(&self, shell: &ShellConfig, name: &str) -> Result<()> {
        self.edit_feature(shell, name, "disable", |f| f.disabled = true)
    }

    /// Tracked manifest merged with the trusted local override.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is not initialized or the tracked
    /// manifest cannot be read.
    pub fn load(&self, shell: &ShellConfig) -> Result<MergedManifest> {
        let paths = self.require_initialized(shell)?;
        load_merged(&paths.manifest, &paths.local_manifest, self.policy, self.log)
            .with_context(|| format!("loading {}", paths.manifest.display()))
    }

    /// Render the init script for `shell` without writing it.
    ///
    /// Trigger commands the script cannot wrap, and triggers claimed by more
    /// than one feature, are logged as warnings.
    ///
    /// # Errors
    ///
    /// Propagates [`load`](Self::load) errors.
    pub fn render(&self, shell: &ShellConfig) -> Result<String> {
        let features = generate::categorize(&self.load(shell)?);
        for issue in generate::trigger_issues(shell.kind, &features) {
            self.log.warn(&format!("{}: {issue}", shell.name()));
        }
        Ok(generate::generator_for(shell.kind).generate(&features))
    }

    /// Regenerate the init script of `shell`.
    ///
    /// The script is rendered completely before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, rendering or writing fails.
    pub fn regenerate(&self, shell: &ShellConfig) -> Result<ResourceChange> {
        let paths = self.layout.shell(shell);
        let script = InitScriptResource::new(paths.init_script, self.render(shell)?);
        let name = shell.name();

        if self.dry_run {
            if script.needs_change()? {
                self.log
                    .dry_run(&format!("would rewrite {}", script.description()));
                self.log.record(name, ActionStatus::DryRun, Some("init script differs"));
                return Ok(ResourceChange::Skipped {
                    reason: "dry run".to_string(),
                });
            }
            self.log.record(name, ActionStatus::Unchanged, None);
            return Ok(ResourceChange::AlreadyCorrect);
        }

        let change = script.apply()?;
        match change {
            ResourceChange::Applied => {
                self.log.debug(&format!("wrote {}", script.description()));
                self.log.record(name, ActionStatus::Changed, None);
            }
            ResourceChange::AlreadyCorrect => self.log.record(name, ActionStatus::Unchanged, None),
            ResourceChange::Skipped { ref reason } => {
                self.log.record(name, ActionStatus::Skipped, Some(reason.as_str()));
            }
        }
        Ok(change)
    }

    /// Regenerate every initialized shell the registry knows.
    ///
    /// A failing shell is logged and recorded; the others still run.
    ///
    /// # Errors
    ///
    /// Returns an error only if `omd-shells/` cannot be listed.
    pub fn regenerate_all(&self) -> Result<Vec<(ShellKind, ResourceChange)>> {
        let mut results = Vec::new();
        for name in self.list_shells()? {
            let Ok(shell) = self.registry.get(&name) else {
                self.log
                    .warn(&format!("skipping unsupported shell directory: {name}"));
                continue;
            };
            match self.regenerate(shell) {
                Ok(change) => results.push((shell.kind, change)),
                Err(e) => {
                    self.log.error(&format!("{name}: {e:#}"));
                    self.log
                        .record(&name, ActionStatus::Failed, Some(e.to_string().as_str()));
                }
            }
        }
        Ok(results)
    }

    /// Names of initialized shell directories, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `omd-shells/` exists but cannot be read.
    pub fn list_shells(&self) -> Result<Vec<String>> {
        let dir = self.layout.shells_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", dir.display())),
        };
        let mut shells = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != LIB_DIR
                && entry.path().is_dir()
                && entry.path().join(crate::shell::layout::MANIFEST_FILE).is_file()
            {
                shells.push(name);
            }
        }
        shells.sort();
        Ok(shells)
    }

    /// Whether `shell`'s tracked manifest has no features left.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read.
    pub fn needs_cleanup(&self, shell: &ShellConfig) -> Result<bool> {
        let paths = self.require_initialized(shell)?;
        Ok(!self.read_base(&paths)?.has_features())
    }

    /// Delete `omd-shells/<shell>/` entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn cleanup_shell(&self, shell: &ShellConfig) -> Result<ResourceChange> {
        let dir = self.layout.shell(shell).dir;
        if !dir.exists() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        if self.dry_run {
            self.log.dry_run(&format!("would delete {}", dir.display()));
            return Ok(ResourceChange::Skipped {
                reason: "dry run".to_string(),
            });
        }
        std::fs::remove_dir_all(&dir).with_context(|| format!("delete {}", dir.display()))?;
        self.log.info(&format!("deleted {}", dir.display()));
        Ok(ResourceChange::Applied)
    }

    fn require_initialized(&self, shell: &ShellConfig) -> Result<ShellLayout> {
        let paths = self.layout.shell(shell);
        if !paths.is_initialized() {
            return Err(ShellError::NotInitialized(shell.name().to_string()).into());
        }
        Ok(paths)
    }

    fn read_base(&self, paths: &ShellLayout) -> Result<FeatureManifest> {
        read_manifest(&paths.manifest).with_context(|| format!("loading {}", paths.manifest.display()))
    }

    fn edit_feature(
        &self,
        shell: &ShellConfig,
        name: &str,
        verb: &str,
        mutator: impl FnOnce(&mut FeatureConfig),
    ) -> Result<()> {
        let paths = self.require_initialized(shell)?;
        let mut manifest = self.read_base(&paths)?;
        manifest
            .update_feature(name, mutator)
            .with_context(|| format!("cannot {verb} '{name}' in {}", shell.name()))?;
        if self.dry_run {
            self.log
                .dry_run(&format!("would {verb} {name} in {}", shell.name()));
            return Ok(());
        }
        write_manifest(&paths.manifest, &manifest)
            .with_context(|| format!("write {}", paths.manifest.display()))?;
        self.regenerate(shell)?;
        Ok(())
    }

    fn check_triggers(&self, shell: &ShellConfig, triggers: &[String]) -> Result<()> {
        let strict = shell.kind == ShellKind::Posix;
        if let Some(bad) = triggers
            .iter()
            .find(|c| !generate::is_function_name(c, strict))
        {
            bail!(
                "trigger command '{bad}' cannot be wrapped as a {} function",
                shell.name()
            );
        }
        Ok(())
    }

    fn resolve_request(
        &self,
        shell: &ShellConfig,
        metadata: Option<&FeatureMetadata>,
        req: &AddRequest,
    ) -> Result<FeatureConfig> {
        let strategy = req
            .strategy
            .or_else(|| metadata.map(|m| m.default_strategy));
        let on_command = match metadata {
            Some(m) if req.on_command.is_empty() && m.default_strategy == Strategy::OnCommand => {
                m.default_triggers()
            }
            _ => req.on_command.clone(),
        };
        self.check_triggers(shell, &on_command)?;

        let specs = metadata.map_or(&[][..], |m| m.options.as_slice());
        let options = validate_options(&req.name, specs, &req.options, &self.option_ctx)?;

        Ok(FeatureConfig {
            name: req.name.clone(),
            strategy,
            on_command,
            disabled: req.disabled,
            options,
        })
    }

    fn write_feature_template(
        &self,
        shell: &ShellConfig,
        paths: &ShellLayout,
        feature: &FeatureConfig,
        metadata: Option<&FeatureMetadata>,
    ) -> Result<()> {
        let file = paths.feature_file(&feature.name);
        if file.exists() {
            self.log
                .debug(&format!("keeping existing {}", file.display()));
            return Ok(());
        }
        let text = feature_template(
            shell.kind,
            &feature.name,
            metadata.map(|m| m.description),
            &feature.options,
        );
        ensure_parent_dir(&file)?;
        std::fs::write(&file, text).with_context(|| format!("write {}", file.display()))?;
        self.log.info(&format!("created {}", file.display()));
        Ok(())
    }
}

/// Starter content for a new feature file.
#[must_use]
pub fn feature_template(
    kind: ShellKind,
    name: &str,
    description: Option<&str>,
    options: &BTreeMap<String, OptionValue>,
) -> String {
    let first_line = match kind {
        ShellKind::Bash => "#!/usr/bin/env bash",
        ShellKind::Zsh => "#!/usr/bin/env zsh",
        ShellKind::Fish => "#!/usr/bin/env fish",
        ShellKind::PowerShell => "# PowerShell",
        ShellKind::Posix => "#!/usr/bin/env sh",
    };
    let mut out = format!(
        "{first_line}\n# oh-my-dot feature: {name}\n# {}\n#\n",
        description.unwrap_or("Custom feature")
    );
    if kind == ShellKind::PowerShell {
        out.push_str("# Declare functions as `function global:Name { ... }` so they stay\n# defined after this file is loaded.\n#\n");
    }
    out.push_str("# Add your shell configuration below\n\n");
    if !options.is_empty() {
        out.push_str("# Configured options:\n");
        for (key, value) in options {
            out.push_str(&format!("#   {key}: {value}\n"));
        }
        out.push('\n');
    }
    out
}
