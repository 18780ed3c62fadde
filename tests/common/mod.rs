// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed dotfiles repository and a fluent
// builder so each integration test can set up an isolated `omd-shells/`
// tree without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use oh_my_dot::catalog::Catalog;
use oh_my_dot::error::TrustViolation;
use oh_my_dot::logging::{ActionStatus, Log};
use oh_my_dot::manifest::trust::LocalOverrideTrustPolicy;
use oh_my_dot::shell::{ShellConfig, ShellRegistry};
use oh_my_dot::workspace::Workspace;

/// [`Log`] that keeps warnings and dry-run messages for assertions.
#[derive(Debug, Default)]
pub struct RecordingLog {
    pub warnings: Mutex<Vec<String>>,
    pub dry_runs: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("lock warnings").clone()
    }

    pub fn dry_runs(&self) -> Vec<String> {
        self.dry_runs.lock().expect("lock dry runs").clone()
    }
}

impl Log for RecordingLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, msg: &str) {
        self.warnings.lock().expect("lock warnings").push(msg.to_string());
    }
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, msg: &str) {
        self.dry_runs.lock().expect("lock dry runs").push(msg.to_string());
    }
    fn record(&self, _name: &str, _status: ActionStatus, _message: Option<&str>) {}
}

/// Trust decision fixed at construction, so tests do not depend on the
/// host's file ownership rules.
#[derive(Debug, Clone, Copy)]
pub struct FixedTrust(pub bool);

impl LocalOverrideTrustPolicy for FixedTrust {
    fn verify(&self, _path: &Path) -> Result<(), TrustViolation> {
        if self.0 {
            Ok(())
        } else {
            Err(TrustViolation::NotRegularFile)
        }
    }
}

/// An isolated dotfiles repository backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory acting as the repository root.
    pub root: tempfile::TempDir,
    pub registry: ShellRegistry,
    pub catalog: Catalog,
    pub policy: FixedTrust,
    pub log: RecordingLog,
}

impl IntegrationTestContext {
    /// An empty repository that trusts local overrides.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
            registry: ShellRegistry::builtin(),
            catalog: Catalog::builtin(),
            policy: FixedTrust(true),
            log: RecordingLog::default(),
        }
    }

    /// Path to the repository root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// A workspace over this repository.
    pub fn workspace(&self) -> Workspace<'_> {
        Workspace::new(
            self.root.path(),
            &self.registry,
            &self.catalog,
            &self.policy,
            &self.log,
        )
    }

    /// Registry entry for `name`.
    pub fn shell(&self, name: &str) -> &ShellConfig {
        self.registry.get(name).expect("known shell")
    }

    /// `omd-shells/<rel>` under the repository.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join("omd-shells").join(rel)
    }

    /// Contents of `omd-shells/<rel>`.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read repository file")
    }

    /// Write `omd-shells/<rel>`, creating parents.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write repository file");
    }
}

/// Fluent builder for [`IntegrationTestContext`].
///
/// Allows individual tests to seed manifests and feature files before the
/// workspace touches the repository.
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a context over an empty repository.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Refuse every local override file.
    pub fn distrusting_local_overrides(mut self) -> Self {
        self.ctx.policy = FixedTrust(false);
        self
    }

    /// Write `omd-shells/<shell>/enabled.json`.
    pub fn with_manifest(self, shell: &str, json: &str) -> Self {
        self.ctx.write(&format!("{shell}/enabled.json"), json);
        self
    }

    /// Write `omd-shells/<shell>/enabled.local.json`.
    pub fn with_local_manifest(self, shell: &str, json: &str) -> Self {
        self.ctx.write(&format!("{shell}/enabled.local.json"), json);
        self
    }

    /// Write `omd-shells/<shell>/features/<file>`.
    pub fn with_feature_file(self, shell: &str, file: &str, content: &str) -> Self {
        self.ctx.write(&format!("{shell}/features/{file}"), content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
