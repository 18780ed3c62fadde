//! Generated init script resource.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// An init script whose desired content is already rendered.
#[derive(Debug, Clone)]
pub struct InitScriptResource {
    /// Script path inside `omd-shells/<shell>/`.
    pub path: PathBuf,
    /// Rendered script text.
    pub content: String,
}

impl InitScriptResource {
    /// Create a new init script resource.
    #[must_use]
    pub const fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }
}

impl Applicable for InitScriptResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.current_state()? == ResourceState::Correct {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        super::fs::write_atomic(&self.path, self.content.as_bytes())
            .with_context(|| format!("write init script: {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        if self.path.symlink_metadata().is_err() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        super::fs::remove_existing(&self.path)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for InitScriptResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: "init script path is a directory".to_string(),
            });
        }
        let existing = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Missing);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read init script: {}", self.path.display()));
            }
        };
        if existing == self.content.as_bytes() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            })
        }
    }
}
