//! Feature manifests: the per-shell list of configured features.
//!
//! A manifest is an ordered list of [`FeatureConfig`] entries with unique
//! names. Every mutation re-validates the entry it touches, so a manifest
//! held in memory is always well formed.
pub mod io;
pub mod load;
pub mod merge;
pub mod options;
pub mod trust;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ManifestError;
pub use options::OptionValue;

/// How a feature is loaded by the generated init script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Sourced synchronously at shell startup.
    Eager,
    /// Sourced in the background once the shell is interactive.
    Defer,
    /// Sourced the first time one of its trigger commands runs.
    OnCommand,
}

impl Strategy {
    /// Every strategy, in documentation order.
    pub const ALL: [Self; 3] = [Self::Eager, Self::Defer, Self::OnCommand];

    /// The manifest spelling of this strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Defer => "defer",
            Self::OnCommand => "on-command",
        }
    }

    /// Parse the manifest spelling; `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured feature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureConfig {
    /// Identifier, unique within a manifest.
    pub name: String,
    /// Load strategy; `None` means the catalog default applies.
    pub strategy: Option<Strategy>,
    /// Trigger commands for [`Strategy::OnCommand`], in order.
    pub on_command: Vec<String>,
    /// Whether the feature is excluded from the generated script.
    pub disabled: bool,
    /// Option values, already checked against the catalog schema.
    pub options: BTreeMap<String, OptionValue>,
}

impl FeatureConfig {
    /// A feature with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Strategy used for loading: the configured one, or eager.
    #[must_use]
    pub fn effective_strategy(&self) -> Strategy {
        self.strategy.unwrap_or(Strategy::Eager)
    }

    /// Check the entry's invariants.
    ///
    /// # Errors
    ///
    /// Returns the [`ManifestError`] variant for the first rule the entry breaks.
    pub fn validate(&self) -> Result<(), ManifestError> {
        validate_name(&self.name)?;
        if self.strategy == Some(Strategy::OnCommand) && self.on_command.is_empty() {
            return Err(ManifestError::MissingTriggerCommands(self.name.clone()));
        }
        Ok(())
    }
}

/// Check that a feature name is non-empty and made of `[A-Za-z0-9_-]`.
///
/// # Errors
///
/// Returns [`ManifestError::EmptyName`] or [`ManifestError::InvalidName`].
pub fn validate_name(name: &str) -> Result<(), ManifestError> {
    if name.is_empty() {
        return Err(ManifestError::EmptyName);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ManifestError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Ordered list of configured features for one shell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureManifest {
    /// Entries in file order.
    pub features: Vec<FeatureConfig>,
}

impl FeatureManifest {
    /// An empty manifest.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    /// Parse and validate manifest JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for malformed JSON and
    /// [`ManifestError::InvalidFeature`] for the first invalid entry.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        io::parse(bytes)
    }

    /// Serialize as 2-space indented JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        io::serialize(self)
    }

    /// Whether the manifest lists any feature at all.
    #[must_use]
    pub const fn has_features(&self) -> bool {
        !self.features.is_empty()
    }

    /// Features that are not disabled, in order.
    pub fn enabled_features(&self) -> impl Iterator<Item = &FeatureConfig> {
        self.features.iter().filter(|f| !f.disabled)
    }

    /// Append a validated feature.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or [`ManifestError::DuplicateFeature`] if
    /// the name is taken.
    pub fn add_feature(&mut self, feature: FeatureConfig) -> Result<(), ManifestError> {
        feature.validate()?;
        if self.position(&feature.name).is_some() {
            return Err(ManifestError::DuplicateFeature(feature.name));
        }
        self.features.push(feature);
        Ok(())
    }

    /// Remove a feature by name and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::FeatureNotFound`] if absent.
    pub fn remove_feature(&mut self, name: &str) -> Result<FeatureConfig, ManifestError> {
        let idx = self.require(name)?;
        Ok(self.features.remove(idx))
    }

    /// Look up a feature by name.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::FeatureNotFound`] if absent.
    pub fn get_feature(&self, name: &str) -> Result<&FeatureConfig, ManifestError> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ManifestError::FeatureNotFound(name.to_string()))
    }

    /// Apply `mutator` to a feature and re-validate it.
    ///
    /// The manifest is left untouched if the mutated entry is invalid or
    /// was renamed onto another feature.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::FeatureNotFound`], a validation error, or
    /// [`ManifestError::DuplicateFeature`].
    pub fn update_feature(
        &mut self,
        name: &str,
        mutator: impl FnOnce(&mut FeatureConfig),
    ) -> Result<(), ManifestError> {
        let idx = self.require(name)?;
        let Some(current) = self.features.get(idx) else {
            return Err(ManifestError::FeatureNotFound(name.to_string()));
        };
        let mut updated = current.clone();
        mutator(&mut updated);
        updated.validate()?;
        if updated.name != name && self.position(&updated.name).is_some() {
            return Err(ManifestError::DuplicateFeature(updated.name));
        }
        if let Some(slot) = self.features.get_mut(idx) {
            *slot = updated;
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    fn require(&self, name: &str) -> Result<usize, ManifestError> {
        self.position(name)
            .ok_or_else(|| ManifestError::FeatureNotFound(name.to_string()))
    }
}
