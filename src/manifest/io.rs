//! JSON wire format and file I/O for manifests.
//!
//! The wire structs keep `strategy` as a plain string so an unknown value
//! surfaces as [`ManifestError::InvalidStrategy`] rather than a generic
//! deserialization error. Zero values are omitted on output.
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::{FeatureConfig, FeatureManifest, OptionValue, Strategy};
use crate::error::ManifestError;
use crate::resources::fs::write_atomic;

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireManifest {
    #[serde(default, deserialize_with = "null_as_default")]
    features: Vec<WireFeature>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFeature {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    strategy: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    on_command: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    disabled: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    options: BTreeMap<String, OptionValue>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(b: &bool) -> bool {
    !*b
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TryFrom<WireFeature> for FeatureConfig {
    type Error = ManifestError;

    fn try_from(wire: WireFeature) -> Result<Self, Self::Error> {
        let strategy = if wire.strategy.is_empty() {
            None
        } else {
            Some(
                Strategy::parse(&wire.strategy).ok_or_else(|| ManifestError::InvalidStrategy {
                    name: wire.name.clone(),
                    strategy: wire.strategy.clone(),
                })?,
            )
        };
        let feature = Self {
            name: wire.name,
            strategy,
            on_command: wire.on_command,
            disabled: wire.disabled,
            options: wire.options,
        };
        feature.validate()?;
        Ok(feature)
    }
}

impl From<&FeatureConfig> for WireFeature {
    fn from(f: &FeatureConfig) -> Self {
        Self {
            name: f.name.clone(),
            strategy: f.strategy.map(|s| s.as_str().to_string()).unwrap_or_default(),
            on_command: f.on_command.clone(),
            disabled: f.disabled,
            options: f.options.clone(),
        }
    }
}

/// Parse and validate manifest JSON.
///
/// An empty object (`{}`) is an empty manifest.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] for malformed JSON and
/// [`ManifestError::InvalidFeature`] naming the first bad entry, including
/// a repeated name.
pub fn parse(bytes: &[u8]) -> Result<FeatureManifest, ManifestError> {
    let wire: WireManifest = serde_json::from_slice(bytes)?;
    let mut seen = HashSet::new();
    let mut features = Vec::with_capacity(wire.features.len());
    for (index, raw) in wire.features.into_iter().enumerate() {
        let invalid = |source| ManifestError::InvalidFeature {
            index,
            source: Box::new(source),
        };
        let feature = FeatureConfig::try_from(raw).map_err(invalid)?;
        if !seen.insert(feature.name.clone()) {
            return Err(invalid(ManifestError::DuplicateFeature(feature.name)));
        }
        features.push(feature);
    }
    Ok(FeatureManifest { features })
}

/// Serialize a manifest as 2-space indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if `serde_json` refuses the value.
pub fn serialize(manifest: &FeatureManifest) -> Result<String, ManifestError> {
    let wire = WireManifest {
        features: manifest.features.iter().map(WireFeature::from).collect(),
    };
    let mut out = serde_json::to_string_pretty(&wire)?;
    out.push('\n');
    Ok(out)
}

/// Read and parse a manifest file.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse`].
pub fn read_manifest(path: &Path) -> Result<FeatureManifest, ManifestError> {
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&bytes)
}

/// Serialize a manifest and atomically replace `path` with it.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file cannot be written.
pub fn write_manifest(path: &Path, manifest: &FeatureManifest) -> Result<(), ManifestError> {
    let json = serialize(manifest)?;
    write_atomic(path, json.as_bytes()).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })
}
