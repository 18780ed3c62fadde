//! Load a shell's tracked manifest together with its local override.
use std::path::Path;

use super::io::read_manifest;
use super::merge::{MergedManifest, merge};
use super::trust::LocalOverrideTrustPolicy;
use super::FeatureManifest;
use crate::error::ManifestError;
use crate::logging::Log;

/// Read `base`, read `local` if present and trusted, and merge them.
///
/// # Errors
///
/// Returns an error only for the base manifest. A local file that the
/// policy refuses or that fails to parse is logged and ignored.
pub fn load_merged(
    base: &Path,
    local: &Path,
    policy: &dyn LocalOverrideTrustPolicy,
    log: &dyn Log,
) -> Result<MergedManifest, ManifestError> {
    let base_manifest = read_manifest(base)?;
    let local_manifest = load_local(local, policy, log);
    Ok(merge(base_manifest, local_manifest))
}

/// Read the local override manifest, or `None` if it is absent or untrusted.
pub fn load_local(
    path: &Path,
    policy: &dyn LocalOverrideTrustPolicy,
    log: &dyn Log,
) -> Option<FeatureManifest> {
    if let Err(e) = path.symlink_metadata()
        && e.kind() == std::io::ErrorKind::NotFound
    {
        return None;
    }

    let bytes = match policy.read_trusted(path) {
        Ok(bytes) => bytes,
        Err(violation) => {
            log.warn(&format!(
                "ignoring local override {}: {violation}",
                path.display()
            ));
            return None;
        }
    };

    match FeatureManifest::parse(&bytes) {
        Ok(manifest) => {
            log.debug(&format!(
                "loaded {} local override(s) from {}",
                manifest.features.len(),
                path.display()
            ));
            Some(manifest)
        }
        Err(e) => {
            log.warn(&format!("ignoring local override {}: {e}", path.display()));
            None
        }
    }
}
