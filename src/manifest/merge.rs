//! Merge a tracked manifest with an optional local override manifest.
use std::collections::HashMap;

use super::{FeatureConfig, FeatureManifest};

/// Provenance of a merged feature.
///
/// At most one of `is_from_local` and `is_overridden` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalOverride {
    /// A local manifest was merged (it may not mention this feature).
    pub has_local: bool,
    /// The feature exists only in the local manifest.
    pub is_from_local: bool,
    /// The feature exists in the base manifest and local changed it.
    pub is_overridden: bool,
}

/// A feature after merging, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFeature {
    /// Effective configuration.
    pub config: FeatureConfig,
    /// Where the configuration came from.
    pub local: LocalOverride,
}

/// Base features in base order, then local-only features in local order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergedManifest {
    /// Merged entries.
    pub features: Vec<MergedFeature>,
}

impl MergedManifest {
    /// Features that are not disabled, in merged order.
    pub fn enabled_features(&self) -> impl Iterator<Item = &FeatureConfig> {
        self.features
            .iter()
            .map(|f| &f.config)
            .filter(|c| !c.disabled)
    }

    /// Look up a merged feature by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MergedFeature> {
        self.features.iter().find(|f| f.config.name == name)
    }
}

/// Merge `base` with an optional `local` manifest.
///
/// For a feature present in both, local `strategy` and `onCommand` replace the
/// base values only when set, and local `disabled` always wins.
#[must_use]
pub fn merge(base: FeatureManifest, local: Option<FeatureManifest>) -> MergedManifest {
    let Some(local) = local else {
        return MergedManifest {
            features: base
                .features
                .into_iter()
                .map(|config| MergedFeature {
                    config,
                    local: LocalOverride::default(),
                })
                .collect(),
        };
    };

    let index: HashMap<String, usize> = local
        .features
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();
    let mut pending: Vec<Option<FeatureConfig>> = local.features.into_iter().map(Some).collect();

    let mut features = Vec::with_capacity(base.features.len() + pending.len());
    for config in base.features {
        let over = index
            .get(&config.name)
            .and_then(|&i| pending.get_mut(i))
            .and_then(Option::take);
        features.push(match over {
            Some(over) => MergedFeature {
                config: apply_override(config, over),
                local: LocalOverride {
                    has_local: true,
                    is_from_local: false,
                    is_overridden: true,
                },
            },
            None => MergedFeature {
                config,
                local: LocalOverride {
                    has_local: true,
                    ..LocalOverride::default()
                },
            },
        });
    }

    features.extend(pending.into_iter().flatten().map(|config| MergedFeature {
        config,
        local: LocalOverride {
            has_local: true,
            is_from_local: true,
            is_overridden: false,
        },
    }));

    MergedManifest { features }
}

fn apply_override(mut base: FeatureConfig, over: FeatureConfig) -> FeatureConfig {
    if over.strategy.is_some() {
        base.strategy = over.strategy;
    }
    if !over.on_command.is_empty() {
        base.on_command = over.on_command;
    }
    base.disabled = over.disabled;
    base
}
