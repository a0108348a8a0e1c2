//! Strict-offline validation: does the manifest cover every required kind?

use crate::catalog::AssetKind;
use crate::features::FeatureSet;
use crate::manifest::AssetManifest;
use std::collections::BTreeSet;
use thiserror::Error;

/// Required asset kinds with no local file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing offline assets: {}", join_keys(.0))]
pub struct MissingAssets(pub BTreeSet<AssetKind>);

impl MissingAssets {
    pub fn kinds(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.0.iter().copied()
    }
}

fn join_keys(kinds: &BTreeSet<AssetKind>) -> String {
    kinds.iter().map(|k| k.key()).collect::<Vec<_>>().join(", ")
}

/// Ok when every kind in `features` resolves in `manifest`.
pub fn validate(features: &FeatureSet, manifest: &AssetManifest) -> Result<(), MissingAssets> {
    let missing: BTreeSet<AssetKind> = features
        .iter()
        .filter(|k| !manifest.is_resolved(*k))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingAssets(missing))
    }
}
