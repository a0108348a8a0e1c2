//! Which optional map plugins a document uses, and what that requires.
//!
//! [`Plugins`] is the caller's declaration ("this map has a time slider and an
//! animated track"). It drives two things:
//!
//! - the Fetcher's download plan (core group plus each enabled group), and
//! - the [`FeatureSet`] the strict-offline validator checks a manifest against.

use crate::catalog::{AssetKind, PluginGroup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Optional plugin groups in use. The core group is implied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Plugins {
    /// Time animation (Leaflet.TimeDimension, moment, iso8601).
    pub time: bool,
    /// Animated tracks (leaflet-ant-path).
    pub ant_path: bool,
    /// Clustered markers (leaflet.markercluster).
    pub clustering: bool,
    /// Drawing tools (leaflet.draw).
    pub draw: bool,
}

impl Plugins {
    /// Every plugin enabled.
    pub fn all() -> Self {
        Self {
            time: true,
            ant_path: true,
            clustering: true,
            draw: true,
        }
    }

    pub fn includes(&self, group: PluginGroup) -> bool {
        match group {
            PluginGroup::Core => true,
            PluginGroup::Time => self.time,
            PluginGroup::AntPath => self.ant_path,
            PluginGroup::Clustering => self.clustering,
            PluginGroup::Draw => self.draw,
        }
    }

    /// Enabled groups, core first.
    pub fn groups(&self) -> Vec<PluginGroup> {
        [
            PluginGroup::Core,
            PluginGroup::Time,
            PluginGroup::AntPath,
            PluginGroup::Clustering,
            PluginGroup::Draw,
        ]
        .into_iter()
        .filter(|g| self.includes(*g))
        .collect()
    }
}

/// The asset kinds a document actually requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    kinds: BTreeSet<AssetKind>,
}

impl FeatureSet {
    /// Core kinds plus the kinds of every enabled plugin group.
    pub fn from_plugins(plugins: &Plugins) -> Self {
        let kinds = AssetKind::ALL
            .into_iter()
            .filter(|k| plugins.includes(k.group()))
            .collect();
        Self { kinds }
    }

    /// Explicit set, for callers that track requirements per kind.
    pub fn from_kinds(kinds: impl IntoIterator<Item = AssetKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn contains(&self, kind: AssetKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.kinds.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
