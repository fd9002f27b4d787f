// Shared types for the cascading filter graph
use crate::model::{Cluster, Report};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One categorical filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Site,
    Location,
    DetailLocation,
    GeoCluster,
    LexicalCluster,
    SemanticCluster,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 6] = [
        FilterDimension::Site,
        FilterDimension::Location,
        FilterDimension::DetailLocation,
        FilterDimension::GeoCluster,
        FilterDimension::LexicalCluster,
        FilterDimension::SemanticCluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Location => "location",
            Self::DetailLocation => "detail_location",
            Self::GeoCluster => "geo_cluster",
            Self::LexicalCluster => "lexical_cluster",
            Self::SemanticCluster => "semantic_cluster",
        }
    }

    /// Parse from the snake_case name used in config files and on the command line
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

impl std::fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities that can be matched against a [`FilterState`]
pub trait Filterable {
    /// Value of this entity for a dimension, if it has one
    fn attribute(&self, dimension: FilterDimension) -> Option<&str>;
}

impl Filterable for Report {
    fn attribute(&self, dimension: FilterDimension) -> Option<&str> {
        match dimension {
            FilterDimension::Site => Some(&self.site),
            FilterDimension::Location => Some(&self.location),
            FilterDimension::DetailLocation => Some(&self.detail_location),
            FilterDimension::GeoCluster => self.clusters.geo.as_deref(),
            FilterDimension::LexicalCluster => self.clusters.lexical.as_deref(),
            FilterDimension::SemanticCluster => self.clusters.semantic.as_deref(),
        }
    }
}

impl Filterable for Cluster {
    fn attribute(&self, dimension: FilterDimension) -> Option<&str> {
        match dimension {
            FilterDimension::GeoCluster => self.assignment.geo.as_deref(),
            FilterDimension::LexicalCluster => self.assignment.lexical.as_deref(),
            FilterDimension::SemanticCluster => self.assignment.semantic.as_deref(),
            _ => None,
        }
    }
}

/// Immutable snapshot of every dimension's selection
///
/// Empty selections are not stored, so two states with the same effective
/// selections always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    selections: BTreeMap<FilterDimension, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty selection for a dimension
    pub fn selection(&self, dimension: FilterDimension) -> Option<&BTreeSet<String>> {
        self.selections.get(&dimension)
    }

    pub fn is_selected(&self, dimension: FilterDimension) -> bool {
        self.selections.contains_key(&dimension)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Dimensions with a non-empty selection
    pub fn active_dimensions(&self) -> impl Iterator<Item = FilterDimension> + '_ {
        self.selections.keys().copied()
    }

    pub(crate) fn with_selection(&self, dimension: FilterDimension, values: BTreeSet<String>) -> Self {
        let mut next = self.clone();
        if values.is_empty() {
            next.selections.remove(&dimension);
        } else {
            next.selections.insert(dimension, values);
        }
        next
    }

    pub(crate) fn without(mut self, dimensions: &[FilterDimension]) -> Self {
        for dimension in dimensions {
            self.selections.remove(dimension);
        }
        self
    }

    /// AND across dimensions, OR within a dimension. Empty selections always pass.
    pub fn matches<T: Filterable + ?Sized>(&self, item: &T) -> bool {
        self.selections.iter().all(|(dimension, allowed)| {
            item.attribute(*dimension)
                .map(|value| allowed.contains(value))
                .unwrap_or(false)
        })
    }
}

/// One ordered parent -> child chain of filter dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChainConfig {
    pub name: String,
    /// Dimensions from root to leaf
    pub levels: Vec<FilterDimension>,
    /// `edges[i]` maps each value of `levels[i]` to its values in `levels[i + 1]`
    pub edges: Vec<BTreeMap<String, Vec<String>>>,
}

/// All filter chains known to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersConfig {
    pub chains: Vec<FilterChainConfig>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            chains: vec![
                super::tables::location_chain(),
                super::tables::cluster_chain(),
            ],
        }
    }
}
