// Filter graph: ordered chains of cascading filter nodes
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{HazardError, Result};
use crate::filtering::node::FilterNode;
use crate::filtering::types::{FilterChainConfig, FilterDimension, FilterState, FiltersConfig};

/// Composes every configured chain into one graph
///
/// The cascade logic is generic: the location chain and the cluster chain
/// differ only in their lookup tables.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    nodes: BTreeMap<FilterDimension, FilterNode>,
    chains: Vec<(String, Vec<FilterDimension>)>,
}

impl FilterGraph {
    /// Build the graph from chain configuration
    pub fn from_config(config: &FiltersConfig) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        let mut chains = Vec::new();

        for chain in &config.chains {
            Self::check_shape(chain)?;

            for (idx, dimension) in chain.levels.iter().copied().enumerate() {
                let descendants = chain.levels[idx + 1..].to_vec();

                let node = if idx == 0 {
                    let universe = chain.edges[0].keys().cloned().collect();
                    FilterNode::root(dimension, universe, descendants)
                } else {
                    let edges: AHashMap<String, BTreeSet<String>> = chain.edges[idx - 1]
                        .iter()
                        .map(|(parent, children)| {
                            (parent.clone(), children.iter().cloned().collect())
                        })
                        .collect();
                    FilterNode::child(dimension, chain.levels[idx - 1], edges, descendants)
                };

                if nodes.insert(dimension, node).is_some() {
                    return Err(HazardError::Config(format!(
                        "Filter dimension '{}' appears in more than one chain",
                        dimension
                    )));
                }
            }

            chains.push((chain.name.clone(), chain.levels.clone()));
        }

        Ok(Self { nodes, chains })
    }

    fn check_shape(chain: &FilterChainConfig) -> Result<()> {
        if chain.levels.len() < 2 {
            return Err(HazardError::Config(format!(
                "Filter chain '{}' needs at least two levels",
                chain.name
            )));
        }
        if chain.edges.len() != chain.levels.len() - 1 {
            return Err(HazardError::Config(format!(
                "Filter chain '{}' has {} levels but {} edge tables",
                chain.name,
                chain.levels.len(),
                chain.edges.len()
            )));
        }
        Ok(())
    }

    pub fn node(&self, dimension: FilterDimension) -> Option<&FilterNode> {
        self.nodes.get(&dimension)
    }

    /// Configured chains as (name, dimensions root to leaf)
    pub fn chains(&self) -> &[(String, Vec<FilterDimension>)] {
        &self.chains
    }

    /// Values currently offered for a dimension (empty if the dimension is not configured)
    pub fn options(&self, dimension: FilterDimension, state: &FilterState) -> BTreeSet<String> {
        self.nodes
            .get(&dimension)
            .map(|node| node.options(state))
            .unwrap_or_default()
    }

    /// Replace a dimension's selection, clearing every dimension below it
    ///
    /// Cascaded clears are fully applied before the new state is returned.
    pub fn select<I, S>(&self, dimension: FilterDimension, values: I, state: &FilterState) -> FilterState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.nodes.get(&dimension) {
            Some(node) => node.select(values, state),
            None => {
                tracing::warn!("Ignoring selection on unconfigured dimension {}", dimension);
                state.clone()
            }
        }
    }

    pub fn clear(&self, dimension: FilterDimension, state: &FilterState) -> FilterState {
        self.select(dimension, std::iter::empty::<String>(), state)
    }
}

impl Default for FilterGraph {
    fn default() -> Self {
        // The built-in tables are well formed
        Self::from_config(&FiltersConfig::default()).unwrap_or(Self {
            nodes: BTreeMap::new(),
            chains: Vec::new(),
        })
    }
}
