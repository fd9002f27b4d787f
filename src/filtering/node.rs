// A single cascading filter dimension
use ahash::AHashMap;
use std::collections::BTreeSet;

use crate::filtering::types::{FilterDimension, FilterState};

/// One dimension of a filter chain
///
/// Knows its parent, its descendants and the lookup table from parent values
/// to its own values. Selecting on a node never mutates the incoming state.
#[derive(Debug, Clone)]
pub struct FilterNode {
    dimension: FilterDimension,
    parent: Option<FilterDimension>,
    /// Every dimension below this one in its chain, nearest first
    descendants: Vec<FilterDimension>,
    /// Parent value -> values of this dimension (empty for a root)
    parent_edges: AHashMap<String, BTreeSet<String>>,
    /// Every value this dimension can take
    universe: BTreeSet<String>,
}

impl FilterNode {
    /// Root node of a chain, with its full vocabulary
    pub fn root(
        dimension: FilterDimension,
        universe: BTreeSet<String>,
        descendants: Vec<FilterDimension>,
    ) -> Self {
        Self {
            dimension,
            parent: None,
            descendants,
            parent_edges: AHashMap::new(),
            universe,
        }
    }

    /// Child node whose values are looked up from the parent's selection
    pub fn child(
        dimension: FilterDimension,
        parent: FilterDimension,
        parent_edges: AHashMap<String, BTreeSet<String>>,
        descendants: Vec<FilterDimension>,
    ) -> Self {
        let universe = parent_edges.values().flatten().cloned().collect();
        Self {
            dimension,
            parent: Some(parent),
            descendants,
            parent_edges,
            universe,
        }
    }

    pub fn dimension(&self) -> FilterDimension {
        self.dimension
    }

    pub fn parent(&self) -> Option<FilterDimension> {
        self.parent
    }

    pub fn descendants(&self) -> &[FilterDimension] {
        &self.descendants
    }

    /// Every value known for this dimension, regardless of selections
    pub fn universe(&self) -> &BTreeSet<String> {
        &self.universe
    }

    /// Values currently offered for this dimension
    ///
    /// With no parent selection everything is offered. Otherwise the union of
    /// the children of each selected parent value.
    pub fn options(&self, state: &FilterState) -> BTreeSet<String> {
        let selected_parents = self.parent.and_then(|parent| state.selection(parent));

        match selected_parents {
            None => self.universe.clone(),
            Some(parents) => parents
                .iter()
                .filter_map(|value| self.parent_edges.get(value))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    /// Replace this node's selection and clear every descendant's selection
    ///
    /// Values outside the current options are dropped so a child selection
    /// is always a subset of what its parent allows.
    pub fn select<I, S>(&self, values: I, state: &FilterState) -> FilterState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = self.options(state);
        let (kept, dropped): (BTreeSet<String>, BTreeSet<String>) = values
            .into_iter()
            .map(Into::<String>::into)
            .partition(|value| options.contains(value));

        if !dropped.is_empty() {
            tracing::warn!(
                "Dropping {} value(s) not offered for {}: {:?}",
                dropped.len(),
                self.dimension,
                dropped
            );
        }

        let cleared: Vec<FilterDimension> = self
            .descendants
            .iter()
            .copied()
            .filter(|d| state.is_selected(*d))
            .collect();
        if !cleared.is_empty() {
            tracing::debug!("Selecting {} clears {:?}", self.dimension, cleared);
        }

        state
            .with_selection(self.dimension, kept)
            .without(&self.descendants)
    }

    /// Clear this node's selection (and its descendants')
    pub fn clear(&self, state: &FilterState) -> FilterState {
        self.select(std::iter::empty::<String>(), state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn nodes() -> (FilterNode, FilterNode) {
        let site = FilterNode::root(
            FilterDimension::Site,
            set(&["NORTH", "SOUTH"]),
            vec![FilterDimension::Location],
        );
        let mut edges = AHashMap::new();
        edges.insert("NORTH".to_string(), set(&["N1", "N2"]));
        edges.insert("SOUTH".to_string(), set(&["S1"]));
        let location = FilterNode::child(
            FilterDimension::Location,
            FilterDimension::Site,
            edges,
            vec![],
        );
        (site, location)
    }

    #[test]
    fn test_child_options_follow_parent() {
        let (site, location) = nodes();
        let state = FilterState::new();
        assert_eq!(location.options(&state), set(&["N1", "N2", "S1"]));

        let state = site.select(["SOUTH"], &state);
        assert_eq!(location.options(&state), set(&["S1"]));

        let state = site.select(["SOUTH", "NORTH"], &state);
        assert_eq!(location.options(&state), set(&["N1", "N2", "S1"]));
    }

    #[test]
    fn test_select_clears_descendants() {
        let (site, location) = nodes();
        let state = location.select(["N1"], &FilterState::new());
        assert!(state.is_selected(FilterDimension::Location));

        let state = site.select(["NORTH"], &state);
        assert!(!state.is_selected(FilterDimension::Location));
    }

    #[test]
    fn test_select_drops_values_outside_options() {
        let (site, location) = nodes();
        let state = site.select(["SOUTH"], &FilterState::new());
        let state = location.select(["N1", "S1"], &state);
        assert_eq!(state.selection(FilterDimension::Location), Some(&set(&["S1"])));
    }

    #[test]
    fn test_select_does_not_mutate_input() {
        let (site, _) = nodes();
        let before = FilterState::new();
        let after = site.select(["NORTH"], &before);
        assert!(before.is_empty());
        assert!(!after.is_empty());
    }

    #[test]
    fn test_clear() {
        let (site, _) = nodes();
        let state = site.select(["NORTH"], &FilterState::new());
        assert!(site.clear(&state).is_empty());
    }
}
