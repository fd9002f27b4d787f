// Integration tests for the cascading filter graph
use hazardwatch::filtering::{FilterDimension, FilterGraph, FilterState, FiltersConfig};
use std::collections::BTreeSet;

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn custom_graph() -> FilterGraph {
    let config: FiltersConfig = toml::from_str(
        r#"
        [[chains]]
        name = "location"
        levels = ["site", "location", "detail_location"]

        [[chains.edges]]
        "NORTH MINE" = ["PIT 1", "PIT 2"]
        "SOUTH MINE" = ["PIT 3"]

        [[chains.edges]]
        "PIT 1" = ["RAMP", "FLOOR"]
        "PIT 2" = ["FLOOR", "CREST"]
        "PIT 3" = []
        "#,
    )
    .unwrap();
    FilterGraph::from_config(&config).unwrap()
}

#[test]
fn test_custom_tables_from_toml() {
    let graph = custom_graph();
    assert_eq!(graph.chains().len(), 1);
    assert_eq!(
        graph.options(FilterDimension::Site, &FilterState::new()),
        set(&["NORTH MINE", "SOUTH MINE"])
    );
    // Cluster dimensions are not configured at all
    assert!(graph
        .options(FilterDimension::GeoCluster, &FilterState::new())
        .is_empty());
}

#[test]
fn test_multi_select_unions_children() {
    let graph = custom_graph();
    let state = graph.select(
        FilterDimension::Site,
        ["NORTH MINE", "SOUTH MINE"],
        &FilterState::new(),
    );
    assert_eq!(
        graph.options(FilterDimension::Location, &state),
        set(&["PIT 1", "PIT 2", "PIT 3"])
    );

    let state = graph.select(FilterDimension::Location, ["PIT 1", "PIT 2"], &state);
    // FLOOR is reachable from both pits but offered once
    assert_eq!(
        graph.options(FilterDimension::DetailLocation, &state),
        set(&["RAMP", "FLOOR", "CREST"])
    );
}

#[test]
fn test_parent_value_without_children() {
    let graph = custom_graph();
    let state = graph.select(FilterDimension::Site, ["SOUTH MINE"], &FilterState::new());
    let state = graph.select(FilterDimension::Location, ["PIT 3"], &state);
    assert!(graph
        .options(FilterDimension::DetailLocation, &state)
        .is_empty());
}

#[test]
fn test_selection_stays_within_options() {
    let graph = custom_graph();
    let state = graph.select(FilterDimension::Site, ["SOUTH MINE"], &FilterState::new());
    let state = graph.select(FilterDimension::Location, ["PIT 1", "PIT 3"], &state);
    assert_eq!(
        state.selection(FilterDimension::Location),
        Some(&set(&["PIT 3"]))
    );

    // Nothing offered: the selection collapses to empty
    let state = graph.select(FilterDimension::Location, ["PIT 2"], &state);
    assert!(!state.is_selected(FilterDimension::Location));
}

#[test]
fn test_select_never_mutates_input() {
    let graph = FilterGraph::default();
    let before = graph.select(FilterDimension::Site, ["MINING PIT"], &FilterState::new());
    let before = graph.select(FilterDimension::Location, ["PIT A"], &before);
    let snapshot = before.clone();

    let after = graph.select(FilterDimension::Site, ["HAUL ROAD"], &before);

    assert_eq!(before, snapshot);
    assert!(before.is_selected(FilterDimension::Location));
    assert!(!after.is_selected(FilterDimension::Location));
}

#[test]
fn test_clear_resets_subtree() {
    let graph = FilterGraph::default();
    let state = graph.select(FilterDimension::GeoCluster, ["GEO-02"], &FilterState::new());
    let state = graph.select(FilterDimension::LexicalCluster, ["LEX-03"], &state);
    let state = graph.select(FilterDimension::SemanticCluster, ["SEM-05"], &state);
    let state = graph.select(FilterDimension::Site, ["WORKSHOP"], &state);

    let cleared = graph.clear(FilterDimension::LexicalCluster, &state);
    assert!(cleared.is_selected(FilterDimension::GeoCluster));
    assert!(!cleared.is_selected(FilterDimension::LexicalCluster));
    assert!(!cleared.is_selected(FilterDimension::SemanticCluster));
    assert!(cleared.is_selected(FilterDimension::Site));

    // Semantic options fall back to everything once the lexical selection is gone
    assert_eq!(
        graph.options(FilterDimension::SemanticCluster, &cleared).len(),
        8
    );
}

#[test]
fn test_geo_cluster_selection_empties_cluster_descendants() {
    let graph = FilterGraph::default();
    let state = graph.select(FilterDimension::GeoCluster, ["GEO-02"], &FilterState::new());
    let state = graph.select(FilterDimension::LexicalCluster, ["LEX-03"], &state);
    let state = graph.select(FilterDimension::SemanticCluster, ["SEM-05"], &state);
    let state = graph.select(FilterDimension::Site, ["WORKSHOP"], &state);
    assert!(state.is_selected(FilterDimension::LexicalCluster));
    assert!(state.is_selected(FilterDimension::SemanticCluster));

    let reselected = graph.select(FilterDimension::GeoCluster, ["GEO-01"], &state);
    assert_eq!(
        reselected.selection(FilterDimension::GeoCluster),
        Some(&set(&["GEO-01"]))
    );
    assert!(!reselected.is_selected(FilterDimension::LexicalCluster));
    assert!(!reselected.is_selected(FilterDimension::SemanticCluster));
    // The location chain is independent
    assert!(reselected.is_selected(FilterDimension::Site));
}

#[test]
fn test_select_is_idempotent() {
    let graph = FilterGraph::default();
    let base = graph.select(FilterDimension::Site, ["MINING PIT"], &FilterState::new());
    let base = graph.select(FilterDimension::Location, ["PIT A"], &base);
    let base = graph.select(FilterDimension::GeoCluster, ["GEO-01"], &base);

    let cases = [
        (FilterDimension::Site, vec!["MINING PIT", "WORKSHOP"]),
        (FilterDimension::Location, vec!["PIT A", "HIGHWALL"]),
        (FilterDimension::GeoCluster, vec!["GEO-02"]),
        (FilterDimension::LexicalCluster, vec!["LEX-01"]),
    ];
    for (dimension, values) in cases {
        let once = graph.select(dimension, values.clone(), &base);
        let twice = graph.select(dimension, values.clone(), &once);
        assert_eq!(once, twice, "{:?} {:?}", dimension, values);
    }
}

#[test]
fn test_reselecting_same_value_clears_children() {
    let graph = FilterGraph::default();
    let state = graph.select(FilterDimension::Site, ["WORKSHOP"], &FilterState::new());
    let state = graph.select(FilterDimension::Location, ["WAREHOUSE"], &state);
    let state = graph.select(FilterDimension::Site, ["WORKSHOP"], &state);
    assert!(!state.is_selected(FilterDimension::Location));
    assert_eq!(
        graph.options(FilterDimension::Location, &state),
        set(&["HEAVY EQUIPMENT BAY", "LIGHT VEHICLE BAY", "WAREHOUSE"])
    );
}
