// Default parent -> children lookup tables for the two filter chains
use super::types::{FilterChainConfig, FilterDimension};
use std::collections::BTreeMap;

fn table(rows: Vec<(&str, Vec<&str>)>) -> BTreeMap<String, Vec<String>> {
    rows.into_iter()
        .map(|(parent, children)| {
            (
                parent.to_string(),
                children.into_iter().map(String::from).collect(),
            )
        })
        .collect()
}

/// Site -> location -> detail location
pub fn location_chain() -> FilterChainConfig {
    let site_locations = table(vec![
        ("MINING PIT", vec!["PIT A", "PIT B", "HIGHWALL", "HAUL RAMP"]),
        ("PROCESSING PLANT", vec!["CRUSHER", "CONVEYOR", "STOCKPILE"]),
        (
            "WORKSHOP",
            vec!["HEAVY EQUIPMENT BAY", "LIGHT VEHICLE BAY", "WAREHOUSE"],
        ),
        ("HAUL ROAD", vec!["NORTH ROAD", "SOUTH ROAD"]),
    ]);

    let location_details = table(vec![
        ("PIT A", vec!["BENCH 1", "BENCH 2", "SUMP"]),
        ("PIT B", vec!["BENCH 3", "BENCH 4", "DEWATERING PUMP"]),
        ("HIGHWALL", vec!["CREST", "TOE"]),
        ("HAUL RAMP", vec!["RAMP ENTRY", "RAMP SWITCHBACK"]),
        ("CRUSHER", vec!["PRIMARY CRUSHER", "SECONDARY CRUSHER"]),
        ("CONVEYOR", vec!["CV-01 TRANSFER", "CV-02 TAIL PULLEY"]),
        ("STOCKPILE", vec!["ROM PAD", "RECLAIM TUNNEL"]),
        ("HEAVY EQUIPMENT BAY", vec!["WASH PAD", "TYRE BAY"]),
        ("LIGHT VEHICLE BAY", vec!["SERVICE PIT"]),
        ("WAREHOUSE", vec!["LOADING DOCK", "CHEMICAL STORE"]),
        ("NORTH ROAD", vec!["INTERSECTION N1", "WATER CART FILL"]),
        ("SOUTH ROAD", vec!["INTERSECTION S1", "DUMP POINT"]),
    ]);

    FilterChainConfig {
        name: "location".to_string(),
        levels: vec![
            FilterDimension::Site,
            FilterDimension::Location,
            FilterDimension::DetailLocation,
        ],
        edges: vec![site_locations, location_details],
    }
}

/// Geo cluster -> lexical cluster -> semantic cluster
pub fn cluster_chain() -> FilterChainConfig {
    let geo_lexical = table(vec![
        ("GEO-01", vec!["LEX-01", "LEX-02"]),
        ("GEO-02", vec!["LEX-03", "LEX-04"]),
        ("GEO-03", vec!["LEX-05"]),
    ]);

    let lexical_semantic = table(vec![
        ("LEX-01", vec!["SEM-01", "SEM-02"]),
        ("LEX-02", vec!["SEM-03"]),
        ("LEX-03", vec!["SEM-04", "SEM-05"]),
        ("LEX-04", vec!["SEM-06"]),
        ("LEX-05", vec!["SEM-07", "SEM-08"]),
    ]);

    FilterChainConfig {
        name: "cluster".to_string(),
        levels: vec![
            FilterDimension::GeoCluster,
            FilterDimension::LexicalCluster,
            FilterDimension::SemanticCluster,
        ],
        edges: vec![geo_lexical, lexical_semantic],
    }
}
