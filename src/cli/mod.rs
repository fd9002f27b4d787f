//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hazardwatch",
    version,
    author = "neur0map",
    about = "Duplicate-detection state and classification for hazard reports",
    long_about = "Hazardwatch reads a dataset of hazard reports and their similarity scores, derives each \
                  report's pipeline phase, classifies duplicate likelihood, filters reports through cascading \
                  site and cluster filters, and runs auto-confirm countdowns for manual review."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/hazardwatch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Cascading filter selections shared by `list` and `options`
#[derive(clap::Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Site filter (repeatable)
    #[arg(long)]
    pub site: Vec<String>,

    /// Location filter (repeatable)
    #[arg(long)]
    pub location: Vec<String>,

    /// Detail location filter (repeatable)
    #[arg(long)]
    pub detail: Vec<String>,

    /// Geo cluster filter (repeatable)
    #[arg(long)]
    pub geo_cluster: Vec<String>,

    /// Lexical cluster filter (repeatable)
    #[arg(long)]
    pub lexical_cluster: Vec<String>,

    /// Semantic cluster filter (repeatable)
    #[arg(long)]
    pub semantic_cluster: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the derived pipeline phase of every report
    Stages {
        /// Dataset JSON file
        dataset: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Classify reports (or clusters) into duplicate tiers
    Classify {
        /// Dataset JSON file
        dataset: PathBuf,

        /// Classify clusters instead of reports
        #[arg(long)]
        clusters: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List reports matching filters, sorted
    List {
        /// Dataset JSON file
        dataset: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Minimum similarity percentage (inclusive)
        #[arg(long)]
        min_similarity: Option<u32>,

        /// Maximum similarity percentage (inclusive)
        #[arg(long)]
        max_similarity: Option<u32>,

        /// Only reports in this phase (repeatable, e.g. "completed")
        #[arg(long)]
        phase: Vec<String>,

        /// Only reports in this tier (repeatable, e.g. "strong_duplicate")
        #[arg(long)]
        tier: Vec<String>,

        /// Sort order
        #[arg(
            short,
            long,
            value_parser = ["priority", "newest", "oldest", "geo", "lexical", "semantic", "rule_based"],
            default_value = "priority"
        )]
        sort: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the options a filter offers given the current selections
    Options {
        /// Filter dimension (site, location, detail_location, geo_cluster, ...)
        dimension: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show dashboard statistics for a dataset
    Stats {
        /// Dataset JSON file
        dataset: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Review a cluster's reports with auto-confirm countdowns
    Review {
        /// Dataset JSON file
        dataset: PathBuf,

        /// Review reports assigned to this geo, lexical or semantic cluster
        #[arg(long)]
        cluster: Option<String>,

        /// Review these report ids (repeatable)
        #[arg(short, long)]
        report: Vec<String>,

        /// Manual verdicts as ID=duplicate or ID=not_duplicate (repeatable)
        #[arg(long, value_name = "ID=VERDICT")]
        confirm: Vec<String>,

        /// Justification note for not-duplicate verdicts
        #[arg(short, long)]
        note: Option<String>,

        /// Name recorded on manual verdicts
        #[arg(long, default_value = "reviewer")]
        actor: String,

        /// Ticks to advance after applying verdicts (defaults to a full countdown)
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Run the countdown in real time instead of stepping it
        #[arg(long, conflicts_with = "ticks")]
        realtime: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
