use hazardwatch::classify::{ClusterTier, DuplicateTier};
use hazardwatch::cli::{Cli, Commands, ConfigAction, SelectionArgs};
use hazardwatch::config::{Config, ConfigValidator};
use hazardwatch::error::{HazardError, Result};
use hazardwatch::filtering::{
    ClusterFilter, FilterDimension, FilterGraph, FilterState, ReportFilter, SimilarityRange,
};
use hazardwatch::model::{Dataset, Report};
use hazardwatch::review::{run_countdown, Annotation, ReviewSession, ReviewSummary, Verdict};
use hazardwatch::sorting::SortOrder;
use hazardwatch::stage::{PipelinePhase, StageDeriver, StageOutcome};
use hazardwatch::stats::DashboardStats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn main() -> Result<()> {
    // Parse CLI arguments
    let Cli {
        config: config_path,
        profile,
        verbose,
        command,
    } = Cli::parse_args();

    // Initialize logging
    init_logging(verbose);

    let config = || load_config(config_path.clone(), profile.clone());

    // Handle commands
    match command {
        Commands::Stages { dataset, json } => {
            cmd_stages(&dataset, json)?;
        }
        Commands::Classify {
            dataset,
            clusters,
            json,
        } => {
            cmd_classify(&config()?, &dataset, clusters, json)?;
        }
        Commands::List {
            dataset,
            selection,
            min_similarity,
            max_similarity,
            phase,
            tier,
            sort,
            limit,
            json,
        } => {
            let config = config()?;
            let filter = build_report_filter(
                &config.filter_graph()?,
                &selection,
                min_similarity,
                max_similarity,
                &phase,
                &tier,
            )?;
            cmd_list(&config, &dataset, &filter, &sort, limit, json)?;
        }
        Commands::Options {
            dimension,
            selection,
            json,
        } => {
            cmd_options(&config()?, &dimension, &selection, json)?;
        }
        Commands::Stats { dataset, json } => {
            cmd_stats(&config()?, &dataset, json)?;
        }
        Commands::Review {
            dataset,
            cluster,
            report,
            confirm,
            note,
            actor,
            ticks,
            realtime,
            json,
        } => {
            let request = ReviewRequest {
                cluster,
                reports: report,
                confirm,
                note,
                actor,
                ticks,
                realtime,
            };
            cmd_review(&config()?, &dataset, request, json)?;
        }
        Commands::Config { action } => {
            cmd_config(config_path.clone(), action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "hazardwatch=debug"
    } else {
        "hazardwatch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| HazardError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string())
}

fn cmd_stages(dataset_path: &Path, json: bool) -> Result<()> {
    let dataset = Dataset::load(dataset_path)?;

    #[derive(Serialize)]
    struct Row<'a> {
        id: &'a str,
        #[serde(flatten)]
        outcome: StageOutcome,
    }

    let rows: Vec<Row> = dataset
        .reports
        .iter()
        .map(|r| Row {
            id: &r.id,
            outcome: StageDeriver::derive(r),
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        let flags = if row.outcome.is_consistent() {
            String::new()
        } else {
            format!("  ! {:?}", row.outcome.inconsistencies)
        };
        println!(
            "{:<12} {:<30} (rule: {}){}",
            row.id, row.outcome.label, row.outcome.rule, flags
        );
    }
    Ok(())
}

fn cmd_classify(config: &Config, dataset_path: &Path, clusters: bool, json: bool) -> Result<()> {
    let dataset = Dataset::load(dataset_path)?;
    let classifier = config.classifier();

    if clusters {
        #[derive(Serialize)]
        struct Row<'a> {
            id: &'a str,
            overall: f64,
            tier: Option<ClusterTier>,
        }

        let rows: Vec<Row> = dataset
            .clusters
            .iter()
            .map(|c| Row {
                id: &c.id,
                overall: c.overall,
                tier: classifier.classify_cluster(c),
            })
            .collect();

        if json {
            return print_json(&rows);
        }
        for row in &rows {
            let tier = row.tier.map(|t| t.label()).unwrap_or("Unclassified");
            println!("{:<12} {:.2}  {}", row.id, row.overall, tier);
        }
        return Ok(());
    }

    #[derive(Serialize)]
    struct Row<'a> {
        id: &'a str,
        overall: Option<f64>,
        tier: Option<DuplicateTier>,
    }

    let rows: Vec<Row> = dataset
        .reports
        .iter()
        .map(|r| Row {
            id: &r.id,
            overall: r.scores.overall,
            tier: classifier.classify_report(r),
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    for row in &rows {
        let tier = row.tier.map(|t| t.label()).unwrap_or("Not yet classified");
        println!("{:<12} {:>5}  {}", row.id, format_score(row.overall), tier);
    }
    Ok(())
}

/// Apply each dimension's selection through the graph, parents first
fn build_state(graph: &FilterGraph, selection: &SelectionArgs) -> FilterState {
    let requested = [
        (FilterDimension::Site, &selection.site),
        (FilterDimension::Location, &selection.location),
        (FilterDimension::DetailLocation, &selection.detail),
        (FilterDimension::GeoCluster, &selection.geo_cluster),
        (FilterDimension::LexicalCluster, &selection.lexical_cluster),
        (FilterDimension::SemanticCluster, &selection.semantic_cluster),
    ];

    requested
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .fold(FilterState::new(), |state, (dimension, values)| {
            graph.select(dimension, values.iter().cloned(), &state)
        })
}

fn build_report_filter(
    graph: &FilterGraph,
    selection: &SelectionArgs,
    min_similarity: Option<u32>,
    max_similarity: Option<u32>,
    phases: &[String],
    tiers: &[String],
) -> Result<ReportFilter> {
    let mut filter = ReportFilter::new(build_state(graph, selection));

    if min_similarity.is_some() || max_similarity.is_some() {
        let range = SimilarityRange::new(min_similarity.unwrap_or(0), max_similarity.unwrap_or(100));
        filter = filter.with_similarity(range);
    }

    let phases = phases
        .iter()
        .map(|p| {
            PipelinePhase::parse(p)
                .ok_or_else(|| HazardError::Config(format!("Unknown phase: {}", p)))
        })
        .collect::<Result<Vec<_>>>()?;
    let tiers = tiers
        .iter()
        .map(|t| {
            DuplicateTier::parse(t).ok_or_else(|| HazardError::Config(format!("Unknown tier: {}", t)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(filter.with_phases(phases).with_tiers(tiers))
}

fn cmd_list(
    config: &Config,
    dataset_path: &Path,
    filter: &ReportFilter,
    sort: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let dataset = Dataset::load(dataset_path)?;
    let classifier = config.classifier();
    let order = SortOrder::parse(sort)
        .ok_or_else(|| HazardError::Config(format!("Unknown sort order: {}", sort)))?;

    let mut matched: Vec<&Report> = filter.apply(&dataset.reports, &classifier);
    order.sort_refs(&mut matched);
    if let Some(limit) = limit {
        matched.truncate(limit);
    }

    tracing::debug!(
        "{} of {} report(s) matched",
        matched.len(),
        dataset.reports.len()
    );

    if json {
        return print_json(&matched);
    }

    if matched.is_empty() {
        println!("No reports match the current filters");
        return Ok(());
    }

    for report in matched {
        let phase = StageDeriver::derive(report).phase;
        let similarity = SimilarityRange::percent(&report.scores)
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "-".to_string());
        let tier = classifier
            .classify_report(report)
            .map(|t| t.label())
            .unwrap_or("-");
        println!(
            "{:<12} {:<16} {:<12} {:<18} {:>5}  {:<28} {}",
            report.id,
            report.site,
            report.location,
            report.detail_location,
            similarity,
            phase.label(),
            tier
        );
    }
    Ok(())
}

fn cmd_options(config: &Config, dimension: &str, selection: &SelectionArgs, json: bool) -> Result<()> {
    let dimension = FilterDimension::parse(dimension)
        .ok_or_else(|| HazardError::Config(format!("Unknown filter dimension: {}", dimension)))?;
    let graph = config.filter_graph()?;
    let state = build_state(&graph, selection);
    let options = graph.options(dimension, &state);

    if json {
        return print_json(&options);
    }

    println!("{} ({} option(s)):", dimension, options.len());
    for option in options {
        let marker = if state
            .selection(dimension)
            .is_some_and(|selected| selected.contains(&option))
        {
            "*"
        } else {
            " "
        };
        println!(" {} {}", marker, option);
    }
    Ok(())
}

fn cmd_stats(config: &Config, dataset_path: &Path, json: bool) -> Result<()> {
    let dataset = Dataset::load(dataset_path)?;
    let classifier = config.classifier();
    let stats = DashboardStats::collect(&dataset.reports, &dataset.clusters, &classifier);

    if json {
        return print_json(&stats);
    }

    println!("Reports: {}", stats.total_reports);
    println!("  In progress: {}", stats.in_progress());
    for phase in PipelinePhase::ALL {
        let count = stats.phase_count(phase);
        if count > 0 {
            println!("  {:<30} {}", phase.label(), count);
        }
    }
    println!("Duplicate tiers:");
    for tier in DuplicateTier::ALL {
        println!("  {:<30} {}", tier.label(), stats.tier_count(tier));
    }
    println!("  {:<30} {}", "Not yet classified", stats.unclassified);
    if let Some(avg) = stats.average_overall {
        println!("Average overall score: {:.2}", avg);
    }
    if stats.inconsistent > 0 {
        println!("⚠ {} report(s) with inconsistent scores", stats.inconsistent);
    }

    println!("Clusters: {}", stats.total_clusters);
    for tier in ClusterTier::ALL {
        let count = stats.clusters_by_tier.get(&tier).copied().unwrap_or(0);
        println!("  {:<30} {}", tier.label(), count);
    }

    // Clusters worth a manual review
    let review_filter = ClusterFilter {
        tiers: [ClusterTier::StrongDuplicate, ClusterTier::PossibleDuplicate].into(),
        ..Default::default()
    };
    let clusters = review_filter.apply(&dataset.clusters, &classifier);
    if !clusters.is_empty() {
        println!("Clusters to review:");
    }
    for cluster in clusters {
        let tier = classifier
            .classify_cluster(cluster)
            .map(|t| t.label())
            .unwrap_or("-");
        println!(
            "  {:<12} {} member(s)  {:.2}  {}",
            cluster.id, cluster.member_count, cluster.overall, tier
        );
    }
    Ok(())
}

struct ReviewRequest {
    cluster: Option<String>,
    reports: Vec<String>,
    confirm: Vec<String>,
    note: Option<String>,
    actor: String,
    ticks: Option<u32>,
    realtime: bool,
}

fn parse_verdict(entry: &str) -> Result<(String, Verdict)> {
    let (id, verdict) = entry.split_once('=').ok_or_else(|| {
        HazardError::Config(format!("Expected ID=VERDICT, got '{}'", entry))
    })?;

    let verdict = match verdict.trim().to_lowercase().replace('-', "_").as_str() {
        "duplicate" | "dup" => Verdict::Duplicate,
        "not_duplicate" | "not" => Verdict::NotDuplicate,
        other => {
            return Err(HazardError::Config(format!("Unknown verdict: {}", other)));
        }
    };
    Ok((id.trim().to_string(), verdict))
}

fn cmd_review(config: &Config, dataset_path: &Path, request: ReviewRequest, json: bool) -> Result<()> {
    let dataset = Dataset::load(dataset_path)?;

    let mut session = ReviewSession::new(request.cluster.clone(), config.review.settings());

    if let Some(cluster_id) = &request.cluster {
        if dataset.cluster(cluster_id).is_none() {
            tracing::warn!("Cluster {} is not in the dataset", cluster_id);
        }
        dataset
            .reports
            .iter()
            .filter(|r| r.in_cluster(cluster_id))
            .for_each(|r| {
                session.enqueue(r.id.clone());
            });
    }

    for id in &request.reports {
        if dataset.report(id).is_none() {
            tracing::warn!("Report {} is not in the dataset, skipping", id);
            continue;
        }
        session.enqueue(id.clone());
    }

    if session.annotations().is_empty() {
        println!("Nothing to review");
        return Ok(());
    }

    let now = chrono::Utc::now();
    for entry in &request.confirm {
        let (id, verdict) = parse_verdict(entry)?;
        match session.get(&id) {
            Some(annotation) if !annotation.is_pending() => {
                println!("Report {} is already {}, skipping", id, annotation.status);
            }
            _ => {
                session.confirm(&id, verdict, &request.actor, request.note.as_deref(), now)?;
            }
        }
    }

    let session = if request.realtime {
        run_realtime(config, session)?
    } else {
        let ticks = request
            .ticks
            .unwrap_or(session.settings().auto_confirm_ticks);
        session.advance(ticks, chrono::Utc::now());
        session
    };

    let annotations = session.snapshot();
    let summary = session.finish();

    if json {
        #[derive(Serialize)]
        struct Output {
            summary: ReviewSummary,
            annotations: Vec<Annotation>,
        }
        return print_json(&Output {
            summary,
            annotations,
        });
    }

    println!("Review session {}", summary.session_id);
    for annotation in &annotations {
        let by = annotation.confirmed_by.as_deref().unwrap_or("-");
        println!(
            "  {:<12} {:<15} by {:<10} {:>3} tick(s) left",
            annotation.report_id, annotation.status, by, annotation.remaining
        );
    }
    println!(
        "✓ {} total: {} duplicate, {} not duplicate, {} auto-confirmed, {} pending",
        summary.total,
        summary.duplicate,
        summary.not_duplicate,
        summary.auto_confirmed,
        summary.pending
    );
    Ok(())
}

fn run_realtime(config: &Config, session: ReviewSession) -> Result<ReviewSession> {
    let interval = config.review.tick_duration()?;
    let runtime = tokio::runtime::Runtime::new().map_err(|e| HazardError::Io {
        source: e,
        context: "Failed to start async runtime".to_string(),
    })?;

    println!(
        "Running countdown: {} tick(s) of {:?}",
        session.settings().auto_confirm_ticks,
        interval
    );

    let shared = Arc::new(Mutex::new(session));
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let stats = runtime.block_on(run_countdown(
        shared.clone(),
        interval,
        shutdown_rx,
    ));
    tracing::info!(
        "Countdown finished after {} tick(s), {} auto-confirmed",
        stats.ticks,
        stats.auto_confirmed
    );

    let session = match Arc::try_unwrap(shared) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
        Err(shared) => shared
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|p| p.into_inner().clone()),
    };
    Ok(session)
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, None)?;
            let value = serde_json::to_value(&config).map_err(|e| HazardError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            match section {
                Some(section) => {
                    let part = value.get(&section).ok_or_else(|| {
                        HazardError::Config(format!("Unknown config section: {}", section))
                    })?;
                    print_json(part)?;
                }
                None => print_json(&value)?,
            }
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!(
                "  Filter chains: {}",
                config
                    .filters
                    .chains
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| HazardError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            // Save default config
            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::debug!(
            "Config file not found, using defaults. Run 'hazardwatch config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}
