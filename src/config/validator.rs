use crate::config::{parse_duration, Config, SCHEMA_VERSION};
use crate::error::{HazardError, Result, ValidationError};
use crate::filtering::FilterGraph;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        // Validate schema version
        Self::validate_schema_version(config, &mut errors);

        // Validate tier cut points
        Self::validate_classification(config, &mut errors);

        // Validate countdown settings
        Self::validate_review(config, &mut errors);

        // Validate filter chains
        Self::validate_filters(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HazardError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_classification(config: &Config, errors: &mut Vec<ValidationError>) {
        let report = &config.classification.report;
        let cuts = [
            ("classification.report.low", report.low),
            ("classification.report.possible", report.possible),
            ("classification.report.strong", report.strong),
        ];
        Self::check_ascending(&cuts, errors);

        let cluster = &config.classification.cluster;
        let cuts = [
            ("classification.cluster.possible", cluster.possible),
            ("classification.cluster.strong", cluster.strong),
        ];
        Self::check_ascending(&cuts, errors);
    }

    /// Every cut point must lie in [0, 1] and not be below the one before it
    fn check_ascending(cuts: &[(&str, f64)], errors: &mut Vec<ValidationError>) {
        for (path, value) in cuts {
            if !(0.0..=1.0).contains(value) {
                errors.push(ValidationError::new(
                    *path,
                    format!("Threshold must be between 0.0 and 1.0, got {}", value),
                ));
            }
        }

        for pair in cuts.windows(2) {
            let (lower_path, lower) = pair[0];
            let (upper_path, upper) = pair[1];
            if lower > upper {
                errors.push(ValidationError::new(
                    upper_path,
                    format!(
                        "Threshold {} is below {} ({})",
                        upper, lower_path, lower
                    ),
                ));
            }
        }
    }

    fn validate_review(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.review.auto_confirm_ticks == 0 {
            errors.push(ValidationError::new(
                "review.auto_confirm_ticks",
                "Auto-confirm ticks must be greater than 0",
            ));
        }

        let interval = &config.review.tick_interval;
        match parse_duration(interval) {
            Some(d) if d.is_zero() => errors.push(ValidationError::new(
                "review.tick_interval",
                "Tick interval must be greater than 0",
            )),
            Some(_) => {}
            None => errors.push(ValidationError::new(
                "review.tick_interval",
                format!("Invalid duration format: {}", interval),
            )),
        }

        if config.review.system_actor.trim().is_empty() {
            errors.push(ValidationError::new(
                "review.system_actor",
                "System actor name cannot be empty",
            ));
        }
    }

    fn validate_filters(config: &Config, errors: &mut Vec<ValidationError>) {
        for chain in &config.filters.chains {
            if chain.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    "filters.chains.name",
                    "Chain name cannot be empty",
                ));
            }
        }

        if let Err(e) = FilterGraph::from_config(&config.filters) {
            errors.push(ValidationError::new("filters.chains", e.to_string()));
        }
    }
}
