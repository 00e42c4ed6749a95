//! Configuration validation.

use super::{Config, TierKind};
use crate::error::{Result, SpreadError};
use std::collections::BTreeSet;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Tier validation
    if config.tiers.is_empty() {
        return Err(SpreadError::Config("at least one tier is required".into()));
    }
    for (name, tier) in &config.tiers {
        if name.trim().is_empty() {
            return Err(SpreadError::Config("tier names cannot be empty".into()));
        }
        if tier.kind == TierKind::Sqlite && tier.path.is_none() {
            return Err(SpreadError::Config(format!(
                "tier '{}' is sqlite and requires a path",
                name
            )));
        }
    }

    // Dataset validation
    let mut dataset_names = BTreeSet::new();
    for dataset in &config.datasets {
        if dataset.name.trim().is_empty() {
            return Err(SpreadError::Config("dataset names cannot be empty".into()));
        }
        if !dataset_names.insert(dataset.name.as_str()) {
            return Err(SpreadError::Config(format!(
                "duplicate dataset name '{}'",
                dataset.name
            )));
        }
        if dataset.table.trim().is_empty() {
            return Err(SpreadError::Config(format!(
                "dataset '{}' requires a table name",
                dataset.name
            )));
        }
        if dataset.fields.is_empty() {
            return Err(SpreadError::Config(format!(
                "dataset '{}' requires at least one field mapping entry",
                dataset.name
            )));
        }
        let mut dest_fields = BTreeSet::new();
        for entry in &dataset.fields {
            if entry.from.trim().is_empty() || entry.to.trim().is_empty() {
                return Err(SpreadError::Config(format!(
                    "dataset '{}' has a field mapping entry with an empty name",
                    dataset.name
                )));
            }
            if !dest_fields.insert(entry.to.to_ascii_lowercase()) {
                return Err(SpreadError::Config(format!(
                    "dataset '{}' maps two fields onto '{}'",
                    dataset.name, entry.to
                )));
            }
        }
        for tier in dataset.table_overrides.keys() {
            if !config.tiers.contains_key(tier) {
                return Err(SpreadError::Config(format!(
                    "dataset '{}' overrides table for unknown tier '{}'",
                    dataset.name, tier
                )));
            }
        }
    }

    // Pipeline validation
    let mut pipeline_names = BTreeSet::new();
    for pipeline in &config.pipelines {
        if !pipeline_names.insert(pipeline.name.as_str()) {
            return Err(SpreadError::Config(format!(
                "duplicate pipeline name '{}'",
                pipeline.name
            )));
        }
        if pipeline.route.len() < 2 {
            return Err(SpreadError::Config(format!(
                "pipeline '{}' route needs at least two tiers",
                pipeline.name
            )));
        }
        for tier in &pipeline.route {
            if !config.tiers.contains_key(tier) {
                return Err(SpreadError::Config(format!(
                    "pipeline '{}' routes through unknown tier '{}'",
                    pipeline.name, tier
                )));
            }
        }
        for pair in pipeline.route.windows(2) {
            if pair[0] == pair[1] {
                return Err(SpreadError::Config(format!(
                    "pipeline '{}' routes tier '{}' into itself",
                    pipeline.name, pair[0]
                )));
            }
        }
        if pipeline.datasets.is_empty() {
            return Err(SpreadError::Config(format!(
                "pipeline '{}' lists no datasets",
                pipeline.name
            )));
        }
        for dataset in &pipeline.datasets {
            if !dataset_names.contains(dataset.as_str()) {
                return Err(SpreadError::Config(format!(
                    "pipeline '{}' references unknown dataset '{}'",
                    pipeline.name, dataset
                )));
            }
        }
    }

    // Portal validation
    if let Some(portal) = &config.portal {
        if portal.url.trim().is_empty() {
            return Err(SpreadError::Config("portal.url is required".into()));
        }
        if portal.username.trim().is_empty() {
            return Err(SpreadError::Config("portal.username is required".into()));
        }
        if portal.password.is_some() && portal.password_env.is_some() {
            return Err(SpreadError::Config(
                "portal.password and portal.password_env cannot both be set".into(),
            ));
        }
    }

    // Replication config validation - only check if explicitly set
    if let Some(0) = config.replication.chunk_size {
        return Err(SpreadError::Config(
            "replication.chunk_size must be at least 1".into(),
        ));
    }

    Ok(())
}
