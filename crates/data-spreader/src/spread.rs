//! Spread orchestrator - chained propagation along tier routes.
//!
//! A pipeline names a route of tiers and the datasets that travel it. The
//! orchestrator walks each dataset hop by hop, strictly in sequence: a hop
//! failure halts that dataset's chain so downstream tiers keep yesterday's
//! rows instead of receiving a half-copied refresh. Other datasets in the
//! run continue; the run as a whole is reported failed.

use crate::config::{Config, DatasetSpec, PipelineSpec};
use crate::error::{Result, SpreadError};
use crate::replicate::{replicate, ReplicationOutcome};
use crate::store::{DatasetStore, StoreImpl};
use crate::tier::TierRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// Spread orchestrator.
///
/// Opens every configured tier store once at construction; all stages of a
/// run go through the same handles.
pub struct Spreader {
    config: Config,
    stores: BTreeMap<String, StoreImpl>,
}

/// Outcome of one replication stage of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Pipeline the stage belongs to.
    pub pipeline: String,

    /// Dataset being replicated.
    pub dataset: String,

    /// Tier read from.
    pub source_tier: String,

    /// Tier written to.
    pub dest_tier: String,

    /// How the stage ended.
    pub status: StageStatus,

    /// Rows copied by this stage.
    pub rows_copied: u64,

    /// Destination row count after the stage.
    pub dest_rows: u64,

    /// Error text for failed or skipped stages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stage duration in seconds.
    pub duration_seconds: f64,
}

/// Stage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Listed by a dry run, not executed.
    Planned,
    Completed,
    Failed,
    /// Not attempted because an upstream hop of the same dataset failed.
    Skipped,
}

/// Result of a spread run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total pipeline/dataset pairs processed.
    pub datasets_total: usize,

    /// Pairs whose whole chain completed.
    pub datasets_success: usize,

    /// Pairs with at least one failed hop.
    pub datasets_failed: usize,

    /// Total rows copied across all stages.
    pub rows_copied: u64,

    /// `pipeline/dataset` keys of the failures.
    pub failed_datasets: Vec<String>,

    /// Every stage of the run, in execution order.
    pub stages: Vec<StageOutcome>,
}

impl RunReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// True when no dataset failed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.datasets_failed == 0
    }
}

/// One source/destination row-count comparison from [`Spreader::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountCheck {
    pub pipeline: String,
    pub dataset: String,
    pub from_tier: String,
    pub to_tier: String,
    pub source_rows: u64,
    pub dest_rows: u64,
    pub matches: bool,
}

/// Health probe result for one tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierHealth {
    pub tier: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Spreader {
    /// Create a new spreader, opening every configured tier store.
    pub fn new(config: Config) -> Result<Self> {
        let registry = TierRegistry::new(&config);
        let mut stores = BTreeMap::new();
        for name in registry.names() {
            stores.insert(name.clone(), registry.open(&name)?);
        }
        Ok(Self { config, stores })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open handle for a tier.
    pub fn store(&self, tier: &str) -> Result<&StoreImpl> {
        self.stores.get(tier).ok_or_else(|| SpreadError::TierResolve {
            name: tier.to_string(),
            known: self
                .stores
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Replicate one dataset across one tier pair, outside any pipeline.
    pub fn replicate_one(
        &self,
        dataset: &str,
        from: &str,
        to: &str,
    ) -> Result<ReplicationOutcome> {
        let spec = self.config.dataset(dataset)?;
        info!("Replicating dataset '{}': {} -> {}", dataset, from, to);
        self.run_stage(spec, from, to)
    }

    /// Run the configured pipelines (or just `pipeline` when given).
    ///
    /// A dry run records every stage as planned without touching a store.
    pub fn run(&self, pipeline: Option<&str>, dry_run: bool) -> Result<RunReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting spread run: {}", run_id);

        let pipelines = self.selected_pipelines(pipeline)?;

        let mut stages: Vec<StageOutcome> = Vec::new();
        let mut failed_datasets: Vec<String> = Vec::new();
        let mut datasets_total = 0;
        let mut rows_copied: u64 = 0;

        for pipeline in &pipelines {
            info!(
                "Pipeline '{}': route {}",
                pipeline.name,
                pipeline.route.join(" -> ")
            );

            for dataset_name in &pipeline.datasets {
                datasets_total += 1;
                let spec = self.config.dataset(dataset_name)?;
                let mut chain_broken = false;

                for hop in pipeline.route.windows(2) {
                    let (from, to) = (&hop[0], &hop[1]);

                    if dry_run {
                        info!(
                            "dry-run: would replicate '{}' {} -> {}",
                            dataset_name, from, to
                        );
                        stages.push(StageOutcome {
                            pipeline: pipeline.name.clone(),
                            dataset: dataset_name.clone(),
                            source_tier: from.clone(),
                            dest_tier: to.clone(),
                            status: StageStatus::Planned,
                            rows_copied: 0,
                            dest_rows: 0,
                            error: None,
                            duration_seconds: 0.0,
                        });
                        continue;
                    }

                    if chain_broken {
                        stages.push(StageOutcome {
                            pipeline: pipeline.name.clone(),
                            dataset: dataset_name.clone(),
                            source_tier: from.clone(),
                            dest_tier: to.clone(),
                            status: StageStatus::Skipped,
                            rows_copied: 0,
                            dest_rows: 0,
                            error: Some("upstream hop failed; tier left stale".to_string()),
                            duration_seconds: 0.0,
                        });
                        continue;
                    }

                    let stage_start = Instant::now();
                    match self.run_stage(spec, from, to) {
                        Ok(outcome) => {
                            rows_copied += outcome.rows_copied;
                            info!(
                                "'{}' {} -> {}: {} rows",
                                dataset_name, from, to, outcome.rows_copied
                            );
                            stages.push(StageOutcome {
                                pipeline: pipeline.name.clone(),
                                dataset: dataset_name.clone(),
                                source_tier: from.clone(),
                                dest_tier: to.clone(),
                                status: StageStatus::Completed,
                                rows_copied: outcome.rows_copied,
                                dest_rows: outcome.dest_rows,
                                error: None,
                                duration_seconds: stage_start.elapsed().as_secs_f64(),
                            });
                        }
                        Err(e) => {
                            error!(
                                "'{}' {} -> {} failed: {}",
                                dataset_name, from, to, e
                            );
                            chain_broken = true;
                            failed_datasets
                                .push(format!("{}/{}", pipeline.name, dataset_name));
                            stages.push(StageOutcome {
                                pipeline: pipeline.name.clone(),
                                dataset: dataset_name.clone(),
                                source_tier: from.clone(),
                                dest_tier: to.clone(),
                                status: StageStatus::Failed,
                                rows_copied: 0,
                                dest_rows: 0,
                                error: Some(e.to_string()),
                                duration_seconds: stage_start.elapsed().as_secs_f64(),
                            });
                        }
                    }
                }
            }
        }

        if !dry_run {
            self.compact_loaded_tiers(&stages);
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let datasets_failed = failed_datasets.len();
        let status = if dry_run {
            "dry_run"
        } else if datasets_failed > 0 {
            "failed"
        } else {
            "completed"
        };

        let report = RunReport {
            run_id,
            status: status.to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            datasets_total,
            datasets_success: datasets_total - datasets_failed,
            datasets_failed,
            rows_copied,
            failed_datasets,
            stages,
        };

        info!(
            "Spread {}: {} datasets, {} rows in {:.1}s",
            report.status, report.datasets_total, report.rows_copied, report.duration_seconds
        );

        Ok(report)
    }

    /// Compare row counts across every hop of the selected pipelines.
    pub fn validate(&self, pipeline: Option<&str>) -> Result<Vec<CountCheck>> {
        let pipelines = self.selected_pipelines(pipeline)?;
        let mut checks = Vec::new();

        for pipeline in &pipelines {
            for dataset_name in &pipeline.datasets {
                let spec = self.config.dataset(dataset_name)?;
                for hop in pipeline.route.windows(2) {
                    let (from, to) = (&hop[0], &hop[1]);
                    let source_rows = self
                        .store(from)?
                        .row_count(spec.table_in(from))
                        .map_err(|e| {
                            SpreadError::Validation(format!(
                                "cannot count '{}' on tier '{}': {}",
                                dataset_name, from, e
                            ))
                        })?;
                    let dest_rows = self
                        .store(to)?
                        .row_count(spec.table_in(to))
                        .unwrap_or(0);

                    let matches = source_rows == dest_rows;
                    if matches {
                        info!(
                            "'{}' {} -> {}: {} rows (match)",
                            dataset_name, from, to, source_rows
                        );
                    } else {
                        warn!(
                            "'{}' {} -> {}: source={} dest={} (MISMATCH)",
                            dataset_name, from, to, source_rows, dest_rows
                        );
                    }
                    checks.push(CountCheck {
                        pipeline: pipeline.name.clone(),
                        dataset: dataset_name.clone(),
                        from_tier: from.clone(),
                        to_tier: to.clone(),
                        source_rows,
                        dest_rows,
                        matches,
                    });
                }
            }
        }
        Ok(checks)
    }

    /// Probe every tier store with a trivial read.
    #[must_use]
    pub fn tier_health(&self) -> Vec<TierHealth> {
        self.stores
            .iter()
            .map(|(name, store)| match store.table_exists("spreader_probe") {
                Ok(_) => TierHealth {
                    tier: name.clone(),
                    healthy: true,
                    detail: None,
                },
                Err(e) => TierHealth {
                    tier: name.clone(),
                    healthy: false,
                    detail: Some(e.to_string()),
                },
            })
            .collect()
    }

    fn run_stage(&self, spec: &DatasetSpec, from: &str, to: &str) -> Result<ReplicationOutcome> {
        let source = self.store(from)?;
        let dest = self.store(to)?;
        replicate(
            dest,
            source,
            spec,
            from,
            to,
            self.config.replication.get_chunk_size(),
        )
    }

    fn selected_pipelines(&self, filter: Option<&str>) -> Result<Vec<&PipelineSpec>> {
        match filter {
            Some(name) => Ok(vec![self.config.pipeline(name)?]),
            None => {
                if self.config.pipelines.is_empty() {
                    return Err(SpreadError::Config("no pipelines configured".to_string()));
                }
                Ok(self.config.pipelines.iter().collect())
            }
        }
    }

    /// Vacuum tiers flagged `compact_after_load` once their inbound stages
    /// all completed. A compaction failure is logged, never fatal.
    fn compact_loaded_tiers(&self, stages: &[StageOutcome]) {
        let mut loaded: BTreeMap<&str, bool> = BTreeMap::new();
        for stage in stages {
            let ok = stage.status == StageStatus::Completed;
            loaded
                .entry(stage.dest_tier.as_str())
                .and_modify(|clean| *clean &= ok)
                .or_insert(ok);
        }

        for (tier, clean) in loaded {
            if !clean {
                continue;
            }
            let wants_compact = self
                .config
                .tiers
                .get(tier)
                .map(|t| t.compact_after_load)
                .unwrap_or(false);
            if !wants_compact {
                continue;
            }
            match self.store(tier).and_then(|s| s.compact()) {
                Ok(()) => info!("Compacted tier '{}'", tier),
                Err(e) => warn!("Compaction of tier '{}' failed: {}", tier, e),
            }
        }
    }
}
