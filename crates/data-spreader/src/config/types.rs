//! Configuration type definitions.

use crate::core::mapping::{FieldMap, FieldMapEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named data tiers, keyed by tier name (e.g. source, internal, public).
    pub tiers: BTreeMap<String, TierConfig>,

    /// Dataset definitions shared by all pipelines.
    pub datasets: Vec<DatasetSpec>,

    /// Replication pipelines.
    #[serde(default)]
    pub pipelines: Vec<PipelineSpec>,

    /// Portal connection, required only for portal commands and reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<PortalConfig>,

    /// Replication behavior configuration.
    #[serde(default)]
    pub replication: ReplicationConfig,

    /// Report output configuration.
    #[serde(default)]
    pub report: ReportConfig,

    /// Directory for per-command log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

/// Kind of staging store backing a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// File-backed sqlite store (staging .sqlite / .gpkg files).
    Sqlite,

    /// In-process store; starts empty every run. Dry runs and tests.
    Memory,
}

/// One named data tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Store kind.
    pub kind: TierKind,

    /// Store file path; required for sqlite tiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Run store maintenance after loads into this tier succeed.
    #[serde(default)]
    pub compact_after_load: bool,
}

/// One thematic dataset (Cemeteries, Trails, Parcels, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Dataset name, referenced by pipelines.
    pub name: String,

    /// Table name, used in every tier unless overridden.
    pub table: String,

    /// Per-tier table name overrides, keyed by tier name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub table_overrides: BTreeMap<String, String>,

    /// Ordered field mapping applied at every stage.
    pub fields: Vec<FieldMapEntry>,
}

impl DatasetSpec {
    /// Table name this dataset uses in the given tier.
    #[must_use]
    pub fn table_in<'a>(&'a self, tier: &str) -> &'a str {
        self.table_overrides
            .get(tier)
            .map(String::as_str)
            .unwrap_or(&self.table)
    }

    /// The dataset's field mapping.
    #[must_use]
    pub fn mapping(&self) -> FieldMap {
        FieldMap::new(self.fields.clone())
    }
}

/// An ordered route of tiers and the datasets propagated along it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name.
    pub name: String,

    /// Tier names in propagation order; length >= 2.
    pub route: Vec<String>,

    /// Names of datasets to propagate.
    pub datasets: Vec<String>,
}

/// Replication behavior configuration.
///
/// Fields use Option<T> to distinguish "not set" (use the default) from
/// "explicitly set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Rows per copy chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl ReplicationConfig {
    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(2_000)
    }
}

/// Portal connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL (e.g. <https://maps.example.gov/portal>).
    pub url: String,

    /// Admin account username.
    pub username: String,

    /// Password in the config file. Prefer `password_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Hosting server admin URL, required for service restart commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_portal_timeout")]
    pub timeout_secs: u64,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory date-stamped report workbooks are written under.
    #[serde(default = "default_report_dir")]
    pub out_dir: PathBuf,

    /// Cell text substituted for absent optional attributes.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            out_dir: default_report_dir(),
            sentinel: default_sentinel(),
        }
    }
}

// Default value functions for serde
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_sentinel() -> String {
    "N/A".to_string()
}

fn default_portal_timeout() -> u64 {
    30
}
