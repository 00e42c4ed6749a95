//! Interactive configuration wizard for first-time setup.
//!
//! Walks through tiers, datasets, pipelines and the optional portal
//! connection, then writes a commented YAML config. Run via
//! `data-spreader init`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use data_spreader::config::{
    Config, DatasetSpec, PipelineSpec, PortalConfig, ReplicationConfig, ReportConfig, TierConfig,
    TierKind,
};
use data_spreader::core::{FieldMapEntry, FieldType};
use data_spreader::store::{DatasetStore, StoreImpl};
use dialoguer::{Confirm, Input, Password, Select};

/// Errors that can occur during the wizard.
#[derive(Debug)]
pub enum WizardError {
    /// User cancelled the wizard.
    Cancelled,
    /// IO error during prompts or file writes.
    Io(std::io::Error),
    /// Configuration error.
    Config(String),
    /// Validation error in the assembled config.
    Validation(String),
}

impl std::fmt::Display for WizardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardError::Cancelled => write!(f, "Wizard cancelled by user"),
            WizardError::Io(e) => write!(f, "IO error: {}", e),
            WizardError::Config(msg) => write!(f, "Configuration error: {}", msg),
            WizardError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for WizardError {}

impl From<std::io::Error> for WizardError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<dialoguer::Error> for WizardError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Io(std::io::Error::other(e.to_string()))
    }
}

/// Result type for wizard operations.
pub type WizardResult<T> = Result<T, WizardError>;

/// What to do when the output file already exists.
enum ExistingFileAction {
    Edit,
    Overwrite,
    Abort,
}

/// Run the interactive configuration wizard.
pub fn run_wizard(output: &Path, force: bool) -> WizardResult<()> {
    println!();
    println!("Data Spreader - Configuration Wizard");
    println!("====================================");
    println!();

    let existing = if output.exists() && !force {
        match prompt_existing_file(output)? {
            ExistingFileAction::Abort => return Err(WizardError::Cancelled),
            ExistingFileAction::Edit => load_existing(output),
            ExistingFileAction::Overwrite => None,
        }
    } else {
        None
    };

    let tiers = prompt_tiers(existing.as_ref())?;
    let datasets = prompt_datasets(existing.as_ref())?;
    let pipelines = prompt_pipelines(existing.as_ref(), &tiers, &datasets)?;
    let portal = prompt_portal(existing.as_ref())?;
    let (replication, report, log_dir) = prompt_run_settings(existing.as_ref())?;

    let config = Config {
        tiers,
        datasets,
        pipelines,
        portal,
        replication,
        report,
        log_dir,
    };

    config
        .validate()
        .map_err(|e| WizardError::Validation(e.to_string()))?;

    print_summary(&config);

    if prompt_store_test()? {
        test_stores(&config);
    }

    if !prompt_save_confirm(output)? {
        return Err(WizardError::Cancelled);
    }

    write_config(&config, output)?;

    println!();
    println!("Configuration saved to {}", output.display());
    println!("Run 'data-spreader spread' to start a replication run.");
    println!();

    Ok(())
}

fn prompt_existing_file(output: &Path) -> WizardResult<ExistingFileAction> {
    println!("Configuration file already exists: {}", output.display());
    println!();

    let choice = Select::new()
        .with_prompt("What would you like to do?")
        .items(&[
            "Edit existing configuration",
            "Overwrite with new configuration",
            "Abort",
        ])
        .default(0)
        .interact()?;

    Ok(match choice {
        0 => ExistingFileAction::Edit,
        1 => ExistingFileAction::Overwrite,
        _ => ExistingFileAction::Abort,
    })
}

/// Load the existing config for editing. Parse failures are tolerated;
/// the wizard simply starts from defaults.
fn load_existing(output: &Path) -> Option<Config> {
    let text = std::fs::read_to_string(output).ok()?;
    match Config::from_yaml(&text) {
        Ok(config) => Some(config),
        Err(e) => {
            println!("Existing file could not be parsed ({}); starting fresh.", e);
            println!();
            None
        }
    }
}

fn prompt_tiers(existing: Option<&Config>) -> WizardResult<BTreeMap<String, TierConfig>> {
    println!("Data tiers");
    println!("----------");

    if let Some(config) = existing {
        if !config.tiers.is_empty() {
            let keep = Confirm::new()
                .with_prompt(format!(
                    "  Keep the {} configured tiers ({})?",
                    config.tiers.len(),
                    config.tiers.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
                .default(true)
                .interact()?;
            if keep {
                println!();
                return Ok(config.tiers.clone());
            }
        }
    }

    let mut tiers = BTreeMap::new();
    let suggested = ["source", "internal", "public"];
    loop {
        let default_name = suggested.get(tiers.len()).copied().unwrap_or("").to_string();
        let name: String = Input::new()
            .with_prompt("  Tier name (blank to finish)")
            .default(default_name)
            .allow_empty(true)
            .interact_text()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            if tiers.len() >= 2 {
                break;
            }
            println!("  At least two tiers are needed to replicate anything.");
            continue;
        }

        let kind_choice = Select::new()
            .with_prompt(format!("  Store kind for '{}'", name))
            .items(&["sqlite (file-backed)", "memory (volatile)"])
            .default(0)
            .interact()?;
        let kind = if kind_choice == 0 {
            TierKind::Sqlite
        } else {
            TierKind::Memory
        };

        let path = if kind == TierKind::Sqlite {
            let p: String = Input::new()
                .with_prompt("  Store file path")
                .default(format!("staging/{}.sqlite", name))
                .interact_text()?;
            Some(PathBuf::from(p))
        } else {
            None
        };

        let compact_after_load = Confirm::new()
            .with_prompt("  Compact this store after successful loads?")
            .default(false)
            .interact()?;

        tiers.insert(
            name,
            TierConfig {
                kind,
                path,
                compact_after_load,
            },
        );
    }
    println!();
    Ok(tiers)
}

fn prompt_datasets(existing: Option<&Config>) -> WizardResult<Vec<DatasetSpec>> {
    println!("Datasets");
    println!("--------");

    if let Some(config) = existing {
        if !config.datasets.is_empty() {
            let keep = Confirm::new()
                .with_prompt(format!(
                    "  Keep the {} configured datasets?",
                    config.datasets.len()
                ))
                .default(true)
                .interact()?;
            if keep {
                println!();
                return Ok(config.datasets.clone());
            }
        }
    }

    let mut datasets: Vec<DatasetSpec> = Vec::new();
    loop {
        let name: String = Input::new()
            .with_prompt("  Dataset name (blank to finish)")
            .allow_empty(true)
            .interact_text()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            if !datasets.is_empty() {
                break;
            }
            println!("  At least one dataset is needed.");
            continue;
        }

        let table: String = Input::new()
            .with_prompt("  Table name")
            .default(name.clone())
            .interact_text()?;

        let mut table_overrides = BTreeMap::new();
        let override_tier: String = Input::new()
            .with_prompt("  Tier with a different table name (blank for none)")
            .allow_empty(true)
            .interact_text()?;
        let override_tier = override_tier.trim().to_string();
        if !override_tier.is_empty() {
            let override_table: String = Input::new()
                .with_prompt(format!("  Table name on '{}'", override_tier))
                .interact_text()?;
            table_overrides.insert(override_tier, override_table.trim().to_string());
        }

        let raw_fields: String = Input::new()
            .with_prompt("  Fields as FROM:to:type, comma-separated (e.g. NAME:name:text, MILES:length_miles:real)")
            .interact_text()?;
        let fields: Vec<FieldMapEntry> = raw_fields
            .split(',')
            .filter_map(parse_field_entry)
            .collect();
        if fields.is_empty() {
            println!("  No fields parsed; a dataset needs at least one field.");
            continue;
        }

        datasets.push(DatasetSpec {
            name,
            table: table.trim().to_string(),
            table_overrides,
            fields,
        });
    }
    println!();
    Ok(datasets)
}

/// Parse one `FROM:to:type` field entry. The destination name defaults to
/// the source name, the type to text.
fn parse_field_entry(raw: &str) -> Option<FieldMapEntry> {
    let mut parts = raw.splitn(3, ':').map(str::trim);
    let from = parts.next()?.to_string();
    if from.is_empty() {
        return None;
    }
    let to = match parts.next() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => from.clone(),
    };
    let field_type = parts
        .next()
        .map(FieldType::from_decl)
        .unwrap_or(FieldType::Text);
    Some(FieldMapEntry::new(from, to, field_type))
}

fn prompt_pipelines(
    existing: Option<&Config>,
    tiers: &BTreeMap<String, TierConfig>,
    datasets: &[DatasetSpec],
) -> WizardResult<Vec<PipelineSpec>> {
    println!("Pipelines");
    println!("---------");

    if let Some(config) = existing {
        if !config.pipelines.is_empty() {
            let keep = Confirm::new()
                .with_prompt(format!(
                    "  Keep the {} configured pipelines?",
                    config.pipelines.len()
                ))
                .default(true)
                .interact()?;
            if keep {
                println!();
                return Ok(config.pipelines.clone());
            }
        }
    }

    let tier_names: Vec<String> = tiers.keys().cloned().collect();
    let all_datasets = datasets
        .iter()
        .map(|d| d.name.clone())
        .collect::<Vec<_>>()
        .join(", ");

    let mut pipelines: Vec<PipelineSpec> = Vec::new();
    loop {
        let default_name = if pipelines.is_empty() { "nightly" } else { "" };
        let name: String = Input::new()
            .with_prompt("  Pipeline name (blank to finish)")
            .default(default_name.to_string())
            .allow_empty(true)
            .interact_text()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            break;
        }

        let route = loop {
            let raw: String = Input::new()
                .with_prompt("  Route as ordered tier names, comma-separated")
                .default(tier_names.join(", "))
                .interact_text()?;
            let route: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let unknown: Vec<&String> =
                route.iter().filter(|t| !tiers.contains_key(*t)).collect();
            if route.len() < 2 {
                println!("  A route needs at least two tiers.");
            } else if !unknown.is_empty() {
                println!(
                    "  Unknown tier(s): {}. Configured tiers: {}",
                    unknown
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    tier_names.join(", ")
                );
            } else {
                break route;
            }
        };

        let raw_datasets: String = Input::new()
            .with_prompt("  Datasets to carry, comma-separated")
            .default(all_datasets.clone())
            .interact_text()?;
        let pipeline_datasets: Vec<String> = raw_datasets
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        pipelines.push(PipelineSpec {
            name,
            route,
            datasets: pipeline_datasets,
        });
    }
    println!();
    Ok(pipelines)
}

fn prompt_portal(existing: Option<&Config>) -> WizardResult<Option<PortalConfig>> {
    println!("Portal connection");
    println!("-----------------");

    let existing_portal = existing.and_then(|c| c.portal.as_ref());
    let wanted = Confirm::new()
        .with_prompt("  Configure a portal connection?")
        .default(existing_portal.is_some())
        .interact()?;
    if !wanted {
        println!();
        return Ok(None);
    }

    let url: String = Input::new()
        .with_prompt("  Portal URL")
        .default(
            existing_portal
                .map(|p| p.url.clone())
                .unwrap_or_else(|| "https://maps.example.gov/portal".to_string()),
        )
        .interact_text()?;

    let username: String = Input::new()
        .with_prompt("  Username")
        .default(
            existing_portal
                .map(|p| p.username.clone())
                .unwrap_or_default(),
        )
        .interact_text()?;

    let storage = Select::new()
        .with_prompt("  Password storage")
        .items(&["Environment variable", "Config file"])
        .default(0)
        .interact()?;

    let (password, password_env) = if storage == 0 {
        let var: String = Input::new()
            .with_prompt("  Environment variable name")
            .default(
                existing_portal
                    .and_then(|p| p.password_env.clone())
                    .unwrap_or_else(|| "SPREADER_PORTAL_PASSWORD".to_string()),
            )
            .interact_text()?;
        (None, Some(var))
    } else {
        let editing = existing_portal.and_then(|p| p.password.as_ref()).is_some();
        let prompt = if editing {
            "  Password (blank to keep existing)"
        } else {
            "  Password"
        };
        let entered: String = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(editing)
            .interact()?;
        let password = if entered.is_empty() {
            existing_portal.and_then(|p| p.password.clone())
        } else {
            Some(entered)
        };
        (password, None)
    };

    let admin_url: String = Input::new()
        .with_prompt("  Hosting server admin URL (blank for none)")
        .default(
            existing_portal
                .and_then(|p| p.admin_url.clone())
                .unwrap_or_default(),
        )
        .allow_empty(true)
        .interact_text()?;
    let admin_url = {
        let trimmed = admin_url.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    let timeout_secs: u64 = Input::new()
        .with_prompt("  Request timeout (seconds)")
        .default(existing_portal.map(|p| p.timeout_secs).unwrap_or(30))
        .interact_text()?;

    println!();
    Ok(Some(PortalConfig {
        url,
        username,
        password,
        password_env,
        admin_url,
        timeout_secs,
    }))
}

fn prompt_run_settings(
    existing: Option<&Config>,
) -> WizardResult<(ReplicationConfig, ReportConfig, PathBuf)> {
    println!("Run settings");
    println!("------------");

    let chunk_raw: String = Input::new()
        .with_prompt("  Copy chunk size (rows per batch, 'auto' for default)")
        .default(
            existing
                .and_then(|c| c.replication.chunk_size)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "auto".to_string()),
        )
        .interact_text()?;
    let chunk_size = chunk_raw.trim().parse::<usize>().ok();

    let out_dir: String = Input::new()
        .with_prompt("  Report output directory")
        .default(
            existing
                .map(|c| c.report.out_dir.display().to_string())
                .unwrap_or_else(|| "reports".to_string()),
        )
        .interact_text()?;

    let sentinel: String = Input::new()
        .with_prompt("  Placeholder for missing report values")
        .default(
            existing
                .map(|c| c.report.sentinel.clone())
                .unwrap_or_else(|| "N/A".to_string()),
        )
        .interact_text()?;

    let log_dir: String = Input::new()
        .with_prompt("  Log directory")
        .default(
            existing
                .map(|c| c.log_dir.display().to_string())
                .unwrap_or_else(|| "logs".to_string()),
        )
        .interact_text()?;

    println!();
    Ok((
        ReplicationConfig { chunk_size },
        ReportConfig {
            out_dir: PathBuf::from(out_dir),
            sentinel,
        },
        PathBuf::from(log_dir),
    ))
}

fn print_summary(config: &Config) {
    println!();
    println!("Configuration Summary");
    println!("---------------------");
    println!("Tiers:");
    for (name, tier) in &config.tiers {
        match &tier.path {
            Some(path) => println!("  {} ({:?}, {})", name, tier.kind, path.display()),
            None => println!("  {} ({:?})", name, tier.kind),
        }
    }
    println!(
        "Datasets: {} ({})",
        config.datasets.len(),
        config
            .datasets
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Pipelines:");
    for pipeline in &config.pipelines {
        println!("  {}: {}", pipeline.name, pipeline.route.join(" -> "));
    }
    match &config.portal {
        Some(portal) => println!("Portal: {}", portal.url),
        None => println!("Portal: not configured"),
    }
    println!();
}

fn prompt_store_test() -> WizardResult<bool> {
    Ok(Confirm::new()
        .with_prompt("Test tier stores now?")
        .default(false)
        .interact()?)
}

/// Open each tier store and run a cheap probe. Failures are reported but
/// do not abort the wizard; a tier file may simply not exist yet.
fn test_stores(config: &Config) {
    println!();
    println!("Testing tier stores...");
    for (name, tier) in &config.tiers {
        match StoreImpl::open(name, tier).and_then(|store| store.table_exists("spreader_probe")) {
            Ok(_) => println!("  {}: OK", name),
            Err(e) => println!("  {}: FAILED ({})", name, e),
        }
    }
    println!();
}

fn prompt_save_confirm(output: &Path) -> WizardResult<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Save configuration to {}?", output.display()))
        .default(true)
        .interact()?)
}

fn write_config(config: &Config, output: &Path) -> WizardResult<()> {
    let header = r#"# Data spreader configuration
# Generated by data-spreader init
#
# Tiers are the named staging stores; pipelines move datasets along a
# route of tiers, one hop at a time. See the repository README for the
# full reference.

"#;

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| WizardError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(output, format!("{}{}", header, yaml))?;
    Ok(())
}
