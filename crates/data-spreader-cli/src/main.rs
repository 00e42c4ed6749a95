//! Command-line interface for the data spreader.

mod logging;
mod wizard;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use data_spreader::config::Config;
use data_spreader::error::{Result, SpreadError};
use data_spreader::portal::PortalClient;
use data_spreader::report;
use data_spreader::spread::Spreader;
use data_spreader::store::DatasetStore;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "data-spreader")]
#[command(about = "Staged GIS data replication, inventory reports and portal chores", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    output_json: bool,

    /// Console log format: text, json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Log directory (overrides the configured one)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured pipelines, tier by tier
    Spread {
        /// Run only this pipeline
        #[arg(long)]
        pipeline: Option<String>,

        /// Plan the stages without touching any store
        #[arg(long)]
        dry_run: bool,
    },

    /// Replicate one dataset across one tier pair
    Replicate {
        /// Dataset name from the config
        #[arg(long)]
        dataset: String,

        /// Source tier
        #[arg(long)]
        from: String,

        /// Destination tier
        #[arg(long)]
        to: String,
    },

    /// Compare row counts along the configured routes
    Validate {
        /// Check only this pipeline
        #[arg(long)]
        pipeline: Option<String>,
    },

    /// Build an inventory report
    Report {
        /// Which inventory to build
        #[arg(value_enum)]
        inventory: ReportKind,

        /// Tier to read for store-backed inventories
        #[arg(long)]
        tier: Option<String>,

        /// Output directory (overrides the configured one)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the report to stdout instead of writing files
        #[arg(long)]
        print: bool,
    },

    /// Copy a portal item into the signed-in account
    CloneItem {
        /// Item id to clone
        #[arg(long)]
        item: String,

        /// Destination folder
        #[arg(long)]
        folder: Option<String>,
    },

    /// List the registered dependencies of a portal item
    ItemDependencies {
        /// Item id to inspect
        #[arg(long)]
        item: String,
    },

    /// Restart hosted services (all of them, or one via --service)
    RestartServices {
        /// Qualified service path, e.g. Hosted/Trails.MapServer
        #[arg(long)]
        service: Option<String>,
    },

    /// Check tier stores and the portal connection
    HealthCheck,

    /// Generate a configuration file interactively
    Init {
        /// Output path for the config file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file without prompting
        #[arg(short, long)]
        force: bool,
    },
}

/// Inventory reports the `report` subcommand can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    /// Portal users with roles and last login
    Users,
    /// Portal groups with membership
    Groups,
    /// Portal items with owners and view counts
    Items,
    /// Relationship classes recorded in a tier store
    RelationshipClasses,
    /// Attribute domains and where they are used
    Domains,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Init runs before config loading; there may be no config file yet.
    if let Commands::Init { output, force } = &cli.command {
        let path = output.clone().unwrap_or_else(|| cli.config.clone());
        wizard::run_wizard(&path, *force).map_err(|e| SpreadError::Config(e.to_string()))?;
        return Ok(());
    }

    let config = Config::load(&cli.config)?;

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.log_dir.clone());
    logging::setup(
        &cli.verbosity,
        &cli.log_format,
        &log_dir,
        command_log_name(&cli.command),
    )
    .map_err(SpreadError::Config)?;

    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Spread { pipeline, dry_run } => {
            let spreader = Spreader::new(config)?;
            let report = spreader.run(pipeline.as_deref(), dry_run)?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!();
                println!("Spread run {}: {}", report.run_id, report.status);
                println!("  Duration: {:.2}s", report.duration_seconds);
                println!(
                    "  Datasets: {}/{} succeeded",
                    report.datasets_success, report.datasets_total
                );
                println!("  Rows copied: {}", report.rows_copied);
                if !report.failed_datasets.is_empty() {
                    println!("  Failed: {}", report.failed_datasets.join(", "));
                }
            }

            if !report.succeeded() {
                return Err(SpreadError::replicate(
                    report.failed_datasets.join(", "),
                    format!(
                        "{} of {} datasets failed",
                        report.datasets_failed, report.datasets_total
                    ),
                ));
            }
            Ok(())
        }

        Commands::Replicate { dataset, from, to } => {
            let spreader = Spreader::new(config)?;
            let outcome = spreader.replicate_one(&dataset, &from, &to)?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "Replicated '{}' {} -> {}: {} rows copied, {} now on {}",
                    dataset, from, to, outcome.rows_copied, outcome.dest_rows, to
                );
            }
            Ok(())
        }

        Commands::Validate { pipeline } => {
            let spreader = Spreader::new(config)?;
            let checks = spreader.validate(pipeline.as_deref())?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&checks)?);
            } else {
                println!();
                for check in &checks {
                    let marker = if check.matches { "match" } else { "MISMATCH" };
                    println!(
                        "  {}/{} {} -> {}: {} vs {} ({})",
                        check.pipeline,
                        check.dataset,
                        check.from_tier,
                        check.to_tier,
                        check.source_rows,
                        check.dest_rows,
                        marker
                    );
                }
            }

            let broken = checks.iter().filter(|c| !c.matches).count();
            if broken > 0 {
                return Err(SpreadError::Validation(format!(
                    "{} of {} count checks failed",
                    broken,
                    checks.len()
                )));
            }
            if !cli.output_json {
                println!();
                println!("Validation passed: {} checks", checks.len());
            }
            Ok(())
        }

        Commands::Report {
            inventory,
            tier,
            out,
            print,
        } => {
            let sentinel = config.report.sentinel.clone();
            let out_dir = out.unwrap_or_else(|| config.report.out_dir.clone());

            let workbook = match inventory {
                ReportKind::Users => {
                    let client = portal_client(&config)?;
                    let users = client.list_users()?;
                    report::users_workbook(&users, &sentinel)
                }
                ReportKind::Groups => {
                    let client = portal_client(&config)?;
                    let groups = client.list_groups()?;
                    let mut members = BTreeMap::new();
                    for group in &groups {
                        match client.group_members(&group.id) {
                            Ok(names) => {
                                members.insert(group.id.clone(), names);
                            }
                            Err(e) => {
                                warn!("group '{}': members unavailable: {}", group.title, e)
                            }
                        }
                    }
                    report::groups_workbook(&groups, &members, &sentinel)
                }
                ReportKind::Items => {
                    let client = portal_client(&config)?;
                    let items = client.search_items("*")?;
                    report::items_workbook(&items, &sentinel)
                }
                ReportKind::RelationshipClasses => {
                    let store = store_for_report(&config, tier.as_deref())?;
                    let classes = store.relationship_classes()?;
                    report::relationship_classes_workbook(&classes, &sentinel)
                }
                ReportKind::Domains => {
                    let store = store_for_report(&config, tier.as_deref())?;
                    let domains = store.domains()?;
                    let usage = store.domain_usage()?;
                    report::domains_workbook(&domains, &usage, &sentinel)
                }
            };

            if print {
                print!("{}", workbook.render_text());
            } else {
                let dir = workbook.write_csv(&out_dir)?;
                println!("Report written to {}", dir.display());
            }
            Ok(())
        }

        Commands::CloneItem { item, folder } => {
            let client = portal_client(&config)?;
            let new_id = client.clone_item(&item, folder.as_deref())?;
            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "source_item": item,
                        "new_item": new_id,
                    }))?
                );
            } else {
                println!("Cloned item {} -> {}", item, new_id);
            }
            Ok(())
        }

        Commands::ItemDependencies { item } => {
            let client = portal_client(&config)?;
            let deps = client.item_dependencies(&item)?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&deps)?);
            } else if deps.is_empty() {
                println!("Item {} has no registered dependencies", item);
            } else {
                println!("Dependencies of item {}:", item);
                for dep in &deps {
                    match &dep.id {
                        Some(id) => println!("  {} {}", dep.dependency_type, id),
                        None => println!("  {}", dep.dependency_type),
                    }
                }
            }
            Ok(())
        }

        Commands::RestartServices { service } => {
            let client = portal_client(&config)?;
            let targets: Vec<String> = match service {
                Some(path) => vec![path],
                None => client.list_services()?.iter().map(|s| s.path()).collect(),
            };
            if targets.is_empty() {
                println!("No services registered");
                return Ok(());
            }

            let mut failed = 0;
            for svc in &targets {
                match client.restart_service(svc) {
                    Ok(()) => println!("  {}: restarted", svc),
                    Err(e) => {
                        failed += 1;
                        println!("  {}: FAILED ({})", svc, e);
                    }
                }
            }
            if failed > 0 {
                return Err(SpreadError::portal_api(
                    0,
                    format!(
                        "{} of {} services failed to restart",
                        failed,
                        targets.len()
                    ),
                ));
            }
            println!("Restarted {} services", targets.len());
            Ok(())
        }

        Commands::HealthCheck => {
            let spreader = Spreader::new(config)?;
            let tiers = spreader.tier_health();
            let portal = spreader.config().portal.as_ref().map(|p| {
                match PortalClient::new(p).and_then(|c| c.ping()) {
                    Ok(version) => (true, format!("version {}", version)),
                    Err(e) => (false, e.to_string()),
                }
            });

            let healthy = tiers.iter().all(|t| t.healthy)
                && portal.as_ref().map_or(true, |(ok, _)| *ok);

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "healthy": healthy,
                        "tiers": tiers,
                        "portal": portal.as_ref().map(|(ok, detail)| {
                            serde_json::json!({ "healthy": ok, "detail": detail })
                        }),
                    }))?
                );
            } else {
                println!();
                println!("Health check");
                println!("------------");
                for t in &tiers {
                    if t.healthy {
                        println!("  tier {}: OK", t.tier);
                    } else {
                        println!(
                            "  tier {}: FAILED ({})",
                            t.tier,
                            t.detail.as_deref().unwrap_or("no detail")
                        );
                    }
                }
                match &portal {
                    None => println!("  portal: not configured"),
                    Some((true, detail)) => println!("  portal: OK ({})", detail),
                    Some((false, detail)) => println!("  portal: FAILED ({})", detail),
                }
                println!();
            }

            if !healthy {
                return Err(SpreadError::Config("Health check failed".to_string()));
            }
            Ok(())
        }

        Commands::Init { .. } => unreachable!(),
    }
}

/// Build a portal client, or explain that the config has no portal section.
fn portal_client(config: &Config) -> Result<PortalClient> {
    let portal = config.portal.as_ref().ok_or_else(|| {
        SpreadError::Config(
            "portal is not configured; add a portal section to the config".to_string(),
        )
    })?;
    PortalClient::new(portal)
}

/// Open the tier store a store-backed report reads from.
fn store_for_report(
    config: &Config,
    tier: Option<&str>,
) -> Result<data_spreader::store::StoreImpl> {
    let tier = tier.ok_or_else(|| {
        SpreadError::Config(
            "--tier is required for relationship-classes and domains reports".to_string(),
        )
    })?;
    data_spreader::tier::TierRegistry::new(config).open(tier)
}

fn command_log_name(command: &Commands) -> &'static str {
    match command {
        Commands::Spread { .. } => "spread",
        Commands::Replicate { .. } => "replicate",
        Commands::Validate { .. } => "validate",
        Commands::Report { .. } => "report",
        Commands::CloneItem { .. } => "clone_item",
        Commands::ItemDependencies { .. } => "item_dependencies",
        Commands::RestartServices { .. } => "restart_services",
        Commands::HealthCheck => "health_check",
        Commands::Init { .. } => "init",
    }
}
