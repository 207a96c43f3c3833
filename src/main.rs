//! zpool-control
//!
//! Command-line front end for the pool control plane. Every operation of
//! [`PoolManager`] is a subcommand; results are printed as JSON on stdout.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zpool_control::parser::size::parse_size;
use zpool_control::{
    CreateDatasetRequest, CreatePoolRequest, CreateSnapshotRequest, DatasetType, Error,
    ManagerConfig, Pool, PoolManager, QuotaMode, Result, ScrubAction, StatusMode,
    UseCaseTemplate,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// zpool-control - ZFS pool topology, health and lifecycle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "ZPOOL_CONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// Status decoding mode (auto, json, text)
    #[arg(long, env = "STATUS_MODE", value_enum)]
    status_mode: Option<StatusMode>,

    /// Path to the zpool binary
    #[arg(long, env = "ZPOOL_PATH")]
    zpool_path: Option<String>,

    /// Path to the zfs binary
    #[arg(long, env = "ZFS_PATH")]
    zfs_path: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long, env = "COMMAND_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all pools
    Pools,
    /// Show one pool
    Pool { name: String },
    /// Show the flattened vdev groups of a pool
    Vdevs { name: String },
    /// Risk assessment for a pool
    Health { name: String },
    /// Resilver progress
    Resilver { name: String },
    /// Scrub progress
    ScrubStatus { name: String },
    /// Create a pool
    CreatePool {
        name: String,
        /// stripe, mirror, raidz1, raidz2 or raidz3
        #[arg(long, default_value = "stripe")]
        raid_type: String,
        #[arg(required = true)]
        devices: Vec<String>,
    },
    /// Destroy a pool
    DestroyPool { name: String },
    /// Start, stop or pause a scrub
    Scrub {
        name: String,
        #[arg(long, value_enum, default_value = "start")]
        action: ScrubAction,
    },
    /// Replace a disk; resilvering starts in the background
    ReplaceDisk {
        pool: String,
        old: String,
        new: String,
    },
    /// List all datasets
    Datasets,
    /// Show one dataset
    Dataset { name: String },
    /// Create a filesystem or volume
    CreateDataset {
        name: String,
        /// filesystem or volume
        #[arg(long = "type", value_parser = parse_dataset_type, default_value = "filesystem")]
        dataset_type: DatasetType,
        /// general, media, surveillance, vm or database
        #[arg(long)]
        use_case: Option<UseCaseTemplate>,
        /// Quota, or volume size (e.g. 10G)
        #[arg(long, value_parser = parse_quota)]
        quota: Option<u64>,
        /// Also reserve the quota
        #[arg(long)]
        fixed: bool,
        /// Extra properties as key=value
        #[arg(short = 'o', long = "property", value_parser = parse_assignment)]
        properties: Vec<(String, String)>,
    },
    /// Destroy a dataset and its children
    DestroyDataset { name: String },
    /// Set a dataset property
    SetProperty {
        name: String,
        #[arg(value_parser = parse_assignment)]
        assignment: (String, String),
    },
    /// List snapshots of a dataset
    Snapshots { dataset: String },
    /// Create a snapshot
    Snapshot {
        dataset: String,
        name: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Destroy a snapshot
    DestroySnapshot { name: String },
    /// Roll a dataset back to a snapshot
    Rollback { name: String },
    /// Clone a snapshot into a new dataset
    CloneSnapshot { source: String, target: String },
    /// Print the JSON schema of the pool model
    Schema,
}

fn parse_dataset_type(s: &str) -> std::result::Result<DatasetType, String> {
    DatasetType::parse(s).ok_or_else(|| format!("unknown dataset type: {}", s))
}

fn parse_quota(s: &str) -> std::result::Result<u64, String> {
    parse_size(s).ok_or_else(|| format!("invalid size: {}", s))
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", s))
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;
    info!(
        "zpool-control {} (status mode: {}, timeout: {}s)",
        zpool_control::VERSION,
        config.status_mode,
        config.command_timeout_secs
    );

    let manager = PoolManager::host(config);
    run(&manager, args.command).await
}

/// Defaults, then the optional YAML file, then flags and environment
fn load_config(args: &Args) -> Result<ManagerConfig> {
    let mut config = match &args.config {
        Some(path) => ManagerConfig::from_yaml_file(path)?,
        None => ManagerConfig::default(),
    };

    if let Some(mode) = args.status_mode {
        config.status_mode = mode;
    }
    if let Some(path) = &args.zpool_path {
        config.zpool_path = path.clone();
    }
    if let Some(path) = &args.zfs_path {
        config.zfs_path = path.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.command_timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

async fn run(manager: &PoolManager, command: Command) -> Result<()> {
    match command {
        Command::Pools => print(&manager.list_pools().await?),
        Command::Pool { name } => print(&manager.get_pool(&name).await?),
        Command::Vdevs { name } => print(&manager.get_pool_vdevs(&name).await?),
        Command::Health { name } => print(&manager.get_pool_health(&name).await?),
        Command::Resilver { name } => print(&manager.get_resilver_status(&name).await?),
        Command::ScrubStatus { name } => print(&manager.get_scrub_status(&name).await?),
        Command::CreatePool {
            name,
            raid_type,
            devices,
        } => {
            let req = CreatePoolRequest {
                name,
                devices,
                raid_type,
            };
            manager.create_pool(&req).await?;
            print(&req)
        }
        Command::DestroyPool { name } => manager.destroy_pool(&name).await,
        Command::Scrub { name, action } => manager.scrub_control(&name, action).await,
        Command::ReplaceDisk { pool, old, new } => manager.replace_disk(&pool, &old, &new).await,
        Command::Datasets => print(&manager.list_datasets().await?),
        Command::Dataset { name } => print(&manager.get_dataset(&name).await?),
        Command::CreateDataset {
            name,
            dataset_type,
            use_case,
            quota,
            fixed,
            properties,
        } => {
            let req = CreateDatasetRequest {
                name,
                dataset_type,
                use_case,
                quota: quota.unwrap_or(0),
                quota_mode: if fixed {
                    QuotaMode::Fixed
                } else {
                    QuotaMode::Flexible
                },
                properties: properties.into_iter().collect::<BTreeMap<_, _>>(),
            };
            manager.create_dataset(&req).await?;
            print(&req)
        }
        Command::DestroyDataset { name } => manager.destroy_dataset(&name).await,
        Command::SetProperty {
            name,
            assignment: (key, value),
        } => manager.set_property(&name, &key, &value).await,
        Command::Snapshots { dataset } => print(&manager.list_snapshots(&dataset).await?),
        Command::Snapshot {
            dataset,
            name,
            recursive,
        } => {
            let req = CreateSnapshotRequest {
                dataset,
                name,
                recursive,
            };
            print(&manager.create_snapshot(&req).await?)
        }
        Command::DestroySnapshot { name } => manager.destroy_snapshot(&name).await,
        Command::Rollback { name } => manager.rollback_snapshot(&name).await,
        Command::CloneSnapshot { source, target } => manager.clone_snapshot(&source, &target).await,
        Command::Schema => print(&schemars::schema_for!(Pool)),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(Error::Json)?;
    println!("{}", out);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so stdout stays machine-readable
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
