//! Pool Manager - the upstream API surface
//!
//! Reads go through the parser, topology and scan chain; mutations are
//! validated here and then handed to the storage tool. Nothing is cached
//! between calls except the resolved status mode.

use super::snapshot::{detect_snapshot_source, snapshot_from_row, sort_snapshots};
use super::templates::dataset_properties;
use super::validation::{
    require, validate_dataset_name, validate_layout, validate_pool_name, validate_property,
    validate_snapshot_id,
};
use crate::config::{ManagerConfig, StatusMode};
use crate::domain::model::{
    CreateDatasetRequest, CreatePoolRequest, CreateSnapshotRequest, Dataset, DatasetType, Pool,
    RiskAssessment, ScanStatus, ScrubAction, Snapshot, VDevGroup,
};
use crate::domain::ports::{CommandExecutor, PoolStatusReport};
use crate::error::{Error, ErrorCategory, ExecutionError, Result};
use crate::executor::HostExecutor;
use crate::parser::size::format_size;
use crate::parser::tabular::{
    parse_dataset_list, parse_pool_list, parse_snapshot_list, PoolListRow, DATASET_LIST_COLUMNS,
    DATASET_QUOTA_COLUMNS, POOL_LIST_COLUMNS, SNAPSHOT_LIST_COLUMNS,
};
use crate::status::{detect_mode, parser_for};
use crate::topology::{assemble_pool, assess_risk, flatten};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// stderr fragments the tools print for a missing pool or dataset
const NOT_FOUND_MARKERS: [&str; 2] = ["no such pool", "does not exist"];

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Map "does not exist" failures to [`Error::NotFound`]
fn not_found(kind: &str, name: &str, err: Error) -> Error {
    match &err {
        Error::Execution {
            source: ExecutionError::Failed { stderr, .. },
            ..
        } if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) => Error::not_found(kind, name),
        _ => err,
    }
}

/// Control plane over one host's storage pools
pub struct PoolManager {
    config: ManagerConfig,
    executor: Arc<dyn CommandExecutor>,
    status_mode: OnceCell<StatusMode>,
}

impl PoolManager {
    pub fn new(config: ManagerConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            config,
            executor,
            status_mode: OnceCell::new(),
        }
    }

    /// Manager that runs the real tools on this host
    pub fn host(config: ManagerConfig) -> Self {
        let executor = Arc::new(HostExecutor::new(config.command_timeout()));
        Self::new(config, executor)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // =========================================================================
    // Command plumbing
    // =========================================================================

    async fn run(
        &self,
        program: &str,
        operation: &str,
        target: &str,
        args: Vec<String>,
    ) -> Result<Vec<u8>> {
        self.executor
            .output(program, &args)
            .await
            .map_err(|e| Error::execution(operation, target, e))
    }

    async fn zpool(&self, operation: &str, target: &str, args: Vec<String>) -> Result<Vec<u8>> {
        self.run(&self.config.zpool_path, operation, target, args)
            .await
    }

    async fn zfs(&self, operation: &str, target: &str, args: Vec<String>) -> Result<Vec<u8>> {
        self.run(&self.config.zfs_path, operation, target, args).await
    }

    /// The status encoding in use, asking the tool in auto mode
    ///
    /// A successful version answer is kept for the manager's lifetime. A failed query
    /// falls back to text for this call only, so the next query asks again.
    pub async fn status_mode(&self) -> StatusMode {
        if self.config.status_mode != StatusMode::Auto {
            return self.config.status_mode;
        }
        match self
            .status_mode
            .get_or_try_init(|| self.detect_status_mode())
            .await
        {
            Ok(mode) => *mode,
            Err(e) => {
                warn!("Could not determine zpool version, using text status: {}", e);
                StatusMode::Text
            }
        }
    }

    async fn detect_status_mode(&self) -> std::result::Result<StatusMode, ExecutionError> {
        let out = self
            .executor
            .output(&self.config.zpool_path, &argv(&["version"]))
            .await?;
        let mode = detect_mode(&String::from_utf8_lossy(&out));
        info!("Using {} zpool status output", mode);
        Ok(mode)
    }

    async fn status_reports(&self, pool: Option<&str>) -> Result<Vec<PoolStatusReport>> {
        let parser = parser_for(self.status_mode().await);
        let raw = self
            .zpool(
                "pool status",
                pool.unwrap_or("all pools"),
                parser.status_args(pool),
            )
            .await?;
        parser.parse(&raw, Utc::now().timestamp())
    }

    async fn pool_status(&self, name: &str) -> Result<PoolStatusReport> {
        let reports = self
            .status_reports(Some(name))
            .await
            .map_err(|e| not_found("pool", name, e))?;
        reports
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::not_found("pool", name))
    }

    async fn pool_rows(&self, pool: Option<&str>) -> Result<Vec<PoolListRow>> {
        let mut args = argv(&["list", "-H", "-p", "-o", POOL_LIST_COLUMNS]);
        args.extend(pool.map(str::to_string));
        let raw = self
            .zpool("list pools", pool.unwrap_or("all pools"), args)
            .await?;
        Ok(parse_pool_list(&String::from_utf8_lossy(&raw)))
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// All imported pools with topology and health
    ///
    /// If the status command fails the pools are still returned with capacity
    /// data only. Status output that cannot be decoded is an error.
    pub async fn list_pools(&self) -> Result<Vec<Pool>> {
        let (rows, reports) = futures::join!(self.pool_rows(None), self.status_reports(None));
        let rows = rows?;
        let reports = match reports {
            Ok(reports) => reports,
            Err(e) if e.category() == ErrorCategory::Parse => return Err(e),
            Err(e) => {
                warn!("Pool status unavailable, returning capacity only: {}", e);
                Vec::new()
            }
        };

        Ok(rows
            .iter()
            .map(|row| assemble_pool(row, reports.iter().find(|r| r.name == row.name)))
            .collect())
    }

    pub async fn get_pool(&self, name: &str) -> Result<Pool> {
        require("pool", name)?;

        let (rows, report) = futures::try_join!(
            async {
                self.pool_rows(Some(name))
                    .await
                    .map_err(|e| not_found("pool", name, e))
            },
            self.pool_status(name)
        )?;
        let row = rows
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::not_found("pool", name))?;

        Ok(assemble_pool(row, Some(&report)))
    }

    pub async fn get_pool_vdevs(&self, name: &str) -> Result<Vec<VDevGroup>> {
        require("pool", name)?;
        let report = self.pool_status(name).await?;
        Ok(flatten(&report.vdevs))
    }

    pub async fn get_resilver_status(&self, name: &str) -> Result<ScanStatus> {
        require("pool", name)?;
        Ok(self.pool_status(name).await?.resilver)
    }

    pub async fn get_scrub_status(&self, name: &str) -> Result<ScanStatus> {
        require("pool", name)?;
        Ok(self.pool_status(name).await?.scrub)
    }

    pub async fn get_pool_health(&self, name: &str) -> Result<RiskAssessment> {
        let pool = self.get_pool(name).await?;
        Ok(assess_risk(pool.health, pool.redundancy))
    }

    pub async fn create_pool(&self, req: &CreatePoolRequest) -> Result<()> {
        validate_pool_name(&req.name)?;
        let layout = validate_layout(&req.raid_type, &req.devices)?;

        let mut args = argv(&["create", "-f", &req.name]);
        if let Some(layout) = &layout {
            args.push(layout.to_string());
        }
        args.extend(req.devices.iter().cloned());

        self.zpool("create pool", &req.name, args).await?;
        info!(
            "Created pool {} ({}, {} devices)",
            req.name,
            layout.map(|l| l.to_string()).unwrap_or_else(|| "stripe".into()),
            req.devices.len()
        );
        Ok(())
    }

    pub async fn destroy_pool(&self, name: &str) -> Result<()> {
        require("pool", name)?;
        self.zpool("destroy pool", name, argv(&["destroy", name]))
            .await
            .map_err(|e| not_found("pool", name, e))?;
        info!("Destroyed pool {}", name);
        Ok(())
    }

    /// Start a scrub
    pub async fn scrub(&self, name: &str) -> Result<()> {
        self.scrub_control(name, ScrubAction::Start).await
    }

    pub async fn scrub_control(&self, name: &str, action: ScrubAction) -> Result<()> {
        require("pool", name)?;
        let (operation, args) = match action {
            ScrubAction::Start => ("start scrub", argv(&["scrub", name])),
            ScrubAction::Stop => ("stop scrub", argv(&["scrub", "-s", name])),
            ScrubAction::Pause => ("pause scrub", argv(&["scrub", "-p", name])),
        };
        self.zpool(operation, name, args)
            .await
            .map_err(|e| not_found("pool", name, e))?;
        info!("Scrub {:?} accepted for pool {}", action, name);
        Ok(())
    }

    /// Replace `old` with `new`; the resilver runs in the background
    pub async fn replace_disk(&self, pool: &str, old: &str, new: &str) -> Result<()> {
        require("pool", pool)?;
        require("old device", old)?;
        require("new device", new)?;
        if old == new {
            return Err(Error::validation(format!(
                "replacement device must differ from {}",
                old
            )));
        }

        self.zpool("replace disk", pool, argv(&["replace", "-f", pool, old, new]))
            .await
            .map_err(|e| not_found("pool", pool, e))?;
        info!("Replacing {} with {} in pool {}", old, new, pool);
        Ok(())
    }

    // =========================================================================
    // Datasets
    // =========================================================================

    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let raw = self
            .zfs(
                "list datasets",
                "all datasets",
                argv(&["list", "-H", "-p", "-o", DATASET_LIST_COLUMNS]),
            )
            .await?;
        Ok(parse_dataset_list(&String::from_utf8_lossy(&raw)))
    }

    pub async fn get_dataset(&self, name: &str) -> Result<Dataset> {
        require("dataset", name)?;
        let columns = format!("{},{}", DATASET_LIST_COLUMNS, DATASET_QUOTA_COLUMNS);
        let raw = self
            .zfs(
                "get dataset",
                name,
                argv(&["list", "-H", "-p", "-o", &columns, name]),
            )
            .await
            .map_err(|e| not_found("dataset", name, e))?;

        parse_dataset_list(&String::from_utf8_lossy(&raw))
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::not_found("dataset", name))
    }

    pub async fn create_dataset(&self, req: &CreateDatasetRequest) -> Result<()> {
        validate_dataset_name(&req.name)?;
        match req.dataset_type {
            DatasetType::Snapshot => {
                return Err(Error::validation(
                    "snapshots are created with create_snapshot, not create_dataset",
                ));
            }
            DatasetType::Volume if req.quota == 0 => {
                return Err(Error::validation("quota (size) is required for volumes"));
            }
            _ => {}
        }

        let props = dataset_properties(req);
        for (key, value) in &props {
            validate_property(key, value)?;
        }

        let mut args = argv(&["create"]);
        if req.dataset_type == DatasetType::Volume {
            args.push("-V".to_string());
            args.push(format_size(req.quota));
        }
        for (key, value) in &props {
            args.push("-o".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(req.name.clone());

        self.zfs("create dataset", &req.name, args).await?;
        info!(
            "Created {} {} with {} properties",
            req.dataset_type,
            req.name,
            props.len()
        );
        Ok(())
    }

    /// Destroy a dataset with all its children and snapshots
    pub async fn destroy_dataset(&self, name: &str) -> Result<()> {
        require("dataset", name)?;
        if name.contains('@') {
            return Err(Error::validation(format!(
                "{} is a snapshot, use destroy_snapshot",
                name
            )));
        }
        self.zfs("destroy dataset", name, argv(&["destroy", "-r", name]))
            .await
            .map_err(|e| not_found("dataset", name, e))?;
        info!("Destroyed dataset {}", name);
        Ok(())
    }

    pub async fn set_property(&self, name: &str, key: &str, value: &str) -> Result<()> {
        require("dataset", name)?;
        validate_property(key, value)?;
        let assignment = format!("{}={}", key, value);
        self.zfs("set property", name, argv(&["set", &assignment, name]))
            .await
            .map_err(|e| not_found("dataset", name, e))?;
        info!("Set {} on {}", assignment, name);
        Ok(())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Snapshots of one dataset, oldest first
    pub async fn list_snapshots(&self, dataset: &str) -> Result<Vec<Snapshot>> {
        require("dataset", dataset)?;
        let raw = self
            .zfs(
                "list snapshots",
                dataset,
                argv(&[
                    "list",
                    "-H",
                    "-p",
                    "-t",
                    "snapshot",
                    "-o",
                    SNAPSHOT_LIST_COLUMNS,
                    "-d",
                    "1",
                    dataset,
                ]),
            )
            .await
            .map_err(|e| not_found("dataset", dataset, e))?;

        let mut snapshots: Vec<Snapshot> = parse_snapshot_list(&String::from_utf8_lossy(&raw))
            .into_iter()
            .map(|row| snapshot_from_row(row, dataset))
            .collect();
        sort_snapshots(&mut snapshots);
        Ok(snapshots)
    }

    pub async fn create_snapshot(&self, req: &CreateSnapshotRequest) -> Result<Snapshot> {
        require("dataset", &req.dataset)?;
        let label = req.name.strip_prefix('@').unwrap_or(&req.name);
        require("snapshot", label)?;
        if label.contains(['@', '/']) || label.contains(char::is_whitespace) {
            return Err(Error::validation(format!("invalid snapshot name: {}", label)));
        }

        let full_name = format!("{}@{}", req.dataset, label);
        let mut args = argv(&["snapshot"]);
        if req.recursive {
            args.push("-r".to_string());
        }
        args.push(full_name.clone());

        self.zfs("create snapshot", &full_name, args)
            .await
            .map_err(|e| not_found("dataset", &req.dataset, e))?;
        info!("Created snapshot {}", full_name);

        match self.snapshot_details(&full_name, &req.dataset).await {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) | Err(_) => {
                debug!("Snapshot {} not listed yet, returning request data", full_name);
                Ok(Snapshot {
                    source: detect_snapshot_source(&full_name),
                    name: full_name,
                    dataset: req.dataset.clone(),
                    created_at: Some(Utc::now()),
                    used: 0,
                    referenced: 0,
                })
            }
        }
    }

    async fn snapshot_details(&self, full_name: &str, dataset: &str) -> Result<Option<Snapshot>> {
        let raw = self
            .zfs(
                "get snapshot",
                full_name,
                argv(&[
                    "list",
                    "-H",
                    "-p",
                    "-t",
                    "snapshot",
                    "-o",
                    SNAPSHOT_LIST_COLUMNS,
                    full_name,
                ]),
            )
            .await?;
        Ok(parse_snapshot_list(&String::from_utf8_lossy(&raw))
            .into_iter()
            .find(|row| row.name == full_name)
            .map(|row| snapshot_from_row(row, dataset)))
    }

    pub async fn destroy_snapshot(&self, name: &str) -> Result<()> {
        validate_snapshot_id(name)?;
        self.zfs("destroy snapshot", name, argv(&["destroy", name]))
            .await
            .map_err(|e| not_found("snapshot", name, e))?;
        info!("Destroyed snapshot {}", name);
        Ok(())
    }

    /// Roll the parent dataset back to `name`
    pub async fn rollback_snapshot(&self, name: &str) -> Result<()> {
        validate_snapshot_id(name)?;
        self.zfs("rollback snapshot", name, argv(&["rollback", name]))
            .await
            .map_err(|e| not_found("snapshot", name, e))?;
        info!("Rolled back to snapshot {}", name);
        Ok(())
    }

    pub async fn clone_snapshot(&self, source: &str, target: &str) -> Result<()> {
        validate_snapshot_id(source)?;
        validate_dataset_name(target)?;
        self.zfs("clone snapshot", source, argv(&["clone", source, target]))
            .await
            .map_err(|e| not_found("snapshot", source, e))?;
        info!("Cloned snapshot {} to {}", source, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{HealthState, QuotaMode, RiskLevel, SnapshotSource, UseCaseTemplate, VDevType};
    use crate::executor::FakeExecutor;
    use crate::parser::status_json::fixtures as json_fixtures;
    use crate::parser::status_text::fixtures as text_fixtures;
    use assert_matches::assert_matches;
    use std::collections::HashSet;

    const TANK_ROW: &str = "tank\t1234567890\t1099511627776\t524288000000\t575223627776\t5\tONLINE\t-\n";

    fn setup(mode: StatusMode) -> (Arc<FakeExecutor>, PoolManager) {
        let fake = FakeExecutor::new();
        let config = ManagerConfig {
            status_mode: mode,
            ..Default::default()
        };
        (fake.clone(), PoolManager::new(config, fake))
    }

    fn args_of(fake: &FakeExecutor, program: &str, subcommand: &str) -> Vec<Vec<String>> {
        fake.commands()
            .into_iter()
            .filter(|c| c.program == program && c.subcommand() == Some(subcommand))
            .map(|c| c.args)
            .collect()
    }

    #[tokio::test]
    async fn test_list_pools_json() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output("zpool", "list", TANK_ROW);
        fake.set_output("zpool", "status", json_fixtures::HEALTHY_MIRROR);

        let pools = manager.list_pools().await.unwrap();
        assert_eq!(pools.len(), 1);

        let tank = &pools[0];
        assert_eq!(tank.name, "tank");
        assert_eq!(tank.free, 1_099_511_627_776 - 524_288_000_000);
        assert_eq!(tank.health, HealthState::Online);
        assert_eq!(tank.redundancy, 1);
        assert_eq!(tank.disk_count, 2);

        assert_eq!(
            args_of(&fake, "zpool", "list"),
            vec![argv(&["list", "-H", "-p", "-o", "name,guid,size,alloc,free,frag,health,altroot"])]
        );
        assert_eq!(args_of(&fake, "zpool", "status"), vec![argv(&["status", "-p", "-j"])]);
    }

    #[tokio::test]
    async fn test_list_pools_survives_status_failure() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output("zpool", "list", TANK_ROW);
        fake.set_failure("zpool", "status", 2, "internal error");

        let pools = manager.list_pools().await.unwrap();
        assert_eq!(pools.len(), 1);
        assert!(pools[0].vdevs.is_empty());
        assert_eq!(pools[0].health, HealthState::Online);
    }

    #[tokio::test]
    async fn test_list_pools_rejects_truncated_status() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output("zpool", "list", TANK_ROW);
        fake.set_output("zpool", "status", r#"{"pools": {"tank": "#);

        let err = manager.list_pools().await.unwrap_err();
        assert_matches!(err, Error::Json(_));
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[tokio::test]
    async fn test_get_pool_text_mode() {
        let (fake, manager) = setup(StatusMode::Text);
        fake.set_output("zpool", "list", TANK_ROW);
        fake.set_output("zpool", "status", text_fixtures::RESILVERING);

        let pool = manager.get_pool("tank").await.unwrap();
        assert_eq!(pool.health, HealthState::Degraded);
        assert_eq!(pool.vdevs.len(), 1);
        assert_eq!(pool.disk_count, 3);
        assert!(pool.resilver.as_ref().unwrap().in_progress);

        assert_eq!(args_of(&fake, "zpool", "status"), vec![argv(&["status", "tank"])]);
    }

    #[tokio::test]
    async fn test_auto_mode_asks_version_once() {
        let (fake, manager) = setup(StatusMode::Auto);
        fake.set_output("zpool", "version", "zfs-2.3.0-1\nzfs-kmod-2.3.0-1\n");
        fake.set_output("zpool", "status", json_fixtures::RESILVERING_MIRROR);

        let status = manager.get_resilver_status("tank").await.unwrap();
        assert!(status.in_progress);
        assert!((status.percent_done - 48.83).abs() < 1.0);

        manager.get_scrub_status("tank").await.unwrap();
        assert_eq!(args_of(&fake, "zpool", "version").len(), 1);
        assert_eq!(manager.status_mode().await, StatusMode::Json);
    }

    #[tokio::test]
    async fn test_auto_mode_falls_back_to_text() {
        let (fake, manager) = setup(StatusMode::Auto);
        fake.set_failure("zpool", "version", 2, "unrecognized command 'version'");

        assert_eq!(manager.status_mode().await, StatusMode::Text);
    }

    #[tokio::test]
    async fn test_failed_version_query_is_retried() {
        let (fake, manager) = setup(StatusMode::Auto);
        fake.set_timeout("zpool", "version");
        assert_eq!(manager.status_mode().await, StatusMode::Text);

        fake.set_output("zpool", "version", "zfs-2.3.0-1\nzfs-kmod-2.3.0-1\n");
        assert_eq!(manager.status_mode().await, StatusMode::Json);
        assert_eq!(manager.status_mode().await, StatusMode::Json);

        assert_eq!(args_of(&fake, "zpool", "version").len(), 2);
    }

    #[tokio::test]
    async fn test_get_pool_not_found() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_failure("zpool", "list", 1, "cannot open 'nope': no such pool\n");
        fake.set_failure("zpool", "status", 1, "cannot open 'nope': no such pool\n");

        assert_matches!(
            manager.get_pool("nope").await,
            Err(Error::NotFound { ref kind, ref name }) if kind == "pool" && name == "nope"
        );
    }

    #[tokio::test]
    async fn test_pool_vdevs_and_health() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output("zpool", "list", TANK_ROW);
        fake.set_output("zpool", "status", json_fixtures::DEGRADED_RAIDZ);

        let vdevs = manager.get_pool_vdevs("tank").await.unwrap();
        assert_eq!(vdevs.len(), 1);
        assert_eq!(vdevs[0].vdev_type, VDevType::Raidz);

        let names: HashSet<&str> = vdevs[0].disks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["sda", "sdb", "sdc", "sdd"]));

        let health = manager.get_pool_health("tank").await.unwrap();
        assert_eq!(health.health, HealthState::Degraded);
        assert_eq!(health.can_lose_more, 0);
        assert_eq!(health.level, RiskLevel::Critical);
    }

    #[tokio::test]
    async fn test_create_pool_commands() {
        let (fake, manager) = setup(StatusMode::Json);

        let mirror = CreatePoolRequest {
            name: "tank".into(),
            devices: vec!["/dev/sda".into(), "/dev/sdb".into()],
            raid_type: "mirror".into(),
        };
        manager.create_pool(&mirror).await.unwrap();

        let stripe = CreatePoolRequest {
            name: "scratch".into(),
            devices: vec!["/dev/sdc".into()],
            raid_type: String::new(),
        };
        manager.create_pool(&stripe).await.unwrap();

        assert_eq!(
            args_of(&fake, "zpool", "create"),
            vec![
                argv(&["create", "-f", "tank", "mirror", "/dev/sda", "/dev/sdb"]),
                argv(&["create", "-f", "scratch", "/dev/sdc"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_pool_request_runs_nothing() {
        let (fake, manager) = setup(StatusMode::Json);

        let req = CreatePoolRequest {
            name: "tank".into(),
            devices: vec!["/dev/sda".into(), "/dev/sdb".into()],
            raid_type: "raidz2".into(),
        };
        assert_matches!(manager.create_pool(&req).await, Err(Error::Validation(_)));
        assert_matches!(manager.destroy_pool("").await, Err(Error::Validation(_)));
        assert_matches!(
            manager.replace_disk("tank", "/dev/sda", "/dev/sda").await,
            Err(Error::Validation(_))
        );
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_execution_error_is_not_retried() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_failure("zpool", "destroy", 1, "cannot destroy 'tank': pool is busy");

        let err = manager.destroy_pool("tank").await.unwrap_err();
        assert_matches!(
            err,
            Error::Execution { ref operation, ref target, .. } if operation == "destroy pool" && target == "tank"
        );
        assert!(err.to_string().contains("pool is busy"));
        assert_eq!(fake.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_scrub_and_replace_commands() {
        let (fake, manager) = setup(StatusMode::Json);

        manager.scrub("tank").await.unwrap();
        manager.scrub_control("tank", ScrubAction::Pause).await.unwrap();
        manager.scrub_control("tank", ScrubAction::Stop).await.unwrap();
        manager.replace_disk("tank", "/dev/sdb", "/dev/sdc").await.unwrap();

        assert_eq!(
            args_of(&fake, "zpool", "scrub"),
            vec![
                argv(&["scrub", "tank"]),
                argv(&["scrub", "-p", "tank"]),
                argv(&["scrub", "-s", "tank"]),
            ]
        );
        assert_eq!(
            args_of(&fake, "zpool", "replace"),
            vec![argv(&["replace", "-f", "tank", "/dev/sdb", "/dev/sdc"])]
        );
    }

    #[tokio::test]
    async fn test_volume_without_size_is_rejected() {
        let (fake, manager) = setup(StatusMode::Json);
        let req = CreateDatasetRequest {
            name: "tank/vm1".into(),
            dataset_type: DatasetType::Volume,
            quota: 0,
            ..Default::default()
        };

        let err = manager.create_dataset(&req).await.unwrap_err();
        assert_matches!(err, Error::Validation(_));
        assert!(err.to_string().contains("quota (size) is required for volumes"));
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_create_volume_from_template() {
        let (fake, manager) = setup(StatusMode::Json);
        let req = CreateDatasetRequest {
            name: "tank/vm1".into(),
            dataset_type: DatasetType::Volume,
            use_case: Some(UseCaseTemplate::Vm),
            quota: 10 << 30,
            quota_mode: QuotaMode::Fixed,
            ..Default::default()
        };

        manager.create_dataset(&req).await.unwrap();
        assert_eq!(
            args_of(&fake, "zfs", "create"),
            vec![argv(&[
                "create",
                "-V",
                "10G",
                "-o",
                "compression=lz4",
                "-o",
                "volblocksize=64K",
                "tank/vm1",
            ])]
        );
    }

    #[tokio::test]
    async fn test_create_filesystem_with_fixed_quota() {
        let (fake, manager) = setup(StatusMode::Json);
        let mut req = CreateDatasetRequest {
            name: "tank/media".into(),
            use_case: Some(UseCaseTemplate::General),
            quota: 1 << 30,
            quota_mode: QuotaMode::Fixed,
            ..Default::default()
        };
        req.properties.insert("compression".into(), "zstd".into());

        manager.create_dataset(&req).await.unwrap();
        assert_eq!(
            args_of(&fake, "zfs", "create"),
            vec![argv(&[
                "create",
                "-o",
                "compression=zstd",
                "-o",
                "quota=1073741824",
                "-o",
                "reservation=1073741824",
                "tank/media",
            ])]
        );
    }

    #[tokio::test]
    async fn test_dataset_operations() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output(
            "zfs",
            "list",
            "tank/media\tfilesystem\t100\t900\t100\t/tank/media\tlz4\toff\toff\t1073741824\t0\n",
        );

        let datasets = manager.list_datasets().await.unwrap();
        assert_eq!(datasets.len(), 1);

        let media = manager.get_dataset("tank/media").await.unwrap();
        assert_eq!(media.quota, Some(1 << 30));
        assert_matches!(
            manager.get_dataset("tank/other").await,
            Err(Error::NotFound { .. })
        );

        manager.set_property("tank/media", "atime", "off").await.unwrap();
        manager.destroy_dataset("tank/media").await.unwrap();
        assert_matches!(
            manager.destroy_dataset("tank/media@snap").await,
            Err(Error::Validation(_))
        );

        assert_eq!(args_of(&fake, "zfs", "set"), vec![argv(&["set", "atime=off", "tank/media"])]);
        assert_eq!(
            args_of(&fake, "zfs", "destroy"),
            vec![argv(&["destroy", "-r", "tank/media"])]
        );
    }

    #[tokio::test]
    async fn test_missing_dataset_maps_to_not_found() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_failure(
            "zfs",
            "set",
            1,
            "cannot open 'tank/nope': dataset does not exist",
        );

        assert_matches!(
            manager.set_property("tank/nope", "atime", "off").await,
            Err(Error::NotFound { ref kind, .. }) if kind == "dataset"
        );
    }

    #[tokio::test]
    async fn test_list_snapshots_sorted_with_sources() {
        let (fake, manager) = setup(StatusMode::Json);
        fake.set_output(
            "zfs",
            "list",
            "tank/data@auto-daily-20241214-120000\t4096\t98304\t1734177600\n\
             tank/data@before-upgrade\t0\t98304\t1734091200\n",
        );

        let snapshots = manager.list_snapshots("tank/data").await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name, "tank/data@before-upgrade");
        assert_eq!(snapshots[0].source, SnapshotSource::Manual);
        assert_eq!(snapshots[1].source, SnapshotSource::Policy("daily".into()));
        assert_eq!(snapshots[1].dataset, "tank/data");

        assert_eq!(
            args_of(&fake, "zfs", "list"),
            vec![argv(&[
                "list",
                "-H",
                "-p",
                "-t",
                "snapshot",
                "-o",
                "name,used,referenced,creation",
                "-d",
                "1",
                "tank/data",
            ])]
        );
    }

    #[tokio::test]
    async fn test_create_snapshot() {
        let (fake, manager) = setup(StatusMode::Json);
        let req = CreateSnapshotRequest {
            dataset: "tank/data".into(),
            name: "@auto-hourly-20241213-120000".into(),
            recursive: true,
        };

        let snapshot = manager.create_snapshot(&req).await.unwrap();
        assert_eq!(snapshot.name, "tank/data@auto-hourly-20241213-120000");
        assert_eq!(snapshot.source, SnapshotSource::Policy("hourly".into()));
        assert!(snapshot.created_at.is_some());

        assert_eq!(
            args_of(&fake, "zfs", "snapshot"),
            vec![argv(&["snapshot", "-r", "tank/data@auto-hourly-20241213-120000"])]
        );
    }

    #[tokio::test]
    async fn test_snapshot_identifiers_need_at_sign() {
        let (fake, manager) = setup(StatusMode::Json);

        assert_matches!(manager.destroy_snapshot("tank/data").await, Err(Error::Validation(_)));
        assert_matches!(manager.rollback_snapshot("").await, Err(Error::Validation(_)));
        assert_matches!(
            manager.clone_snapshot("tank/data", "tank/clone").await,
            Err(Error::Validation(_))
        );
        assert_matches!(
            manager
                .create_snapshot(&CreateSnapshotRequest {
                    dataset: "tank/data".into(),
                    name: "@".into(),
                    recursive: false,
                })
                .await,
            Err(Error::Validation(_))
        );
        assert!(fake.commands().is_empty());

        manager.destroy_snapshot("tank/data@old").await.unwrap();
        manager.rollback_snapshot("tank/data@good").await.unwrap();
        manager.clone_snapshot("tank/data@good", "tank/restored").await.unwrap();

        let commands: Vec<Vec<String>> = fake.commands().into_iter().map(|c| c.args).collect();
        assert_eq!(
            commands,
            vec![
                argv(&["destroy", "tank/data@old"]),
                argv(&["rollback", "tank/data@good"]),
                argv(&["clone", "tank/data@good", "tank/restored"]),
            ]
        );
    }
}
