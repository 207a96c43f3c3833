//! Domain Model - Normalized pool, vdev, dataset and snapshot types
//!
//! These types are rebuilt from tool output on every query and never
//! persisted. They are flat on purpose: the nested vdev layout reported by
//! the storage tool is resolved by the topology builder before it gets here.

use chrono::{DateTime, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

// =============================================================================
// Health
// =============================================================================

/// Health state of a pool, vdev or disk as reported by the storage tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Online,
    Degraded,
    Faulted,
    Offline,
    Unavail,
    Removed,
    /// Anything the tool reported that we do not recognize
    Unknown,
}

impl HealthState {
    /// Parse a tool health string, never failing
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONLINE" => HealthState::Online,
            "DEGRADED" => HealthState::Degraded,
            "FAULTED" => HealthState::Faulted,
            "OFFLINE" => HealthState::Offline,
            "UNAVAIL" | "UNAVAILABLE" => HealthState::Unavail,
            "REMOVED" => HealthState::Removed,
            "" => HealthState::Unknown,
            other => {
                warn!("Unknown health state {:?}", other);
                HealthState::Unknown
            }
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, HealthState::Online)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        HealthState::Unknown
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Online => write!(f, "ONLINE"),
            HealthState::Degraded => write!(f, "DEGRADED"),
            HealthState::Faulted => write!(f, "FAULTED"),
            HealthState::Offline => write!(f, "OFFLINE"),
            HealthState::Unavail => write!(f, "UNAVAIL"),
            HealthState::Removed => write!(f, "REMOVED"),
            HealthState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// Topology
// =============================================================================

/// Redundancy layout of a vdev group
///
/// Vendor spellings are normalized on the way in: `raidz1` becomes
/// [`VDevType::Raidz`] and a bare `disk` becomes [`VDevType::Stripe`].
/// Layouts without special handling are kept verbatim in [`VDevType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VDevType {
    Mirror,
    Raidz,
    Raidz2,
    Raidz3,
    Stripe,
    Other(String),
}

impl VDevType {
    pub fn normalize(raw: &str) -> Self {
        match raw.trim() {
            "mirror" => VDevType::Mirror,
            "raidz" | "raidz1" => VDevType::Raidz,
            "raidz2" => VDevType::Raidz2,
            "raidz3" => VDevType::Raidz3,
            "disk" | "stripe" | "" => VDevType::Stripe,
            other => VDevType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VDevType::Mirror => "mirror",
            VDevType::Raidz => "raidz",
            VDevType::Raidz2 => "raidz2",
            VDevType::Raidz3 => "raidz3",
            VDevType::Stripe => "stripe",
            VDevType::Other(s) => s,
        }
    }

    /// Number of parity disks for RAIDZ layouts
    pub fn parity(&self) -> Option<u32> {
        match self {
            VDevType::Raidz => Some(1),
            VDevType::Raidz2 => Some(2),
            VDevType::Raidz3 => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for VDevType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VDevType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VDevType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(VDevType::normalize(&s))
    }
}

impl JsonSchema for VDevType {
    fn schema_name() -> String {
        "VDevType".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// A physical disk inside a vdev group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Disk {
    /// Device name as the tool reports it (e.g. `sda`)
    pub name: String,
    /// Device path (e.g. `/dev/sda`), when the tool reports one
    pub path: Option<String>,
    pub state: HealthState,
    /// Physical enclosure slot, when known
    pub slot: Option<String>,
    pub read_errors: u64,
    pub write_errors: u64,
    pub checksum_errors: u64,
    /// True for the incoming disk of an in-progress replacement
    pub replacing: bool,
}

/// One redundancy unit of a pool: a mirror, a RAIDZ group or a single disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VDevGroup {
    /// Group name (e.g. `mirror-0`, or the disk name for a single-disk stripe)
    pub name: String,
    #[serde(rename = "type")]
    pub vdev_type: VDevType,
    pub state: HealthState,
    pub disks: Vec<Disk>,
}

impl VDevGroup {
    pub fn online_disks(&self) -> usize {
        self.disks.iter().filter(|d| d.state.is_online()).count()
    }

    pub fn unhealthy_disks(&self) -> usize {
        self.disks.len() - self.online_disks()
    }
}

// =============================================================================
// Scan (scrub / resilver)
// =============================================================================

/// Kind of background scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanFunction {
    Scrub,
    Resilver,
}

impl ScanFunction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scrub" => Some(ScanFunction::Scrub),
            "resilver" => Some(ScanFunction::Resilver),
            _ => None,
        }
    }
}

impl fmt::Display for ScanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanFunction::Scrub => write!(f, "scrub"),
            ScanFunction::Resilver => write!(f, "resilver"),
        }
    }
}

/// Lifecycle state of the most recent scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanState {
    None,
    Scanning,
    Finished,
    Canceled,
}

impl ScanState {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCANNING" => ScanState::Scanning,
            "FINISHED" => ScanState::Finished,
            "CANCELED" | "CANCELLED" => ScanState::Canceled,
            _ => ScanState::None,
        }
    }
}

/// Progress of a scrub or resilver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanStatus {
    pub function: ScanFunction,
    pub state: ScanState,
    pub in_progress: bool,
    pub examined_bytes: u64,
    pub to_examine_bytes: u64,
    pub issued_bytes: u64,
    pub rate_bytes_per_sec: u64,
    pub percent_done: f64,
    pub errors: u64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub seconds_remaining: Option<u64>,
}

impl ScanStatus {
    /// A scan of `function` that is not running and has no data
    pub fn idle(function: ScanFunction) -> Self {
        Self {
            function,
            state: ScanState::None,
            in_progress: false,
            examined_bytes: 0,
            to_examine_bytes: 0,
            issued_bytes: 0,
            rate_bytes_per_sec: 0,
            percent_done: 0.0,
            errors: 0,
            start_time: None,
            end_time: None,
            seconds_remaining: None,
        }
    }
}

// =============================================================================
// Pool
// =============================================================================

/// A storage pool with its derived topology and health data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pool {
    pub name: String,
    pub guid: String,
    pub size: u64,
    pub allocated: u64,
    pub free: u64,
    /// Fragmentation percentage
    pub fragmentation: u64,
    pub health: HealthState,
    pub altroot: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vdevs: Vec<VDevGroup>,
    pub disk_count: usize,
    /// Additional disk failures the pool can survive without data loss
    pub redundancy: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrub: Option<ScanStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilver: Option<ScanStatus>,
}

impl Pool {
    pub fn use_percent(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.allocated as f64 / self.size as f64 * 100.0
    }
}

/// Operator-facing risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Risk assessment of a pool, for UI messaging only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RiskAssessment {
    pub health: HealthState,
    pub can_lose_more: u32,
    pub level: RiskLevel,
    pub description: String,
    pub recommendation: String,
}

// =============================================================================
// Datasets
// =============================================================================

/// Kind of dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    Filesystem,
    Volume,
    Snapshot,
}

impl DatasetType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "filesystem" => Some(DatasetType::Filesystem),
            "volume" => Some(DatasetType::Volume),
            "snapshot" => Some(DatasetType::Snapshot),
            _ => None,
        }
    }
}

impl Default for DatasetType {
    fn default() -> Self {
        DatasetType::Filesystem
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetType::Filesystem => write!(f, "filesystem"),
            DatasetType::Volume => write!(f, "volume"),
            DatasetType::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// A filesystem or volume carved from a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Dataset {
    /// Full name (`pool/path`)
    pub name: String,
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    /// Pool the dataset lives on
    pub pool: String,
    pub used: u64,
    pub available: u64,
    pub referenced: u64,
    pub mountpoint: Option<String>,
    pub compression: String,
    pub encryption: String,
    pub deduplication: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<u64>,
}

/// Named bundle of default tunables for a workload class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UseCaseTemplate {
    General,
    Media,
    Surveillance,
    Vm,
    Database,
}

impl std::str::FromStr for UseCaseTemplate {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(UseCaseTemplate::General),
            "media" => Ok(UseCaseTemplate::Media),
            "surveillance" => Ok(UseCaseTemplate::Surveillance),
            "vm" => Ok(UseCaseTemplate::Vm),
            "database" => Ok(UseCaseTemplate::Database),
            other => Err(crate::error::Error::validation(format!(
                "unknown use case template: {}",
                other
            ))),
        }
    }
}

/// How a dataset quota is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuotaMode {
    /// Quota and reservation are both set: the space is guaranteed and capped
    Fixed,
    /// Only the quota is set: the space is capped but not reserved
    Flexible,
}

impl Default for QuotaMode {
    fn default() -> Self {
        QuotaMode::Flexible
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Where a snapshot came from, derived from its label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotSource {
    Manual,
    /// Created by the named snapshot policy
    Policy(String),
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSource::Manual => write!(f, "manual"),
            SnapshotSource::Policy(name) => write!(f, "policy:{}", name),
        }
    }
}

impl Serialize for SnapshotSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.strip_prefix("policy:") {
            Some(name) => SnapshotSource::Policy(name.to_string()),
            None => SnapshotSource::Manual,
        })
    }
}

impl JsonSchema for SnapshotSource {
    fn schema_name() -> String {
        "SnapshotSource".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Point-in-time reference to a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    /// Full name (`dataset@label`)
    pub name: String,
    pub dataset: String,
    pub created_at: Option<DateTime<Utc>>,
    pub used: u64,
    pub referenced: u64,
    pub source: SnapshotSource,
}

// =============================================================================
// Requests
// =============================================================================

/// Request to create a pool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreatePoolRequest {
    pub name: String,
    /// Device paths (e.g. `/dev/sda`)
    pub devices: Vec<String>,
    /// `mirror`, `raidz`, `raidz2`, `raidz3`, or empty for a stripe
    #[serde(default, rename = "type")]
    pub raid_type: String,
}

/// Request to create a filesystem or volume
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateDatasetRequest {
    /// Full name (`pool/path`)
    pub name: String,
    #[serde(default, rename = "type")]
    pub dataset_type: DatasetType,
    #[serde(default)]
    pub use_case: Option<UseCaseTemplate>,
    /// Quota in bytes; for volumes this is the volume size
    #[serde(default)]
    pub quota: u64,
    #[serde(default)]
    pub quota_mode: QuotaMode,
    /// Caller properties, overriding template defaults
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Request to create a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateSnapshotRequest {
    /// Dataset to snapshot (`pool/path`)
    pub dataset: String,
    /// Snapshot label, without `@`
    pub name: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Scrub control actions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScrubAction {
    Start,
    Stop,
    Pause,
}
