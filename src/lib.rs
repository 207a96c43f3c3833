//! zpool-control - ZFS Pool Control Plane
//!
//! Turns the text and JSON output of `zpool`/`zfs` into a normalized pool
//! model with topology, health, redundancy and scan progress, and exposes
//! the lifecycle operations (pools, datasets, snapshots) behind one API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         PoolManager (lifecycle)                      │
//! │        validation · templates · snapshot naming · NotFound mapping   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌────────────────┐   ┌─────────────────────┐  │
//! │  │  StatusParser  │   │    Topology    │   │    Scan Tracker     │  │
//! │  │  JSON │ Text   │──►│ tree ► groups  │   │  scrub / resilver   │  │
//! │  └───────┬────────┘   │ ► redundancy   │   └──────────┬──────────┘  │
//! │          │            └────────────────┘              │             │
//! │  ┌───────┴──────────────────────────────────────────────┴─────────┐  │
//! │  │          Parsers (tab rows, status document, status text)      │  │
//! │  └───────────────────────────────┬────────────────────────────────┘  │
//! ├──────────────────────────────────┼──────────────────────────────────┤
//! │                     CommandExecutor (Host │ Fake)                   │
//! └──────────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`lifecycle`]: the [`PoolManager`] API, input validation, templates
//! - [`status`]: status decoding strategies and mode selection
//! - [`topology`]: vdev trees, flattening, health and risk
//! - [`scan`]: scrub and resilver progress extraction
//! - [`parser`]: pure parsers over captured tool output
//! - [`executor`]: process execution and the test double
//! - [`domain`]: data model and ports
//! - [`config`]: manager configuration
//! - [`error`]: error types and handling

pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod parser;
pub mod scan;
pub mod status;
pub mod topology;

// Re-export commonly used types
pub use config::{ManagerConfig, StatusMode};

pub use domain::model::{
    CreateDatasetRequest, CreatePoolRequest, CreateSnapshotRequest, Dataset, DatasetType, Disk,
    HealthState, Pool, QuotaMode, RiskAssessment, RiskLevel, ScanFunction, ScanState, ScanStatus,
    ScrubAction, Snapshot, SnapshotSource, UseCaseTemplate, VDevGroup, VDevType,
};
pub use domain::ports::{CommandExecutor, PoolStatusReport, StatusParser};

pub use error::{Error, ErrorCategory, ExecutionError, Result};

pub use executor::{FakeExecutor, HostExecutor};

pub use lifecycle::PoolManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
