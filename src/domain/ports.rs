//! Domain Ports - Trait definitions at the external boundaries
//!
//! The storage tool is the only external system this crate talks to. It is
//! reached through [`CommandExecutor`], and its status output is decoded by a
//! [`StatusParser`] strategy chosen at runtime.

use crate::config::StatusMode;
use crate::domain::model::{HealthState, ScanStatus};
use crate::error::{ExecutionError, Result};
use crate::topology::VdevTree;
use async_trait::async_trait;

// =============================================================================
// Command Execution
// =============================================================================

/// Runs the storage CLI tools
///
/// Each call is independent and blocking from the caller's point of view.
/// Implementations must not retry.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` and return its stdout on a zero exit status
    async fn output(
        &self,
        program: &str,
        args: &[String],
    ) -> std::result::Result<Vec<u8>, ExecutionError>;
}

// =============================================================================
// Status Decoding
// =============================================================================

/// Mode-independent view of one pool in `zpool status` output
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStatusReport {
    pub name: String,
    pub state: HealthState,
    pub guid: Option<String>,
    /// Direct children of the root vdev
    pub vdevs: Vec<VdevTree>,
    pub scrub: ScanStatus,
    pub resilver: ScanStatus,
    /// The `errors:` summary line, when present
    pub errors: Option<String>,
}

/// Decodes `zpool status` output in one particular encoding
pub trait StatusParser: Send + Sync {
    /// The encoding this parser handles
    fn mode(&self) -> StatusMode;

    /// Arguments for `zpool`; `None` asks for every imported pool
    fn status_args(&self, pool: Option<&str>) -> Vec<String>;

    /// Decode raw tool output. `now` is the current Unix time, used for rates.
    fn parse(&self, raw: &[u8], now: i64) -> Result<Vec<PoolStatusReport>>;
}
