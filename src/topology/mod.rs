//! Topology - vdev tree resolution and derived health metrics
//!
//! ```text
//! VdevNode (raw, JSON or text) ──► VdevTree ──► Vec<VDevGroup> ──► redundancy / risk
//! ```
//!
//! [`assemble_pool`] joins a capacity row from `zpool list` with the status
//! report for the same pool into the normalized [`Pool`].

pub mod builder;
pub mod health;
pub mod tree;

pub use builder::{build_group, flatten};
pub use health::{assess_risk, group_tolerance, pool_redundancy, reconcile_health};
pub use tree::{VdevInfo, VdevTree};

use crate::domain::model::{Pool, ScanState, ScanStatus};
use crate::domain::ports::PoolStatusReport;
use crate::parser::tabular::PoolListRow;

fn reported_scan(scan: &ScanStatus) -> Option<ScanStatus> {
    (scan.state != ScanState::None || scan.in_progress).then(|| scan.clone())
}

/// Build a [`Pool`] from its list row and, when available, its status report
///
/// Without a report the pool carries capacity data only: no groups, zero
/// redundancy and the health from the listing.
pub fn assemble_pool(row: &PoolListRow, report: Option<&PoolStatusReport>) -> Pool {
    let vdevs = report.map(|r| flatten(&r.vdevs)).unwrap_or_default();
    let reported = report.map(|r| r.state).unwrap_or(row.health);
    let guid = match (row.guid.is_empty(), report.and_then(|r| r.guid.clone())) {
        (true, Some(guid)) => guid,
        _ => row.guid.clone(),
    };

    Pool {
        name: row.name.clone(),
        guid,
        size: row.size,
        allocated: row.allocated,
        free: row.size.saturating_sub(row.allocated),
        fragmentation: row.fragmentation,
        health: reconcile_health(reported, &vdevs),
        altroot: row.altroot.clone(),
        disk_count: vdevs.iter().map(|g| g.disks.len()).sum(),
        redundancy: pool_redundancy(&vdevs),
        scrub: report.and_then(|r| reported_scan(&r.scrub)),
        resilver: report.and_then(|r| reported_scan(&r.resilver)),
        vdevs,
    }
}
