//! Tab-separated listings (`-H -p` mode)
//!
//! One row per line, fields split on `\t` in a fixed column order. Rows with
//! fewer fields than expected are skipped rather than failing the listing.

use super::size::parse_u64_lenient;
use crate::domain::model::{Dataset, DatasetType, HealthState};
use tracing::warn;

/// Column list for `zpool list -H -p -o ...`
pub const POOL_LIST_COLUMNS: &str = "name,guid,size,alloc,free,frag,health,altroot";
/// Column list for `zfs list -H -p -o ...`
pub const DATASET_LIST_COLUMNS: &str =
    "name,type,used,avail,refer,mountpoint,compression,encryption,dedup";
/// Optional trailing columns requested for single-dataset lookups
pub const DATASET_QUOTA_COLUMNS: &str = "quota,reservation";
/// Column list for snapshot listings
pub const SNAPSHOT_LIST_COLUMNS: &str = "name,used,referenced,creation";

const POOL_FIELDS: usize = 8;
const DATASET_FIELDS: usize = 9;
const SNAPSHOT_FIELDS: usize = 4;

/// One row of `zpool list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolListRow {
    pub name: String,
    pub guid: String,
    pub size: u64,
    pub allocated: u64,
    pub free: u64,
    pub fragmentation: u64,
    pub health: HealthState,
    pub altroot: Option<String>,
}

/// One row of a snapshot listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotListRow {
    pub name: String,
    pub used: u64,
    pub referenced: u64,
    /// Creation time as Unix seconds
    pub creation: Option<i64>,
}

fn rows(text: &str, min_fields: usize) -> impl Iterator<Item = Vec<&str>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(move |line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < min_fields {
                warn!(
                    "Skipping row with {} of {} fields: {:?}",
                    fields.len(),
                    min_fields,
                    line
                );
                return None;
            }
            Some(fields)
        })
}

fn optional(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field == "-" {
        None
    } else {
        Some(field.to_string())
    }
}

/// Parse `zpool list -H -p -o name,guid,size,alloc,free,frag,health,altroot`
pub fn parse_pool_list(text: &str) -> Vec<PoolListRow> {
    rows(text, POOL_FIELDS)
        .map(|f| PoolListRow {
            name: f[0].to_string(),
            guid: f[1].to_string(),
            size: parse_u64_lenient(f[2]),
            allocated: parse_u64_lenient(f[3]),
            free: parse_u64_lenient(f[4]),
            fragmentation: parse_u64_lenient(f[5].trim_end_matches('%')),
            health: HealthState::parse(f[6]),
            altroot: optional(f[7]),
        })
        .collect()
}

/// Parse `zfs list -H -p -o name,type,used,avail,refer,mountpoint,compression,encryption,dedup`
///
/// When the optional `quota,reservation` columns follow, they are read too;
/// a zero value means "not set".
pub fn parse_dataset_list(text: &str) -> Vec<Dataset> {
    rows(text, DATASET_FIELDS)
        .filter_map(|f| {
            let dataset_type = match DatasetType::parse(f[1]) {
                Some(t) => t,
                None => {
                    warn!("Skipping dataset {} with unknown type {:?}", f[0], f[1]);
                    return None;
                }
            };
            let name = f[0].to_string();
            let pool = name.split(['/', '@']).next().unwrap_or_default().to_string();
            let nonzero = |idx: usize| {
                f.get(idx)
                    .map(|v| parse_u64_lenient(v))
                    .filter(|v| *v > 0)
            };

            Some(Dataset {
                pool,
                dataset_type,
                used: parse_u64_lenient(f[2]),
                available: parse_u64_lenient(f[3]),
                referenced: parse_u64_lenient(f[4]),
                mountpoint: optional(f[5]),
                compression: f[6].to_string(),
                encryption: f[7].to_string(),
                deduplication: f[8].trim().to_string(),
                quota: nonzero(9),
                reservation: nonzero(10),
                name,
            })
        })
        .collect()
}

/// Parse `zfs list -H -p -t snapshot -o name,used,referenced,creation`
pub fn parse_snapshot_list(text: &str) -> Vec<SnapshotListRow> {
    rows(text, SNAPSHOT_FIELDS)
        .map(|f| SnapshotListRow {
            name: f[0].to_string(),
            used: parse_u64_lenient(f[1]),
            referenced: parse_u64_lenient(f[2]),
            creation: f[3].trim().parse().ok(),
        })
        .collect()
}
