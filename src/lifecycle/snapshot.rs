//! Snapshot naming and listing helpers

use crate::domain::model::{Snapshot, SnapshotSource};
use crate::parser::tabular::SnapshotListRow;
use chrono::DateTime;

/// Label prefix used by automated snapshot policies
const POLICY_PREFIX: &str = "auto-";
/// Width of the `-YYYYMMDD-HHMMSS` suffix policies append
const TIMESTAMP_SUFFIX_LEN: usize = 16;

/// Classify a snapshot by its label: `auto-<policy>-YYYYMMDD-HHMMSS`
/// belongs to `<policy>`, anything else is manual
pub fn detect_snapshot_source(full_name: &str) -> SnapshotSource {
    let Some((_, label)) = full_name.split_once('@') else {
        return SnapshotSource::Manual;
    };
    let Some(rest) = label.strip_prefix(POLICY_PREFIX) else {
        return SnapshotSource::Manual;
    };

    let len = rest.chars().count();
    if len > TIMESTAMP_SUFFIX_LEN {
        let policy: String = rest.chars().take(len - TIMESTAMP_SUFFIX_LEN).collect();
        SnapshotSource::Policy(policy)
    } else {
        SnapshotSource::Policy("auto".to_string())
    }
}

/// Build a snapshot from a listing row
pub fn snapshot_from_row(row: SnapshotListRow, dataset: &str) -> Snapshot {
    Snapshot {
        source: detect_snapshot_source(&row.name),
        dataset: dataset.to_string(),
        created_at: row.creation.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        used: row.used,
        referenced: row.referenced,
        name: row.name,
    }
}

/// Oldest first; snapshots without a creation time sort first, ties by name
pub fn sort_snapshots(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}
