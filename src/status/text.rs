//! Text status strategy (plain `zpool status`)
//!
//! Used with tool releases that predate JSON output.

use crate::config::StatusMode;
use crate::domain::model::{HealthState, ScanFunction};
use crate::domain::ports::{PoolStatusReport, StatusParser};
use crate::error::{Error, Result};
use crate::parser::status_text::{parse_status_text, TextPoolStatus};
use crate::scan;
use crate::topology::VdevTree;

/// What `zpool status` prints when nothing is imported
const NO_POOLS: &str = "no pools available";

#[derive(Debug, Clone, Copy, Default)]
pub struct TextStatusParser;

fn report(pool: TextPoolStatus) -> PoolStatusReport {
    let vdevs = pool
        .root
        .as_ref()
        .map(|root| VdevTree::forest(root.vdevs.values()))
        .unwrap_or_default();

    PoolStatusReport {
        state: HealthState::parse(&pool.state),
        guid: None,
        vdevs,
        scrub: scan::text::extract(&pool.scan, ScanFunction::Scrub),
        resilver: scan::text::extract(&pool.scan, ScanFunction::Resilver),
        errors: pool.errors,
        name: pool.name,
    }
}

impl StatusParser for TextStatusParser {
    fn mode(&self) -> StatusMode {
        StatusMode::Text
    }

    fn status_args(&self, pool: Option<&str>) -> Vec<String> {
        let mut args = vec!["status".to_string()];
        args.extend(pool.map(str::to_string));
        args
    }

    fn parse(&self, raw: &[u8], _now: i64) -> Result<Vec<PoolStatusReport>> {
        let text = String::from_utf8_lossy(raw);
        let pools = parse_status_text(&text);

        let trimmed = text.trim();
        if pools.is_empty() && !trimmed.is_empty() && trimmed != NO_POOLS {
            let first = trimmed.lines().next().unwrap_or_default();
            return Err(Error::Parse(format!(
                "zpool status output has no pool section: {:?}",
                first
            )));
        }

        Ok(pools.into_iter().map(report).collect())
    }
}
