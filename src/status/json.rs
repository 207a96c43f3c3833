//! JSON status strategy (`zpool status -p -j`)

use crate::config::StatusMode;
use crate::domain::model::{HealthState, ScanFunction};
use crate::domain::ports::{PoolStatusReport, StatusParser};
use crate::error::Result;
use crate::parser::size::parse_u64_lenient;
use crate::parser::status_json::{parse_status_document, PoolStatusJson};
use crate::scan;
use crate::topology::VdevTree;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStatusParser;

impl JsonStatusParser {
    fn report(name: &str, pool: &PoolStatusJson, now: i64) -> PoolStatusReport {
        let stats = pool.scan_stats.as_ref();
        let name = if pool.name.is_empty() { name } else { pool.name.as_str() };
        let error_count = parse_u64_lenient(&pool.error_count);

        PoolStatusReport {
            name: name.to_string(),
            state: HealthState::parse(&pool.state),
            guid: (!pool.pool_guid.is_empty()).then(|| pool.pool_guid.clone()),
            vdevs: VdevTree::forest(pool.top_level_vdevs()),
            scrub: scan::json::extract(stats, ScanFunction::Scrub, now),
            resilver: scan::json::extract(stats, ScanFunction::Resilver, now),
            errors: (!pool.error_count.is_empty()).then(|| match error_count {
                0 => "No known data errors".to_string(),
                n => format!("{} data errors", n),
            }),
        }
    }
}

impl StatusParser for JsonStatusParser {
    fn mode(&self) -> StatusMode {
        StatusMode::Json
    }

    fn status_args(&self, pool: Option<&str>) -> Vec<String> {
        let mut args = vec!["status".to_string(), "-p".to_string(), "-j".to_string()];
        args.extend(pool.map(str::to_string));
        args
    }

    fn parse(&self, raw: &[u8], now: i64) -> Result<Vec<PoolStatusReport>> {
        let document = parse_status_document(raw)?;
        Ok(document
            .pools
            .iter()
            .map(|(name, pool)| Self::report(name, pool, now))
            .collect())
    }
}
