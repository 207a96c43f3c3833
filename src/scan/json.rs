//! Scan status from the JSON `scan_stats` block

use super::display_time;
use crate::domain::model::{ScanFunction, ScanState, ScanStatus};
use crate::parser::size::parse_u64_lenient;
use crate::parser::status_json::ScanStatsJson;

/// Extract the status of `function` from a pool's `scan_stats`
///
/// The tool reports only the most recent scan. When that was a different
/// kind of scan (or there was none), `function` is reported idle. `now` is
/// the current Unix time and feeds the rate and remaining-time estimate.
pub fn extract(stats: Option<&ScanStatsJson>, function: ScanFunction, now: i64) -> ScanStatus {
    let Some(stats) = stats else {
        return ScanStatus::idle(function);
    };
    if ScanFunction::parse(&stats.function) != Some(function) {
        return ScanStatus::idle(function);
    }

    let state = ScanState::parse(&stats.state);
    let examined = parse_u64_lenient(&stats.examined);
    let to_examine = parse_u64_lenient(&stats.to_examine);
    let issued = parse_u64_lenient(&stats.issued);
    let in_progress = state == ScanState::Scanning;

    let percent_done = if to_examine == 0 {
        0.0
    } else {
        examined as f64 / to_examine as f64 * 100.0
    };

    let mut rate = 0;
    let mut seconds_remaining = None;
    if in_progress {
        let progressed = if issued > 0 { issued } else { examined };
        let pass_start: i64 = stats.pass_start.trim().parse().unwrap_or(0);
        let elapsed = now - pass_start;
        if pass_start > 0 && elapsed > 0 {
            rate = progressed / elapsed as u64;
        }
        if rate > 0 {
            seconds_remaining = Some(to_examine.saturating_sub(progressed) / rate);
        }
    }

    let end_time = match state {
        ScanState::Finished | ScanState::Canceled => display_time(&stats.end_time),
        _ => None,
    };

    ScanStatus {
        function,
        state,
        in_progress,
        examined_bytes: examined,
        to_examine_bytes: to_examine,
        issued_bytes: issued,
        rate_bytes_per_sec: rate,
        percent_done,
        errors: parse_u64_lenient(&stats.errors),
        start_time: display_time(&stats.start_time),
        end_time,
        seconds_remaining,
    }
}
