//! Scan status from the `scan:` block of plain `zpool status`
//!
//! The first line names the scan and its state; progress lines follow while
//! it runs. Formats seen across releases:
//!
//! ```text
//! resilver in progress since Fri Dec 13 12:00:00 2024
//!     500G scanned out of 1T at 100M/s, 1h30m to go
//!     48.83% done
//!
//! scrub in progress since Sun Dec  8 00:00:01 2024
//!     1.23T scanned at 500M/s, 1.00T issued at 400M/s, 2.50T total
//!     0B repaired, 40.00% done, 00:55:00 to go
//!
//! scrub repaired 0B in 00:00:01 with 0 errors on Sun Dec  8 00:24:02 2024
//! resilvered 1.2G in 00:03:12 with 0 errors on Mon Dec  9 10:00:00 2024
//! scrub canceled on Sun Dec  8 00:10:00 2024
//! ```

use crate::domain::model::{ScanFunction, ScanState, ScanStatus};
use crate::parser::size::{parse_duration, parse_size};

#[derive(Debug, Default)]
struct Header {
    function: Option<ScanFunction>,
    state: Option<ScanState>,
    start_time: Option<String>,
    end_time: Option<String>,
    errors: u64,
}

fn parse_header(line: &str) -> Header {
    let line = line.trim();
    let mut header = Header::default();

    if let Some((kind, since)) = line.split_once(" in progress since ") {
        header.function = ScanFunction::parse(kind);
        header.state = Some(ScanState::Scanning);
        header.start_time = Some(since.trim().to_string());
        return header;
    }

    if let Some((kind, since)) = line.split_once(" paused since ") {
        header.function = ScanFunction::parse(kind);
        header.state = Some(ScanState::Scanning);
        header.start_time = Some(since.trim().to_string());
        return header;
    }

    if let Some((kind, on)) = line.split_once(" canceled on ") {
        header.function = ScanFunction::parse(kind);
        header.state = Some(ScanState::Canceled);
        header.end_time = Some(on.trim().to_string());
        return header;
    }

    let function = if line.starts_with("scrub repaired") {
        Some(ScanFunction::Scrub)
    } else if line.starts_with("resilvered") {
        Some(ScanFunction::Resilver)
    } else {
        None
    };
    if function.is_some() {
        header.function = function;
        header.state = Some(ScanState::Finished);
        if let Some((summary, on)) = line.rsplit_once(" on ") {
            header.end_time = Some(on.trim().to_string());
            header.errors = summary
                .split_once(" with ")
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
        }
    }
    header
}

fn parse_rate(s: &str) -> Option<u64> {
    parse_size(s.trim().strip_suffix("/s")?)
}

/// `X` or `X / Y`
fn parse_pair(s: &str) -> (Option<u64>, Option<u64>) {
    match s.split_once(" / ") {
        Some((done, total)) => (parse_size(done), parse_size(total)),
        None => (parse_size(s), None),
    }
}

#[derive(Debug, Default)]
struct Progress {
    examined: Option<u64>,
    to_examine: Option<u64>,
    issued: Option<u64>,
    rate: Option<u64>,
    percent: Option<f64>,
    remaining: Option<u64>,
}

impl Progress {
    fn clause(&mut self, clause: &str) {
        let clause = clause.trim();

        if let Some(pct) = clause.strip_suffix("% done") {
            self.percent = pct.trim().parse().ok();
        } else if let Some(eta) = clause.strip_suffix(" to go") {
            self.remaining = parse_duration(eta);
        } else if let Some((scanned, rest)) = clause
            .split_once(" scanned out of ")
            .or_else(|| clause.split_once(" scanned of "))
        {
            // `X scanned out of Y at R/s` (0.6, 0.7) or `X scanned of Y at R/s`
            self.examined = parse_size(scanned);
            match rest.split_once(" at ") {
                Some((total, rate)) => {
                    self.to_examine = parse_size(total);
                    self.rate = parse_rate(rate);
                }
                None => self.to_examine = parse_size(rest),
            }
        } else if let Some((scanned, rest)) = clause.split_once(" scanned") {
            let (examined, total) = parse_pair(scanned);
            self.examined = examined;
            self.to_examine = total.or(self.to_examine);
            if let Some(rate) = rest.trim().strip_prefix("at ") {
                self.rate = self.rate.or_else(|| parse_rate(rate));
            }
        } else if let Some((issued, rest)) = clause.split_once(" issued") {
            let (issued, total) = parse_pair(issued);
            self.issued = issued;
            self.to_examine = total.or(self.to_examine);
            // The issue rate reflects real progress better than the scan rate
            if let Some(rate) = rest.trim().strip_prefix("at ").and_then(parse_rate) {
                self.rate = Some(rate);
            }
        } else if let Some(total) = clause.strip_suffix(" total") {
            self.to_examine = parse_size(total);
        }
    }
}

/// Extract the status of `function` from a `scan:` block
///
/// If the block describes a different kind of scan, `function` is idle even
/// when progress data is present.
pub fn extract(block: &str, function: ScanFunction) -> ScanStatus {
    let mut lines = block.lines();
    let header = parse_header(lines.next().unwrap_or_default());
    if header.function != Some(function) {
        return ScanStatus::idle(function);
    }
    let state = header.state.unwrap_or(ScanState::None);

    let mut progress = Progress::default();
    for line in lines {
        for clause in line.split(',') {
            progress.clause(clause);
        }
    }

    let examined = progress.examined.unwrap_or(0);
    let to_examine = progress.to_examine.unwrap_or(0);
    let percent_done = match (progress.percent, state) {
        (Some(pct), _) => pct,
        (None, ScanState::Finished) => 100.0,
        (None, _) if to_examine > 0 => examined as f64 / to_examine as f64 * 100.0,
        _ => 0.0,
    };
    let in_progress = state == ScanState::Scanning;

    ScanStatus {
        function,
        state,
        in_progress,
        examined_bytes: examined,
        to_examine_bytes: to_examine,
        issued_bytes: progress.issued.unwrap_or(0),
        rate_bytes_per_sec: progress.rate.unwrap_or(0),
        percent_done,
        errors: header.errors,
        start_time: header.start_time,
        end_time: header.end_time,
        seconds_remaining: if in_progress { progress.remaining } else { None },
    }
}
