//! Status decoding strategies
//!
//! `zpool status` is decoded by one of two independent [`StatusParser`]
//! implementations. Which one runs is decided once, from configuration or
//! from the installed tool version, never by branching inside a parser.

pub mod json;
pub mod text;

pub use json::JsonStatusParser;
pub use text::TextStatusParser;

use crate::config::StatusMode;
use crate::domain::ports::StatusParser;
use tracing::debug;

/// First OpenZFS release whose `zpool status` accepts `-j`
pub const JSON_MIN_VERSION: (u32, u32) = (2, 3);

/// Userland version from `zpool version` output (`zfs-2.3.0-1`)
pub fn tool_version(output: &str) -> Option<(u32, u32)> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("zfs-") && !l.starts_with("zfs-kmod-"))?;
    let mut parts = line.trim_start_matches("zfs-").split(['.', '-']);
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Pick the status encoding the installed tool supports
pub fn detect_mode(version_output: &str) -> StatusMode {
    match tool_version(version_output) {
        Some(version) if version >= JSON_MIN_VERSION => StatusMode::Json,
        Some(version) => {
            debug!("zpool {:?} predates JSON status output", version);
            StatusMode::Text
        }
        None => StatusMode::Text,
    }
}

/// The parser for a resolved mode; `Auto` is treated as JSON
pub fn parser_for(mode: StatusMode) -> Box<dyn StatusParser> {
    match mode {
        StatusMode::Json | StatusMode::Auto => Box::new(JsonStatusParser),
        StatusMode::Text => Box::new(TextStatusParser),
    }
}
