//! Size and duration notation used by the storage tools
//!
//! Sizes use binary suffixes (`K`, `M`, `G`, `T`, `P`, powers of 1024); a
//! bare numeral is a byte count.

use tracing::warn;

const UNITS: [(char, u32); 5] = [('K', 1), ('M', 2), ('G', 3), ('T', 4), ('P', 5)];

/// Parse `500G`, `1.81T`, `4096` or `12.5M` into bytes
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // zfs sometimes prints "B" after the unit ("0B", "12.5MB")
    let s = s.strip_suffix('B').filter(|rest| !rest.is_empty()).unwrap_or(s);

    if let Ok(bytes) = s.parse::<u64>() {
        return Some(bytes);
    }

    let suffix = s.chars().last()?.to_ascii_uppercase();
    let exponent = UNITS.iter().find(|(c, _)| *c == suffix).map(|(_, e)| *e)?;
    let value: f64 = s[..s.len() - 1].trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some((value * 1024f64.powi(exponent as i32)) as u64)
}

/// Parse a numeric field that may be a plain integer or size notation,
/// defaulting to zero
///
/// Empty and `-` fields are silently zero; anything else unparseable is
/// logged before it is zeroed.
pub fn parse_u64_lenient(s: &str) -> u64 {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return 0;
    }
    parse_size(s).unwrap_or_else(|| {
        warn!("Unparseable numeric field {:?}, using 0", s);
        0
    })
}

/// Format bytes with the largest binary unit that keeps a whole number,
/// rounding down: 1536 becomes `1K`, 10 GiB becomes `10G`
pub fn format_size(bytes: u64) -> String {
    for (suffix, exponent) in UNITS.iter().rev() {
        let unit = 1u64 << (10 * exponent);
        if bytes >= unit {
            return format!("{}{}", bytes / unit, suffix);
        }
    }
    bytes.to_string()
}

/// Parse a remaining-time estimate into seconds
///
/// Accepts `1h30m`, `45s`, `2d4h`, `01:23:45` and `2 days 01:23:45`.
pub fn parse_duration(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.contains(':') {
        let mut days = 0u64;
        let mut clock = s;
        if let Some((prefix, rest)) = s.split_once(" days ").or_else(|| s.split_once(" day ")) {
            days = prefix.trim().parse().ok()?;
            clock = rest;
        }
        let parts: Vec<u64> = clock
            .trim()
            .split(':')
            .map(|p| p.parse().ok())
            .collect::<Option<Vec<_>>>()?;
        let (h, m, sec) = match parts.as_slice() {
            [h, m, sec] => (*h, *m, *sec),
            [m, sec] => (0, *m, *sec),
            _ => return None,
        };
        return Some(days * 86_400 + h * 3_600 + m * 60 + sec);
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let multiplier = match c {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            ' ' => continue,
            _ => return None,
        };
        let value: u64 = digits.parse().ok()?;
        total += value * multiplier;
        digits.clear();
    }

    if !digits.is_empty() {
        return None;
    }
    Some(total)
}
