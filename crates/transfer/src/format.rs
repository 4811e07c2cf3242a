//! Display helpers for sizes and durations.

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count with base-1024 units and up to two decimals.
///
/// Returns `None` for negative or non-finite input.
pub fn format_bytes(bytes: f64) -> Option<String> {
    if !bytes.is_finite() || bytes < 0.0 {
        return None;
    }
    if bytes < 1.0 {
        return Some("0 B".into());
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    Some(format!("{} {}", trim_decimals(rounded), UNITS[unit]))
}

/// Like [`format_bytes`], but renders rejected or missing input as `"-"`.
pub fn format_bytes_or_dash(bytes: Option<f64>) -> String {
    bytes
        .and_then(format_bytes)
        .unwrap_or_else(|| "-".into())
}

/// Formats seconds as `45s`, `3m 05s` or `1h 02m`.
pub fn format_duration_secs(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "-".into();
    }
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

fn trim_decimals(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
