use std::collections::BTreeSet;

/// Placeholder used when ordering a movie that has no recorded showtime
pub const NO_SHOWTIME: &str = "00:00";

/// Normalize a wall-clock time to zero-padded 24-hour `HH:MM`.
///
/// Accepts `H:MM`, `HH:MM` and `HH:MM:SS` (seconds are dropped). Returns
/// `None` for anything that is not a valid time of day.
pub fn normalize_showtime(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hour = parts.next()?;
    let minute = parts.next()?;
    if let Some(seconds) = parts.next() {
        if seconds.len() != 2 || !seconds.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

/// Earliest showtime of a set, or `"00:00"` when the set is empty
pub fn earliest_showtime(showtimes: &BTreeSet<String>) -> &str {
    showtimes.iter().next().map(String::as_str).unwrap_or(NO_SHOWTIME)
}
