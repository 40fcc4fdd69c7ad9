//! Seat count extraction from label text

use std::sync::OnceLock;

use regex::Regex;

static DIGITS: OnceLock<Regex> = OnceLock::new();

/// First run of decimal digits in `text`, or 0 when there is none.
///
/// Runs too large for `u32` saturate at `u32::MAX`.
pub fn extract_seat_count(text: &str) -> u32 {
    let re = DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("Invalid regex"));
    let Some(m) = re.find(text) else {
        return 0;
    };
    // Only ASCII digits reach here, so a parse failure means overflow
    m.as_str().parse::<u32>().unwrap_or(u32::MAX)
}
