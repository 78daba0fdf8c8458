//! Human-readable timestamps written back to the QC sheet.

use chrono::{DateTime, FixedOffset, Utc};

/// India Standard Time, UTC+05:30 (no daylight saving).
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Day-first layout the QC sheet expects.
const DISPLAY_FORMAT: &str = "%d/%m/%Y, %-I:%M:%S %P";

/// Format an instant in IST as `dd/mm/yyyy, h:mm:ss am`.
pub fn format_completion_time(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist).format(DISPLAY_FORMAT).to_string(),
        None => at.format(DISPLAY_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_in_india_time() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 34, 5).unwrap();
        assert_eq!(format_completion_time(at), "19/10/2026, 3:04:05 pm");
    }

    #[test]
    fn crosses_midnight() {
        let at = Utc.with_ymd_and_hms(2026, 12, 31, 20, 0, 0).unwrap();
        assert_eq!(format_completion_time(at), "01/01/2027, 1:30:00 am");
    }
}
