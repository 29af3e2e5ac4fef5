use chrono::{DateTime, Utc};
use glow_common::helpers::truncate_chars;

/// The public display format for donation dates, e.g. `07/03/2024`.
pub fn format_donation_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Trims surrounding whitespace and truncates to `max_chars` characters.
pub fn truncate_field(value: &str, max_chars: usize) -> String {
    truncate_chars(value.trim(), max_chars)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn dates_are_day_first() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 22, 15, 0).unwrap();
        assert_eq!(format_donation_date(&date), "07/03/2024");
    }

    #[test]
    fn fields_are_trimmed_then_truncated() {
        assert_eq!(truncate_field("  Marie  ", 50), "Marie");
        assert_eq!(truncate_field(&"x".repeat(60), 50).len(), 50);
    }
}
