use time::macros::format_description;
use time::OffsetDateTime;

/// Timestamp shared by every sample of one cycle. Taken once, before any check starts.
pub fn cycle_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Format a UTC instant as an ISO-8601 string with millisecond precision.
/// `2024-05-01T12:00:00.000Z` is the shape the dashboard consumers already parse.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let iso_millis =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    at.to_offset(time::UtcOffset::UTC)
        .format(iso_millis)
        .expect("ISO-8601 formatting should not fail")
}
