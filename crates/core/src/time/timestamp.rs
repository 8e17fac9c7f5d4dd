use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// The report generator stamps records with its local wall clock (KST, UTC+9)
/// and no offset, so that is the default zone for naive timestamps.
pub const DEFAULT_NAIVE_UTC_OFFSET_SECS: i32 = 9 * 3600;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a report timestamp into a UTC instant.
///
/// RFC 3339 values carry their own offset. Naive ISO-8601 values (as emitted by
/// the upstream generator, e.g. `2026-01-22T11:35:21.863855`) are read in the
/// zone given by `naive_utc_offset_secs`.
pub fn parse_report_timestamp(
    raw: &str,
    naive_utc_offset_secs: i32,
) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("timestamp must be non-empty".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let offset = FixedOffset::east_opt(naive_utc_offset_secs)
        .ok_or_else(|| format!("invalid naive timestamp offset: {naive_utc_offset_secs}s"))?;

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return naive
                .and_local_timezone(offset)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("ambiguous local timestamp: {s}"));
        }
    }

    Err(format!("not a valid RFC 3339 or ISO-8601 timestamp: {s}"))
}
