//! Date and time utilities.

use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

/// Current date and time in UTC.
pub fn now() -> PrimitiveDateTime {
    let utc = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(utc.date(), utc.time())
}

/// Current unix timestamp in seconds.
pub fn now_unix_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Format a UTC timestamp as ISO 8601 (RFC 3339).
pub fn format_iso8601(value: PrimitiveDateTime) -> Result<String, time::error::Format> {
    value.assume_utc().format(&Rfc3339)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn iso8601_format_is_utc_with_designator() {
        let formatted = format_iso8601(datetime!(2026-02-03 04:05:06)).expect("format");
        assert_eq!(formatted, "2026-02-03T04:05:06Z");
    }
}
