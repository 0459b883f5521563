use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Game DTOs.
pub mod game;
/// Health check DTOs.
pub mod health;
/// Game history DTOs.
pub mod history;
/// Phase exposed to clients.
pub mod phase;
/// Question cache DTOs.
pub mod questions;
/// Settings DTOs.
pub mod settings;
/// SSE payloads.
pub mod sse;
/// Shared validation helpers.
pub mod validation;

/// Render a millisecond Unix timestamp as RFC 3339.
pub(crate) fn format_millis(millis: u64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_millis_as_rfc3339() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_millis(1_500), "1970-01-01T00:00:01.5Z");
    }
}
