use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

pub const FEED_DEFAULT_LIMIT: i64 = 20;
pub const FEED_MAX_LIMIT: i64 = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("invalid cursor encoding")]
    Encoding,

    #[error("invalid cursor format")]
    Format,

    #[error("invalid cursor timestamp")]
    Timestamp,

    #[error("invalid cursor id")]
    Id,
}

/// Seek position: the sort key and tiebreak id of the last item served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub timestamp: DateTime<Utc>,
    pub id: Uuid,
}

/// Encodes `(timestamp, id)` as base64url(`<unix-nanos>:<uuid>`).
///
/// Returns an empty string for the epoch, for times outside the nanosecond
/// range, and for the nil uuid. An empty cursor means there is no next page.
pub fn encode_cursor(timestamp: DateTime<Utc>, id: Uuid) -> String {
    if id.is_nil() {
        return String::new();
    }
    match timestamp.timestamp_nanos_opt() {
        Some(nanos) if nanos != 0 => URL_SAFE.encode(format!("{}:{}", nanos, id)),
        _ => String::new(),
    }
}

/// Decodes a cursor. An empty token is the first page and yields `None`.
pub fn decode_cursor(token: &str) -> Result<Option<CursorPosition>, CursorError> {
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = URL_SAFE.decode(token).map_err(|_| CursorError::Encoding)?;
    let raw = String::from_utf8(bytes).map_err(|_| CursorError::Encoding)?;
    let (nanos, id) = raw.split_once(':').ok_or(CursorError::Format)?;

    let nanos: i64 = nanos.parse().map_err(|_| CursorError::Timestamp)?;
    let id = Uuid::parse_str(id).map_err(|_| CursorError::Id)?;

    Ok(Some(CursorPosition { timestamp: Utc.timestamp_nanos(nanos), id }))
}

/// Feed paging request: opaque cursor plus a page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorParams {
    pub cursor: Option<CursorPosition>,
    pub limit: i64,
}

impl CursorParams {
    /// A missing, non-numeric or non-positive limit falls back to the
    /// default; anything above the cap is clamped.
    pub fn parse(cursor: Option<&str>, limit: Option<&str>) -> Result<Self, CursorError> {
        Self::parse_with_limits(cursor, limit, FEED_DEFAULT_LIMIT, FEED_MAX_LIMIT)
    }

    pub fn parse_with_limits(
        cursor: Option<&str>,
        limit: Option<&str>,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self, CursorError> {
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .min(max_limit)
            .max(1);
        let cursor = decode_cursor(cursor.unwrap_or_default().trim())?;
        Ok(Self { cursor, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_time() -> DateTime<Utc> {
        Utc.timestamp_nanos(1_717_171_717_123_456_789)
    }

    #[test]
    fn test_round_trip() {
        let id = Uuid::new_v4();
        let token = encode_cursor(sample_time(), id);
        assert!(!token.is_empty());

        let decoded = decode_cursor(&token).unwrap().unwrap();
        assert_eq!(decoded.timestamp, sample_time());
        assert_eq!(decoded.id, id);
    }

    #[test]
    fn test_round_trip_before_epoch() {
        let id = Uuid::new_v4();
        let t = Utc.timestamp_nanos(-86_400_000_000_000);
        let decoded = decode_cursor(&encode_cursor(t, id)).unwrap().unwrap();
        assert_eq!(decoded.timestamp, t);
    }

    #[test]
    fn test_encode_fails_closed() {
        assert_eq!(encode_cursor(sample_time(), Uuid::nil()), "");
        assert_eq!(encode_cursor(Utc.timestamp_nanos(0), Uuid::new_v4()), "");
    }

    #[test]
    fn test_decode_empty_is_first_page() {
        assert_eq!(decode_cursor(""), Ok(None));
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(decode_cursor("not-base64!!"), Err(CursorError::Encoding));
        assert_eq!(decode_cursor(&URL_SAFE.encode("no-separator")), Err(CursorError::Format));
        assert_eq!(decode_cursor(&URL_SAFE.encode("abc:1b4e28ba-2fa1-11d2-883f-0016d3cca427")), Err(CursorError::Timestamp));
        assert_eq!(decode_cursor(&URL_SAFE.encode("12345:not-a-uuid")), Err(CursorError::Id));
    }

    #[test]
    fn test_cursor_params_limits() {
        assert_eq!(CursorParams::parse(None, None).unwrap().limit, 20);
        assert_eq!(CursorParams::parse(None, Some("7")).unwrap().limit, 7);
        assert_eq!(CursorParams::parse(None, Some("500")).unwrap().limit, 50);
        assert_eq!(CursorParams::parse(None, Some("-3")).unwrap().limit, 20);
        assert_eq!(CursorParams::parse(None, Some("lots")).unwrap().limit, 20);
        assert!(CursorParams::parse(Some("%%%"), None).is_err());
    }

    #[test]
    fn test_cursor_params_custom_limits() {
        assert_eq!(CursorParams::parse_with_limits(None, None, 10, 20).unwrap().limit, 10);
        assert_eq!(CursorParams::parse_with_limits(None, Some("35"), 10, 20).unwrap().limit, 20);
    }
}
