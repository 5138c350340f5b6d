//! Stored responses.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Response headers bound to one client's session.
const PRIVATE_HEADERS: &[&str] = &["set-cookie", "set-cookie2"];

/// A response as it is stored in, and served from, a partition.
///
/// The body is a reference-counted [`Bytes`] buffer, so cloning a record to
/// store one copy and hand the other to the caller never consumes the body.
/// There is no separate capture timestamp: the `Date` header is the only
/// signal of when the response was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    /// The URL this response answers.
    pub url: String,
    pub status: u16,
    /// Headers in the order they were received. Names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseRecord {
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self { url: url.into(), status, headers, body: body.into() }
    }

    /// First value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether a shared cache may keep this response.
    ///
    /// Partial content and responses marked `no-store` or `private` are
    /// never kept.
    pub fn is_storable(&self) -> bool {
        if !self.is_success() || self.status == 206 {
            return false;
        }
        !self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("cache-control"))
            .flat_map(|(_, v)| v.split(','))
            .map(|directive| directive.split('=').next().unwrap_or_default().trim())
            .any(|d| d.eq_ignore_ascii_case("no-store") || d.eq_ignore_ascii_case("private"))
    }

    /// Headers safe to replay to other clients.
    pub(crate) fn shareable_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(n, _)| !PRIVATE_HEADERS.iter().any(|p| p.eq_ignore_ascii_case(n)))
            .cloned()
            .collect()
    }

    /// The `Date` header as a timestamp, if present and parseable.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.header("date")?;
        DateTime::parse_from_rfc2822(raw.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub(crate) fn headers_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.shareable_headers())
    }

    pub(crate) fn headers_from_json(json: &str) -> Result<Vec<(String, String)>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Format a timestamp the way HTTP `Date` headers are written.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_header_lookup_case_insensitive() {
        let record = ResponseRecord::new(
            "https://example.com/app.js",
            200,
            vec![("Content-Type".into(), "text/javascript".into())],
            "x",
        );
        assert_eq!(record.header("content-type"), Some("text/javascript"));
        assert_eq!(record.header("CONTENT-TYPE"), Some("text/javascript"));
        assert_eq!(record.headers[0].0, "content-type");
    }

    #[test]
    fn test_is_success() {
        let ok = ResponseRecord::new("u", 204, vec![], "");
        let redirect = ResponseRecord::new("u", 301, vec![], "");
        let missing = ResponseRecord::new("u", 404, vec![], "");
        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_date_parsing() {
        let record = ResponseRecord::new("u", 200, vec![("date".into(), "Wed, 21 Oct 2015 07:28:00 GMT".into())], "");
        assert_eq!(record.date(), Some(Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()));
    }

    #[test]
    fn test_date_unparseable() {
        let record = ResponseRecord::new("u", 200, vec![("date".into(), "yesterday".into())], "");
        assert_eq!(record.date(), None);
        assert_eq!(ResponseRecord::new("u", 200, vec![], "").date(), None);
    }

    #[test]
    fn test_http_date_round_trips_through_parser() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap();
        let record = ResponseRecord::new("u", 200, vec![("date".into(), http_date(at))], "");
        assert_eq!(record.date(), Some(at));
    }

    #[test]
    fn test_partial_content_not_storable() {
        assert!(ResponseRecord::new("u", 200, vec![], "full").is_storable());
        assert!(!ResponseRecord::new("u", 206, vec![("content-range".into(), "bytes 0-3/10".into())], "ABCD").is_storable());
        assert!(!ResponseRecord::new("u", 404, vec![], "").is_storable());
    }

    #[test]
    fn test_cache_control_opt_out() {
        let with = |cc: &str| ResponseRecord::new("u", 200, vec![("Cache-Control".into(), cc.into())], "");
        assert!(!with("no-store").is_storable());
        assert!(!with("private, max-age=60").is_storable());
        assert!(!with("max-age=0, No-Store").is_storable());
        assert!(with("public, max-age=31536000, immutable").is_storable());
        assert!(with("no-cache").is_storable());
    }

    #[test]
    fn test_shareable_headers_drop_cookies() {
        let record = ResponseRecord::new(
            "u",
            200,
            vec![
                ("content-type".into(), "text/css".into()),
                ("Set-Cookie".into(), "session=alice-secret".into()),
            ],
            "",
        );
        assert_eq!(record.shareable_headers(), vec![("content-type".to_string(), "text/css".to_string())]);
    }

    #[test]
    fn test_clone_shares_body() {
        let record = ResponseRecord::new("u", 200, vec![], "hello world");
        let stored = record.clone();
        drop(stored);
        assert_eq!(&record.body[..], b"hello world");
    }
}
