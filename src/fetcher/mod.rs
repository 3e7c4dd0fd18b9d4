pub mod http_fetcher;

use async_trait::async_trait;
use url::Url;

use crate::app::{Result, TributaryError};
use crate::domain::FetchedDocument;

/// Retrieves and decodes one feed.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

/// Accept only absolute http(s) URLs with a host.
pub fn validate_url(feed_url: &str) -> Result<Url> {
    let invalid = |reason: String| TributaryError::InvalidUrl {
        url: feed_url.to_string(),
        reason,
    };

    let parsed = Url::parse(feed_url).map_err(|e| invalid(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid("URL must use http or https scheme".into()));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL must have a valid host".into()));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ErrorKind;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url("http://example.com/feed.xml").is_ok());
        assert!(validate_url("https://example.com/rss?format=xml").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = validate_url("ftp://example.com/feed.xml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_unparseable() {
        let err = validate_url("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_rejects_missing_host() {
        assert!(validate_url("http://").is_err());
        assert!(validate_url("file:///tmp/feed.xml").is_err());
    }
}
