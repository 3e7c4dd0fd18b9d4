use html_escape::decode_html_entities;
use rss::Channel;

use crate::app::{Result, TributaryError};
use crate::domain::{FetchedDocument, FetchedEntry};

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode an RSS document. Items without a link are dropped since the
    /// link is what identifies a post.
    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<FetchedDocument> {
        let channel = Channel::read_from(body).map_err(|e| TributaryError::FeedParse {
            url: feed_url.to_string(),
            message: e.to_string(),
        })?;

        let entries = channel
            .items()
            .iter()
            .filter_map(|item| {
                let link = item.link().map(str::trim).filter(|l| !l.is_empty())?;
                Some(FetchedEntry {
                    title: item.title().map(decode).unwrap_or_default(),
                    link: link.to_string(),
                    description: item.description().map(decode),
                    author: item.author().map(String::from),
                    published_at: item.pub_date().map(String::from),
                })
            })
            .collect();

        Ok(FetchedDocument {
            title: decode(channel.title()),
            description: decode(channel.description()),
            language: channel.language().map(String::from),
            last_build_date: channel.last_build_date().map(|d| d.trim().to_string()),
            entries,
        })
    }
}

fn decode(text: &str) -> String {
    decode_html_entities(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ErrorKind;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com/</link>
    <description>A test feed</description>
    <language>en-us</language>
    <lastBuildDate>Tue, 02 Jan 2024 10:00:00 GMT</lastBuildDate>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <author>jane@example.com (Jane)</author>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
    </item>
    <item>
      <title>No link here</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_channel_metadata() {
        let doc = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(doc.title, "Test Feed");
        assert_eq!(doc.description, "A test feed");
        assert_eq!(doc.language.as_deref(), Some("en-us"));
        assert_eq!(
            doc.last_build_date.as_deref(),
            Some("Tue, 02 Jan 2024 10:00:00 GMT")
        );
    }

    #[test]
    fn test_entries_keep_document_order_and_raw_dates() {
        let doc = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[0].link, "https://example.com/item1");
        assert_eq!(
            doc.entries[0].published_at.as_deref(),
            Some("Mon, 01 Jan 2024 00:00:00 GMT")
        );
        assert_eq!(doc.entries[0].author.as_deref(), Some("jane@example.com (Jane)"));
        assert_eq!(doc.entries[1].link, "https://example.com/item2");
        assert_eq!(doc.entries[1].published_at, None);
        assert_eq!(doc.entries[1].description, None);
    }

    #[test]
    fn test_double_escaped_entities_are_decoded() {
        let body = r#"<rss version="2.0"><channel><title>Tom &amp;amp; Jerry</title>
<link>https://example.com/</link><description></description>
<item><title>Fish &amp;amp; Chips</title><link>https://example.com/f</link></item>
</channel></rss>"#;
        let doc = Normalizer::new()
            .normalize("https://example.com/feed.xml", body.as_bytes())
            .unwrap();

        assert_eq!(doc.title, "Tom & Jerry");
        assert_eq!(doc.entries[0].title, "Fish & Chips");
    }

    #[test]
    fn test_channel_without_items() {
        let body = r#"<rss version="2.0"><channel><title>Empty</title>
<link>https://example.com/</link><description>nothing yet</description></channel></rss>"#;
        let doc = Normalizer::new()
            .normalize("https://example.com/feed.xml", body.as_bytes())
            .unwrap();

        assert!(doc.entries.is_empty());
        assert_eq!(doc.last_build_date, None);
    }

    #[test]
    fn test_malformed_xml_is_a_parse_error() {
        let err = Normalizer::new()
            .normalize("https://example.com/feed.xml", b"<html><body>oops")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("https://example.com/feed.xml"));
    }
}
