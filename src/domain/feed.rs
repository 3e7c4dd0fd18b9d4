use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub language: String,
    /// `None` until the first successful update.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            id: 0,
            url,
            title: String::new(),
            description: None,
            language: String::new(),
            last_fetched_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feed_was_never_fetched() {
        let feed = Feed::new("https://example.com/feed.xml".into());
        assert!(feed.last_fetched_at.is_none());
        assert_eq!(feed.id, 0);
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let mut feed = Feed::new("https://example.com/feed.xml".into());
        assert_eq!(feed.display_title(), "https://example.com/feed.xml");

        feed.title = "Example".into();
        assert_eq!(feed.display_title(), "Example");
    }
}
