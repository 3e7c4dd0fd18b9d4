use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, StatusCode};

use crate::app::{Result, TributaryError};
use crate::domain::FetchedDocument;
use crate::fetcher::{validate_url, Fetcher};
use crate::normalizer::Normalizer;

pub const USER_AGENT: &str = concat!("tributary/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT_FEEDS: &str = "application/rss+xml, application/xml, text/xml";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self::from_client(client_builder(timeout).build()?))
    }

    fn from_client(client: Client) -> Self {
        Self {
            client,
            normalizer: Normalizer::new(),
        }
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .user_agent(USER_AGENT)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let parsed = validate_url(url)?;

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, ACCEPT_FEEDS)
            .send()
            .await?;

        // The response is dropped here without reading the body.
        if response.status() != StatusCode::OK {
            return Err(TributaryError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(feed = %url, bytes = body.len(), "Fetched feed body");

        self.normalizer.normalize(url, &body)
    }
}
