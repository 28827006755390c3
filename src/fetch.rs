use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

const USER_AGENT: &str = concat!("immo_pipeline/", env!("CARGO_PKG_VERSION"));

/// Where pages come from. Failures are transport errors and abort the crawl.
pub trait DocumentSource {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let start = Instant::now();
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        debug!("Fetched {} ({} bytes, {}ms)", url, body.len(), start.elapsed().as_millis());
        Ok(body)
    }
}
