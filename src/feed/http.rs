use async_trait::async_trait;
use log::debug;
use reqwest::header::USER_AGENT;
use reqwest::Client;

use super::{FeedSnapshot, FeedSource};
use crate::error::{Error, Result};

// The notice API rejects requests that do not look like a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        debug!("GET {}", self.url);
        let res = self
            .client
            .get(&self.url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|err| Error::Fetch(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("unexpected status {}", status)));
        }

        res.json::<FeedSnapshot>()
            .await
            .map_err(|err| Error::Fetch(format!("decode body: {}", err)))
    }
}
