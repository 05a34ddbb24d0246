use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;

use crate::error::FetchError;

/// Source of HTML documents. One blocking GET per call, no retries.
pub trait Fetch {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching {}", url);
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().map_err(transport)
    }
}

/// Resolves a profile `href` against the listing page it came from.
pub fn resolve_link(base: &str, href: &str) -> Result<String, FetchError> {
    let invalid = |source: url::ParseError| FetchError::InvalidUrl {
        url: href.to_string(),
        source,
    };
    let base = url::Url::parse(base).map_err(invalid)?;
    let joined = base.join(href).map_err(invalid)?;
    Ok(joined.into())
}
