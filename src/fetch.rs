use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;

use crate::error::HarvestError;

pub const DEFAULT_USER_AGENT: &str = "tocharvest/0.1";

/// Plain, unauthenticated GET of a remote text resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, HarvestError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, HarvestError> {
        tracing::debug!(%url, "fetch");
        let http_err = |source| HarvestError::Http {
            url: url.to_owned(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(http_err)
    }
}
