use super::PageFetcher;
use crate::error::NutritionError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use reqwest::Client;
use std::time::Duration;

pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    /// Builds a pooled client with browser-like headers.
    ///
    /// `referer` is sent on every request; the site refuses some requests
    /// without it.
    pub fn new(
        timeout: Option<Duration>,
        user_agent: &str,
        referer: &str,
    ) -> Result<Self, NutritionError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(10));

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(REFERER, referer.parse()?);

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, NutritionError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NutritionError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
