// src/fetch/http.rs

use reqwest::{Client, Request};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{FetchError, Page, PageSource};
use crate::config::SourceConfig;
use crate::process::RawRecord;

/// `GET <url>?resource_id=..&limit=..&offset=..` against a datastore-search
/// style endpoint.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    url: Url,
    resource_id: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<ResultBody>,
}

#[derive(Debug, Deserialize)]
struct ResultBody {
    total: Option<usize>,
    records: Option<Vec<RawRecord>>,
}

impl HttpPageSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            resource_id: config.resource_id.clone(),
            timeout: config.timeout(),
        }
    }

    fn request(&self, offset: usize, limit: usize) -> Result<Request, FetchError> {
        Ok(self
            .client
            .get(self.url.clone())
            .query(&[("resource_id", self.resource_id.as_str())])
            .query(&[("limit", limit), ("offset", offset)])
            .timeout(self.timeout)
            .build()?)
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Page, FetchError> {
        debug!(url = %self.url, offset, limit, "requesting page");
        let resp = self.client.execute(self.request(offset, limit)?).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = resp.bytes().await?;
        parse_page(&body)
    }
}

/// Validate the `{"result": {"total": n, "records": [...]}}` envelope.
pub fn parse_page(body: &[u8]) -> Result<Page, FetchError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    let result = envelope
        .result
        .ok_or_else(|| FetchError::InvalidEnvelope("missing `result`".into()))?;
    let records = result
        .records
        .ok_or_else(|| FetchError::InvalidEnvelope("missing `result.records`".into()))?;
    Ok(Page {
        total: result.total,
        records,
    })
}
