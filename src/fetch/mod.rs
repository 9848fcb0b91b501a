// src/fetch/mod.rs
pub mod http;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::process::{RawRecord, RawTable};

pub use http::HttpPageSource;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid API response structure: {0}")]
    InvalidEnvelope(String),

    #[error("decoding API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One page of the remote listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Total record count reported by the source, if present.
    pub total: Option<usize>,
    pub records: Vec<RawRecord>,
}

/// Anything that can serve pages of raw records by offset.
pub trait PageSource {
    fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// Result of a full pagination run.
#[derive(Debug)]
pub struct Fetched {
    pub records: Vec<RawRecord>,
    /// Total reported by the first page.
    pub total: usize,
    /// The error that cut the run short after at least one page.
    pub interrupted: Option<FetchError>,
}

impl Fetched {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }

    pub fn into_raw_table(self) -> RawTable {
        RawTable::new(self.records)
    }
}

/// Walks a [`PageSource`] from offset 0 until the reported total is reached.
pub struct RecordFetcher<S> {
    source: S,
    page_size: usize,
    page_delay: Duration,
}

impl<S: PageSource> RecordFetcher<S> {
    pub fn new(source: S, page_size: usize, page_delay: Duration) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            page_delay,
        }
    }

    /// Fetch every page, sequentially, pausing `page_delay` between pages.
    ///
    /// An error on the first page is returned. An error on a later page
    /// stops the run and the records gathered so far are returned with the
    /// error in [`Fetched::interrupted`].
    #[instrument(level = "info", skip(self), fields(page_size = self.page_size))]
    pub async fn fetch_all(&self) -> Result<Fetched, FetchError> {
        let mut records: Vec<RawRecord> = Vec::new();
        let mut offset = 0usize;
        let mut pages = 0usize;
        let mut total: Option<usize> = None;

        let interrupted = loop {
            let page = match self.source.fetch_page(offset, self.page_size).await {
                Ok(page) => page,
                Err(e) if pages > 0 => {
                    warn!(error = %e, partial = records.len(), "API error; returning partial data");
                    break Some(e);
                }
                Err(e) => {
                    error!(error = %e, "API error on first page");
                    return Err(e);
                }
            };

            let expected = match (total, page.total) {
                (Some(t), _) => t,
                (None, Some(t)) => {
                    info!(total = t, "total records");
                    *total.insert(t)
                }
                (None, None) => {
                    let e = FetchError::InvalidEnvelope("missing `result.total`".into());
                    error!(error = %e, "API error on first page");
                    return Err(e);
                }
            };

            pages += 1;
            let got = page.records.len();
            records.extend(page.records);
            offset += got;
            info!(retrieved = offset, total = expected, "retrieved page");

            if offset >= expected {
                break None;
            }
            if got == 0 {
                warn!(retrieved = offset, total = expected, "empty page before total; stopping");
                break None;
            }
            sleep(self.page_delay).await;
        };

        info!(records = records.len(), complete = interrupted.is_none(), "API data loaded");
        Ok(Fetched {
            records,
            total: total.unwrap_or_default(),
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::RawValue;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned pages and records the offsets it was asked for.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Page, FetchError>>>,
        offsets: Mutex<Vec<usize>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page, FetchError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                offsets: Mutex::new(Vec::new()),
            }
        }

        fn offsets(&self) -> Vec<usize> {
            self.offsets.lock().unwrap().clone()
        }
    }

    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, offset: usize, _limit: usize) -> Result<Page, FetchError> {
            self.offsets.lock().unwrap().push(offset);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Status(StatusCode::NOT_FOUND)))
        }
    }

    fn records(n: usize, start: usize) -> Vec<RawRecord> {
        (start..start + n)
            .map(|i| RawRecord {
                town: Some(RawValue::Text(format!("town-{i}"))),
                ..RawRecord::default()
            })
            .collect()
    }

    fn page(total: Option<usize>, n: usize, start: usize) -> Result<Page, FetchError> {
        Ok(Page {
            total,
            records: records(n, start),
        })
    }

    fn fetcher(source: ScriptedSource, page_size: usize) -> RecordFetcher<ScriptedSource> {
        RecordFetcher::new(source, page_size, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_fetches_until_total() -> anyhow::Result<()> {
        let f = fetcher(
            ScriptedSource::new(vec![
                page(Some(5), 2, 0),
                page(Some(5), 2, 2),
                page(Some(5), 1, 4),
            ]),
            2,
        );
        let fetched = f.fetch_all().await?;
        assert!(fetched.is_complete());
        assert_eq!(fetched.total, 5);
        assert_eq!(fetched.records, records(5, 0));
        assert_eq!(f.source.offsets(), vec![0, 2, 4]);
        Ok(())
    }

    #[tokio::test]
    async fn test_first_page_covering_total_stops() -> anyhow::Result<()> {
        let f = fetcher(ScriptedSource::new(vec![page(Some(5000), 10_000, 0)]), 10_000);
        let fetched = f.fetch_all().await?;
        assert_eq!(fetched.records.len(), 10_000);
        assert_eq!(f.source.offsets(), vec![0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_error_after_first_page_returns_partial() -> anyhow::Result<()> {
        let f = fetcher(
            ScriptedSource::new(vec![
                page(Some(25_000), 10_000, 0),
                Err(FetchError::Status(StatusCode::BAD_GATEWAY)),
            ]),
            10_000,
        );
        let fetched = f.fetch_all().await?;
        assert_eq!(fetched.records, records(10_000, 0));
        assert!(matches!(
            fetched.interrupted,
            Some(FetchError::Status(StatusCode::BAD_GATEWAY))
        ));
        assert_eq!(f.source.offsets(), vec![0, 10_000]);
        Ok(())
    }

    #[tokio::test]
    async fn test_error_on_first_page_propagates() {
        let f = fetcher(
            ScriptedSource::new(vec![Err(FetchError::InvalidEnvelope("no result".into()))]),
            100,
        );
        let err = f.fetch_all().await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn test_missing_total_is_envelope_error() {
        let f = fetcher(ScriptedSource::new(vec![page(None, 3, 0)]), 100);
        let err = f.fetch_all().await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn test_empty_page_stops_short_source() -> anyhow::Result<()> {
        let f = fetcher(
            ScriptedSource::new(vec![page(Some(10), 4, 0), page(Some(10), 0, 4)]),
            4,
        );
        let fetched = f.fetch_all().await?;
        assert!(fetched.is_complete());
        assert_eq!(fetched.records.len(), 4);
        assert_eq!(f.source.offsets(), vec![0, 4]);
        Ok(())
    }
}
