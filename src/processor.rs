// src/processor.rs

use arrow::record_batch::RecordBatch;
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::cache::{self, CacheError};
use crate::config::ProcessorConfig;
use crate::fetch::{FetchError, HttpPageSource, PageSource, RecordFetcher};
use crate::process::{self, sample_raw_table, CleaningError};
use crate::query::{self, HeatmapCell, Summary, TownMonth};
use crate::schema::HousingTable;

/// The ways an initial table can be obtained, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Api,
    Cache,
    Sample,
}

/// Why a strategy did not produce a table.
#[derive(Debug, Error)]
enum StrategyError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Clean(#[from] CleaningError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("no cache at {0:?}")]
    NoCache(PathBuf),

    #[error("strategy produced an empty table")]
    Empty,
}

/// Owns the cleaned table and answers read-only queries over it.
///
/// The table is built once by [`HousingProcessor::build`] (API, then cache,
/// then built-in sample) and only replaced through [`HousingProcessor::reload`].
pub struct HousingProcessor<S = HttpPageSource> {
    config: ProcessorConfig,
    fetcher: RecordFetcher<S>,
    table: Option<HousingTable>,
    source: Option<Strategy>,
}

impl HousingProcessor<HttpPageSource> {
    /// Build against the configured HTTP endpoint. Never fails: the sample
    /// strategy is the last resort.
    pub async fn build(config: ProcessorConfig) -> Self {
        let source = HttpPageSource::new(Client::new(), &config.source);
        Self::build_with_source(config, source).await
    }
}

impl<S: PageSource> HousingProcessor<S> {
    pub async fn build_with_source(config: ProcessorConfig, source: S) -> Self {
        let mut processor = Self::unloaded(config, source);
        processor.reload().await;
        processor
    }

    /// A processor with no table yet; every query answers empty until
    /// [`reload`](Self::reload) runs.
    pub fn unloaded(config: ProcessorConfig, source: S) -> Self {
        let fetcher = RecordFetcher::new(
            source,
            config.source.page_limit,
            config.source.page_delay(),
        );
        Self {
            config,
            fetcher,
            table: None,
            source: None,
        }
    }

    /// Re-run the strategies and replace the table.
    #[instrument(level = "info", skip(self), fields(use_network = self.config.use_network))]
    pub async fn reload(&mut self) {
        let (table, strategy) = self.load().await;
        info!(?strategy, rows = table.num_rows(), "table ready");
        self.table = Some(table);
        self.source = Some(strategy);
    }

    async fn load(&self) -> (HousingTable, Strategy) {
        if self.config.use_network {
            info!("attempting API data load");
            match self.from_api().await {
                Ok(table) => return (table, Strategy::Api),
                Err(e) => {
                    error!(error = %e, "API load failed");
                    warn!("attempting fallback methods");
                }
            }
        } else {
            info!("network disabled; loading from cache");
        }

        match self.from_cache() {
            Ok(table) => return (table, Strategy::Cache),
            Err(e @ StrategyError::NoCache(_)) | Err(e @ StrategyError::Empty) => {
                warn!(reason = %e, "cache unavailable")
            }
            Err(e) => error!(error = %e, "cache load failed"),
        }

        (Self::from_sample(), Strategy::Sample)
    }

    /// Fetch, clean and cache. A cache write failure is logged and the
    /// fetched table is still used.
    async fn from_api(&self) -> Result<HousingTable, StrategyError> {
        let fetched = self.fetcher.fetch_all().await?;
        if let Some(e) = &fetched.interrupted {
            warn!(error = %e, records = fetched.records.len(), total = fetched.total, "using partial API data");
        }
        let table = process::clean(&fetched.into_raw_table())?;
        if table.is_empty() {
            return Err(StrategyError::Empty);
        }
        if let Err(e) = cache::save(&table, &self.config.cache_path) {
            error!(error = %e, "failed to save cache; keeping API data");
        }
        Ok(table)
    }

    fn from_cache(&self) -> Result<HousingTable, StrategyError> {
        match cache::load(&self.config.cache_path)? {
            Some(table) if !table.is_empty() => Ok(table),
            Some(_) => Err(StrategyError::Empty),
            None => Err(StrategyError::NoCache(self.config.cache_path.clone())),
        }
    }

    fn from_sample() -> HousingTable {
        error!(severity = "critical", "GENERATING SAMPLE DATA - REAL DATA UNAVAILABLE");
        process::clean(&sample_raw_table()).unwrap_or_else(|e| {
            error!(error = %e, "sample data failed to clean");
            HousingTable::empty()
        })
    }
}

impl<S> HousingProcessor<S> {
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Which strategy produced the current table.
    pub fn source(&self) -> Option<Strategy> {
        self.source
    }

    pub fn table(&self) -> Option<&HousingTable> {
        self.table.as_ref()
    }

    pub fn list_towns(&self) -> Vec<String> {
        self.table.as_ref().map(query::list_towns).unwrap_or_default()
    }

    pub fn list_flat_types(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(query::list_flat_types)
            .unwrap_or_default()
    }

    pub fn town_series(&self, town: &str) -> Vec<TownMonth> {
        self.table
            .as_ref()
            .map(|t| query::town_series(t, town))
            .unwrap_or_default()
    }

    pub fn heatmap(&self) -> Vec<HeatmapCell> {
        self.table.as_ref().map(query::heatmap).unwrap_or_default()
    }

    /// Snapshot of the whole table. Arrow buffers are immutable, so the
    /// copy shares memory with the processor's table.
    pub fn full_table(&self) -> Option<RecordBatch> {
        self.table.as_ref().map(|t| t.batch().clone())
    }

    pub fn summary(&self) -> Summary {
        let mut summary = match &self.table {
            Some(t) => query::summary(t),
            None => query::summary(&HousingTable::empty()),
        };
        summary.source = self.source;
        summary
    }
}
