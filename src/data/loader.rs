//! Dataset Loader Module
//! Fetches the CSV, normalizes it and caches the result.

use log::info;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::dataset::EducationDataset;
use super::schema::{self, NormalizeOptions, ParseError};
use super::source::{DataSource, DataSourceError};
use crate::config::DashboardConfig;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to fetch dataset: {0}")]
    Source(#[from] DataSourceError),
    #[error("Malformed dataset: {0}")]
    Parse(#[from] ParseError),
}

/// Builds an `EducationDataset` from a data source.
pub struct DatasetLoader {
    source: Box<dyn DataSource>,
    options: NormalizeOptions,
}

impl DatasetLoader {
    pub fn new(source: Box<dyn DataSource>, options: NormalizeOptions) -> Self {
        Self { source, options }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.build_source(),
            NormalizeOptions {
                duplicate_policy: config.duplicate_policy,
                validation: config.validation,
            },
        )
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    /// Fetch, parse and normalize. Any failure aborts the whole load.
    pub fn load(&self) -> Result<EducationDataset, LoaderError> {
        let start = Instant::now();
        info!("Fetching dataset from {}", self.source.describe());

        let bytes = self.source.fetch()?;
        info!("Fetched {} bytes", bytes.len());

        let df = schema::parse_csv(bytes)?;
        let (records, derived) = schema::normalize(&df, self.options)?;

        info!(
            "Loaded {} records ({} columns) in {:?}",
            records.len(),
            df.width(),
            start.elapsed()
        );
        Ok(EducationDataset::with_derived(records, derived))
    }
}

/// Holds the loaded dataset for the process lifetime or an optional TTL.
///
/// Owned by the composition root and handed around explicitly; readers get
/// a shared `Arc` and never see a dataset being rebuilt underneath them.
pub struct DatasetCache {
    loader: DatasetLoader,
    ttl: Option<Duration>,
    entry: Option<(Instant, Arc<EducationDataset>)>,
}

impl DatasetCache {
    pub fn new(loader: DatasetLoader, ttl: Option<Duration>) -> Self {
        Self {
            loader,
            ttl,
            entry: None,
        }
    }

    /// Cached dataset, loading it first if empty or expired.
    pub fn get(&mut self) -> Result<Arc<EducationDataset>, LoaderError> {
        if let Some((loaded_at, dataset)) = &self.entry {
            let fresh = self.ttl.map_or(true, |ttl| loaded_at.elapsed() < ttl);
            if fresh {
                return Ok(Arc::clone(dataset));
            }
            info!("Cached dataset expired after {:?}", loaded_at.elapsed());
        }

        let dataset = Arc::new(self.loader.load()?);
        self.entry = Some((Instant::now(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drop the cached dataset so the next `get` fetches again.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("Dataset cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }

    pub fn describe_source(&self) -> String {
        self.loader.describe_source()
    }
}
