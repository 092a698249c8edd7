//! Pipeline facade: configured ingest, geocode and export operations

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ingest::{ingest_source, IngestReport, SourceFormat};
use crate::scheduler::{BatchScheduler, RunReport};
use sl_geocode::Resolver;
use sl_store::{export_geojson, RecordStore};
use std::path::Path;

/// Configured pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create pipeline
    ///
    /// # Errors
    /// `Config` if the configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// With cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Store handle (with feed, when configured)
    #[must_use]
    pub fn store(&self) -> RecordStore {
        let store = RecordStore::new(&self.config.store_path);
        match &self.config.feed_path {
            Some(feed) => store.with_feed(feed),
            None => store,
        }
    }

    /// Ingest a source file; format is detected from the extension when `None`
    ///
    /// # Errors
    /// See [`ingest_source`]
    pub fn ingest(
        &self,
        source: &Path,
        format: Option<SourceFormat>,
    ) -> Result<IngestReport, PipelineError> {
        let format = format.unwrap_or_else(|| SourceFormat::detect(source));
        ingest_source(
            source,
            format,
            self.config.extract.to_extractor_config(),
            &self.store(),
            &self.cancel,
        )
    }

    /// Geocode every unresolved record with the configured resolver
    ///
    /// # Errors
    /// `Config` for resolver setup problems, otherwise see [`Pipeline::geocode_with`]
    pub async fn geocode(&self) -> Result<RunReport, PipelineError> {
        let resolver = Resolver::from_config(&self.config.resolver)?;
        self.geocode_with(resolver).await
    }

    /// Geocode every unresolved record with `resolver`
    ///
    /// # Errors
    /// - `MissingInput` if the store does not exist
    /// - `PersistenceFailure` if a checkpoint or export fails
    pub async fn geocode_with(&self, resolver: Resolver) -> Result<RunReport, PipelineError> {
        let store = self.store();
        let mut records = store.load()?;

        let scheduler = BatchScheduler::new(resolver)
            .with_batch_size(self.config.batch_size)
            .with_delay(self.config.delay())
            .with_cancellation(self.cancel.clone());
        let report = scheduler.run(&mut records, &store).await?;

        if let Some(path) = &self.config.geojson_path {
            export_geojson(path, &records)?;
        }
        Ok(report)
    }

    /// Export positioned records as GeoJSON, returning the feature count
    ///
    /// # Errors
    /// `MissingInput` if the store does not exist; write failures
    pub fn export_geojson(&self, out: &Path) -> Result<usize, PipelineError> {
        let records = self.store().load()?;
        Ok(export_geojson(out, &records)?)
    }
}
