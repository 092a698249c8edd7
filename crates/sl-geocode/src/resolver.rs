//! Ordered multi-strategy resolver

use crate::config::ResolverConfig;
use crate::error::SetupError;
use crate::query::AddressQuery;
use crate::service::GeocodingService;
use crate::strategy::{
    CentroidFallback, PrimaryQuery, Resolution, ResolutionStrategy, SimplifiedQuery,
};
use sl_record::ServiceLineRecord;
use std::sync::Arc;

/// Threads an address through strategies until one succeeds
///
/// First success wins; later strategies are never invoked. Failures are
/// logged and fall through, so `resolve` itself never errors.
#[derive(Debug, Clone)]
pub struct Resolver {
    strategies: Vec<Arc<dyn ResolutionStrategy>>,
    region: String,
}

impl Resolver {
    /// Start building a resolver
    #[inline]
    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Assemble the standard primary → simplified → centroid chain
    ///
    /// # Errors
    /// [`SetupError`] if the service or centroid table cannot be built
    pub fn from_config(config: &ResolverConfig) -> Result<Self, SetupError> {
        let service = config.build_service()?;
        let centroid = CentroidFallback::new(config.centroid_table.build()?)
            .with_confidence(config.centroid_confidence)
            .with_jitter(config.jitter_degrees);

        let resolver = Self::builder()
            .with_region(config.region.clone())
            .with_service(service, config.simplify)
            .with_strategy(centroid)
            .build();

        tracing::info!(
            service = ?config.service,
            endpoint = %config.endpoint(),
            strategies = ?resolver.strategy_names(),
            "resolver configured"
        );
        Ok(resolver)
    }

    /// Strategy names in attempt order
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Region appended to queries
    #[inline]
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resolve an address in its locality
    pub async fn resolve(&self, address: &str, town: &str, zip: &str) -> Resolution {
        let query = AddressQuery::new(address, town, zip, self.region.as_str());
        self.resolve_query(&query).await
    }

    /// Resolve a stored record's address
    pub async fn resolve_record(&self, record: &ServiceLineRecord) -> Resolution {
        let query = AddressQuery::from_record(record, &self.region);
        self.resolve_query(&query).await
    }

    /// Resolve a prepared query
    pub async fn resolve_query(&self, query: &AddressQuery) -> Resolution {
        for strategy in &self.strategies {
            match strategy.attempt(query).await {
                Ok(Some(geocode)) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        source = %geocode.source,
                        address = %query.address,
                        "resolved"
                    );
                    return Resolution::Resolved(geocode);
                }
                Ok(None) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        address = %query.address,
                        "no match"
                    );
                }
                Err(failure) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        address = %query.address,
                        retryable = failure.is_retryable(),
                        error = %failure,
                        "strategy failed, falling through"
                    );
                }
            }
        }
        Resolution::Unresolved
    }
}

/// Builder for [`Resolver`]
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    strategies: Vec<Arc<dyn ResolutionStrategy>>,
    region: Option<String>,
}

impl ResolverBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With query region (default `NY`)
    #[inline]
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Append a strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ResolutionStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Append a shared strategy
    #[must_use]
    pub fn with_shared_strategy(mut self, strategy: Arc<dyn ResolutionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Append primary and, optionally, simplified strategies over `service`
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn GeocodingService>, simplify: bool) -> Self {
        let primary = PrimaryQuery::new(Arc::clone(&service));
        self.strategies.push(Arc::new(primary));
        if simplify {
            let simplified = SimplifiedQuery::new(service);
            self.strategies.push(Arc::new(simplified));
        }
        self
    }

    /// Build resolver
    #[must_use]
    pub fn build(self) -> Resolver {
        Resolver {
            strategies: self.strategies,
            region: self.region.unwrap_or_else(|| "NY".to_string()),
        }
    }
}
