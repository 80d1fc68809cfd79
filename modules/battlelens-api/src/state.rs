use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use battlelens_analytics::{Clock, SystemClock, TtlCache};
use battlelens_common::{Config, Dataset, DatasetRegistry, Result, Row};
use battlelens_snapshot::{load_rows, SnapshotSource};

use crate::rest::chart_data::ChartDataResponse;
use crate::rest::keyword_search::KeywordSearchResponse;

#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub responses: Duration,
    pub rows: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            responses: Duration::minutes(30),
            rows: Duration::minutes(60),
        }
    }
}

impl CacheTtls {
    pub fn from_config(config: &Config) -> Self {
        Self {
            responses: Duration::seconds(config.response_cache_ttl_secs),
            rows: Duration::seconds(config.rows_cache_ttl_secs),
        }
    }
}

pub struct AppState {
    pub source: Arc<dyn SnapshotSource>,
    pub registry: DatasetRegistry,
    pub rows_cache: Mutex<TtlCache<Arc<Vec<Row>>>>,
    pub chart_cache: Mutex<TtlCache<ChartDataResponse>>,
    pub search_cache: Mutex<TtlCache<KeywordSearchResponse>>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        registry: DatasetRegistry,
        ttls: CacheTtls,
    ) -> Self {
        Self::with_clock(source, registry, ttls, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn SnapshotSource>,
        registry: DatasetRegistry,
        ttls: CacheTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            registry,
            rows_cache: Mutex::new(TtlCache::new(ttls.rows, clock.clone())),
            chart_cache: Mutex::new(TtlCache::new(ttls.responses, clock.clone())),
            search_cache: Mutex::new(TtlCache::new(ttls.responses, clock)),
        }
    }

    /// Parsed rows for a dataset, fetched on a miss or after the rows TTL.
    pub async fn rows_for(&self, dataset: &Dataset) -> Result<Arc<Vec<Row>>> {
        let cached = self.rows_cache.lock().await.get(&dataset.key);
        if let Some(rows) = cached {
            debug!(dataset = %dataset.key, rows = rows.len(), "Rows cache hit");
            return Ok(rows);
        }

        let rows = Arc::new(load_rows(self.source.as_ref(), dataset).await?);
        self.rows_cache
            .lock()
            .await
            .insert(dataset.key.clone(), rows.clone());
        Ok(rows)
    }

    /// Drop every cached snapshot and response.
    pub async fn clear_caches(&self) {
        self.rows_cache.lock().await.clear();
        self.chart_cache.lock().await.clear();
        self.search_cache.lock().await.clear();
    }
}
