use std::time::Duration;

use async_trait::async_trait;

use battlelens_common::{BattleLensError, Result};

/// Where snapshot bytes come from. Paths are relative to the source's root.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the raw (possibly gzip-compressed) object at `path`.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// Object store reachable over plain HTTP(S) GETs.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BattleLensError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path);
        tracing::debug!(url = %url, "Fetching snapshot");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BattleLensError::Fetch(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BattleLensError::Fetch(format!(
                "{url}: HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BattleLensError::Fetch(format!("{url}: {e}")))?;
        tracing::debug!(url = %url, bytes = bytes.len(), "Snapshot fetched");
        Ok(bytes.to_vec())
    }
}
