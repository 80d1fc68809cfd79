use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{BattleLensError, Result};

/// A known snapshot: registry key plus its path under the object-store base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub key: String,
    pub path: String,
}

impl Dataset {
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Built-in snapshots, in display order. The first entry is the default.
const BUILTIN_DATASETS: &[(&str, &str)] = &[
    ("arena", "arena/table_data.csv.gz"),
    ("webdev", "webdev/table_data.csv.gz"),
    ("wildbench", "wildbench/table_data.csv.gz"),
];

/// Fixed set of dataset keys the service will fetch. Unknown keys are a
/// configuration error, never an empty result.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    datasets: Vec<Dataset>,
    default_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetsFile {
    default: Option<String>,
    datasets: BTreeMap<String, String>,
}

impl DatasetRegistry {
    pub fn builtin() -> Self {
        let datasets = BUILTIN_DATASETS
            .iter()
            .map(|(key, path)| Dataset {
                key: key.to_string(),
                path: path.to_string(),
            })
            .collect();
        Self {
            datasets,
            default_key: BUILTIN_DATASETS[0].0.to_string(),
        }
    }

    pub fn new(datasets: Vec<Dataset>, default_key: &str) -> Result<Self> {
        if !datasets.iter().any(|d| d.key == default_key) {
            return Err(BattleLensError::unknown_dataset(default_key));
        }
        Ok(Self {
            datasets,
            default_key: default_key.to_string(),
        })
    }

    /// Parse a TOML registry:
    ///
    /// ```toml
    /// default = "arena"
    /// [datasets]
    /// arena = "arena/table_data.csv.gz"
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: DatasetsFile = toml::from_str(content)
            .map_err(|e| BattleLensError::Config(format!("invalid datasets file: {e}")))?;
        if file.datasets.is_empty() {
            return Err(BattleLensError::Config(
                "datasets file declares no datasets".to_string(),
            ));
        }
        let datasets: Vec<Dataset> = file
            .datasets
            .into_iter()
            .map(|(key, path)| Dataset { key, path })
            .collect();
        let default_key = file.default.unwrap_or_else(|| datasets[0].key.clone());
        Self::new(datasets, &default_key)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read datasets file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Override the default key; it must already be registered.
    pub fn with_default(self, key: &str) -> Result<Self> {
        Self::new(self.datasets, key)
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Look up a dataset, falling back to the default when no key is given.
    pub fn resolve(&self, key: Option<&str>) -> Result<&Dataset> {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.default_key);
        self.datasets
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| BattleLensError::unknown_dataset(key))
    }
}
