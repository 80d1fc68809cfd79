//! In-memory snapshot source for tests that should not touch the network.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

use battlelens_common::{BattleLensError, Result};

use crate::source::SnapshotSource;

#[derive(Default)]
pub struct MemorySnapshotSource {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemorySnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `csv` gzip-compressed under `path`.
    pub fn with_csv(self, path: &str, csv: &str) -> Self {
        self.put(path, gzip(csv.as_bytes()));
        self
    }

    pub fn put(&self, path: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .expect("memory source lock poisoned")
            .insert(path.to_string(), bytes);
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for MemorySnapshotSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .expect("memory source lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| BattleLensError::Fetch(format!("{path}: HTTP 404")))
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory gzip cannot fail");
    encoder.finish().expect("in-memory gzip cannot fail")
}
