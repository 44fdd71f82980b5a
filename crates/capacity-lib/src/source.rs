//! Snapshot sources
//!
//! Tenants, integrations and storage are fetched independently. A failure in
//! one source falls back to that source's empty snapshot and records the
//! error, leaving the other two untouched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::health::components;
use crate::models::{IntegrationsSnapshot, StorageSnapshot, TenantsSnapshot};

pub const TENANTS_FILE: &str = "tenants.json";
pub const INTEGRATIONS_FILE: &str = "integrations.json";
pub const STORAGE_FILE: &str = "hdfs.json";

/// Errors raised while fetching a snapshot
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {name} snapshot: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to fetch {name} snapshot: {message}")]
    Fetch { name: &'static str, message: String },
}

/// Parse a snapshot payload
pub fn parse_snapshot<T: DeserializeOwned>(name: &'static str, bytes: &[u8]) -> Result<T, SourceError> {
    serde_json::from_slice(bytes).map_err(|source| SourceError::Parse { name, source })
}

/// Provider of the three snapshot payloads
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn tenants(&self) -> Result<TenantsSnapshot, SourceError>;

    async fn integrations(&self) -> Result<IntegrationsSnapshot, SourceError>;

    async fn storage(&self) -> Result<StorageSnapshot, SourceError>;
}

/// Reads snapshots from JSON files in a directory
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, name: &'static str, file: &str) -> Result<T, SourceError> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Io { path, source })?;
        parse_snapshot(name, &bytes)
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn tenants(&self) -> Result<TenantsSnapshot, SourceError> {
        self.read(components::TENANTS, TENANTS_FILE).await
    }

    async fn integrations(&self) -> Result<IntegrationsSnapshot, SourceError> {
        self.read(components::INTEGRATIONS, INTEGRATIONS_FILE).await
    }

    async fn storage(&self) -> Result<StorageSnapshot, SourceError> {
        self.read(components::STORAGE, STORAGE_FILE).await
    }
}

/// Latest outcome of fetching one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceState<T> {
    /// Fetched snapshot, or the empty default when the fetch failed
    pub data: T,
    /// When `data` was last fetched successfully
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Default + Clone> SourceState<T> {
    pub fn from_result(result: Result<T, SourceError>, now: DateTime<Utc>) -> Self {
        match result {
            Ok(data) => Self {
                data,
                fetched_at: Some(now),
                error: None,
            },
            Err(err) => Self {
                data: T::default(),
                fetched_at: None,
                error: Some(err.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// After a failed fetch, keep serving the data from `previous` if it was
    /// ever fetched successfully. The new error is kept either way.
    pub fn retain_last_good(&mut self, previous: &Self) {
        if self.is_ok() || previous.fetched_at.is_none() {
            return;
        }
        self.data = previous.data.clone();
        self.fetched_at = previous.fetched_at;
    }
}

/// The three independently fetched snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    pub tenants: SourceState<TenantsSnapshot>,
    pub integrations: SourceState<IntegrationsSnapshot>,
    pub storage: SourceState<StorageSnapshot>,
}

impl SnapshotSet {
    /// Per-source errors keyed by component name
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        [
            (components::TENANTS, self.tenants.error.as_deref()),
            (components::INTEGRATIONS, self.integrations.error.as_deref()),
            (components::STORAGE, self.storage.error.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, error)| error.map(|e| (name, e)))
        .collect()
    }

    /// Error for one source, if its latest fetch failed
    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors()
            .into_iter()
            .find(|(source, _)| *source == name)
            .map(|(_, error)| error)
    }

    /// True when no source was fetched on the latest attempt
    pub fn all_failed(&self) -> bool {
        self.errors().len() == components::ALL.len()
    }

    /// Fall back to `previous` for every source whose latest fetch failed
    pub fn retain_last_good(&mut self, previous: &SnapshotSet) {
        self.tenants.retain_last_good(&previous.tenants);
        self.integrations.retain_last_good(&previous.integrations);
        self.storage.retain_last_good(&previous.storage);
    }
}

/// Fetch all three snapshots concurrently
pub async fn load_snapshots(source: &dyn SnapshotSource, now: DateTime<Utc>) -> SnapshotSet {
    let (tenants, integrations, storage) =
        tokio::join!(source.tenants(), source.integrations(), source.storage());

    let set = SnapshotSet {
        tenants: SourceState::from_result(tenants, now),
        integrations: SourceState::from_result(integrations, now),
        storage: SourceState::from_result(storage, now),
    };

    for (name, error) in set.errors() {
        warn!(source = name, error = %error, "Snapshot unavailable, using empty defaults");
    }
    debug!(
        tenants = set.tenants.data.tenants.len(),
        integrations = set.integrations.data.integrations.len(),
        "Snapshots loaded"
    );

    set
}
