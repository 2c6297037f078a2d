//! Deployment record persisted after a successful deployment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default path of the deployment record.
pub const DEFAULT_RECORD_PATH: &str = "deployment-info.json";

/// Outcome of a completed deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_address: String,
    /// The class hash assigned by the network on declare.
    pub class_hash: String,
    /// Hash of the deploy transaction.
    pub transaction_hash: String,
    pub network: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
}

impl DeploymentRecord {
    /// Create a record timestamped now.
    pub fn new(
        contract_address: String,
        class_hash: String,
        transaction_hash: String,
        network: String,
    ) -> Self {
        Self {
            contract_address,
            class_hash,
            transaction_hash,
            network,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Load a record from a file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context(format!(
            "Failed to read deployment record from {}",
            path.display()
        ))?;

        serde_json::from_str(&content).context("Failed to parse deployment record JSON")
    }
}

/// Durable storage for deployment records.
pub trait RecordWriter {
    /// Persist the record, returning where it was written.
    fn write(&self, record: &DeploymentRecord) -> Result<PathBuf>;

    /// Where the record will be written.
    fn destination(&self) -> &Path;
}

impl<W: RecordWriter + ?Sized> RecordWriter for &W {
    fn write(&self, record: &DeploymentRecord) -> Result<PathBuf> {
        (**self).write(record)
    }

    fn destination(&self) -> &Path {
        (**self).destination()
    }
}

/// Writes the record as pretty-printed JSON, replacing any previous file.
#[derive(Debug, Clone)]
pub struct JsonFileRecordWriter {
    path: PathBuf,
}

impl JsonFileRecordWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for JsonFileRecordWriter {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_PATH)
    }
}

impl RecordWriter for JsonFileRecordWriter {
    fn write(&self, record: &DeploymentRecord) -> Result<PathBuf> {
        let json =
            serde_json::to_string_pretty(record).context("Failed to serialize deployment record")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, json).context(format!(
            "Failed to write deployment record to {}",
            self.path.display()
        ))?;

        Ok(self.path.clone())
    }

    fn destination(&self) -> &Path {
        &self.path
    }
}
