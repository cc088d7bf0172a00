//! Durable storage for the report collection.
//!
//! The whole newest-first collection lives in one named record and is rewritten
//! on every save; there is no append primitive.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::StorageError;
use crate::model::SymptomReport;

/// Name of the record holding the serialized collection.
pub const RECORD_NAME: &str = "ayushlens_reports";

/// Persists and retrieves the ordered report collection.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Load the persisted collection. Missing or unreadable data yields an empty list.
    async fn load(&self) -> Vec<SymptomReport>;

    /// Durably overwrite the entire collection.
    async fn save(&self, reports: &[SymptomReport]) -> Result<(), StorageError>;
}

#[async_trait]
impl<S> ReportStore for std::sync::Arc<S>
where
    S: ReportStore + ?Sized,
{
    async fn load(&self) -> Vec<SymptomReport> {
        (**self).load().await
    }

    async fn save(&self, reports: &[SymptomReport]) -> Result<(), StorageError> {
        (**self).save(reports).await
    }
}

/// Decode a stored record, treating anything unparsable as empty.
fn decode(raw: &str, source: &str) -> Vec<SymptomReport> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(reports) => reports,
        Err(e) => {
            warn!(source, error = %e, "Stored reports are unparsable, starting empty");
            Vec::new()
        }
    }
}

/// JSON file store. Writes go to a sibling temp file which is then renamed over
/// the record, so a failed write leaves the previous collection intact.
#[derive(Debug, Clone)]
pub struct FileReportStore {
    path: PathBuf,
}

impl FileReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory, e.g. `~/.local/share/ayushlens/`.
    pub fn in_data_dir() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(default_path_in(&dir)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| RECORD_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Record path under a given data directory.
pub fn default_path_in(data_dir: &Path) -> PathBuf {
    data_dir
        .join("ayushlens")
        .join(format!("{}.json", RECORD_NAME))
}

#[async_trait]
impl ReportStore for FileReportStore {
    #[instrument(name = "report_store_load", skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Vec<SymptomReport> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored reports yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored reports, starting empty");
                return Vec::new();
            }
        };
        let reports = decode(&raw, "file");
        info!(count = reports.len(), "Loaded reports");
        reports
    }

    #[instrument(
        name = "report_store_save",
        skip(self, reports),
        fields(path = %self.path.display(), count = reports.len())
    )]
    async fn save(&self, reports: &[SymptomReport]) -> Result<(), StorageError> {
        let json = serde_json::to_string(reports)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(bytes = json.len(), "Saved reports");
        Ok(())
    }
}

/// In-memory store holding the serialized record, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    record: Mutex<Option<String>>,
    reject_writes: bool,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose record starts with the given raw contents.
    pub fn with_record(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
            reject_writes: false,
        }
    }

    /// A store that rejects every write, as a full medium would.
    pub fn failing() -> Self {
        Self {
            record: Mutex::new(None),
            reject_writes: true,
        }
    }

    /// Raw contents of the record, if any write has succeeded.
    pub fn raw(&self) -> Option<String> {
        self.record.lock().ok().and_then(|record| record.clone())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn load(&self) -> Vec<SymptomReport> {
        match self.raw() {
            Some(raw) => decode(&raw, "memory"),
            None => Vec::new(),
        }
    }

    async fn save(&self, reports: &[SymptomReport]) -> Result<(), StorageError> {
        if self.reject_writes {
            warn!("Memory store rejecting write");
            return Err(StorageError::Rejected("quota exceeded".to_string()));
        }
        let json = serde_json::to_string(reports)?;
        let mut record = self
            .record
            .lock()
            .map_err(|_| StorageError::Rejected("store lock poisoned".to_string()))?;
        *record = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_layout() {
        let path = default_path_in(Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data/ayushlens/ayushlens_reports.json"));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = FileReportStore::new("/data/reports.json");
        assert_eq!(store.temp_path(), PathBuf::from("/data/reports.json.tmp"));
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        assert!(decode("{not json", "test").is_empty());
        assert!(decode("", "test").is_empty());
        assert!(decode("{\"id\": \"x\"}", "test").is_empty());
    }

    #[tokio::test]
    async fn test_failing_store_keeps_nothing() {
        let store = MemoryReportStore::failing();
        let err = store.save(&[]).await.unwrap_err();
        assert_eq!(err, StorageError::Rejected("quota exceeded".to_string()));
        assert!(store.raw().is_none());
    }
}
