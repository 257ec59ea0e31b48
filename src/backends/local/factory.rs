use std::sync::Arc;

use crate::config::StorageConfig;
use crate::errors::{ConfigError, DescriptorError};
use crate::traits::Process;
use super::processes::*;

/// Factory for the built-in (in-process) transformations
pub struct LocalProcessFactory;

impl LocalProcessFactory {
    /// Build every built-in process, in registration order.
    pub fn catalog(storage: &StorageConfig) -> Result<Vec<Arc<dyn Process>>, DescriptorError> {
        let mut processes = Vec::new();
        for uid in Self::list_available_implementations() {
            if let Some(process) = Self::build(uid, storage)? {
                processes.push(process);
            }
        }
        Ok(processes)
    }

    /// Create one built-in process by uid
    ///
    /// - "file_system_integration" -> FileIngestion
    /// - "extract_file_metadata" -> ExtractFileMetadata
    pub fn create_process(uid: &str, storage: &StorageConfig) -> Result<Arc<dyn Process>, ConfigError> {
        Self::build(uid, storage)?.ok_or_else(|| ConfigError::UnknownProcess {
            uid: uid.to_string(),
        })
    }

    fn build(uid: &str, storage: &StorageConfig) -> Result<Option<Arc<dyn Process>>, DescriptorError> {
        let process: Arc<dyn Process> = match uid {
            FileIngestion::UID => Arc::new(FileIngestion::new(&storage.managed_dir, storage.chunk_size)?),
            ExtractFileMetadata::UID => Arc::new(ExtractFileMetadata::new()?),
            _ => return Ok(None),
        };
        Ok(Some(process))
    }

    /// List all built-in process uids
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![FileIngestion::UID, ExtractFileMetadata::UID]
    }

    /// Check if a built-in process exists
    pub fn is_implementation_available(uid: &str) -> bool {
        Self::list_available_implementations().contains(&uid)
    }
}
