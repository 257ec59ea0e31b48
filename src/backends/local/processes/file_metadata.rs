// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::backends::local::processes::file_ingestion::{dotted_extension, files_store};
use crate::errors::{DescriptorError, TransformationError};
use crate::store::{ColumnSpec, ColumnType, Payload, StoreDescriptor};
use crate::traits::{Process, ProcessDescriptor, StepInput};

pub const METADATA_STORE: &str = "file_core_metadata";

pub fn metadata_store() -> Result<StoreDescriptor, DescriptorError> {
    StoreDescriptor::new(
        METADATA_STORE,
        vec![ColumnSpec::required("metadata", ColumnType::Json)],
    )
}

/// Broad media category of a file, judged by extension.
pub fn media_kind(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" | ".png" | ".gif" | ".bmp" | ".tiff" | ".tif" | ".webp" | ".heic" => "image",
        ".mp4" | ".mov" | ".avi" | ".mkv" | ".webm" => "video",
        ".mp3" | ".wav" | ".flac" | ".ogg" | ".m4a" => "audio",
        ".pdf" | ".txt" | ".md" | ".doc" | ".docx" | ".odt" => "document",
        _ => "other",
    }
}

/// Reads filesystem metadata of an imported file's managed copy.
pub struct ExtractFileMetadata {
    descriptor: ProcessDescriptor,
}

impl ExtractFileMetadata {
    pub const UID: &'static str = "extract_file_metadata";

    pub fn new() -> Result<Self, DescriptorError> {
        let descriptor = ProcessDescriptor::new(Self::UID, files_store()?, metadata_store()?)?
            .description("Record size, type and timestamps of an imported file");
        Ok(Self { descriptor })
    }
}

#[async_trait]
impl Process for ExtractFileMetadata {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError> {
        let path = input
            .entry
            .get_str("file_path")
            .map(PathBuf::from)
            .ok_or_else(|| TransformationError::MissingInput("file_path".to_string()))?;
        let extension = match input.entry.get_str("file_extension") {
            Some(ext) => ext.to_lowercase(),
            None => dotted_extension(&path),
        };

        let metadata = tokio::fs::metadata(&path).await?;
        let modified: DateTime<Utc> = metadata.modified()?.into();

        let mut payload = Payload::new();
        payload.insert(
            "metadata".into(),
            json!({
                "size": metadata.len(),
                "extension": extension,
                "kind": media_kind(&extension),
                "modified": modified.to_rfc3339(),
                "read_only": metadata.permissions().readonly(),
            }),
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Entry, Provenance};
    use tempfile::TempDir;

    #[test]
    fn test_media_kind() {
        let cases = vec![
            (".jpg", "image"),
            (".tif", "image"),
            (".mov", "video"),
            (".flac", "audio"),
            (".pdf", "document"),
            (".xyz", "other"),
            ("", "other"),
        ];
        for (extension, kind) in cases {
            assert_eq!(media_kind(extension), kind, "extension {extension:?}");
        }
    }

    #[tokio::test]
    async fn test_compute_reports_file_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.jpg");
        std::fs::write(&path, b"12345").unwrap();

        let mut data = Payload::new();
        data.insert("file_path".into(), Value::String(path.to_string_lossy().into_owned()));
        data.insert("file_extension".into(), Value::String(".jpg".into()));
        let entry = Entry {
            entry_key: "file-1".to_string(),
            provenance: Provenance::manual(),
            data,
        };

        let process = ExtractFileMetadata::new().unwrap();
        let payload = process
            .compute(StepInput {
                key: "file-1",
                entry: &entry,
                content_key: None,
            })
            .await
            .unwrap();

        let metadata = &payload["metadata"];
        assert_eq!(metadata["size"], 5);
        assert_eq!(metadata["extension"], ".jpg");
        assert_eq!(metadata["kind"], "image");
        assert_eq!(metadata["read_only"], false);
        assert!(metadata_store().unwrap().validate_create(&payload).is_ok());
    }
}
