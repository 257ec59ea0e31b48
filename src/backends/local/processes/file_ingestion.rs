// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::errors::{DescriptorError, TransformationError};
use crate::observability::messages::process::SourceChangedDuringImport;
use crate::observability::messages::StructuredLog;
use crate::store::{ColumnSpec, ColumnType, Entry, Payload, StoreDescriptor};
use crate::traits::{Process, ProcessDescriptor, StepInput};

pub const FILES_STORE: &str = "file_table";
pub const HASH_COLUMN: &str = "blake3_hash";

/// The store of imported files, content-addressed by BLAKE3 hash.
pub fn files_store() -> Result<StoreDescriptor, DescriptorError> {
    StoreDescriptor::new(
        FILES_STORE,
        vec![
            ColumnSpec::required(HASH_COLUMN, ColumnType::Text),
            ColumnSpec::required("original_name", ColumnType::Text),
            ColumnSpec::required("file_path", ColumnType::Text),
            ColumnSpec::required("original_file_path", ColumnType::Text),
            ColumnSpec::required("file_size", ColumnType::Integer),
            ColumnSpec::required("file_extension", ColumnType::Text),
            ColumnSpec::optional("date_created", ColumnType::Text),
            ColumnSpec::required("date_modified", ColumnType::Text),
            ColumnSpec::required("import_timestamp", ColumnType::Text),
        ],
    )?
    .content_addressed(HASH_COLUMN)
}

/// Stream a file through BLAKE3 in `chunk_size` reads and return the hex digest.
pub async fn hash_file(path: &Path, chunk_size: usize) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// A file copied into managed storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedCopy {
    pub hash: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Copy `source` into `dir` as `<hash><extension>`, hashing the bytes as they
/// are written so the name always matches the content on disk.
///
/// The copy goes to a `staging_name` file first and is renamed once the hash
/// is known.
pub async fn copy_hashed(
    source: &Path,
    dir: &Path,
    extension: &str,
    staging_name: &str,
    chunk_size: usize,
) -> std::io::Result<ManagedCopy> {
    tokio::fs::create_dir_all(dir).await?;
    let staging = dir.join(format!(".{staging_name}.partial"));

    let copied = async {
        let mut reader = tokio::fs::File::open(source).await?;
        let mut writer = tokio::fs::File::create(&staging).await?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; chunk_size.max(1)];
        let mut size = 0u64;
        loop {
            let read = reader.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            writer.write_all(&buffer[..read]).await?;
            size += read as u64;
        }
        writer.flush().await?;
        Ok::<_, std::io::Error>((hasher.finalize().to_hex().to_string(), size))
    }
    .await;

    let (hash, size) = match copied {
        Ok(done) => done,
        Err(error) => {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(error);
        }
    };

    let path = dir.join(format!("{hash}{extension}"));
    tokio::fs::rename(&staging, &path).await?;
    Ok(ManagedCopy { hash, path, size })
}

/// Lower-cased extension with its leading dot, or empty.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Imports a file named by a Manual entry's `file_path` into managed storage.
///
/// The managed copy is named `<hash><extension>`, so the same bytes imported
/// under two names land on one file and one entry.
pub struct FileIngestion {
    descriptor: ProcessDescriptor,
    managed_dir: PathBuf,
    chunk_size: usize,
}

impl FileIngestion {
    pub const UID: &'static str = "file_system_integration";

    pub fn new(managed_dir: impl Into<PathBuf>, chunk_size: usize) -> Result<Self, DescriptorError> {
        let descriptor = ProcessDescriptor::new(Self::UID, StoreDescriptor::manual(), files_store()?)?
            .description("Copy a file into managed storage under its content hash");
        Ok(Self {
            descriptor,
            managed_dir: managed_dir.into(),
            chunk_size,
        })
    }

    fn source_path(entry: &Entry) -> Result<PathBuf, TransformationError> {
        entry
            .get_str("file_path")
            .map(PathBuf::from)
            .ok_or_else(|| TransformationError::MissingInput("file_path".to_string()))
    }
}

#[async_trait]
impl Process for FileIngestion {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn content_key(&self, input: &Entry) -> Result<Option<String>, TransformationError> {
        let source = Self::source_path(input)?;
        Ok(Some(hash_file(&source, self.chunk_size).await?))
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError> {
        let source = Self::source_path(input.entry)?;
        let original_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransformationError::InvalidInput(format!("{} has no file name", source.display())))?
            .to_string();
        let extension = dotted_extension(&source);

        // The payload names what was copied, even if the source changed after `content_key`.
        let copy = copy_hashed(&source, &self.managed_dir, &extension, input.key, self.chunk_size).await?;
        if let Some(expected) = input.content_key.filter(|hash| *hash != copy.hash) {
            SourceChangedDuringImport {
                source: &source,
                expected_hash: expected,
                copied_hash: &copy.hash,
            }
            .log();
        }

        let metadata = tokio::fs::metadata(&source).await?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let created: Option<DateTime<Utc>> = metadata.created().ok().map(Into::into);

        let mut payload = Payload::new();
        payload.insert(HASH_COLUMN.into(), Value::String(copy.hash));
        payload.insert("original_name".into(), Value::String(original_name));
        payload.insert("file_path".into(), Value::String(copy.path.to_string_lossy().into_owned()));
        payload.insert("original_file_path".into(), Value::String(source.to_string_lossy().into_owned()));
        payload.insert("file_size".into(), Value::from(copy.size));
        payload.insert("file_extension".into(), Value::String(extension));
        if let Some(created) = created {
            payload.insert("date_created".into(), Value::String(created.to_rfc3339()));
        }
        payload.insert("date_modified".into(), Value::String(modified.to_rfc3339()));
        payload.insert("import_timestamp".into(), Value::String(Utc::now().to_rfc3339()));
        Ok(payload)
    }
}
