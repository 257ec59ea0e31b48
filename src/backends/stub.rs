// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TransformationError;
use crate::store::{ColumnSpec, ColumnType, Entry, Payload, StoreDescriptor};
use crate::traits::{Process, ProcessDescriptor, StepInput};

/// A store with a single required `text` column.
pub fn text_store(name: &str) -> StoreDescriptor {
    StoreDescriptor::new(name, vec![ColumnSpec::required("text", ColumnType::Text)])
        .expect("valid test store")
}

/// A content-addressed store keyed by a `digest` column.
pub fn digest_store(name: &str) -> StoreDescriptor {
    StoreDescriptor::new(
        name,
        vec![
            ColumnSpec::required("digest", ColumnType::Text),
            ColumnSpec::required("text", ColumnType::Text),
        ],
    )
    .and_then(|s| s.content_addressed("digest"))
    .expect("valid test store")
}

fn input_text(entry: &Entry) -> Result<String, TransformationError> {
    entry
        .get_str("text")
        .map(str::to_string)
        .ok_or_else(|| TransformationError::MissingInput("text".to_string()))
}

/// Copies the input `text` upper-cased and counts how often it ran.
pub struct StubProcess {
    descriptor: ProcessDescriptor,
    pub calls: AtomicUsize,
}

impl StubProcess {
    pub fn new(uid: &str, input: StoreDescriptor, output: StoreDescriptor) -> Self {
        Self::with_descriptor(ProcessDescriptor::new(uid, input, output).expect("valid test process"))
    }

    pub fn with_descriptor(descriptor: ProcessDescriptor) -> Self {
        Self {
            descriptor,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Process for StubProcess {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut payload = Payload::new();
        payload.insert("text".into(), Value::String(input_text(input.entry)?.to_uppercase()));
        Ok(payload)
    }
}

/// Always fails in `compute`.
pub struct FailingProcess {
    descriptor: ProcessDescriptor,
}

impl FailingProcess {
    pub fn new(uid: &str, input: StoreDescriptor, output: StoreDescriptor) -> Self {
        Self {
            descriptor: ProcessDescriptor::new(uid, input, output).expect("valid test process"),
        }
    }
}

#[async_trait]
impl Process for FailingProcess {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn compute(&self, _input: StepInput<'_>) -> Result<Payload, TransformationError> {
        Err(TransformationError::Failed("simulated failure".to_string()))
    }
}

/// Requires installation; the install step can be told to fail.
pub struct InstallableProcess {
    descriptor: ProcessDescriptor,
    fail_install: bool,
    pub installs: AtomicUsize,
}

impl InstallableProcess {
    pub fn new(uid: &str, input: StoreDescriptor, output: StoreDescriptor, fail_install: bool) -> Self {
        Self {
            descriptor: ProcessDescriptor::new(uid, input, output)
                .expect("valid test process")
                .requires_installation(true),
            fail_install,
            installs: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Process for InstallableProcess {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn install(&self) -> Result<(), TransformationError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        if self.fail_install {
            return Err(TransformationError::Failed("model download failed".to_string()));
        }
        Ok(())
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError> {
        let mut payload = Payload::new();
        payload.insert("text".into(), Value::String(input_text(input.entry)?));
        Ok(payload)
    }
}

/// Writes into a content-addressed store, keyed by the BLAKE3 hash of the
/// input text.
pub struct DigestProcess {
    descriptor: ProcessDescriptor,
    pub calls: AtomicUsize,
}

impl DigestProcess {
    pub fn new(uid: &str, input: StoreDescriptor, output: StoreDescriptor) -> Self {
        Self {
            descriptor: ProcessDescriptor::new(uid, input, output).expect("valid test process"),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Process for DigestProcess {
    fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    async fn content_key(&self, input: &Entry) -> Result<Option<String>, TransformationError> {
        let text = input_text(input)?;
        Ok(Some(blake3::hash(text.as_bytes()).to_hex().to_string()))
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let digest = input
            .content_key
            .ok_or_else(|| TransformationError::MissingInput("digest".to_string()))?;
        let mut payload = Payload::new();
        payload.insert("digest".into(), Value::String(digest.to_string()));
        payload.insert("text".into(), Value::String(input_text(input.entry)?));
        Ok(payload)
    }
}
