use async_trait::async_trait;

use crate::errors::{DescriptorError, TransformationError};
use crate::store::validate_identifier;
use crate::store::{Entry, Payload, StoreDescriptor};

/// Static description of a transformation: what it reads, what it writes and
/// how the framework must treat it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    uid: String,
    input: StoreDescriptor,
    output: StoreDescriptor,
    repeatable: bool,
    requires_installation: bool,
    description: String,
}

impl ProcessDescriptor {
    /// Processes default to running once per input entry and needing no
    /// installation step.
    pub fn new(
        name: impl Into<String>,
        input: StoreDescriptor,
        output: StoreDescriptor,
    ) -> Result<Self, DescriptorError> {
        let uid = name.into();
        validate_identifier(&uid)?;
        if output.is_manual() {
            return Err(DescriptorError::ManualOutput { process: uid });
        }

        Ok(Self {
            uid,
            input,
            output,
            repeatable: false,
            requires_installation: false,
            description: String::new(),
        })
    }

    /// A repeatable process runs again for an input it has already handled.
    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn requires_installation(mut self, required: bool) -> Self {
        self.requires_installation = required;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn input(&self) -> &StoreDescriptor {
        &self.input
    }

    pub fn output(&self) -> &StoreDescriptor {
        &self.output
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn needs_installation(&self) -> bool {
        self.requires_installation
    }

    pub fn summary(&self) -> &str {
        &self.description
    }

    /// Root processes read user input rather than another process's output.
    pub fn is_root(&self) -> bool {
        self.input.is_manual()
    }

    /// Whether `consumer` reads what this process writes.
    pub fn feeds(&self, consumer: &ProcessDescriptor) -> bool {
        self.output.uid() == consumer.input.uid()
    }
}

/// What a transformation body sees for one step.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub key: &'a str,
    pub entry: &'a Entry,
    /// Content hash computed during dedup, if the output store is content-addressed
    pub content_key: Option<&'a str>,
}

/// A transformation from one store to another.
///
/// Implementations only compute payloads. Idempotency checks, dedup and
/// provenance stamping happen in the step executor around `compute`.
#[async_trait]
pub trait Process: Send + Sync {
    fn descriptor(&self) -> &ProcessDescriptor;

    fn uid(&self) -> &str {
        self.descriptor().uid()
    }

    /// One-time setup, run when the process is installed.
    async fn install(&self) -> Result<(), TransformationError> {
        Ok(())
    }

    /// Content hash of the object an input entry refers to. Only consulted
    /// when the output store is content-addressed.
    async fn content_key(&self, _input: &Entry) -> Result<Option<String>, TransformationError> {
        Ok(None)
    }

    async fn compute(&self, input: StepInput<'_>) -> Result<Payload, TransformationError>;
}
