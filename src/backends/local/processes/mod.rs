pub mod file_ingestion;
pub mod file_metadata;

pub use file_ingestion::FileIngestion;
pub use file_metadata::ExtractFileMetadata;
