/// Database file used when the config names none
pub const DEFAULT_DATABASE_PATH: &str = "data/database.sqlite3";
/// One connection: every store shares a single handle
pub const DEFAULT_MAX_CONNECTIONS: u32 = 1;
/// Where imported files are copied
pub const DEFAULT_MANAGED_DIR: &str = "data/client_files";
/// Read size for streaming content hashes (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// Upper bound on the hashing buffer (16 MiB)
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tagsense.yaml";
