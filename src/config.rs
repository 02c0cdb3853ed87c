//! Run configuration, independent of how it was supplied (flags, env, tests)

use std::path::PathBuf;
use std::time::Duration;

use crate::download::DEFAULT_URL;
use crate::load::CommitMode;
use crate::store::PostgresTarget;

/// Whole-request limit for the archive download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Where the dataset is loaded
#[derive(Debug, Clone)]
pub enum Destination {
    Sqlite(PathBuf),
    Postgres(PostgresTarget),
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Sqlite(path) => write!(f, "sqlite:{}", path.display()),
            Destination::Postgres(t) => write!(f, "postgres://{}@{}:{}/{}", t.user, t.host, t.port, t.dbname),
        }
    }
}

/// Settings for the fetch and load stages
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub url: String,
    pub download_dir: Option<PathBuf>,
    pub extract_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub commit_mode: CommitMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            download_dir: None,
            extract_dir: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            commit_mode: CommitMode::default(),
        }
    }
}
