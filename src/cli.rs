use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Destination, PipelineConfig};
use crate::download::DEFAULT_URL;
use crate::load::CommitMode;
use crate::store::PostgresTarget;

#[derive(Parser, Debug)]
#[command(name = "nafstat-sync")]
#[command(version, about = "Load the NAF statistics dump into a relational database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the dump and replace the destination dataset
    Sync {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        db: DatabaseArgs,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Download and extract the dump without loading it
    Download {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Load an already extracted data directory
    Load {
        /// Directory holding the CSV exports
        source_dir: PathBuf,

        #[command(flatten)]
        db: DatabaseArgs,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Create any missing destination tables and indexes
    InitSchema {
        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// List the destination tables in load order
    ListTables,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL of the zipped dump
    #[arg(long, env = "FILE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Directory the archive is downloaded into
    #[arg(long, env = "DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Directory the archive is extracted into (emptied first)
    #[arg(long, env = "EXTRACT_DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Limit in seconds for the whole download
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 600)]
    pub fetch_timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Load into this SQLite file instead of PostgreSQL
    #[arg(long, env = "NAFSTAT_SQLITE")]
    pub sqlite: Option<PathBuf>,

    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "POSTGRES_USER", required_unless_present = "sqlite")]
    pub db_user: Option<String>,

    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "POSTGRES_DB", required_unless_present = "sqlite")]
    pub db_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Commit after each table instead of once for the whole run
    #[arg(long)]
    pub per_table_commit: bool,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl DatabaseArgs {
    /// The selected backend; `None` when PostgreSQL settings are incomplete
    pub fn destination(&self) -> Option<Destination> {
        if let Some(path) = &self.sqlite {
            return Some(Destination::Sqlite(path.clone()));
        }
        Some(Destination::Postgres(PostgresTarget {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone()?,
            password: self.db_password.clone(),
            dbname: self.db_name.clone()?,
        }))
    }
}

impl LoadArgs {
    pub fn commit_mode(&self) -> CommitMode {
        if self.per_table_commit {
            CommitMode::PerTable
        } else {
            CommitMode::Single
        }
    }
}

impl FetchArgs {
    pub fn pipeline_config(&self, commit_mode: CommitMode) -> PipelineConfig {
        PipelineConfig {
            url: self.url.clone(),
            download_dir: self.download_dir.clone(),
            extract_dir: self.extract_dir.clone(),
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            commit_mode,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
