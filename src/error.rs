//! Error taxonomy for the ingestion pipeline.
//!
//! Every stage fails fast: the first error aborts the run and is surfaced to
//! the operator with its full source chain.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Busy(#[from] BusyError),

    #[error("could not connect to the database")]
    Connect(#[source] DbError),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

/// Network or HTTP failure while retrieving the dump
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building the HTTP client failed")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("reading the response body from {url} failed")]
    Body {
        url: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[error("archive {path:?} is corrupt or incomplete")]
pub struct ExtractError {
    pub path: PathBuf,
    #[source]
    pub source: zip::result::ZipError,
}

/// The extracted archive does not have exactly one data directory
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no data directory found in {0:?}")]
    Missing(PathBuf),

    #[error("expected one data directory in {root:?}, found {found:?}")]
    Ambiguous { root: PathBuf, found: Vec<String> },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{file}: column `{column}` expects source header `{header}`, which is missing")]
    MissingColumn {
        file: String,
        column: &'static str,
        header: &'static str,
    },

    #[error("{file}: malformed CSV")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: line {line}: `{value}` is not a valid {kind} for column `{column}`")]
    InvalidValue {
        file: String,
        line: u64,
        column: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("table `{table}` has no column `{column}`")]
    Template { table: &'static str, column: String },
}

/// A database failure attributed to the table being loaded
#[derive(Debug, Error)]
#[error("loading table `{table}` failed")]
pub struct LoadError {
    pub table: String,
    #[source]
    pub source: DbError,
}

impl LoadError {
    pub fn new(table: impl Into<String>, source: impl Into<DbError>) -> Self {
        Self {
            table: table.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("encoding COPY data failed")]
    Encode(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("table `{0}` appears twice in the load plan")]
    Duplicate(&'static str),

    #[error("table `{table}` references `{parent}`, which is not in the load plan")]
    UnknownParent {
        table: &'static str,
        parent: &'static str,
    },

    #[error("table `{table}` (rank {rank}) must rank above its parent `{parent}` (rank {parent_rank})")]
    RankOrder {
        table: &'static str,
        rank: u8,
        parent: &'static str,
        parent_rank: u8,
    },
}

#[derive(Debug, Error)]
#[error("another ingestion run holds the run lock")]
pub struct BusyError;
