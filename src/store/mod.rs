//! Destination database backends.
//!
//! The loader only talks to [`Store`]; PostgreSQL is the production target,
//! SQLite serves local runs and the test suite.

pub mod postgres;
pub mod schema_gen;
pub mod sqlite;

pub use postgres::{PostgresStore, PostgresTarget};
pub use sqlite::SqliteStore;

use crate::error::{DbError, Error, LoadError, ParseError};
use crate::parser::Record;
use crate::schema::TableSchema;

/// Rows are handed to the store in chunks of this size
pub const BATCH_SIZE: usize = 1000;

/// SQL dialect spoken by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// Stream of transformed rows for one table
pub type RowStream<'a> = dyn Iterator<Item = Result<Record, ParseError>> + 'a;

pub trait Store {
    fn dialect(&self) -> Dialect;

    /// Take the run-level exclusive lock; `false` if another run holds it
    fn try_lock_run(&mut self) -> Result<bool, DbError>;

    /// Release the lock taken by `try_lock_run`
    fn unlock_run(&mut self) -> Result<(), DbError>;

    /// Create missing tables and FK indexes, parents first
    fn create_tables(&mut self, tables: &[&TableSchema]) -> Result<(), LoadError>;

    fn begin(&mut self) -> Result<(), DbError>;
    fn commit(&mut self) -> Result<(), DbError>;
    fn rollback(&mut self) -> Result<(), DbError>;

    /// Empty every table in one operation; `tables` is in load order
    fn truncate(&mut self, tables: &[&TableSchema]) -> Result<(), DbError>;

    /// Set-based insert of every row of `rows`; returns the row count
    fn bulk_load(&mut self, table: &TableSchema, rows: &mut RowStream<'_>) -> Result<u64, Error>;

    /// Insert rows, skipping any whose primary key already exists; returns
    /// how many were inserted
    fn insert_missing(&mut self, table: &TableSchema, rows: &[Record]) -> Result<u64, DbError>;

    /// All values of an integer column
    fn integer_values(&mut self, table: &TableSchema, column: &str) -> Result<Vec<i64>, DbError>;

    fn count_rows(&mut self, table: &TableSchema) -> Result<u64, DbError>;
}
