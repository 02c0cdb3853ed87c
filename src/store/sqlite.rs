use rusqlite::Connection;
use std::path::Path;

use super::schema_gen::{
    generate_create_table, generate_indexes, generate_insert, generate_insert_ignore,
    generate_truncate,
};
use super::{Dialect, RowStream, Store};
use crate::error::{DbError, Error, LoadError};
use crate::parser::Record;
use crate::schema::TableSchema;

/// SQLite destination, for local targets and tests
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file, keeping existing contents
    pub fn open(db_path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(db_path)?;

        // Enable foreign keys and optimize for bulk insert
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    // SQLite serializes writers itself; `begin` takes the write lock up front.
    fn try_lock_run(&mut self) -> Result<bool, DbError> {
        Ok(true)
    }

    fn unlock_run(&mut self) -> Result<(), DbError> {
        Ok(())
    }

    fn create_tables(&mut self, tables: &[&TableSchema]) -> Result<(), LoadError> {
        for schema in tables {
            let sql = generate_create_table(schema, Dialect::Sqlite);
            self.conn
                .execute(&sql, [])
                .map_err(|e| LoadError::new(schema.name, e))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .map_err(|e| LoadError::new(schema.name, e))?;
            }
        }

        Ok(())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn truncate(&mut self, tables: &[&TableSchema]) -> Result<(), DbError> {
        for sql in generate_truncate(tables, Dialect::Sqlite) {
            self.conn.execute(&sql, [])?;
        }
        Ok(())
    }

    fn bulk_load(&mut self, table: &TableSchema, rows: &mut RowStream<'_>) -> Result<u64, Error> {
        let fail = |e: rusqlite::Error| Error::from(LoadError::new(table.name, e));

        let sql = generate_insert(table);
        let mut stmt = self.conn.prepare_cached(&sql).map_err(fail)?;
        let mut count: u64 = 0;

        for row in rows {
            let row = row?;
            for (idx, value) in row.values.iter().enumerate() {
                value.bind_to(idx + 1, &mut stmt).map_err(fail)?;
            }
            stmt.raw_execute().map_err(fail)?;
            count += 1;
        }

        Ok(count)
    }

    fn insert_missing(&mut self, table: &TableSchema, rows: &[Record]) -> Result<u64, DbError> {
        let sql = generate_insert_ignore(table, Dialect::Sqlite);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut inserted: u64 = 0;

        for row in rows {
            for (idx, value) in row.values.iter().enumerate() {
                value.bind_to(idx + 1, &mut stmt)?;
            }
            inserted += stmt.raw_execute()? as u64;
        }

        Ok(inserted)
    }

    fn integer_values(&mut self, table: &TableSchema, column: &str) -> Result<Vec<i64>, DbError> {
        let sql = format!("SELECT {} FROM {} WHERE {} IS NOT NULL", column, table.name, column);
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    fn count_rows(&mut self, table: &TableSchema) -> Result<u64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
