use bytes::Bytes;
use futures::{pin_mut, SinkExt};
use tokio::runtime::Runtime;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, CopyInSink, NoTls};

use super::schema_gen::{
    generate_copy, generate_create_table, generate_indexes, generate_insert_ignore,
    generate_truncate,
};
use super::{Dialect, RowStream, Store, BATCH_SIZE};
use crate::error::{DbError, Error, LoadError};
use crate::parser::Record;
use crate::schema::TableSchema;

/// Advisory lock key held for the duration of an ingestion run
const RUN_LOCK_KEY: i64 = 0x6e61_6673_7461_74;

/// Connection settings for the PostgreSQL destination
#[derive(Debug, Clone)]
pub struct PostgresTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
}

/// PostgreSQL destination, loaded through `COPY ... FROM STDIN`.
///
/// The store owns a current-thread runtime and blocks on it for every call,
/// so callers stay synchronous.
pub struct PostgresStore {
    runtime: Runtime,
    client: Client,
}

impl PostgresStore {
    pub fn connect(target: &PostgresTarget) -> Result<Self, DbError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut config = tokio_postgres::Config::new();
        config
            .host(&target.host)
            .port(target.port)
            .user(&target.user)
            .dbname(&target.dbname)
            .application_name("nafstat-sync");
        if let Some(password) = &target.password {
            config.password(password);
        }

        let (client, connection) = runtime.block_on(config.connect(NoTls))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection closed");
            }
        });

        tracing::debug!(host = %target.host, db = %target.dbname, "connected to postgres");
        Ok(Self { runtime, client })
    }

    fn batch_execute(&self, sql: &str) -> Result<(), tokio_postgres::Error> {
        self.runtime.block_on(self.client.batch_execute(sql))
    }
}

/// Encode a chunk of rows as CSV for COPY; unquoted empty fields are NULL
fn encode_rows(rows: &[Record]) -> Result<Bytes, DbError> {
    let mut writer = csv::Writer::from_writer(Vec::with_capacity(rows.len() * 128));
    for row in rows {
        writer.write_record(
            row.values
                .iter()
                .map(|v| v.to_text().unwrap_or_default()),
        )?;
    }
    let buf = writer.into_inner().map_err(|e| DbError::Io(e.into_error()))?;
    Ok(Bytes::from(buf))
}

impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn try_lock_run(&mut self) -> Result<bool, DbError> {
        let row = self.runtime.block_on(
            self.client
                .query_one("SELECT pg_try_advisory_lock($1)", &[&RUN_LOCK_KEY]),
        )?;
        Ok(row.get(0))
    }

    fn unlock_run(&mut self) -> Result<(), DbError> {
        let row = self.runtime.block_on(
            self.client
                .query_one("SELECT pg_advisory_unlock($1)", &[&RUN_LOCK_KEY]),
        )?;
        if !row.get::<_, bool>(0) {
            tracing::warn!("run lock was not held by this session");
        }
        Ok(())
    }

    fn create_tables(&mut self, tables: &[&TableSchema]) -> Result<(), LoadError> {
        for schema in tables {
            let mut sql = generate_create_table(schema, Dialect::Postgres);
            for index_sql in generate_indexes(schema) {
                sql.push_str(";\n");
                sql.push_str(&index_sql);
            }
            self.batch_execute(&sql)
                .map_err(|e| LoadError::new(schema.name, e))?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        Ok(self.batch_execute("BEGIN")?)
    }

    fn commit(&mut self) -> Result<(), DbError> {
        Ok(self.batch_execute("COMMIT")?)
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        // Outside a transaction this only raises a server-side warning
        Ok(self.batch_execute("ROLLBACK")?)
    }

    fn truncate(&mut self, tables: &[&TableSchema]) -> Result<(), DbError> {
        for sql in generate_truncate(tables, Dialect::Postgres) {
            self.batch_execute(&sql)?;
        }
        Ok(())
    }

    fn bulk_load(&mut self, table: &TableSchema, rows: &mut RowStream<'_>) -> Result<u64, Error> {
        let copy = generate_copy(table);
        let client = &self.client;

        self.runtime.block_on(async {
            let sink: CopyInSink<Bytes> = client
                .copy_in(copy.as_str())
                .await
                .map_err(|e| LoadError::new(table.name, e))?;
            pin_mut!(sink);

            // Dropping the sink before `finish` aborts the COPY
            let mut batch = Vec::with_capacity(BATCH_SIZE);
            for row in rows {
                batch.push(row?);
                if batch.len() >= BATCH_SIZE {
                    let chunk = encode_rows(&batch).map_err(|e| LoadError::new(table.name, e))?;
                    sink.send(chunk)
                        .await
                        .map_err(|e| LoadError::new(table.name, e))?;
                    batch.clear();
                }
            }
            if !batch.is_empty() {
                let chunk = encode_rows(&batch).map_err(|e| LoadError::new(table.name, e))?;
                sink.send(chunk)
                    .await
                    .map_err(|e| LoadError::new(table.name, e))?;
            }

            let count = sink
                .as_mut()
                .finish()
                .await
                .map_err(|e| LoadError::new(table.name, e))?;
            Ok::<_, Error>(count)
        })
    }

    fn insert_missing(&mut self, table: &TableSchema, rows: &[Record]) -> Result<u64, DbError> {
        let sql = generate_insert_ignore(table, Dialect::Postgres);
        let client = &self.client;

        let inserted = self.runtime.block_on(async {
            let stmt = client.prepare(&sql).await?;
            let mut inserted = 0;
            for row in rows {
                let params: Vec<Option<String>> = row.values.iter().map(|v| v.to_text()).collect();
                let refs: Vec<&(dyn ToSql + Sync)> =
                    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
                inserted += client.execute(&stmt, &refs).await?;
            }
            Ok::<_, tokio_postgres::Error>(inserted)
        })?;

        Ok(inserted)
    }

    fn integer_values(&mut self, table: &TableSchema, column: &str) -> Result<Vec<i64>, DbError> {
        let sql = format!(
            "SELECT {}::bigint FROM {} WHERE {} IS NOT NULL",
            column, table.name, column
        );
        let rows = self.runtime.block_on(self.client.query(sql.as_str(), &[]))?;
        Ok(rows.iter().map(|r| r.get::<_, i64>(0)).collect())
    }

    fn count_rows(&mut self, table: &TableSchema) -> Result<u64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        let row = self.runtime.block_on(self.client.query_one(sql.as_str(), &[]))?;
        Ok(row.get::<_, i64>(0) as u64)
    }
}
