//! Bulk loader: truncate, seed sentinel rows, then load every table of the
//! plan in order.
//!
//! Tables with a contiguous key range get their placeholder rows right after
//! they load. Because every FK parent ranks below its children, sentinels and
//! placeholders exist before anything can reference them.

pub mod reconcile;
pub mod seed;

use seed::{ReservedKeys, SeedCounts};

use std::path::Path;

use crate::error::{BusyError, Error, LoadError, Result};
use crate::parser::TableReader;
use crate::report::{Phase, Reporter, TableReport};
use crate::schema::{LoadPlan, TableSchema};
use crate::store::Store;

/// Transaction scope of a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// Truncate and every table load commit together; a failure leaves the
    /// previous dataset in place
    #[default]
    Single,
    /// Truncate commits first, then each table commits on its own; a failure
    /// leaves the tables loaded so far and empties the rest
    PerTable,
}

impl CommitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitMode::Single => "single",
            CommitMode::PerTable => "per-table",
        }
    }
}

/// Replace the destination dataset with the CSV exports in `source_root`
pub fn load_dataset<S: Store + ?Sized, R: Reporter>(
    store: &mut S,
    plan: &LoadPlan,
    source_root: &Path,
    mode: CommitMode,
    reporter: &mut R,
) -> Result<Vec<TableReport>> {
    tracing::info!(dialect = ?store.dialect(), mode = mode.as_str(), tables = plan.len(), "loading dataset");

    // Taken before any DDL: schema statements wait on another run's table locks
    if !store
        .try_lock_run()
        .map_err(|e| LoadError::new("run lock", e))?
    {
        return Err(BusyError.into());
    }

    let result = store
        .create_tables(plan.tables())
        .map_err(Error::from)
        .and_then(|()| match mode {
            CommitMode::Single => load_single(store, plan, source_root, reporter),
            CommitMode::PerTable => load_per_table(store, plan, source_root, reporter),
        });

    if let Err(err) = &result {
        tracing::error!(error = %err, mode = mode.as_str(), "load failed, rolling back");
        if let Err(e) = store.rollback() {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
    if let Err(e) = store.unlock_run() {
        tracing::warn!(error = %e, "releasing the run lock failed");
    }

    result
}

fn load_single<S: Store + ?Sized, R: Reporter>(
    store: &mut S,
    plan: &LoadPlan,
    source_root: &Path,
    reporter: &mut R,
) -> Result<Vec<TableReport>> {
    let scope = plan_label(plan);
    store.begin().map_err(|e| LoadError::new(&scope, e))?;

    let seeded = truncate_and_seed(store, plan, reporter)?;

    reporter.set_phase(Phase::Loading);
    let mut reports = Vec::with_capacity(plan.len());
    for (idx, &table) in plan.tables().iter().enumerate() {
        reports.push(with_seed_count(load_table(store, table, source_root)?, &seeded));
        reporter.set_progress(idx as u64 + 1, plan.len() as u64, table.name);
    }

    store.commit().map_err(|e| LoadError::new(&scope, e))?;
    Ok(reports)
}

fn load_per_table<S: Store + ?Sized, R: Reporter>(
    store: &mut S,
    plan: &LoadPlan,
    source_root: &Path,
    reporter: &mut R,
) -> Result<Vec<TableReport>> {
    let scope = plan_label(plan);
    store.begin().map_err(|e| LoadError::new(&scope, e))?;
    let seeded = truncate_and_seed(store, plan, reporter)?;
    store.commit().map_err(|e| LoadError::new(&scope, e))?;

    reporter.set_phase(Phase::Loading);
    let mut reports = Vec::with_capacity(plan.len());
    for (idx, &table) in plan.tables().iter().enumerate() {
        store.begin().map_err(|e| LoadError::new(table.name, e))?;
        reports.push(with_seed_count(load_table(store, table, source_root)?, &seeded));
        store.commit().map_err(|e| LoadError::new(table.name, e))?;
        reporter.set_progress(idx as u64 + 1, plan.len() as u64, table.name);
    }

    Ok(reports)
}

fn truncate_and_seed<S: Store + ?Sized, R: Reporter>(
    store: &mut S,
    plan: &LoadPlan,
    reporter: &mut R,
) -> Result<SeedCounts> {
    reporter.set_phase(Phase::Truncating);
    store
        .truncate(plan.tables())
        .map_err(|e| LoadError::new(plan_label(plan), e))?;
    tracing::info!(tables = plan.len(), "destination tables truncated");

    seed::seed_plan(store, plan)
}

fn with_seed_count(mut report: TableReport, seeded: &SeedCounts) -> TableReport {
    report.sentinels_inserted = seeded
        .iter()
        .find(|(name, _)| *name == report.table)
        .map_or(0, |&(_, count)| count);
    report
}

/// Load one table and fill its key gaps. Upstream rows holding a reserved
/// sentinel id are dropped.
pub fn load_table<S: Store + ?Sized>(
    store: &mut S,
    table: &'static TableSchema,
    source_root: &Path,
) -> Result<TableReport> {
    let reserved = ReservedKeys::for_table(table)?;
    let mut reserved_dropped: u64 = 0;

    let rows_loaded = {
        let reader = TableReader::open(source_root, table)?;
        let mut rows = reader.filter(|row| match row {
            Ok(record) if reserved.is_reserved(record) => {
                reserved_dropped += 1;
                false
            }
            _ => true,
        });
        store.bulk_load(table, &mut rows)?
    };
    if reserved_dropped > 0 {
        tracing::warn!(
            table = table.name,
            dropped = reserved_dropped,
            "upstream rows use reserved sentinel ids; keeping the sentinels"
        );
    }
    tracing::info!(table = table.name, rows = rows_loaded, "table loaded");

    let placeholders_inserted = match &table.gap_fill {
        Some(gap) => reconcile::fill_gaps(store, table, gap)?,
        None => 0,
    };

    Ok(TableReport {
        table: table.name.to_string(),
        rows_loaded,
        reserved_dropped,
        placeholders_inserted,
        ..Default::default()
    })
}

fn plan_label(plan: &LoadPlan) -> String {
    plan.tables()
        .iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::parser::Record;
    use crate::report::SilentReporter;
    use crate::store::{Dialect, RowStream};

    /// Records the calls made on it
    struct ScriptedStore {
        lock_free: bool,
        fail_ddl: bool,
        calls: Vec<&'static str>,
    }

    impl ScriptedStore {
        fn new(lock_free: bool, fail_ddl: bool) -> Self {
            Self {
                lock_free,
                fail_ddl,
                calls: Vec::new(),
            }
        }
    }

    impl Store for ScriptedStore {
        fn dialect(&self) -> Dialect {
            Dialect::Postgres
        }

        fn try_lock_run(&mut self) -> Result<bool, DbError> {
            self.calls.push("try_lock_run");
            Ok(self.lock_free)
        }

        fn unlock_run(&mut self) -> Result<(), DbError> {
            self.calls.push("unlock_run");
            Ok(())
        }

        fn create_tables(&mut self, _tables: &[&TableSchema]) -> Result<(), LoadError> {
            self.calls.push("create_tables");
            if self.fail_ddl {
                return Err(LoadError::new(
                    "races",
                    std::io::Error::new(std::io::ErrorKind::Other, "lock timeout"),
                ));
            }
            Ok(())
        }

        fn begin(&mut self) -> Result<(), DbError> {
            self.calls.push("begin");
            Ok(())
        }

        fn commit(&mut self) -> Result<(), DbError> {
            self.calls.push("commit");
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), DbError> {
            self.calls.push("rollback");
            Ok(())
        }

        fn truncate(&mut self, _tables: &[&TableSchema]) -> Result<(), DbError> {
            self.calls.push("truncate");
            Ok(())
        }

        fn bulk_load(&mut self, _table: &TableSchema, _rows: &mut RowStream<'_>) -> Result<u64, Error> {
            self.calls.push("bulk_load");
            Ok(0)
        }

        fn insert_missing(&mut self, _table: &TableSchema, _rows: &[Record]) -> Result<u64, DbError> {
            self.calls.push("insert_missing");
            Ok(0)
        }

        fn integer_values(&mut self, _table: &TableSchema, _column: &str) -> Result<Vec<i64>, DbError> {
            Ok(Vec::new())
        }

        fn count_rows(&mut self, _table: &TableSchema) -> Result<u64, DbError> {
            Ok(0)
        }
    }

    fn load(store: &mut ScriptedStore, plan: &LoadPlan) -> Result<Vec<TableReport>> {
        load_dataset(store, plan, Path::new("unused"), CommitMode::Single, &mut SilentReporter)
    }

    #[test]
    fn test_busy_lock_fails_before_any_ddl() {
        let mut store = ScriptedStore::new(false, false);
        let plan = LoadPlan::standard().unwrap();
        assert!(matches!(load(&mut store, &plan), Err(Error::Busy(_))));
        assert_eq!(store.calls, vec!["try_lock_run"]);
    }

    #[test]
    fn test_lock_released_after_failure() {
        let mut store = ScriptedStore::new(true, true);
        let plan = LoadPlan::standard().unwrap();
        assert!(matches!(load(&mut store, &plan), Err(Error::Load(_))));
        assert_eq!(
            store.calls,
            vec!["try_lock_run", "create_tables", "rollback", "unlock_run"]
        );
    }

    #[test]
    fn test_lock_released_after_success() {
        let mut store = ScriptedStore::new(true, false);
        let plan = LoadPlan::new(&[]).unwrap();
        assert!(load(&mut store, &plan).unwrap().is_empty());
        assert_eq!(
            store.calls,
            vec!["try_lock_run", "create_tables", "begin", "truncate", "commit", "unlock_run"]
        );
    }
}
