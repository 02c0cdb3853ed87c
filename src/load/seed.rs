//! Reserved sentinel rows ("Unknown" race, "Unknown"/"Deleted" variants).
//!
//! Sentinels go in right after the truncate, before any table loads. Their
//! ids are reserved: upstream rows claiming one are dropped during the load
//! so the sentinel always wins.

use crate::error::{LoadError, ParseError, Result};
use crate::parser::{Record, SqlValue};
use crate::schema::{LoadPlan, TableSchema};
use crate::store::Store;

/// Sentinel rows inserted per table, in plan order
pub type SeedCounts = Vec<(&'static str, u64)>;

/// Insert the table's sentinel rows, skipping any already present.
/// Returns how many sentinels were inserted.
pub fn inject_sentinels<S: Store + ?Sized>(store: &mut S, table: &'static TableSchema) -> Result<u64> {
    if table.sentinels.is_empty() {
        return Ok(0);
    }

    let rows = table
        .sentinels
        .iter()
        .map(|&template| Record::from_template(table, template))
        .collect::<Result<Vec<_>, _>>()?;

    let inserted = store
        .insert_missing(table, &rows)
        .map_err(|e| LoadError::new(table.name, e))?;
    tracing::info!(table = table.name, inserted, "sentinel rows injected");

    Ok(inserted)
}

/// Seed every table of the plan that declares sentinels
pub fn seed_plan<S: Store + ?Sized>(store: &mut S, plan: &LoadPlan) -> Result<SeedCounts> {
    plan.tables()
        .iter()
        .filter(|t| !t.sentinels.is_empty())
        .map(|&table| Ok((table.name, inject_sentinels(store, table)?)))
        .collect()
}

/// Primary keys of a table's sentinel rows
#[derive(Debug, Clone)]
pub struct ReservedKeys {
    key_columns: Vec<usize>,
    keys: Vec<Vec<SqlValue>>,
}

impl ReservedKeys {
    pub fn for_table(table: &'static TableSchema) -> Result<Self, ParseError> {
        let key_columns = table
            .primary_key
            .iter()
            .map(|&key| {
                table.column_index(key).ok_or_else(|| ParseError::Template {
                    table: table.name,
                    column: key.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut keys = Vec::with_capacity(table.sentinels.len());
        for &template in table.sentinels {
            let row = Record::from_template(table, template)?;
            keys.push(key_columns.iter().map(|&i| row.values[i].clone()).collect());
        }

        Ok(Self { key_columns, keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True when `row` carries the primary key of a sentinel
    pub fn is_reserved(&self, row: &Record) -> bool {
        self.keys.iter().any(|key| {
            self.key_columns
                .iter()
                .zip(key)
                .all(|(&i, value)| row.values.get(i) == Some(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ALL_TABLES, AWARDS, RACES, VARIANTS};
    use crate::store::SqliteStore;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::in_memory().unwrap();
        store.create_tables(ALL_TABLES).unwrap();
        store
    }

    fn variant(id: i64, name: &str) -> Record {
        Record {
            values: vec![
                SqlValue::Integer(id),
                SqlValue::Text(name.into()),
                SqlValue::Integer(1),
            ],
        }
    }

    #[test]
    fn test_injects_variant_sentinels() {
        let mut store = store();
        assert_eq!(inject_sentinels(&mut store, &VARIANTS).unwrap(), 2);

        let mut ids = store.integer_values(&VARIANTS, "variantid").unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 6]);
    }

    #[test]
    fn test_is_idempotent() {
        let mut store = store();
        inject_sentinels(&mut store, &VARIANTS).unwrap();
        assert_eq!(inject_sentinels(&mut store, &VARIANTS).unwrap(), 0);
        assert_eq!(store.count_rows(&VARIANTS).unwrap(), 2);
    }

    #[test]
    fn test_seeded_row_survives_conflicting_insert() {
        let mut store = store();
        inject_sentinels(&mut store, &VARIANTS).unwrap();

        let inserted = store
            .insert_missing(&VARIANTS, &[variant(6, "Upstream Six")])
            .unwrap();
        assert_eq!(inserted, 0);

        let name: String = store
            .connection()
            .query_row("SELECT variantname FROM variants WHERE variantid = 6", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Deleted");
    }

    #[test]
    fn test_seed_plan_covers_races_and_variants() {
        let mut store = store();
        let counts = seed_plan(&mut store, &LoadPlan::standard().unwrap()).unwrap();
        assert_eq!(counts, vec![("races", 1), ("variants", 2)]);
    }

    #[test]
    fn test_tables_without_sentinels() {
        let mut store = store();
        assert_eq!(inject_sentinels(&mut store, &AWARDS).unwrap(), 0);
        assert!(ReservedKeys::for_table(&AWARDS).unwrap().is_empty());
    }

    #[test]
    fn test_reserved_keys() {
        let reserved = ReservedKeys::for_table(&VARIANTS).unwrap();
        assert!(reserved.is_reserved(&variant(6, "Sevens")));
        assert!(reserved.is_reserved(&variant(0, "Zero")));
        assert!(!reserved.is_reserved(&variant(13, "BB2016")));

        let races = ReservedKeys::for_table(&RACES).unwrap();
        let mut amazon = vec![SqlValue::Null; RACES.columns.len()];
        amazon[0] = SqlValue::Integer(1);
        assert!(!races.is_reserved(&Record { values: amazon }));
    }
}
