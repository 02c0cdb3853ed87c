//! Placeholder rows for retired member numbers.
//!
//! Upstream drops members from the roster while their games, tournaments and
//! awards stay in the dump. Member numbers are treated as one contiguous
//! range, and every hole in it gets a placeholder row so those historical
//! references stay satisfiable.

use crate::error::{LoadError, ParseError, Result};
use crate::parser::{Record, SqlValue};
use crate::schema::{GapFill, TableSchema};
use crate::store::{Store, BATCH_SIZE};

/// Holes in an integer key range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGaps {
    pub min: i64,
    pub max: i64,
    pub missing: Vec<i64>,
}

/// Find every integer in `[min(keys), max(keys)]` absent from `keys`.
/// `None` when `keys` is empty.
pub fn find_gaps(keys: &[i64]) -> Option<KeyGaps> {
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let min = *sorted.first()?;
    let max = *sorted.last()?;
    let mut missing = Vec::new();
    for pair in sorted.windows(2) {
        missing.extend(pair[0] + 1..pair[1]);
    }

    Some(KeyGaps { min, max, missing })
}

/// Insert a placeholder for each gap in `gap.key`; returns how many were inserted
pub fn fill_gaps<S: Store + ?Sized>(store: &mut S, table: &'static TableSchema, gap: &GapFill) -> Result<u64> {
    let key_idx = table
        .column_index(gap.key)
        .ok_or_else(|| ParseError::Template {
            table: table.name,
            column: gap.key.to_string(),
        })?;
    let template = Record::from_template(table, gap.placeholder)?;

    let keys = store
        .integer_values(table, gap.key)
        .map_err(|e| LoadError::new(table.name, e))?;
    let Some(gaps) = find_gaps(&keys) else {
        tracing::warn!(table = table.name, "table is empty; no range to reconcile");
        return Ok(0);
    };

    let mut inserted = 0;
    for chunk in gaps.missing.chunks(BATCH_SIZE) {
        let rows: Vec<Record> = chunk
            .iter()
            .map(|&id| {
                let mut row = template.clone();
                row.values[key_idx] = SqlValue::Integer(id);
                row
            })
            .collect();
        inserted += store
            .insert_missing(table, &rows)
            .map_err(|e| LoadError::new(table.name, e))?;
    }

    tracing::info!(
        table = table.name,
        min = gaps.min,
        max = gaps.max,
        placeholders = inserted,
        "key range reconciled"
    );

    Ok(inserted)
}
