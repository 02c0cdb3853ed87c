use super::tables::ALL_TABLES;
use super::types::TableSchema;
use crate::error::PlanError;
use std::collections::HashMap;

/// Validated, ordered list of tables to load
///
/// Tables are ordered by `rank`, keeping declaration order within a rank.
/// Construction fails unless every foreign-key parent is part of the plan
/// with a strictly lower rank, so walking the plan front to back never loads
/// a row before the rows it references.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    tables: Vec<&'static TableSchema>,
}

impl LoadPlan {
    pub fn new(tables: &[&'static TableSchema]) -> Result<Self, PlanError> {
        let mut ranks: HashMap<&'static str, u8> = HashMap::new();
        for table in tables {
            if ranks.insert(table.name, table.rank).is_some() {
                return Err(PlanError::Duplicate(table.name));
            }
        }

        for table in tables {
            for parent in table.dependencies() {
                let parent_rank = *ranks.get(parent).ok_or(PlanError::UnknownParent {
                    table: table.name,
                    parent,
                })?;
                if parent_rank >= table.rank {
                    return Err(PlanError::RankOrder {
                        table: table.name,
                        rank: table.rank,
                        parent,
                        parent_rank,
                    });
                }
            }
        }

        let mut ordered = tables.to_vec();
        ordered.sort_by_key(|t| t.rank);

        Ok(Self { tables: ordered })
    }

    /// The plan covering every table of the dump
    pub fn standard() -> Result<Self, PlanError> {
        Self::new(ALL_TABLES)
    }

    /// Tables in load order (parents before children)
    pub fn tables(&self) -> &[&'static TableSchema] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
