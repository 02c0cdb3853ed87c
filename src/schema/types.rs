use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Boolean,
    /// Date or date-time, passed through as text
    Timestamp,
}

impl ColumnType {
    /// Human-readable name used in parse errors
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    /// Destination column name
    pub name: &'static str,
    /// Header of the source CSV field feeding this column
    pub source: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    /// Create an optional (nullable) column fed by a source field of the same name
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            source: name,
            col_type,
            nullable: true,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            source: name,
            col_type,
            nullable: false,
        }
    }

    /// Set the source CSV header (for when it differs from the column name)
    pub const fn header(self, header: &'static str) -> Self {
        Self {
            source: header,
            ..self
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
    ) -> Self {
        Self {
            column,
            references_table,
            references_column,
        }
    }
}

/// A row given as `(column, value)` pairs; columns not listed are null
pub type RowTemplate = &'static [(&'static str, &'static str)];

/// Placeholder policy for gaps in an integer key range
#[derive(Debug, Clone)]
pub struct GapFill {
    /// Integer key column whose range must be contiguous
    pub key: &'static str,
    /// Values for the other columns of each placeholder row
    pub placeholder: RowTemplate,
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub source_file: &'static str,
    /// Load order class; every FK parent must have a strictly lower rank
    pub rank: u8,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    /// Reserved rows inserted right after the table is loaded
    pub sentinels: &'static [RowTemplate],
    /// Placeholder policy applied right after the table is loaded
    pub gap_fill: Option<GapFill>,
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}
