use crate::error::ParseError;
use crate::schema::{ColumnType, RowTemplate, TableSchema};

/// Prefix of the zero date upstream writes for "no date"
const ZERO_DATE: &str = "0000-00-00";

/// A transformed row in destination column order, ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl SqlValue {
    /// Normalize and type one raw CSV field.
    ///
    /// Empty fields and zero dates become `Null`. Returns `None` when the
    /// field is not a valid value of `col_type`.
    pub fn parse(raw: &str, col_type: ColumnType) -> Option<SqlValue> {
        if raw.is_empty() || is_zero_date(raw) {
            return Some(SqlValue::Null);
        }

        match col_type {
            ColumnType::Integer => raw.trim().parse().ok().map(SqlValue::Integer),
            ColumnType::Boolean => parse_bool(raw.trim()).map(SqlValue::Boolean),
            ColumnType::Text | ColumnType::Timestamp => Some(SqlValue::Text(raw.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Boolean(b) => stmt.raw_bind_parameter(idx, b)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }

    /// Text form used for COPY CSV fields and text-cast query parameters.
    /// `None` is SQL NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Boolean(b) => Some(if *b { "t" } else { "f" }.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

/// True for `0000-00-00` and `0000-00-00 00:00:00` style values
pub fn is_zero_date(raw: &str) -> bool {
    raw.starts_with(ZERO_DATE)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Record {
    /// Build a row from `(column, value)` pairs; unnamed columns are null
    pub fn from_template(
        schema: &'static TableSchema,
        template: RowTemplate,
    ) -> Result<Record, ParseError> {
        let mut values = vec![SqlValue::Null; schema.columns.len()];
        for (column, raw) in template {
            let idx = schema
                .column_index(column)
                .ok_or_else(|| ParseError::Template {
                    table: schema.name,
                    column: column.to_string(),
                })?;
            let col = &schema.columns[idx];
            values[idx] =
                SqlValue::parse(raw, col.col_type).ok_or_else(|| ParseError::InvalidValue {
                    file: format!("<{} template>", schema.name),
                    line: 0,
                    column: col.name,
                    kind: col.col_type.label(),
                    value: raw.to_string(),
                })?;
        }
        Ok(Record { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{MEMBERS, RACES};

    #[test]
    fn test_zero_dates_become_null() {
        assert_eq!(
            SqlValue::parse("0000-00-00", ColumnType::Timestamp),
            Some(SqlValue::Null)
        );
        assert_eq!(
            SqlValue::parse("0000-00-00 00:00:00", ColumnType::Timestamp),
            Some(SqlValue::Null)
        );
        // Applies to every column, not only timestamps
        assert_eq!(
            SqlValue::parse("0000-00-00", ColumnType::Text),
            Some(SqlValue::Null)
        );
        assert_eq!(
            SqlValue::parse("2001-00-00", ColumnType::Timestamp),
            Some(SqlValue::Text("2001-00-00".into()))
        );
    }

    #[test]
    fn test_empty_is_null() {
        assert_eq!(SqlValue::parse("", ColumnType::Integer), Some(SqlValue::Null));
        assert_eq!(SqlValue::parse("", ColumnType::Text), Some(SqlValue::Null));
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            SqlValue::parse(" 10005 ", ColumnType::Integer),
            Some(SqlValue::Integer(10005))
        );
        assert_eq!(SqlValue::parse("-3", ColumnType::Integer), Some(SqlValue::Integer(-3)));
        assert_eq!(SqlValue::parse("12a", ColumnType::Integer), None);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(SqlValue::parse("1", ColumnType::Boolean), Some(SqlValue::Boolean(true)));
        assert_eq!(SqlValue::parse("N", ColumnType::Boolean), Some(SqlValue::Boolean(false)));
        assert_eq!(SqlValue::parse("maybe", ColumnType::Boolean), None);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(SqlValue::Null.to_text(), None);
        assert_eq!(SqlValue::Integer(7).to_text().as_deref(), Some("7"));
        assert_eq!(SqlValue::Boolean(false).to_text().as_deref(), Some("f"));
    }

    #[test]
    fn test_from_template() {
        let row = Record::from_template(&RACES, RACES.sentinels[0]).unwrap();
        assert_eq!(row.values.len(), RACES.columns.len());
        assert_eq!(row.values[0], SqlValue::Integer(0));
        assert_eq!(row.values[1], SqlValue::Text("Unknown".into()));
        // selectable is not named by the template
        assert!(row.values[RACES.column_index("selectable").unwrap()].is_null());
    }

    #[test]
    fn test_from_template_unknown_column() {
        let err = Record::from_template(&MEMBERS, &[("nickname", "x")]).unwrap_err();
        assert!(matches!(err, ParseError::Template { table: "members", .. }));
    }
}
