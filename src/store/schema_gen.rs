use super::Dialect;
use crate::schema::{ColumnType, TableSchema};

fn sql_type(col_type: ColumnType, dialect: Dialect) -> &'static str {
    match (dialect, col_type) {
        (_, ColumnType::Integer) => "INTEGER",
        (_, ColumnType::Text) => "TEXT",
        (Dialect::Sqlite, ColumnType::Boolean) => "INTEGER",
        (Dialect::Postgres, ColumnType::Boolean) => "BOOLEAN",
        (Dialect::Sqlite, ColumnType::Timestamp) => "TEXT",
        (Dialect::Postgres, ColumnType::Timestamp) => "TIMESTAMP",
    }
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema, dialect: Dialect) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut lines = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        lines.push(format!(
            "    {} {}{}",
            col.name,
            sql_type(col.col_type, dialect),
            null_constraint
        ));
    }

    lines.push(format!("    PRIMARY KEY ({})", schema.primary_key.join(", ")));

    for fk in schema.foreign_keys {
        lines.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

/// Conflict-safe insert of one full row
pub fn generate_insert_ignore(schema: &TableSchema, dialect: Dialect) -> String {
    let placeholders: Vec<String> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| match dialect {
            Dialect::Sqlite => format!("?{}", i + 1),
            // Parameters travel as text and are cast to the column type server-side
            Dialect::Postgres => format!("${}::text::{}", i + 1, sql_type(col.col_type, dialect)),
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING",
        schema.name,
        schema.column_names().join(", "),
        placeholders.join(", "),
        schema.primary_key.join(", ")
    )
}

/// Plain insert of one full row
pub fn generate_insert(schema: &TableSchema) -> String {
    let placeholders: Vec<String> = (1..=schema.columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        schema.column_names().join(", "),
        placeholders.join(", ")
    )
}

/// COPY statement streaming CSV rows in schema column order
pub fn generate_copy(schema: &TableSchema) -> String {
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
        schema.name,
        schema.column_names().join(", ")
    )
}

/// Statements emptying every table in one go
///
/// `tables` must be in load order. PostgreSQL truncates them in a single
/// statement; SQLite has no TRUNCATE, so rows are deleted children first.
pub fn generate_truncate(tables: &[&TableSchema], dialect: Dialect) -> Vec<String> {
    match dialect {
        Dialect::Postgres => {
            let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
            vec![format!("TRUNCATE TABLE {} CASCADE", names.join(", "))]
        }
        Dialect::Sqlite => tables
            .iter()
            .rev()
            .map(|t| format!("DELETE FROM {}", t.name))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ALL_TABLES, GAMES, MEMBERS, TOURNAMENT_COACHES};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&GAMES, Dialect::Postgres);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS games"));
        assert!(sql.contains("gameid INTEGER NOT NULL"));
        assert!(sql.contains("dirty BOOLEAN"));
        assert!(sql.contains("date TIMESTAMP"));
        assert!(sql.contains("PRIMARY KEY (gameid)"));
        assert!(sql.contains("FOREIGN KEY (homecoachid) REFERENCES members(naf_number)"));
        assert!(sql.contains("FOREIGN KEY (variantsid) REFERENCES variants(variantid)"));

        let sql = generate_create_table(&GAMES, Dialect::Sqlite);
        assert!(sql.contains("dirty INTEGER"));
        assert!(sql.contains("date TEXT"));
    }

    #[test]
    fn test_composite_primary_key() {
        let sql = generate_create_table(&TOURNAMENT_COACHES, Dialect::Sqlite);
        assert!(sql.contains("PRIMARY KEY (tournamentid, coachid, raceid)"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&GAMES);
        assert_eq!(indexes.len(), 6);
        assert!(indexes.iter().any(|i| i.contains("idx_games_awaycoachid")));
        assert!(generate_indexes(&MEMBERS).is_empty());
    }

    #[test]
    fn test_generate_insert_ignore() {
        let sql = generate_insert_ignore(&MEMBERS, Dialect::Postgres);
        assert!(sql.starts_with("INSERT INTO members (naf_number, naf_name, country"));
        assert!(sql.contains("$1::text::INTEGER"));
        assert!(sql.contains("$4::text::TIMESTAMP"));
        assert!(sql.ends_with("ON CONFLICT (naf_number) DO NOTHING"));

        let sql = generate_insert_ignore(&MEMBERS, Dialect::Sqlite);
        assert!(sql.contains("VALUES (?1, ?2, ?3, ?4, ?5)"));
    }

    #[test]
    fn test_generate_copy() {
        assert_eq!(
            generate_copy(&TOURNAMENT_COACHES),
            "COPY tournament_coaches (tournamentid, coachid, raceid) FROM STDIN WITH (FORMAT csv)"
        );
    }

    #[test]
    fn test_generate_truncate() {
        let pg = generate_truncate(ALL_TABLES, Dialect::Postgres);
        assert_eq!(pg.len(), 1);
        assert!(pg[0].starts_with("TRUNCATE TABLE races, variants"));
        assert!(pg[0].ends_with("CASCADE"));

        let sqlite = generate_truncate(ALL_TABLES, Dialect::Sqlite);
        assert_eq!(sqlite.len(), 9);
        assert_eq!(sqlite[0], "DELETE FROM coach_ranking_variant");
        assert_eq!(sqlite[8], "DELETE FROM races");
    }
}
