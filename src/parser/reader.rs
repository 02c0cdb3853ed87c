use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::record::{Record, SqlValue};
use crate::error::{Error, ParseError};
use crate::schema::TableSchema;

/// Field separator of the upstream exports
pub const DELIMITER: u8 = b';';

/// Streams one source CSV as records in destination column order.
///
/// Source fields are matched to destination columns by header name; fields
/// no column asks for are dropped.
pub struct TableReader<R> {
    schema: &'static TableSchema,
    file: String,
    reader: csv::Reader<R>,
    /// For each destination column, the position of its source field
    positions: Vec<usize>,
    record: StringRecord,
}

impl TableReader<File> {
    /// Open the table's source file inside `source_root`
    pub fn open(source_root: &Path, schema: &'static TableSchema) -> Result<Self, Error> {
        let path = source_root.join(schema.source_file);
        let file = File::open(&path)
            .map_err(|e| Error::io(format!("Failed to open: {:?}", path), e))?;
        Ok(Self::new(file, schema.source_file, schema)?)
    }
}

impl<R: Read> TableReader<R> {
    pub fn new(
        input: R,
        file: impl Into<String>,
        schema: &'static TableSchema,
    ) -> Result<Self, ParseError> {
        let file = file.into();
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|source| ParseError::Csv {
                file: file.clone(),
                source,
            })?
            .clone();

        let positions = schema
            .columns
            .iter()
            .map(|col| {
                headers
                    .iter()
                    .position(|h| h.trim() == col.source)
                    .ok_or_else(|| ParseError::MissingColumn {
                        file: file.clone(),
                        column: col.name,
                        header: col.source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema,
            file,
            reader,
            positions,
            record: StringRecord::new(),
        })
    }

    fn transform(&self) -> Result<Record, ParseError> {
        let line = self.record.position().map(|p| p.line()).unwrap_or(0);

        let values = self
            .schema
            .columns
            .iter()
            .zip(&self.positions)
            .map(|(col, &pos)| {
                let raw = self.record.get(pos).unwrap_or_default();
                SqlValue::parse(raw, col.col_type).ok_or_else(|| ParseError::InvalidValue {
                    file: self.file.clone(),
                    line,
                    column: col.name,
                    kind: col.col_type.label(),
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record { values })
    }
}

impl<R: Read> Iterator for TableReader<R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => Some(self.transform()),
            Err(source) => Some(Err(ParseError::Csv {
                file: self.file.clone(),
                source,
            })),
        }
    }
}
