// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An in-memory table of named columns and a [`Cursor`] over its rows.
//!
//! Tables are read from JSON documents of the form
//! `{"columns": ["one", "two"], "rows": [["a", 1], ["b", null]]}`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, trace};
use serde::Deserialize;
use serde_json::Value;

use crate::{Cursor, KeyExtractor, TableError};

/// Rows of JSON cells under a list of column labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, TableError> {
        Table::new(raw.columns, raw.rows)
    }
}

impl Table {
    /// Build a table, checking that every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let expected = columns.len();
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != expected)
        {
            return Err(TableError::RaggedRow {
                row,
                expected,
                found: cells.len(),
            });
        }

        Ok(Table { columns, rows })
    }

    /// A table with the given columns and no rows.
    pub fn empty(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Parse a table from a JSON document.
    pub fn from_reader(reader: impl Read) -> Result<Self, TableError> {
        serde_json::from_reader(reader).map_err(TableError::ParseError)
    }

    /// Read and parse a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        debug!("reading table from {}", path.display());

        let file = File::open(path).map_err(|e| TableError::read_error(e, path.to_owned()))?;
        let table = Table::from_reader(BufReader::new(file))?;

        debug!(
            "read {} rows of {} columns",
            table.rows.len(),
            table.columns.len()
        );
        Ok(table)
    }

    /// The column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A cursor positioned before the first row.
    pub fn cursor(&self) -> TableCursor<'_> {
        TableCursor {
            table: self,
            position: Position::BeforeFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At(usize),
    AfterLast,
}

/// A forward-only cursor over the rows of a [`Table`].
#[derive(Debug, Clone)]
pub struct TableCursor<'a> {
    table: &'a Table,
    position: Position,
}

impl<'a> TableCursor<'a> {
    /// The zero-based index of the column labelled `label`.
    pub fn find_column(&self, label: &str) -> Result<usize, TableError> {
        self.table
            .columns
            .iter()
            .position(|column| column == label)
            .ok_or_else(|| TableError::ColumnNotFound {
                label: label.to_owned(),
            })
    }

    /// The cells of the current row.
    pub fn row(&self) -> Result<&'a [Value], TableError> {
        match self.position {
            Position::At(row) => Ok(&self.table.rows[row]),
            Position::BeforeFirst | Position::AfterLast => Err(TableError::NoCurrentRecord),
        }
    }

    /// The cell in column `index` of the current row.
    pub fn get(&self, index: usize) -> Result<&'a Value, TableError> {
        let width = self.table.columns.len();
        self.row()?
            .get(index)
            .ok_or(TableError::ColumnOutOfRange { index, width })
    }

    /// The string in column `index` of the current row; `None` for a null
    /// cell.
    pub fn get_str(&self, index: usize) -> Result<Option<&'a str>, TableError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            _ => Err(TableError::TypeMismatch {
                index,
                expected: "string",
            }),
        }
    }

    /// A human readable rendering of the current row.
    pub fn describe_record(&self) -> String {
        match self.position {
            Position::BeforeFirst => "<at beginning>".to_owned(),
            Position::AfterLast => "<at end>".to_owned(),
            Position::At(row) => self.table.rows[row]
                .iter()
                .map(|cell| match cell {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Cursor for TableCursor<'_> {
    type Error = TableError;

    fn advance(&mut self) -> Result<bool, TableError> {
        let next = match self.position {
            Position::BeforeFirst => 0,
            Position::At(row) => row + 1,
            Position::AfterLast => return Ok(false),
        };

        if next < self.table.rows.len() {
            trace!("advanced to row {}", next);
            self.position = Position::At(next);
            Ok(true)
        } else {
            self.position = Position::AfterLast;
            Ok(false)
        }
    }
}

/// A column named either by zero-based index or by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// A zero-based column index.
    Index(usize),

    /// A column label.
    Label(String),
}

impl std::str::FromStr for ColumnRef {
    type Err = std::convert::Infallible;

    /// All-digit strings are indexes; anything else is a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Label(s.to_owned()),
        })
    }
}

/// Groups [`TableCursor`] rows by the string value of one column.
///
/// Null cells give the null key. A label is resolved to an index the first
/// time a key is extracted.
#[derive(Debug, Clone)]
pub struct ColumnKey {
    column: ColumnRef,
}

impl ColumnKey {
    /// Key on the column at zero-based `index`.
    pub fn index(index: usize) -> Self {
        ColumnKey {
            column: ColumnRef::Index(index),
        }
    }

    /// Key on the column labelled `label`.
    pub fn named(label: impl Into<String>) -> Self {
        ColumnKey {
            column: ColumnRef::Label(label.into()),
        }
    }
}

impl From<ColumnRef> for ColumnKey {
    fn from(column: ColumnRef) -> Self {
        ColumnKey { column }
    }
}

impl<'a> KeyExtractor<TableCursor<'a>> for ColumnKey {
    type Key = String;

    fn extract(&mut self, cursor: &TableCursor<'a>) -> Result<Option<String>, TableError> {
        let index = match &self.column {
            ColumnRef::Index(index) => *index,
            ColumnRef::Label(label) => {
                let index = cursor.find_column(label)?;
                self.column = ColumnRef::Index(index);
                index
            }
        };

        Ok(cursor.get_str(index)?.map(str::to_owned))
    }
}
