// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The error type for [`GroupedSequence`](crate::GroupedSequence) operations.
///
/// `E` is the data-access error of the underlying cursor, so callers can tell
/// "the protocol was misused" apart from "the data source failed".
#[derive(Debug, Error)]
pub enum GroupError<E> {
    /// The caller violated the group/record call order.
    #[error(transparent)]
    CallOrder(CallOrderError),

    /// The cursor or the key extractor failed.
    #[error("Unable to read from the cursor")]
    DataAccess(#[source] E),
}

impl<E> From<CallOrderError> for GroupError<E> {
    fn from(err: CallOrderError) -> Self {
        GroupError::CallOrder(err)
    }
}

impl<E> GroupError<E> {
    /// Returns the call order violation, if this is one.
    pub fn call_order(&self) -> Option<CallOrderError> {
        match self {
            GroupError::CallOrder(err) => Some(*err),
            GroupError::DataAccess(_) => None,
        }
    }
}

/// A violation of the two-level `next_group`/`next_in_group` protocol.
///
/// These are programming errors in the caller rather than conditions of the
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CallOrderError {
    /// No group has been opened yet.
    #[error("next_group must be called first")]
    NotStarted,

    /// `next_group` was called while the open group still had records.
    #[error("the current group has not been exhausted; call next_in_group until it returns false")]
    GroupNotExhausted,

    /// `next_in_group` was called after it already reported the end of the group.
    #[error("the current group is exhausted; call next_group to open the next one")]
    BoundaryPending,

    /// The key was read after the sequence ran out of records.
    #[error("iteration has finished")]
    Finished,

    /// A previous call failed with a data-access error.
    #[error("the sequence failed earlier and can no longer be used")]
    Poisoned,
}

/// Data-access errors raised by a [`TableCursor`](crate::table::TableCursor).
#[derive(Debug, Error)]
pub enum TableError {
    /// A record was read before the first advance or after the last one.
    #[error("End of data")]
    NoCurrentRecord,

    /// No column carries the requested label.
    #[error("No column found for {label}")]
    ColumnNotFound {
        /// The label that was looked up.
        label: String,
    },

    /// The column index is past the width of the table.
    #[error("column index {index} out of range for {width} columns")]
    ColumnOutOfRange {
        /// The requested column.
        index: usize,
        /// The number of columns in the table.
        width: usize,
    },

    /// The cell does not hold the requested type.
    #[error("column {index} is not of type {expected}")]
    TypeMismatch {
        /// The requested column.
        index: usize,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// A row does not have one cell per column.
    #[error("row {row} has {found} cells but the table has {expected} columns")]
    RaggedRow {
        /// Zero-based position of the row.
        row: usize,
        /// The number of columns.
        expected: usize,
        /// The number of cells in the row.
        found: usize,
    },

    /// The table document could not be parsed.
    #[error("Unable to parse the table")]
    ParseError(#[source] serde_json::Error),

    /// The table file could not be read.
    #[error("Unable to read the table at {}", path.display())]
    ReadError {
        /// The file that was being read.
        #[source]
        inner: io::Error,
        /// The path of that file.
        path: PathBuf,
    },
}

/// The error type for the report operations of `grouped-cursor`.
#[derive(Debug, Error)]
pub enum Error {
    /// Error while walking the groups of a table.
    #[error(transparent)]
    GroupingError(GroupError<TableError>),

    /// Error while loading or reading a table.
    #[error(transparent)]
    TableError(TableError),

    /// Error while writing to the output.
    #[error("Unable to write to the output")]
    OutputError(#[source] io::Error),

    /// Error while encoding a JSON report line.
    #[error("Unable to encode a report line")]
    EncodeError(#[source] serde_json::Error),
}

/// A specialized `Result` type for `grouped-cursor` report operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<GroupError<TableError>> for Error {
    fn from(err: GroupError<TableError>) -> Self {
        Error::GroupingError(err)
    }
}

impl From<CallOrderError> for Error {
    fn from(err: CallOrderError) -> Self {
        Error::GroupingError(GroupError::CallOrder(err))
    }
}

impl From<TableError> for Error {
    fn from(err: TableError) -> Self {
        Error::TableError(err)
    }
}

impl Error {
    pub(crate) fn output_error(inner: io::Error) -> Error {
        Error::OutputError(inner)
    }

    pub(crate) fn encode_error(inner: serde_json::Error) -> Error {
        Error::EncodeError(inner)
    }
}

impl TableError {
    pub(crate) fn read_error(inner: io::Error, path: PathBuf) -> TableError {
        TableError::ReadError { inner, path }
    }
}
